//! # Gateway Handler
//!
//! Turns the platform's push events into deliveries on the cache. The
//! [`ChatDispatchHandler`] runs inside the engine's
//! [`GatewayDispatcher`](entity_framework::GatewayDispatcher), one event at a
//! time, and every model it delivers carries the stamp the event was received
//! under.
//!
//! | Event                                   | Effect                                   |
//! |-----------------------------------------|------------------------------------------|
//! | `GUILD_CREATE`                          | guild, its roles and channels delivered  |
//! | `GUILD_UPDATE`                          | guild delivered                          |
//! | `GUILD_DELETE`                          | guild and its scope evicted              |
//! | `GUILD_DELETE` with `unavailable: true` | guild marked unavailable, nothing evicted|
//! | `GUILD_ROLE_CREATE` / `_UPDATE`         | role delivered under its guild           |
//! | `GUILD_ROLE_DELETE`                     | role evicted                             |
//! | `CHANNEL_CREATE` / `_UPDATE`            | channel delivered                        |
//! | `CHANNEL_DELETE`                        | channel evicted                          |
//! | `GUILD_BAN_ADD`                         | user and ban delivered                   |
//! | `GUILD_BAN_REMOVE`                      | the guild's ban evicted, user delivered  |
//! | `GUILD_SCHEDULED_EVENT_*`               | scheduled event delivered or evicted     |
//! | `USER_UPDATE`                           | user delivered                           |
//!
//! Anything else is marked ignored in the report.

pub mod payloads;

use crate::ban_actor::Ban;
use crate::channel_actor::Channel;
use crate::error::ChatError;
use crate::guild_actor::Guild;
use crate::model::{BanModel, ChannelModel, GuildModel, ScheduledEventModel, UserModel};
use crate::role_actor::Role;
use crate::scheduled_event_actor::ScheduledEvent;
use crate::user_actor::User;
use async_trait::async_trait;
use entity_framework::{
    Actor, CacheKey, CachePath, Client, DispatchHandler, DispatchReport, Field, GatewayEvent, Id,
    Kind, Stamped,
};
use payloads::{BanChange, GuildChildren, GuildDelete, RoleDelete, RoleUpsert};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

/// Dispatch handler for the chat platform's Gateway events.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChatDispatchHandler;

#[async_trait]
impl DispatchHandler for ChatDispatchHandler {
    type Error = ChatError;

    async fn handle(
        &self,
        client: &Client,
        event: &GatewayEvent,
        report: &mut DispatchReport,
    ) -> Result<(), ChatError> {
        match event.name.as_str() {
            "GUILD_CREATE" => guild_create(client, event, report),
            "GUILD_UPDATE" => {
                let guild: GuildModel = decode(event)?;
                deliver(report, &client.actor::<Guild>(CachePath::root(), guild.id), guild)
            }
            "GUILD_DELETE" => guild_delete(client, event, report),
            "GUILD_ROLE_CREATE" | "GUILD_ROLE_UPDATE" => {
                let RoleUpsert { guild_id, role } = decode(event)?;
                let actor = client.actor::<Role>(CachePath::of::<Guild>(guild_id), role.id);
                deliver(report, &actor, role)
            }
            "GUILD_ROLE_DELETE" => {
                let RoleDelete { role_id, .. } = decode(event)?;
                evict::<Role>(client, report, &CachePath::root(), role_id);
                Ok(())
            }
            "CHANNEL_CREATE" | "CHANNEL_UPDATE" => {
                let channel: ChannelModel = decode(event)?;
                let scope = channel
                    .guild_id
                    .flatten()
                    .map(|&guild_id| CachePath::of::<Guild>(guild_id))
                    .unwrap_or_default();
                deliver(report, &client.actor::<Channel>(scope, channel.id), channel)
            }
            "CHANNEL_DELETE" => {
                let channel: ChannelModel = decode(event)?;
                evict::<Channel>(client, report, &CachePath::root(), channel.id);
                Ok(())
            }
            "GUILD_BAN_ADD" => {
                let BanChange { guild_id, user } = decode(event)?;
                let ban = client.actor::<Ban>(CachePath::of::<Guild>(guild_id), user.id);
                deliver_user(client, report, user.clone())?;
                deliver(report, &ban, BanModel::new(user))
            }
            "GUILD_BAN_REMOVE" => {
                let BanChange { guild_id, user } = decode(event)?;
                evict::<Ban>(client, report, &CachePath::of::<Guild>(guild_id), user.id);
                deliver_user(client, report, user)
            }
            "GUILD_SCHEDULED_EVENT_CREATE" | "GUILD_SCHEDULED_EVENT_UPDATE" => {
                let scheduled: ScheduledEventModel = decode(event)?;
                let guild_id = require(event, &scheduled.guild_id, "guild_id")?;
                let actor = client
                    .actor::<ScheduledEvent>(CachePath::of::<Guild>(guild_id), scheduled.id);
                deliver(report, &actor, scheduled)
            }
            "GUILD_SCHEDULED_EVENT_DELETE" => {
                let scheduled: ScheduledEventModel = decode(event)?;
                evict::<ScheduledEvent>(client, report, &CachePath::root(), scheduled.id);
                Ok(())
            }
            "USER_UPDATE" => deliver_user(client, report, decode(event)?),
            _ => {
                debug!(event = %event.name, "Unhandled event");
                report.ignore();
                Ok(())
            }
        }
    }
}

fn guild_create(
    client: &Client,
    event: &GatewayEvent,
    report: &mut DispatchReport,
) -> Result<(), ChatError> {
    let guild: GuildModel = decode(event)?;
    let children: GuildChildren = decode(event)?;
    let scope = CachePath::of::<Guild>(guild.id);

    deliver(report, &client.actor::<Guild>(CachePath::root(), guild.id), guild)?;
    for role in children.roles {
        deliver(report, &client.actor::<Role>(scope.clone(), role.id), role)?;
    }
    for channel in children.channels {
        deliver(report, &client.actor::<Channel>(scope.clone(), channel.id), channel)?;
    }
    Ok(())
}

fn guild_delete(
    client: &Client,
    event: &GatewayEvent,
    report: &mut DispatchReport,
) -> Result<(), ChatError> {
    let GuildDelete { id, unavailable } = decode(event)?;

    if unavailable {
        info!(guild_id = %id, "Guild unavailable");
        let mut outage = GuildModel::new(id);
        outage.unavailable = Field::Specified(true);
        return deliver(report, &client.actor::<Guild>(CachePath::root(), id), outage);
    }

    evict::<Guild>(client, report, &CachePath::root(), id);
    let scoped = client.cache().invalidate_scope(&CacheKey::of::<Guild>(id));
    debug!(guild_id = %id, scoped, "Guild removed");
    Ok(())
}

fn decode<T: DeserializeOwned>(event: &GatewayEvent) -> Result<T, ChatError> {
    serde_json::from_value(event.payload.clone()).map_err(|source| ChatError::Payload {
        event: event.name.clone(),
        source,
    })
}

fn require(event: &GatewayEvent, field: &Field<Id>, name: &'static str) -> Result<Id, ChatError> {
    field.get().copied().ok_or_else(|| ChatError::MissingField {
        event: event.name.clone(),
        field: name,
    })
}

/// Delivers `model` under the event's stamp and records the outcome.
fn deliver<K: Kind>(
    report: &mut DispatchReport,
    actor: &Actor<K>,
    model: K::Model,
) -> Result<(), ChatError> {
    let outcome = actor.deliver_stamped(Stamped::new(report.stamp, model))?;
    report.record(actor.key(), outcome);
    Ok(())
}

fn deliver_user(
    client: &Client,
    report: &mut DispatchReport,
    user: UserModel,
) -> Result<(), ChatError> {
    deliver(report, &client.actor::<User>(CachePath::root(), user.id), user)
}

/// Evicts `id`, under the parent named in `path` for scoped kinds.
fn evict<K: Kind>(client: &Client, report: &mut DispatchReport, path: &CachePath, id: Id) {
    if client.cache().evict_in::<K>(path, id) {
        report.record_eviction(CacheKey::of::<K>(id));
    }
}
