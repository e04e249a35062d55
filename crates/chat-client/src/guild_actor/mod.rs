//! # Guild Actor
//!
//! Guilds are the root of most of the platform's object graph: roles, bans and
//! scheduled events can only be addressed through their guild, and most channels
//! belong to one. This module implements the [`Guild`] kind and the navigation
//! helpers that hand out actors for a guild's children.
//!
//! ## Structure
//!
//! - [`Guild`] - [`Kind`] implementation, deriving the owner and AFK channel actors
//! - [`GuildActorExt`] - child actors scoped to the guild's cache path
//! - [`bans`] - the [`BanPager`] kept as a trait on the guild actor
//!
//! ## Usage
//!
//! ```rust
//! use chat_client::clients::ChatClientExt;
//! use chat_client::guild_actor::GuildActorExt;
//! use entity_framework::fixtures::fixture_client;
//! use entity_framework::{CacheKey, Id};
//! use chat_client::guild_actor::Guild;
//!
//! let (client, _mock) = fixture_client();
//! let guild = client.guild(Id(10));
//! let role = guild.role(Id(20)).unwrap();
//!
//! // Roles live inside their guild's scope.
//! assert!(role.path().contains(&CacheKey::of::<Guild>(Id(10))));
//! ```

pub mod bans;

pub use bans::{BanPager, GuildBans};

use crate::ban_actor::Ban;
use crate::channel_actor::Channel;
use crate::model::GuildModel;
use crate::role_actor::Role;
use crate::scheduled_event_actor::ScheduledEvent;
use crate::user_actor::User;
use entity_framework::{
    Actor, CachePath, ConstructionContext, FrameworkError, Id, Kind, Route,
};
use std::sync::Arc;

/// Actors derived from a guild model.
#[derive(Debug, Clone)]
pub struct GuildLinks {
    pub owner: Option<Actor<User>>,
    pub afk_channel: Option<Actor<Channel>>,
}

pub struct Guild;

impl Kind for Guild {
    const NAME: &'static str = "guild";
    type Model = GuildModel;
    type Derived = GuildLinks;

    fn derive(
        ctx: &ConstructionContext<'_, Self>,
        model: &GuildModel,
    ) -> Result<GuildLinks, FrameworkError> {
        let owner = model
            .owner_id
            .get()
            .map(|&id| ctx.actor_of::<User>(CachePath::root(), id));
        let afk_channel = model
            .afk_channel_id
            .flatten()
            .map(|&id| ctx.actor_of::<Channel>(CachePath::of::<Guild>(model.id), id));
        Ok(GuildLinks { owner, afk_channel })
    }

    fn fetch_route(_path: &CachePath, id: Id) -> Result<Route, FrameworkError> {
        Ok(Route::get(format!("/guilds/{id}")))
    }

    fn modify_route(_path: &CachePath, id: Id) -> Result<Route, FrameworkError> {
        Ok(Route::patch(format!("/guilds/{id}")))
    }

    fn delete_route(_path: &CachePath, id: Id) -> Result<Route, FrameworkError> {
        Ok(Route::delete(format!("/guilds/{id}")))
    }
}

/// Navigation from a guild actor to the actors of its children.
///
/// Child actors are created under the guild's scope, so deleting the guild
/// invalidates all of them at once.
pub trait GuildActorExt {
    /// Cache path of everything owned by this guild.
    fn scope(&self) -> CachePath;

    fn role(&self, id: Id) -> Result<Actor<Role>, FrameworkError>;

    fn channel(&self, id: Id) -> Result<Actor<Channel>, FrameworkError>;

    /// The ban of `user_id` in this guild.
    fn ban(&self, user_id: Id) -> Result<Actor<Ban>, FrameworkError>;

    fn scheduled_event(&self, id: Id) -> Result<Actor<ScheduledEvent>, FrameworkError>;

    /// The guild's ban paginator, created on first use.
    fn bans(&self) -> Result<Arc<BanPager>, FrameworkError>;

    /// The AFK channel of the cached guild. `None` if the guild is not cached or
    /// has no AFK channel.
    fn afk_channel(&self) -> Option<Actor<Channel>>;

    fn owner(&self) -> Option<Actor<User>>;
}

impl GuildActorExt for Actor<Guild> {
    fn scope(&self) -> CachePath {
        self.path().with::<Guild>(self.id())
    }

    fn role(&self, id: Id) -> Result<Actor<Role>, FrameworkError> {
        Ok(self.client()?.actor::<Role>(self.scope(), id))
    }

    fn channel(&self, id: Id) -> Result<Actor<Channel>, FrameworkError> {
        Ok(self.client()?.actor::<Channel>(self.scope(), id))
    }

    fn ban(&self, user_id: Id) -> Result<Actor<Ban>, FrameworkError> {
        Ok(self.client()?.actor::<Ban>(self.scope(), user_id))
    }

    fn scheduled_event(&self, id: Id) -> Result<Actor<ScheduledEvent>, FrameworkError> {
        Ok(self.client()?.actor::<ScheduledEvent>(self.scope(), id))
    }

    fn bans(&self) -> Result<Arc<BanPager>, FrameworkError> {
        let client = self.client()?;
        Ok(self.get_or_create_trait::<GuildBans>(|actor| {
            BanPager::new(actor.id(), client.downgrade())
        }))
    }

    fn afk_channel(&self) -> Option<Actor<Channel>> {
        self.try_get_precached_entity()?.derived().afk_channel
    }

    fn owner(&self) -> Option<Actor<User>> {
        self.try_get_precached_entity()?.derived().owner
    }
}
