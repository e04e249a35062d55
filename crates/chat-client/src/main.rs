//! # Chat Client Demo
//!
//! Replays a short session against a scripted transport:
//!
//! 1. Fetch a guild over REST.
//! 2. Receive Gateway events for it, including one for a role that arrives
//!    before anyone asked for the role.
//! 3. Page through the guild's bans.
//! 4. Shut down.
//!
//! Run with `RUST_LOG=debug` to see every delivery.

use chat_client::clients::ChatClientExt;
use chat_client::guild_actor::GuildActorExt;
use chat_client::lifecycle::ChatSystem;
use entity_framework::mock::MockTransport;
use entity_framework::telemetry::setup_tracing;
use entity_framework::{ClientConfig, GatewayEvent, HttpMethod, Id};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, Instrument};

fn scripted_transport() -> MockTransport {
    let mock = MockTransport::new();
    mock.expect(HttpMethod::Get, "/guilds/10").return_ok(json!({
        "id": "10",
        "name": "rustaceans",
        "owner_id": "1",
        "afk_channel_id": "30",
        "afk_timeout": 300,
    }));
    mock.expect(HttpMethod::Get, "/guilds/10/bans?limit=2").return_ok(json!([
        { "user": { "id": "5", "username": "spammer" }, "reason": "spam" },
        { "user": { "id": "7", "username": "raider" }, "reason": null },
    ]));
    mock.expect(HttpMethod::Get, "/guilds/10/bans?limit=2&after=7")
        .return_ok(json!([]));
    mock
}

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();
    info!("Starting chat client demo");

    let mock = scripted_transport();
    let system = ChatSystem::new(Arc::new(mock.clone()), ClientConfig::from_env());
    let guild = system.client.guild(Id(10));

    let span = tracing::info_span!("initial_fetch", guild_id = %guild.id());
    let entity = async {
        guild
            .fetch(None, None)
            .await
            .map_err(|e| e.to_string())?
            .ok_or_else(|| "guild 10 not found".to_string())
    }
    .instrument(span)
    .await?;
    info!(name = ?entity.read(|model, _| model.name.get().cloned()), "Guild fetched");

    let span = tracing::info_span!("gateway");
    async {
        let events = [
            GatewayEvent::new(
                "GUILD_ROLE_CREATE",
                json!({ "guild_id": "10", "role": { "id": "20", "name": "mods", "color": 16711680 } }),
            )
            .with_sequence(1),
            GatewayEvent::new(
                "GUILD_ROLE_UPDATE",
                json!({ "guild_id": "10", "role": { "id": "20", "color": 255 } }),
            )
            .with_sequence(2),
            GatewayEvent::new("GUILD_UPDATE", json!({ "id": "10", "description": "all things crab" }))
                .with_sequence(3),
        ];
        for event in events {
            let report = system.dispatch.dispatch(event).await.map_err(|e| e.to_string())?;
            info!(event = %report.event, deliveries = ?report.deliveries, "Dispatched");
        }
        Ok::<(), String>(())
    }
    .instrument(span)
    .await?;

    let role = guild.role(Id(20)).map_err(|e| e.to_string())?;
    if let Some(role) = role.try_get_precached_entity() {
        info!(color = ?role.read(|model, _| model.color), "Role materialized from buffered push");
    }
    if let Some(afk) = guild.afk_channel() {
        info!(channel_id = %afk.id(), "AFK channel actor available before any channel fetch");
    }

    let span = tracing::info_span!("bans");
    async {
        let pager = guild.bans().map_err(|e| e.to_string())?;
        while !pager.is_exhausted() {
            let page = pager.next_page(2, None).await.map_err(|e| e.to_string())?;
            info!(count = page.len(), cursor = ?pager.cursor(), "Ban page");
        }
        Ok::<(), String>(())
    }
    .instrument(span)
    .await?;

    info!(stats = %system.client.cache().stats(), "Session complete");
    system.shutdown().await?;
    mock.verify();

    info!("Demo completed successfully");
    Ok(())
}
