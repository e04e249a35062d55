use chat_client::clients::ChatClientExt;
use chat_client::guild_actor::{Guild, GuildActorExt};
use chat_client::lifecycle::ChatSystem;
use chat_client::role_actor::Role;
use entity_framework::mock::MockTransport;
use entity_framework::{
    CacheKey, ClientConfig, DeliveryOutcome, DetailLevel, Field, GatewayEvent, HttpMethod, Id,
    Identity,
};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Notify;

fn system() -> (ChatSystem, MockTransport) {
    let mock = MockTransport::new();
    let system = ChatSystem::new(Arc::new(mock.clone()), ClientConfig::default());
    (system, mock)
}

fn role_update(color: u32) -> GatewayEvent {
    GatewayEvent::new(
        "GUILD_ROLE_UPDATE",
        json!({ "guild_id": "10", "role": { "id": "20", "name": "mods", "color": color } }),
    )
}

/// A role pushed before its guild was ever fetched is usable once the guild is.
#[tokio::test]
async fn test_role_push_before_guild_fetch() {
    let (system, mock) = system();
    mock.expect(HttpMethod::Get, "/guilds/10")
        .return_ok(json!({ "id": "10", "name": "rustaceans" }));

    let report = system.dispatch.dispatch(role_update(0xff0000)).await.unwrap();
    assert_eq!(
        report.outcome_for(&CacheKey::of::<Role>(Id(20))),
        Some(DeliveryOutcome::Buffered)
    );

    let guild = system.client.guild(Id(10)).fetch(None, None).await.unwrap().unwrap();
    let role = system
        .client
        .guild(guild.id())
        .role(Id(20))
        .unwrap()
        .try_get_precached_entity()
        .unwrap();

    assert_eq!(role.read(|model, _| model.color), Field::Specified(0xff0000));
    assert!(role.derived().guild.same_binding(&system.client.guild(Id(10))));
    system.shutdown().await.unwrap();
}

/// Two pushes back to back: the entity ends with the second one.
#[tokio::test]
async fn test_successive_role_updates_keep_last() {
    let (system, _mock) = system();
    let role = system.client.guild(Id(10)).role(Id(20)).unwrap();
    let entity = role
        .create_entity(serde_json::from_value(json!({ "id": "20", "color": 0 })).unwrap())
        .unwrap();

    system.dispatch.submit(role_update(0xff0000)).await.unwrap();
    system.dispatch.dispatch(role_update(0x0000ff)).await.unwrap();

    assert_eq!(entity.read(|model, _| model.color), Field::Specified(0x0000ff));
    system.shutdown().await.unwrap();
}

/// A fetch issued before a push must not overwrite it when the response lands late.
#[tokio::test]
async fn test_late_fetch_loses_to_push() {
    let (system, mock) = system();
    let gate = Arc::new(Notify::new());
    mock.expect(HttpMethod::Get, "/guilds/10/roles/20")
        .after(gate.clone())
        .return_ok(json!({ "id": "20", "name": "mods", "color": 1 }));

    let role = system.client.guild(Id(10)).role(Id(20)).unwrap();
    let fetch = {
        let role = role.clone();
        tokio::spawn(async move { role.fetch(None, None).await })
    };
    // Let the fetch issue its request before the push is received.
    while mock.requests().is_empty() {
        tokio::task::yield_now().await;
    }
    system.dispatch.dispatch(role_update(2)).await.unwrap();
    gate.notify_one();

    let entity = fetch.await.unwrap().unwrap().unwrap();
    assert_eq!(entity.read(|model, _| model.color), Field::Specified(2));
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_guild_delete_clears_children_and_pager_survives() {
    let (system, _mock) = system();
    system
        .dispatch
        .dispatch(GatewayEvent::new(
            "GUILD_CREATE",
            json!({
                "id": "10",
                "name": "rustaceans",
                "roles": [{ "id": "20", "name": "mods" }, { "id": "21", "name": "crabs" }],
            }),
        ))
        .await
        .unwrap();

    let guild = system.client.guild(Id(10));
    let _entity = guild.try_get_precached_entity().unwrap();
    let _pager = guild.bans().unwrap();

    let report = system
        .dispatch
        .dispatch(GatewayEvent::new("GUILD_DELETE", json!({ "id": "10" })))
        .await
        .unwrap();

    assert_eq!(report.evicted, vec![CacheKey::of::<Guild>(Id(10))]);
    assert!(system.client.lookup::<Guild>(Id(10)).is_none());
    for role_id in [20, 21] {
        let role = guild.role(Id(role_id)).unwrap();
        assert!(!role.has_pending());
        assert!(role.try_get_precached_entity().is_none());
    }
    // Traits are released explicitly, never by eviction.
    assert_eq!(guild.trait_names(), vec!["guild_bans"]);
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_identity_resolves_through_actor() {
    let (system, _mock) = system();
    let guild = system.client.guild(Id(10));
    let identity = Identity::of_actor(guild.clone());
    assert_eq!(identity.detail(), DetailLevel::Actor);
    assert!(identity.resolve().is_none());

    system
        .dispatch
        .dispatch(GatewayEvent::new("GUILD_UPDATE", json!({ "id": "10", "name": "rustaceans" })))
        .await
        .unwrap();

    // Resolving never drains the buffered push; the actor does.
    assert!(identity.resolve().is_none());
    let entity = guild.try_get_precached_entity().unwrap();
    let resolved = identity.resolve().unwrap();
    assert!(Arc::ptr_eq(&resolved, &entity));
    assert_eq!(resolved.id(), Id(10));
    assert_eq!(Identity::<Guild>::of_id(Id(10)), identity);
    system.shutdown().await.unwrap();
}

/// Guild 10 / role 20 pushed before anything referenced guild 10: navigating
/// there later yields the buffered role without any request.
#[tokio::test]
async fn test_out_of_order_role_materializes_without_fetch() {
    let (system, mock) = system();
    system.dispatch.dispatch(role_update(0xff0000)).await.unwrap();

    let role = system
        .client
        .guild(Id(10))
        .role(Id(20))
        .unwrap()
        .try_get_precached_entity()
        .unwrap();

    assert_eq!(role.read(|model, _| model.color), Field::Specified(0xff0000));
    assert!(mock.requests().is_empty());
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_red_then_blue_before_materialization() {
    let (system, _mock) = system();
    system.dispatch.submit(role_update(0xff0000)).await.unwrap();
    system.dispatch.dispatch(role_update(0x0000ff)).await.unwrap();

    let role = system.client.guild(Id(10)).role(Id(20)).unwrap();
    let entity = role.try_get_precached_entity().unwrap();
    assert_eq!(entity.current_model().color, Field::Specified(0x0000ff));
    assert!(!role.has_pending());
    system.shutdown().await.unwrap();
}
