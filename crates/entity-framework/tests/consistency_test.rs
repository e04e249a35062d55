use entity_framework::fixtures::{fixture_client, folder_path, note, Note, NoteModel};
use entity_framework::{
    DeliveryOutcome, Field, FrameworkError, HttpMethod, Id, Identity, Stamped,
};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Notify;

async fn wait_for_requests(mock: &entity_framework::mock::MockTransport, count: usize) {
    while mock.requests().len() < count {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn test_push_during_first_fetch_wins() {
    let (client, mock) = fixture_client();
    let gate = Arc::new(Notify::new());
    mock.expect(HttpMethod::Get, "/folders/1/notes/7")
        .after(gate.clone())
        .return_ok(json!({ "id": "7", "title": "fetched", "pinned": false }));

    let actor = client.actor::<Note>(folder_path(1), Id(7));
    let fetch = {
        let actor = actor.clone();
        tokio::spawn(async move { actor.fetch(None, None).await })
    };
    wait_for_requests(&mock, 1).await;

    let push = NoteModel {
        title: Field::Specified("pushed".into()),
        ..NoteModel::empty(Id(7))
    };
    assert_eq!(actor.deliver_model(push).unwrap(), DeliveryOutcome::Buffered);
    gate.notify_one();

    let entity = fetch.await.unwrap().unwrap().unwrap();
    let model = entity.current_model();
    assert_eq!(model.title, Field::Specified("pushed".to_string()));
    assert_eq!(model.pinned, Field::Specified(false));
    mock.verify();
}

#[tokio::test]
async fn test_late_fetch_does_not_overwrite_newer_push() {
    let (client, mock) = fixture_client();
    let gate = Arc::new(Notify::new());
    mock.expect(HttpMethod::Get, "/folders/1/notes/7")
        .after(gate.clone())
        .return_ok(json!({ "id": "7", "title": "stale" }));

    let actor = client.actor::<Note>(folder_path(1), Id(7));
    let entity = actor.create_entity(note(7, "initial")).unwrap();

    let fetch = {
        let actor = actor.clone();
        tokio::spawn(async move { actor.fetch(None, None).await })
    };
    wait_for_requests(&mock, 1).await;

    assert_eq!(
        actor.deliver_model(note(7, "fresh")).unwrap(),
        DeliveryOutcome::Applied
    );
    gate.notify_one();

    let fetched = fetch.await.unwrap().unwrap().unwrap();
    assert!(Arc::ptr_eq(&fetched, &entity));
    assert_eq!(entity.current_model().title, Field::Specified("fresh".to_string()));
}

#[tokio::test]
async fn test_out_of_order_materialization_needs_no_fetch() {
    let (client, mock) = fixture_client();

    let stamp = client.next_stamp();
    let pushed = client.actor::<Note>(folder_path(10), Id(20));
    pushed
        .deliver_stamped(Stamped::new(stamp, note(20, "buffered")))
        .unwrap();
    drop(pushed);

    // Later, somebody navigates to the same note.
    let actor = client.actor::<Note>(folder_path(10), Id(20));
    let entity = actor.try_get_precached_entity().unwrap();

    assert_eq!(entity.current_model().title, Field::Specified("buffered".to_string()));
    assert_eq!(entity.derived().folder.id(), Id(10));
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn test_rapid_successive_updates() {
    let (client, _mock) = fixture_client();
    let actor = client.actor::<Note>(folder_path(1), Id(7));
    let entity = actor.create_entity(note(7, "a")).unwrap();

    for title in ["red", "blue"] {
        let delta = NoteModel {
            title: Field::Specified(title.into()),
            ..NoteModel::empty(Id(7))
        };
        actor.deliver_model(delta).unwrap();
    }

    assert_eq!(entity.current_model().title, Field::Specified("blue".to_string()));
}

#[tokio::test]
async fn test_actor_usable_before_materialization() {
    let (client, mock) = fixture_client();
    mock.expect(HttpMethod::Get, "/folders/1/notes/7")
        .return_ok(json!({ "id": "7", "title": "remote" }));

    let actor = client.actor::<Note>(folder_path(1), Id(7));
    assert!(actor.try_get_precached_entity().is_none());

    let entity = actor.fetch(None, None).await.unwrap().unwrap();
    assert_eq!(entity.current_model().title, Field::Specified("remote".to_string()));
}

#[tokio::test]
async fn test_identity_resolve_after_collection() {
    let (client, _mock) = fixture_client();
    let entity = client
        .create_latent::<Note>(note(7, "a"), &folder_path(1))
        .unwrap();
    let identity = Identity::of_entity(&entity);
    drop(entity);

    assert!(identity.resolve().is_none());
    assert!(client.lookup::<Note>(Id(7)).is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_fetch_and_push_share_one_entity() {
    let (client, mock) = fixture_client();
    for _ in 0..4 {
        mock.expect(HttpMethod::Get, "/folders/1/notes/7")
            .return_ok(json!({ "id": "7", "title": "fetched" }));
    }

    let actor = client.actor::<Note>(folder_path(1), Id(7));
    let mut handles = Vec::new();
    for _ in 0..4 {
        let actor = actor.clone();
        handles.push(tokio::spawn(async move { actor.fetch(None, None).await }));
    }

    let mut entities = Vec::new();
    for handle in handles {
        entities.push(handle.await.unwrap().unwrap().unwrap());
    }
    assert!(entities.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
    mock.verify();
}

#[tokio::test]
async fn test_modify_unsupported_for_kind_without_route() {
    let (client, _mock) = fixture_client();
    let folder = client.actor::<entity_framework::fixtures::Folder>(
        entity_framework::CachePath::root(),
        Id(1),
    );

    let err = folder
        .modify(&json!({ "name": "x" }), None, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        FrameworkError::Unsupported { kind: "folder", operation: "modify" }
    ));
}
