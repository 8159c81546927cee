//! Integration tests for record storage across backends.

mod helpers;

use httpmock::prelude::*;

use morphic_entity::preferences::DEFAULT_PREFERENCES_ID;
use morphic_entity::{PreferenceKey, PreferenceValue, Preferences, User};
use morphic_storage::{LoadStatus, Storage};

fn mag_factor() -> PreferenceKey {
    PreferenceKey::new("Magnifier", "magFactor")
}

#[tokio::test]
async fn test_preferences_survive_restart() {
    let dir = tempfile::tempdir().unwrap();

    {
        let storage = helpers::local_storage(dir.path()).await;
        let mut prefs = Preferences::for_user("prefs-1", "user-7");
        prefs.set(mag_factor(), 2.5);
        prefs.set(PreferenceKey::new("Magnifier", "inverse_video"), true);
        assert!(storage.save(&prefs).await);
    }

    let storage = helpers::local_storage(dir.path()).await;
    assert!(storage.contains::<Preferences>("prefs-1"));
    assert!(!storage.contains::<User>("prefs-1"));

    let (status, prefs) = storage.load::<Preferences>("prefs-1").await;
    assert_eq!(status, LoadStatus::Success);
    let prefs = prefs.unwrap();
    assert_eq!(prefs.user_id(), Some("user-7"));
    assert_eq!(prefs.get(&mag_factor()), Some(&PreferenceValue::Double(2.5)));
    assert_eq!(prefs.len(), 2);
}

#[tokio::test]
async fn test_default_record_on_empty_directory() {
    let dir = tempfile::tempdir().unwrap();
    let storage = helpers::local_storage(dir.path()).await;

    let (status, prefs) = storage.load::<Preferences>(DEFAULT_PREFERENCES_ID).await;
    assert_eq!(status, LoadStatus::Success);
    assert!(prefs.unwrap().is_empty());

    let (status, prefs) = storage.load::<Preferences>("prefs-1").await;
    assert_eq!(status, LoadStatus::NotFound);
    assert!(prefs.is_none());
}

#[tokio::test]
async fn test_remove_from_local_directory() {
    let dir = tempfile::tempdir().unwrap();
    let storage = helpers::local_storage(dir.path()).await;
    let prefs = Preferences::new("prefs-1");
    assert!(storage.save(&prefs).await);

    let (status, removed) = storage.remove(&prefs).await;
    assert_eq!(status, LoadStatus::Success);
    assert_eq!(removed, Some(prefs.clone()));
    assert!(!storage.contains::<Preferences>("prefs-1"));

    let (status, _) = storage.remove(&prefs).await;
    assert_eq!(status, LoadStatus::NotFound);
}

#[tokio::test]
async fn test_save_pushes_to_remote() {
    let server = MockServer::start_async().await;
    let put = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path("/v1/preferences/prefs-1")
                .header("x-morphic-auth-token", "test-token")
                .body_includes("Magnifier.magFactor");
            then.status(200);
        })
        .await;

    let storage = Storage::in_memory().with_remote(helpers::remote_manager(server.base_url()));
    let mut prefs = Preferences::new("prefs-1");
    prefs.set(mag_factor(), 2.5);

    assert!(storage.save(&prefs).await);
    put.assert_async().await;
}

#[tokio::test]
async fn test_remote_failure_does_not_fail_save() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(PUT).path("/v1/preferences/prefs-1");
            then.status(503);
        })
        .await;

    let storage = Storage::in_memory().with_remote(helpers::remote_manager(server.base_url()));
    assert!(storage.save(&Preferences::new("prefs-1")).await);

    let (status, _) = storage.load::<Preferences>("prefs-1").await;
    assert_eq!(status, LoadStatus::Success);
}

#[tokio::test]
async fn test_load_falls_through_to_remote_and_writes_back() {
    let server = MockServer::start_async().await;
    let get = server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/preferences/prefs-9");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"identifier":"prefs-9","values":{"Magnifier.magFactor":4}}"#);
        })
        .await;

    let storage = Storage::in_memory().with_remote(helpers::remote_manager(server.base_url()));
    assert!(!storage.contains::<Preferences>("prefs-9"));

    let (status, prefs) = storage.load::<Preferences>("prefs-9").await;
    assert_eq!(status, LoadStatus::Success);
    assert_eq!(
        prefs.unwrap().get(&mag_factor()),
        Some(&PreferenceValue::Integer(4))
    );
    assert!(storage.contains::<Preferences>("prefs-9"));

    // Served locally from now on.
    let (status, _) = storage.load::<Preferences>("prefs-9").await;
    assert_eq!(status, LoadStatus::Success);
    get.assert_calls_async(1).await;
}

#[tokio::test]
async fn test_remote_miss_is_not_found() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/preferences/missing");
            then.status(404);
        })
        .await;

    let storage = Storage::in_memory().with_remote(helpers::remote_manager(server.base_url()));
    let (status, prefs) = storage.load::<Preferences>("missing").await;
    assert_eq!(status, LoadStatus::NotFound);
    assert!(prefs.is_none());
}

#[tokio::test]
async fn test_remove_deletes_remote_copy() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(PUT).path("/v1/user/0b7e9a2c-52b6-4f5e-9d3f-1c2a3b4c5d6e");
            then.status(200);
        })
        .await;
    let delete = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/v1/user/0b7e9a2c-52b6-4f5e-9d3f-1c2a3b4c5d6e");
            then.status(204);
        })
        .await;

    let storage = Storage::in_memory().with_remote(helpers::remote_manager(server.base_url()));
    let user = User::with_identifier("0b7e9a2c-52b6-4f5e-9d3f-1c2a3b4c5d6e".parse().unwrap());
    assert!(storage.save(&user).await);

    let (status, removed) = storage.remove(&user).await;
    assert_eq!(status, LoadStatus::Success);
    assert_eq!(removed.unwrap().identifier, user.identifier);
    delete.assert_async().await;
}

#[tokio::test]
async fn test_remote_read_error_is_failure() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/preferences/prefs-1");
            then.status(500);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path(format!("/v1/preferences/{DEFAULT_PREFERENCES_ID}"));
            then.status(500);
        })
        .await;

    let storage = Storage::in_memory().with_remote(helpers::remote_manager(server.base_url()));
    let (status, prefs) = storage.load::<Preferences>("prefs-1").await;
    assert_eq!(status, LoadStatus::Failure);
    assert!(prefs.is_none());

    // An unreachable remote must not be mistaken for a fresh default record.
    let (status, prefs) = storage.load::<Preferences>(DEFAULT_PREFERENCES_ID).await;
    assert_eq!(status, LoadStatus::Failure);
    assert!(prefs.is_none());
}

#[tokio::test]
async fn test_failed_remote_delete_keeps_record() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(PUT).path("/v1/preferences/prefs-1");
            then.status(200);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(DELETE).path("/v1/preferences/prefs-1");
            then.status(503);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v1/preferences/prefs-1");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"identifier":"prefs-1","values":{"Magnifier.magFactor":2.5}}"#);
        })
        .await;

    let storage = Storage::in_memory().with_remote(helpers::remote_manager(server.base_url()));
    let mut prefs = Preferences::new("prefs-1");
    prefs.set(mag_factor(), 2.5);
    assert!(storage.save(&prefs).await);

    let (status, removed) = storage.remove(&prefs).await;
    assert_eq!(status, LoadStatus::Failure);
    assert!(removed.is_none());

    // Both copies survive, so the record is neither lost nor resurrected.
    assert!(storage.contains::<Preferences>("prefs-1"));
    let (status, loaded) = storage.load::<Preferences>("prefs-1").await;
    assert_eq!(status, LoadStatus::Success);
    assert_eq!(loaded, Some(prefs));
}
