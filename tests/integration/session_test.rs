//! Integration tests for capture, apply, and the session lifecycle.

mod helpers;

use std::time::Duration;

use morphic_entity::preferences::DEFAULT_PREFERENCES_ID;
use morphic_entity::{PreferenceKey, PreferenceValue, Preferences, User};
use morphic_service::settings::keys;
use morphic_service::{ApplyOutcome, CaptureOutcome, InMemorySettingsManager, SessionContext};
use morphic_storage::LoadStatus;

#[tokio::test]
async fn test_capture_records_only_changed_values() {
    let app = helpers::TestApp::new();
    app.settings.set_current(&keys::audio_volume(), 0.8);
    app.settings.set_current(&keys::display_contrast_enabled(), true);

    let all_keys: Vec<PreferenceKey> = keys::well_known().into_iter().map(|(k, _)| k).collect();
    let report = app
        .context()
        .capture(Preferences::new("prefs-1"), all_keys.clone())
        .run()
        .await;

    assert_eq!(report.outcomes.len(), all_keys.len());
    assert_eq!(report.captured_count(), 2);
    assert_eq!(
        report.preferences.get(&keys::audio_volume()),
        Some(&PreferenceValue::Double(0.8))
    );
    assert_eq!(
        report.outcome(&keys::zoom_enabled()),
        Some(CaptureOutcome::EqualsDefault)
    );
    assert!(!report.preferences.contains_key(&keys::zoom_enabled()));
}

#[tokio::test]
async fn test_capture_all_values_when_requested() {
    let app = helpers::TestApp::new();
    let all_keys: Vec<PreferenceKey> = keys::well_known().into_iter().map(|(k, _)| k).collect();

    let report = app
        .context()
        .capture(Preferences::new("prefs-1"), all_keys.clone())
        .capture_default_values(true)
        .run()
        .await;

    assert_eq!(report.captured_count(), all_keys.len());
    assert_eq!(report.preferences.len(), all_keys.len());
}

#[tokio::test]
async fn test_capture_skips_unsupported_keys() {
    let app = helpers::TestApp::new();
    let unknown = PreferenceKey::new("org.example.unknown", "enabled");

    let report = app
        .context()
        .capture(
            Preferences::new("prefs-1"),
            [unknown.clone(), keys::audio_volume()],
        )
        .capture_default_values(true)
        .run()
        .await;

    assert_eq!(report.outcome(&unknown), Some(CaptureOutcome::Unresolved));
    assert!(!report.preferences.contains_key(&unknown));
    assert!(report.preferences.contains_key(&keys::audio_volume()));
}

#[tokio::test]
async fn test_apply_order_with_add_first() {
    let app = helpers::TestApp::new();
    let mut apply = app.context().apply([
        (keys::zoom_enabled(), PreferenceValue::Bool(true)),
        (keys::audio_volume(), PreferenceValue::Double(0.3)),
    ]);
    apply.add_first(keys::zoom_style(), 1);

    let report = apply.run().await;
    assert_eq!(
        report.order(),
        vec![keys::zoom_style(), keys::zoom_enabled(), keys::audio_volume()]
    );
    let writes: Vec<PreferenceKey> = app
        .settings
        .writes()
        .await
        .into_iter()
        .map(|(k, _)| k)
        .collect();
    assert_eq!(writes, report.order());
}

#[tokio::test]
async fn test_apply_continues_past_failures() {
    let app = helpers::TestApp::new();
    app.settings.reject(keys::voiceover_enabled());
    let unknown = PreferenceKey::new("org.example.unknown", "enabled");

    let report = app
        .context()
        .apply([
            (keys::voiceover_enabled(), PreferenceValue::Bool(true)),
            (unknown.clone(), PreferenceValue::Bool(true)),
            (keys::night_shift_enabled(), PreferenceValue::Bool(true)),
        ])
        .run()
        .await;

    assert_eq!(report.outcomes.len(), 3);
    assert_eq!(
        report.outcome(&keys::voiceover_enabled()),
        Some(ApplyOutcome::Failed)
    );
    assert_eq!(report.outcome(&unknown), Some(ApplyOutcome::Unsupported));
    assert_eq!(
        report.outcome(&keys::night_shift_enabled()),
        Some(ApplyOutcome::Applied)
    );
    assert_eq!(report.applied_count(), 1);
    assert!(report.completed_at.is_some());
}

#[tokio::test]
async fn test_slow_settings_time_out() {
    let settings = InMemorySettingsManager::with_well_known().with_latency(Duration::from_millis(200));
    let mut ctx = SessionContext::in_memory(settings);
    ctx.config.call_timeout_ms = 20;

    let report = ctx
        .apply([(keys::zoom_enabled(), PreferenceValue::Bool(true))])
        .run()
        .await;
    assert_eq!(
        report.outcome(&keys::zoom_enabled()),
        Some(ApplyOutcome::TimedOut)
    );
}

#[tokio::test]
async fn test_capture_then_apply_restores_settings() {
    let app = helpers::TestApp::opened().await;
    app.settings.set_current(&keys::audio_volume(), 0.2);
    app.settings.set_current(&keys::display_zoom_percentage(), 1.5);

    app.session
        .capture(keys::well_known().into_iter().map(|(k, _)| k))
        .await
        .unwrap();

    app.settings.set_current(&keys::audio_volume(), 0.9);
    app.settings.set_current(&keys::display_zoom_percentage(), 1.0);

    let report = app.session.apply_preferences().await;
    assert!(report.all_applied());
    assert_eq!(
        app.settings.current(&keys::audio_volume()),
        Some(PreferenceValue::Double(0.2))
    );
    assert_eq!(
        app.settings.current(&keys::display_zoom_percentage()),
        Some(PreferenceValue::Double(1.5))
    );
}

#[tokio::test]
async fn test_sign_in_and_out() {
    let app = helpers::TestApp::opened().await;
    app.session.apply(true, keys::display_contrast_enabled()).await;

    let user = User::new();
    app.session.sign_in(user.clone()).await.unwrap();
    let prefs = app.session.preferences().await.unwrap();
    assert_eq!(prefs.user_id(), Some(user.identifier.to_string().as_str()));
    assert!(prefs.is_empty());

    app.session.apply(0.4, keys::audio_volume()).await;
    app.session.sign_out().await.unwrap();

    assert!(app.session.user().await.is_none());
    let defaults = app.session.preferences().await.unwrap();
    assert_eq!(defaults.identifier(), DEFAULT_PREFERENCES_ID);
    assert_eq!(
        defaults.get(&keys::display_contrast_enabled()),
        Some(&PreferenceValue::Bool(true))
    );
    assert!(!defaults.contains_key(&keys::audio_volume()));

    let storage = &app.context().storage;
    let (status, stored) = storage
        .load::<Preferences>(&user.preferences_identifier().unwrap())
        .await;
    assert_eq!(status, LoadStatus::Success);
    assert_eq!(
        stored.unwrap().get(&keys::audio_volume()),
        Some(&PreferenceValue::Double(0.4))
    );
}

#[tokio::test]
async fn test_reopen_known_user() {
    let app = helpers::TestApp::opened().await;
    let user = User::new();
    app.session.sign_in(user.clone()).await.unwrap();
    app.session.apply(true, keys::night_shift_enabled()).await;

    let reopened = helpers::TestApp::with_storage(app.context().storage.clone());
    reopened.session.open(Some(user.identifier)).await.unwrap();

    assert_eq!(
        reopened.session.user().await.map(|u| u.identifier),
        Some(user.identifier)
    );
    assert_eq!(
        reopened
            .session
            .preferences()
            .await
            .unwrap()
            .get(&keys::night_shift_enabled()),
        Some(&PreferenceValue::Bool(true))
    );
}
