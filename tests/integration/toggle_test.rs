//! Integration tests for the magnifier toggle and bar control dispatch.

mod helpers;

use morphic_core::config::BarConfig;
use morphic_entity::{BarFeature, BarItem, PreferenceValue, Preferences};
use morphic_service::bar::load_items;
use morphic_service::settings::keys;
use morphic_service::toggle::MAGNIFIER_SNAPSHOT_ID;
use morphic_service::{ControlDispatcher, DispatchResult, FeatureToggle};
use morphic_storage::LoadStatus;

#[tokio::test]
async fn test_magnifier_round_trip_restores_companions() {
    let app = helpers::TestApp::new();
    app.settings.set_current(&keys::zoom_style(), 2);
    let toggle = FeatureToggle::magnifier();

    let report = toggle.enable(app.context()).await;
    assert!(report.all_applied());
    assert_eq!(
        app.settings.current(&keys::zoom_enabled()),
        Some(PreferenceValue::Bool(true))
    );
    assert_eq!(
        app.settings.current(&keys::zoom_style()),
        Some(PreferenceValue::Integer(1))
    );

    let report = toggle.disable(app.context()).await;
    assert_eq!(
        report.order(),
        vec![keys::zoom_enabled(), keys::zoom_style()]
    );
    assert_eq!(
        app.settings.current(&keys::zoom_enabled()),
        Some(PreferenceValue::Bool(false))
    );
    assert_eq!(
        app.settings.current(&keys::zoom_style()),
        Some(PreferenceValue::Integer(2))
    );
}

#[tokio::test]
async fn test_magnifier_disable_without_snapshot() {
    let app = helpers::TestApp::new();
    app.settings.set_current(&keys::zoom_enabled(), true);

    let (status, _) = app
        .context()
        .storage
        .load::<Preferences>(MAGNIFIER_SNAPSHOT_ID)
        .await;
    assert_eq!(status, LoadStatus::NotFound);

    let report = FeatureToggle::magnifier().disable(app.context()).await;
    assert_eq!(report.order(), vec![keys::zoom_enabled()]);
    assert_eq!(
        app.settings.current(&keys::zoom_enabled()),
        Some(PreferenceValue::Bool(false))
    );
}

#[tokio::test]
async fn test_dispatch_volume_segments() {
    let app = helpers::TestApp::opened().await;
    let dispatcher = ControlDispatcher::new(app.session.clone());

    dispatcher.perform(BarFeature::Volume, 0).await.unwrap();
    assert_eq!(
        app.settings.current(&keys::audio_volume()),
        Some(PreferenceValue::Double(0.6))
    );

    dispatcher.perform(BarFeature::Volume, 2).await.unwrap();
    assert_eq!(
        app.settings.current(&keys::audio_muted()),
        Some(PreferenceValue::Bool(true))
    );

    // Any press while muted unmutes without changing the level.
    dispatcher.perform(BarFeature::Volume, 1).await.unwrap();
    assert_eq!(
        app.settings.current(&keys::audio_muted()),
        Some(PreferenceValue::Bool(false))
    );
    assert_eq!(
        app.settings.current(&keys::audio_volume()),
        Some(PreferenceValue::Double(0.6))
    );
}

#[tokio::test]
async fn test_dispatch_resolution_stops_at_limit() {
    let app = helpers::TestApp::opened().await;
    let dispatcher = ControlDispatcher::new(app.session.clone());
    app.settings
        .set_current(&keys::display_zoom_percentage(), 1.75);

    let result = dispatcher.perform(BarFeature::Resolution, 0).await.unwrap();
    assert!(matches!(result, DispatchResult::Applied(_)));
    assert_eq!(
        app.settings.current(&keys::display_zoom_percentage()),
        Some(PreferenceValue::Double(2.0))
    );

    let result = dispatcher.perform(BarFeature::Resolution, 0).await.unwrap();
    assert!(matches!(result, DispatchResult::Ignored));
}

#[tokio::test]
async fn test_dispatch_read_selected_enables_then_requests_hotkey() {
    let app = helpers::TestApp::opened().await;
    let dispatcher = ControlDispatcher::new(app.session.clone());

    match dispatcher.perform(BarFeature::ReadSelected, 0).await.unwrap() {
        DispatchResult::HotKeyRequired(report) => assert_eq!(report.applied_count(), 1),
        other => panic!("unexpected result: {other:?}"),
    }
    match dispatcher.perform(BarFeature::ReadSelected, 0).await.unwrap() {
        DispatchResult::HotKeyRequired(report) => assert!(report.outcomes.is_empty()),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_dispatch_rejects_out_of_range_segment() {
    let app = helpers::TestApp::opened().await;
    let dispatcher = ControlDispatcher::new(app.session.clone());

    assert!(dispatcher.perform(BarFeature::Contrast, 5).await.is_err());
    assert!(matches!(
        dispatcher.perform(BarFeature::Unknown, 0).await.unwrap(),
        DispatchResult::Ignored
    ));
}

#[tokio::test]
async fn test_shipped_bar_layout_is_dispatchable() {
    let config = BarConfig {
        items_path: Some("config/bar.json".to_string()),
        skip_unknown: true,
    };
    let items = load_items(&config).await.unwrap();
    assert!(matches!(items.first(), Some(BarItem::Link(_))));

    let app = helpers::TestApp::opened().await;
    let dispatcher = ControlDispatcher::new(app.session.clone());
    for item in &items {
        if let BarItem::Control(control) = item {
            assert_ne!(control.feature, BarFeature::Unknown);
            dispatcher.perform(control.feature, 0).await.unwrap();
        }
    }

    assert_eq!(
        app.settings.current(&keys::zoom_enabled()),
        Some(PreferenceValue::Bool(true))
    );
    let prefs = app.session.preferences().await.unwrap();
    assert_eq!(
        prefs.get(&keys::display_contrast_enabled()),
        Some(&PreferenceValue::Bool(true))
    );
    assert_eq!(
        prefs.get(&keys::voiceover_enabled()),
        Some(&PreferenceValue::Bool(true))
    );
}
