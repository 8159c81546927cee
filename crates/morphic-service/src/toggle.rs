//! Feature toggles that remember the settings they change.
//!
//! Enabling captures the current values of the settings the feature is
//! about to change into a snapshot record, saves it, then applies the
//! feature's values followed by the enable flag. Disabling replays the
//! snapshot with the disable flag first.

use tracing::{debug, warn};

use morphic_entity::{PreferenceKey, PreferenceValue, Preferences};
use morphic_storage::LoadStatus;

use crate::apply::ApplyReport;
use crate::context::SessionContext;
use crate::settings::keys;

/// Snapshot record identifier used by the magnifier.
pub const MAGNIFIER_SNAPSHOT_ID: &str = "__magnifier__";

/// An on/off feature backed by one flag and a set of companion settings.
#[derive(Debug, Clone)]
pub struct FeatureToggle {
    snapshot_id: String,
    flag: PreferenceKey,
    on: PreferenceValue,
    off: PreferenceValue,
    companions: Vec<(PreferenceKey, PreferenceValue)>,
}

impl FeatureToggle {
    /// A toggle for `flag` that stores its snapshot under `snapshot_id`.
    pub fn new(snapshot_id: impl Into<String>, flag: PreferenceKey) -> Self {
        Self {
            snapshot_id: snapshot_id.into(),
            flag,
            on: PreferenceValue::Bool(true),
            off: PreferenceValue::Bool(false),
            companions: Vec::new(),
        }
    }

    /// Also set `key` to `value` while the feature is on.
    pub fn with_companion(mut self, key: PreferenceKey, value: impl Into<PreferenceValue>) -> Self {
        self.companions.push((key, value.into()));
        self
    }

    /// The screen magnifier in picture-in-picture style.
    pub fn magnifier() -> Self {
        Self::new(MAGNIFIER_SNAPSHOT_ID, keys::zoom_enabled()).with_companion(keys::zoom_style(), 1)
    }

    /// Identifier of the snapshot record.
    pub fn snapshot_id(&self) -> &str {
        &self.snapshot_id
    }

    /// The flag key.
    pub fn flag(&self) -> &PreferenceKey {
        &self.flag
    }

    /// Snapshot the companion settings, then turn the feature on.
    pub async fn enable(&self, ctx: &SessionContext) -> ApplyReport {
        let capture = ctx
            .capture(
                Preferences::new(self.snapshot_id.clone()),
                self.companions.iter().map(|(k, _)| k.clone()),
            )
            .capture_default_values(true)
            .run()
            .await;

        if !ctx.storage.save(&capture.preferences).await {
            warn!(snapshot = %self.snapshot_id, "Failed to save feature snapshot");
        }

        let mut apply = ctx.apply(self.companions.iter().cloned());
        apply.add(self.flag.clone(), self.on.clone());
        apply.run().await
    }

    /// Turn the feature off and restore the snapshot taken by [`enable`](Self::enable).
    pub async fn disable(&self, ctx: &SessionContext) -> ApplyReport {
        match ctx.storage.load::<Preferences>(&self.snapshot_id).await {
            (LoadStatus::Success, Some(snapshot)) => {
                let mut apply = ctx.apply_preferences(&snapshot);
                apply.add_first(self.flag.clone(), self.off.clone());
                apply.run().await
            }
            (status, _) => {
                debug!(snapshot = %self.snapshot_id, status = %status, "No feature snapshot, turning off only");
                ctx.apply([(self.flag.clone(), self.off.clone())]).run().await
            }
        }
    }
}
