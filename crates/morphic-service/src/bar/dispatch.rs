//! Turns presses on bar control segments into settings operations.

use tokio::time::timeout;
use tracing::{debug, warn};

use morphic_core::error::AppError;
use morphic_core::result::AppResult;
use morphic_entity::{BarFeature, PreferenceKey, PreferenceValue};

use crate::apply::ApplyReport;
use crate::session::Session;
use crate::settings::keys;
use crate::toggle::FeatureToggle;

/// What a segment press did.
#[derive(Debug, Clone)]
pub enum DispatchResult {
    /// Settings were written; see the report for per-key outcomes.
    Applied(ApplyReport),
    /// Speak-selected-text is enabled and the caller must send its hotkey.
    /// The report covers enabling it, and is empty when it already was.
    HotKeyRequired(ApplyReport),
    /// Nothing to do for this press.
    Ignored,
}

/// Maps `(feature, segment)` presses onto the session.
#[derive(Debug, Clone)]
pub struct ControlDispatcher {
    session: Session,
    magnifier: FeatureToggle,
}

impl ControlDispatcher {
    /// Dispatch presses against `session`.
    pub fn new(session: Session) -> Self {
        Self {
            session,
            magnifier: FeatureToggle::magnifier(),
        }
    }

    /// Perform the action bound to `segment` of a `feature` control.
    ///
    /// On/off controls use segment 0 for on and 1 for off. Volume uses
    /// 0 up, 1 down, 2 mute. Resolution uses 0 zoom in, 1 zoom out.
    pub async fn perform(&self, feature: BarFeature, segment: usize) -> AppResult<DispatchResult> {
        if feature == BarFeature::Unknown {
            return Ok(DispatchResult::Ignored);
        }
        if segment >= feature.segment_count() {
            return Err(AppError::validation(format!(
                "Control '{feature}' has no segment {segment}"
            )));
        }
        debug!(feature = %feature, segment, "Dispatching control press");

        let on = segment == 0;
        let result = match feature {
            BarFeature::Contrast => {
                DispatchResult::Applied(self.session.apply(on, keys::display_contrast_enabled()).await)
            }
            BarFeature::Reader => {
                DispatchResult::Applied(self.session.apply(on, keys::voiceover_enabled()).await)
            }
            BarFeature::NightShift => {
                DispatchResult::Applied(self.set(keys::night_shift_enabled(), on.into()).await)
            }
            BarFeature::Magnifier => {
                let ctx = self.session.context();
                let report = if on {
                    self.magnifier.enable(ctx).await
                } else {
                    self.magnifier.disable(ctx).await
                };
                DispatchResult::Applied(report)
            }
            BarFeature::Volume => self.volume(segment).await,
            BarFeature::Resolution => self.resolution(on).await,
            BarFeature::ReadSelected => self.read_selected().await,
            BarFeature::Unknown => DispatchResult::Ignored,
        };
        Ok(result)
    }

    async fn volume(&self, segment: usize) -> DispatchResult {
        if segment == 2 {
            return DispatchResult::Applied(self.set(keys::audio_muted(), true.into()).await);
        }

        let muted = self
            .read(&keys::audio_muted())
            .await
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        if muted {
            return DispatchResult::Applied(self.set(keys::audio_muted(), false.into()).await);
        }

        let Some(volume) = self.read(&keys::audio_volume()).await.and_then(|v| v.as_f64()) else {
            warn!("Volume is not readable");
            return DispatchResult::Ignored;
        };
        let delta = if segment == 0 {
            keys::VOLUME_STEP
        } else {
            -keys::VOLUME_STEP
        };
        let target = ((volume + delta).clamp(0.0, 1.0) * 100.0).round() / 100.0;
        DispatchResult::Applied(self.set(keys::audio_volume(), target.into()).await)
    }

    async fn resolution(&self, zoom_in: bool) -> DispatchResult {
        let current = self
            .read(&keys::display_zoom_percentage())
            .await
            .and_then(|v| v.as_f64())
            .unwrap_or(1.0);
        match keys::step_zoom(current, zoom_in) {
            Some(target) => {
                DispatchResult::Applied(self.set(keys::display_zoom_percentage(), target.into()).await)
            }
            None => {
                debug!(current, zoom_in, "Display zoom already at its limit");
                DispatchResult::Ignored
            }
        }
    }

    async fn read_selected(&self) -> DispatchResult {
        let key = keys::speak_selected_text_enabled();
        let enabled = self
            .read(&key)
            .await
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        if enabled {
            return DispatchResult::HotKeyRequired(ApplyReport::default());
        }

        let report = self.set(key, true.into()).await;
        if report.all_applied() {
            DispatchResult::HotKeyRequired(report)
        } else {
            warn!("Could not enable speak-selected-text");
            DispatchResult::Applied(report)
        }
    }

    async fn set(&self, key: PreferenceKey, value: PreferenceValue) -> ApplyReport {
        self.session.context().apply([(key, value)]).run().await
    }

    async fn read(&self, key: &PreferenceKey) -> Option<PreferenceValue> {
        let ctx = self.session.context();
        match timeout(ctx.config.call_timeout(), ctx.settings.read_value(key)).await {
            Ok(Ok(value)) => value,
            Ok(Err(e)) => {
                warn!(key = %key, error = %e, "Failed to read setting");
                None
            }
            Err(_) => {
                warn!(key = %key, "Reading setting timed out");
                None
            }
        }
    }
}
