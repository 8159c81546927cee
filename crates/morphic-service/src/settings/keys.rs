//! Well-known setting keys and their defaults.

use morphic_entity::{PreferenceKey, PreferenceValue};

/// Solution owning the screen magnifier settings.
pub const ZOOM_SOLUTION: &str = "com.apple.macos.zoom";
/// Solution owning display settings.
pub const DISPLAY_SOLUTION: &str = "com.apple.macos.display";
/// Solution owning the screen reader.
pub const VOICEOVER_SOLUTION: &str = "com.apple.macos.voiceover";
/// Solution owning speech settings.
pub const SPEECH_SOLUTION: &str = "com.apple.macos.speech";
/// Solution owning audio output settings.
pub const AUDIO_SOLUTION: &str = "com.apple.macos.audio";

/// Display zoom factors the resolution control steps through.
pub const ZOOM_PERCENTAGES: [f64; 6] = [0.75, 1.0, 1.25, 1.5, 1.75, 2.0];

/// Volume change per press of the volume control.
pub const VOLUME_STEP: f64 = 0.1;

/// Screen magnifier on/off.
pub fn zoom_enabled() -> PreferenceKey {
    PreferenceKey::new(ZOOM_SOLUTION, "enabled")
}

/// Screen magnifier style: 0 full screen, 1 picture-in-picture.
pub fn zoom_style() -> PreferenceKey {
    PreferenceKey::new(ZOOM_SOLUTION, "style")
}

/// Increased contrast on/off.
pub fn display_contrast_enabled() -> PreferenceKey {
    PreferenceKey::new(DISPLAY_SOLUTION, "contrast_enabled")
}

/// Night shift on/off.
pub fn night_shift_enabled() -> PreferenceKey {
    PreferenceKey::new(DISPLAY_SOLUTION, "night_shift_enabled")
}

/// Display zoom factor, `1.0` being the native resolution.
pub fn display_zoom_percentage() -> PreferenceKey {
    PreferenceKey::new(DISPLAY_SOLUTION, "zoom_percentage")
}

/// Screen reader on/off.
pub fn voiceover_enabled() -> PreferenceKey {
    PreferenceKey::new(VOICEOVER_SOLUTION, "enabled")
}

/// Speak-selected-text hotkey on/off.
pub fn speak_selected_text_enabled() -> PreferenceKey {
    PreferenceKey::new(SPEECH_SOLUTION, "speak_selected_text_enabled")
}

/// Output volume in `0.0..=1.0`.
pub fn audio_volume() -> PreferenceKey {
    PreferenceKey::new(AUDIO_SOLUTION, "volume")
}

/// Output muted.
pub fn audio_muted() -> PreferenceKey {
    PreferenceKey::new(AUDIO_SOLUTION, "muted")
}

/// Every well-known key with its declared default.
pub fn well_known() -> Vec<(PreferenceKey, PreferenceValue)> {
    vec![
        (zoom_enabled(), false.into()),
        (zoom_style(), 0.into()),
        (display_contrast_enabled(), false.into()),
        (night_shift_enabled(), false.into()),
        (display_zoom_percentage(), 1.0.into()),
        (voiceover_enabled(), false.into()),
        (speak_selected_text_enabled(), false.into()),
        (audio_volume(), 0.5.into()),
        (audio_muted(), false.into()),
    ]
}

/// Next zoom factor above (`zoom_in`) or below `current`, if any.
pub fn step_zoom(current: f64, zoom_in: bool) -> Option<f64> {
    if zoom_in {
        ZOOM_PERCENTAGES.iter().copied().find(|p| *p > current + f64::EPSILON)
    } else {
        ZOOM_PERCENTAGES
            .iter()
            .rev()
            .copied()
            .find(|p| *p < current - f64::EPSILON)
    }
}
