use crate::timer::duration_from_ms;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_SELECTOR: &str = "#loading";
pub const DEFAULT_FADE_DURATION_MS: f64 = 320.0;
pub const DEFAULT_FAILSAFE_MS: f64 = 3000.0;

/// Style variable the host transition reads its duration from.
pub const FADE_DURATION_PROPERTY: &str = "--fade-duration";
/// Class that starts the fade-out in the host styling layer.
pub const FADING_CLASS: &str = "is-fading";
/// Attribute that removes the overlay from view once the fade is over.
pub const HIDDEN_ATTRIBUTE: &str = "hidden";

/// Shortest fallback delay, roughly one frame.
const MIN_FALLBACK_MS: f64 = 16.0;
/// Slack added to the fade duration before the fallback forces the hidden state.
const FALLBACK_SLACK_MS: f64 = 80.0;

/// Overlay options. Every field is optional: at construction missing or invalid values fall back
/// to the defaults, and in `set_options` missing values leave the current setting untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct OverlayOptions {
    /// Selector of the overlay element (default "#loading")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    /// Duration of the fade-out in milliseconds (default 320)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fade_duration_ms: Option<f64>,
    /// Hide automatically after this many milliseconds, 0 or less disables it (default 3000)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failsafe_ms: Option<f64>,
    /// Log every state change of the overlay
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,
}

impl OverlayOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// All fields filled in with their defaults.
    pub fn defaults() -> Self {
        Self {
            selector: Some(DEFAULT_SELECTOR.to_string()),
            fade_duration_ms: Some(DEFAULT_FADE_DURATION_MS),
            failsafe_ms: Some(DEFAULT_FAILSAFE_MS),
            debug: Some(false),
        }
    }

    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    pub fn with_fade_duration_ms(mut self, fade_duration_ms: f64) -> Self {
        self.fade_duration_ms = Some(fade_duration_ms);
        self
    }

    pub fn with_failsafe_ms(mut self, failsafe_ms: f64) -> Self {
        self.failsafe_ms = Some(failsafe_ms);
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = Some(debug);
        self
    }
}

/// Effective settings of a live controller.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlaySettings {
    pub selector: String,
    pub fade_duration_ms: f64,
    pub failsafe_ms: f64,
    pub debug: bool,
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            selector: DEFAULT_SELECTOR.to_string(),
            fade_duration_ms: DEFAULT_FADE_DURATION_MS,
            failsafe_ms: DEFAULT_FAILSAFE_MS,
            debug: false,
        }
    }
}

impl OverlaySettings {
    pub fn from_options(options: &OverlayOptions) -> Self {
        let defaults = Self::default();
        Self {
            selector: options.selector.clone().unwrap_or(defaults.selector),
            fade_duration_ms: options
                .fade_duration_ms
                .filter(|ms| ms.is_finite() && *ms >= 0.0)
                .unwrap_or(defaults.fade_duration_ms),
            failsafe_ms: options
                .failsafe_ms
                .filter(|ms| ms.is_finite())
                .unwrap_or(defaults.failsafe_ms),
            debug: options.debug.unwrap_or(defaults.debug),
        }
    }

    /// Value written to [`FADE_DURATION_PROPERTY`], e.g. `"320ms"`.
    pub fn fade_duration_value(&self) -> String {
        format!("{}ms", self.fade_duration_ms)
    }

    /// How long a fade may run before the hidden state is forced.
    pub fn fallback_delay(&self) -> Duration {
        let ms = (self.fade_duration_ms + FALLBACK_SLACK_MS).max(MIN_FALLBACK_MS);
        duration_from_ms(ms)
    }

    /// `None` when the failsafe is disabled.
    pub fn failsafe_delay(&self) -> Option<Duration> {
        if self.failsafe_ms > 0.0 {
            Some(duration_from_ms(self.failsafe_ms))
        } else {
            None
        }
    }
}

/// Accepts a runtime fade duration update only if it is a finite, non-negative number.
pub(crate) fn valid_update(value: Option<f64>) -> Option<f64> {
    value.filter(|ms| ms.is_finite() && *ms >= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_missing() {
        let settings = OverlaySettings::from_options(&OverlayOptions::new());
        assert_eq!(settings, OverlaySettings::default());
        assert_eq!(settings.selector, "#loading");
        assert_eq!(settings.fade_duration_value(), "320ms");
        assert_eq!(settings.failsafe_delay(), Some(Duration::from_millis(3000)));
    }

    #[test]
    fn test_invalid_numbers_fall_back() {
        let options = OverlayOptions::new()
            .with_fade_duration_ms(f64::NAN)
            .with_failsafe_ms(f64::INFINITY);
        let settings = OverlaySettings::from_options(&options);
        assert_eq!(settings.fade_duration_ms, DEFAULT_FADE_DURATION_MS);
        assert_eq!(settings.failsafe_ms, DEFAULT_FAILSAFE_MS);

        let negative = OverlaySettings::from_options(&OverlayOptions::new().with_fade_duration_ms(-1.0));
        assert_eq!(negative.fade_duration_ms, DEFAULT_FADE_DURATION_MS);
    }

    #[test]
    fn test_non_positive_failsafe_disables() {
        for ms in [0.0, -250.0] {
            let settings = OverlaySettings::from_options(&OverlayOptions::new().with_failsafe_ms(ms));
            assert_eq!(settings.failsafe_delay(), None);
        }
    }

    #[test]
    fn test_fallback_delay() {
        let mut settings = OverlaySettings::default();
        settings.fade_duration_ms = 100.0;
        assert_eq!(settings.fallback_delay(), Duration::from_millis(180));

        settings.fade_duration_ms = 0.0;
        assert_eq!(settings.fallback_delay(), Duration::from_millis(80));

        // Settings fields are public, so the floor applies to hand-built values too.
        settings.fade_duration_ms = -75.0;
        assert_eq!(settings.fallback_delay(), Duration::from_millis(16));
    }

    #[test]
    fn test_valid_update() {
        assert_eq!(valid_update(Some(0.0)), Some(0.0));
        assert_eq!(valid_update(Some(-1.0)), None);
        assert_eq!(valid_update(Some(f64::NAN)), None);
        assert_eq!(valid_update(None), None);
    }

    #[test]
    fn test_options_from_yaml() {
        let options: OverlayOptions =
            serde_yaml::from_str("fade_duration_ms: 360\nfailsafe_ms: 2500\n").unwrap();
        assert_eq!(options.fade_duration_ms, Some(360.0));
        assert_eq!(options.failsafe_ms, Some(2500.0));
        assert_eq!(options.selector, None);
        assert_eq!(options.debug, None);
    }
}
