//! Viewer configuration and the fixed tokens of the URL hash format.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Delimiter tokens of the layer-config and extent strings.
///
/// They are multi-character on purpose: every character survives a
/// percent-encoding round trip unchanged.
pub mod symbols {
    /// Separates layers in the config string.
    pub const SEMICOLON: &str = "_-_";
    /// Separates a layer id from its values.
    pub const COLON: &str = "___";
    /// Separates values (and extent components).
    pub const COMMA: &str = "_";
}

/// Names of the hash fields the viewer reads and writes.
pub mod fields {
    /// URL of the source document.
    pub const SOURCE: &str = "source";
    /// Encoded per-layer config string.
    pub const CONFIG: &str = "config";
    /// Encoded view extent.
    pub const EXTENT: &str = "extent";
}

/// Lowest opacity a layer may have.
pub const MIN_OPACITY: f64 = 0.1;
/// Highest opacity a layer may have.
pub const MAX_OPACITY: f64 = 1.0;
/// Projection used when the source document does not declare one.
pub const DEFAULT_PROJECTION: &str = "EPSG:4326";

/// Runtime configuration for a viewer session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Projection used when the source document omits one.
    #[serde(default = "ViewerConfig::default_projection")]
    pub default_projection: String,
    /// Delay before a settled view extent is written to the hash.
    #[serde(default = "ViewerConfig::default_extent_update_delay_ms")]
    pub extent_update_delay_ms: u64,
    /// Step of the opacity slider in percent.
    #[serde(default = "ViewerConfig::default_opacity_step_percent")]
    pub opacity_step_percent: u8,
    /// Viewport width in pixels (headless backend).
    #[serde(default = "ViewerConfig::default_viewport_width")]
    pub viewport_width: f64,
    /// Viewport height in pixels (headless backend).
    #[serde(default = "ViewerConfig::default_viewport_height")]
    pub viewport_height: f64,
}

impl ViewerConfig {
    fn default_projection() -> String {
        DEFAULT_PROJECTION.to_string()
    }

    const fn default_extent_update_delay_ms() -> u64 {
        200
    }

    const fn default_opacity_step_percent() -> u8 {
        5
    }

    const fn default_viewport_width() -> f64 {
        800.0
    }

    const fn default_viewport_height() -> f64 {
        600.0
    }

    /// Debounce window for extent write-back.
    #[must_use]
    pub const fn extent_update_delay(&self) -> Duration {
        Duration::from_millis(self.extent_update_delay_ms)
    }

    /// Load a configuration from JSON; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            default_projection: Self::default_projection(),
            extent_update_delay_ms: Self::default_extent_update_delay_ms(),
            opacity_step_percent: Self::default_opacity_step_percent(),
            viewport_width: Self::default_viewport_width(),
            viewport_height: Self::default_viewport_height(),
        }
    }
}

/// Clamp an opacity into `[MIN_OPACITY, MAX_OPACITY]`.
///
/// NaN maps to `MAX_OPACITY`.
#[must_use]
pub fn clamp_opacity(opacity: f64) -> f64 {
    if opacity.is_nan() {
        return MAX_OPACITY;
    }
    opacity.clamp(MIN_OPACITY, MAX_OPACITY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_viewer_conventions() {
        let config = ViewerConfig::default();
        assert_eq!(config.default_projection, "EPSG:4326");
        assert_eq!(config.extent_update_delay(), Duration::from_millis(200));
        assert_eq!(config.opacity_step_percent, 5);
    }

    #[test]
    fn from_json_fills_missing_fields() {
        let config = ViewerConfig::from_json(r#"{"extent_update_delay_ms": 50}"#)
            .expect("config should parse");
        assert_eq!(config.extent_update_delay_ms, 50);
        assert_eq!(config.default_projection, DEFAULT_PROJECTION);
        assert!((config.viewport_width - 800.0).abs() < f64::EPSILON);
    }

    #[test]
    fn from_json_rejects_garbage() {
        assert!(ViewerConfig::from_json("{ nope").is_err());
    }

    #[test]
    fn clamp_opacity_bounds() {
        assert!((clamp_opacity(2.0) - 1.0).abs() < f64::EPSILON);
        assert!((clamp_opacity(-1.0) - 0.1).abs() < f64::EPSILON);
        assert!((clamp_opacity(0.55) - 0.55).abs() < f64::EPSILON);
        assert!((clamp_opacity(f64::NAN) - 1.0).abs() < f64::EPSILON);
    }
}
