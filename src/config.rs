// SPDX-License-Identifier: GPL-3.0-only

//! Widget and start-up configuration
//!
//! [`WidgetConfig`] is what the host pushes at runtime. [`Settings`] is read
//! once at start-up from `settings.json` in the user config directory and then
//! overridden by command-line flags.

use crate::backends::camera::types::{CameraBackendType, FacingMode, MediaConstraints};
use crate::constants::{DEFAULT_FRAME_HEIGHT, DEFAULT_INTERVAL_SECONDS, app_info, camera};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Capture configuration pushed by the host
///
/// Two configs are equal when both fields match; the widget restarts its
/// timers only when an incoming config differs from the last applied one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetConfig {
    /// Whether auto-capture should run
    #[serde(default)]
    pub active: bool,
    /// Seconds between captures (always > 0)
    #[serde(
        default = "default_interval",
        deserialize_with = "deserialize_interval"
    )]
    pub interval_seconds: u32,
}

impl WidgetConfig {
    /// Build a config, substituting the default for a missing or zero interval
    pub fn new(active: bool, interval_seconds: Option<u32>) -> Self {
        Self {
            active,
            interval_seconds: normalize_interval(interval_seconds.map(i64::from)),
        }
    }

    /// Capture period as a Duration
    pub fn interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.interval_seconds))
    }
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            active: false,
            interval_seconds: DEFAULT_INTERVAL_SECONDS,
        }
    }
}

fn default_interval() -> u32 {
    DEFAULT_INTERVAL_SECONDS
}

/// Anything that is not a positive integer falls back to the default interval
fn normalize_interval(raw: Option<i64>) -> u32 {
    match raw {
        Some(secs) if secs > 0 => u32::try_from(secs).unwrap_or(u32::MAX),
        _ => DEFAULT_INTERVAL_SECONDS,
    }
}

fn deserialize_interval<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    // Hosts send integers, floats, or null here
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    let secs = raw.and_then(|value| match value {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        serde_json::Value::Bool(true) => Some(1),
        _ => None,
    });
    Ok(normalize_interval(secs))
}

/// Start-up settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Camera backend to open
    pub backend: CameraBackendType,
    /// Explicit device path (e.g. /dev/video2); first matching device if unset
    pub device: Option<String>,
    /// Ideal capture width
    pub width: u32,
    /// Ideal capture height
    pub height: u32,
    /// Preferred camera direction
    pub facing: FacingMode,
    /// Widget height reported to the host after each config event
    pub frame_height: u32,
    /// Still image served by the test-pattern backend instead of colour bars
    pub pattern_image: Option<PathBuf>,
    /// Config applied at start-up before the host sends anything
    pub initial: Option<WidgetConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend: CameraBackendType::default(),
            device: None,
            width: camera::PREFERRED_WIDTH,
            height: camera::PREFERRED_HEIGHT,
            facing: FacingMode::Environment,
            frame_height: DEFAULT_FRAME_HEIGHT,
            pattern_image: None,
            initial: None,
        }
    }
}

impl Settings {
    /// Default location: `$XDG_CONFIG_HOME/capture-widget/settings.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| {
            dir.join(app_info::CONFIG_DIR_NAME)
                .join(app_info::SETTINGS_FILE_NAME)
        })
    }

    /// Load settings from a file
    ///
    /// A missing file yields the defaults; an unreadable or invalid one is an error.
    pub fn load(path: &Path) -> AppResult<Self> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No settings file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(AppError::Config(format!(
                    "cannot read {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let settings = Self::from_json(&raw)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        info!(path = %path.display(), "Loaded settings");
        Ok(settings)
    }

    /// Parse settings from JSON text
    pub fn from_json(raw: &str) -> AppResult<Self> {
        let settings: Settings = serde_json::from_str(raw)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings that cannot produce a usable camera request
    pub fn validate(&self) -> AppResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(AppError::Config(format!(
                "resolution must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if self.frame_height == 0 {
            return Err(AppError::Config("frame_height must be non-zero".into()));
        }
        Ok(())
    }

    /// Camera request derived from these settings
    pub fn constraints(&self) -> MediaConstraints {
        MediaConstraints {
            ideal_width: self.width,
            ideal_height: self.height,
            facing: self.facing,
            audio: false,
            device: self.device.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_defaults_when_missing() {
        let config: WidgetConfig = serde_json::from_str(r#"{"active": true}"#).unwrap();
        assert!(config.active);
        assert_eq!(config.interval_seconds, DEFAULT_INTERVAL_SECONDS);
    }

    #[test]
    fn test_falsy_intervals_use_default() {
        for raw in [
            r#"{"active": true, "interval_seconds": 0}"#,
            r#"{"active": true, "interval_seconds": null}"#,
            r#"{"active": true, "interval_seconds": -3}"#,
        ] {
            let config: WidgetConfig = serde_json::from_str(raw).unwrap();
            assert_eq!(config.interval_seconds, DEFAULT_INTERVAL_SECONDS, "{}", raw);
        }
    }

    #[test]
    fn test_explicit_interval_kept() {
        let config: WidgetConfig =
            serde_json::from_str(r#"{"active": false, "interval_seconds": 12}"#).unwrap();
        assert_eq!(config, WidgetConfig::new(false, Some(12)));
        assert_eq!(config.interval(), Duration::from_secs(12));
    }

    #[test]
    fn test_settings_partial_json() {
        let settings = Settings::from_json(r#"{"backend": "test-pattern", "width": 640}"#).unwrap();
        assert_eq!(settings.backend, CameraBackendType::TestPattern);
        assert_eq!(settings.width, 640);
        assert_eq!(settings.height, camera::PREFERRED_HEIGHT);
        assert_eq!(settings.frame_height, DEFAULT_FRAME_HEIGHT);
    }

    #[test]
    fn test_settings_reject_zero_resolution() {
        assert!(matches!(
            Settings::from_json(r#"{"height": 0}"#),
            Err(AppError::Config(_))
        ));
    }
}
