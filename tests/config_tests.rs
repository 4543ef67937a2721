// SPDX-License-Identifier: MPL-2.0

//! Integration tests for configuration module

use capture_widget::backends::camera::types::{CameraBackendType, FacingMode};
use capture_widget::config::{Settings, WidgetConfig};
use capture_widget::constants::{DEFAULT_FRAME_HEIGHT, DEFAULT_INTERVAL_SECONDS};
use capture_widget::errors::AppError;
use std::path::PathBuf;

/// Unique scratch file under the system temp dir
fn scratch_file(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "capture-widget-{}-{}.json",
        std::process::id(),
        name
    ))
}

#[test]
fn test_widget_config_default() {
    // Inactive with the default interval until the host says otherwise
    let config = WidgetConfig::default();
    assert!(!config.active);
    assert_eq!(config.interval_seconds, DEFAULT_INTERVAL_SECONDS);
}

#[test]
fn test_widget_config_equality_drives_restarts() {
    // Equal configs are what the widget uses to skip restarts
    assert_eq!(WidgetConfig::new(true, Some(5)), WidgetConfig::new(true, None));
    assert_ne!(WidgetConfig::new(true, Some(5)), WidgetConfig::new(true, Some(6)));
    assert_ne!(WidgetConfig::new(true, Some(5)), WidgetConfig::new(false, Some(5)));
}

#[test]
fn test_zero_interval_falls_back() {
    assert_eq!(
        WidgetConfig::new(true, Some(0)).interval_seconds,
        DEFAULT_INTERVAL_SECONDS
    );
}

#[test]
fn test_widget_config_from_host_json() {
    // Float intervals from JavaScript hosts are truncated
    let config: WidgetConfig =
        serde_json::from_str(r#"{"active": true, "interval_seconds": 2.7}"#).unwrap();
    assert_eq!(config, WidgetConfig::new(true, Some(2)));

    let config: WidgetConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(config, WidgetConfig::default());
}

#[test]
fn test_settings_default() {
    let settings = Settings::default();
    assert_eq!(settings.backend, CameraBackendType::V4l2);
    assert_eq!(settings.facing, FacingMode::Environment);
    assert_eq!(settings.frame_height, DEFAULT_FRAME_HEIGHT);
    assert!(settings.initial.is_none());
    assert!(settings.validate().is_ok());
}

#[test]
fn test_settings_constraints() {
    let settings = Settings {
        device: Some("/dev/video2".to_string()),
        facing: FacingMode::User,
        ..Settings::default()
    };
    let constraints = settings.constraints();
    assert_eq!(constraints.ideal_width, 1280);
    assert_eq!(constraints.ideal_height, 720);
    assert_eq!(constraints.facing, FacingMode::User);
    assert_eq!(constraints.device.as_deref(), Some("/dev/video2"));
    assert!(!constraints.audio);
}

#[test]
fn test_missing_settings_file_uses_defaults() {
    let path = scratch_file("missing");
    let _ = std::fs::remove_file(&path);

    let settings = Settings::load(&path).unwrap();
    assert_eq!(settings, Settings::default());
}

#[test]
fn test_settings_file_loaded() {
    let path = scratch_file("loaded");
    std::fs::write(
        &path,
        r#"{
            "backend": "test-pattern",
            "facing": "user",
            "frame_height": 480,
            "initial": {"active": true, "interval_seconds": 10}
        }"#,
    )
    .unwrap();

    let settings = Settings::load(&path);
    let _ = std::fs::remove_file(&path);
    let settings = settings.unwrap();

    assert_eq!(settings.backend, CameraBackendType::TestPattern);
    assert_eq!(settings.facing, FacingMode::User);
    assert_eq!(settings.frame_height, 480);
    assert_eq!(settings.initial, Some(WidgetConfig::new(true, Some(10))));
}

#[test]
fn test_invalid_settings_file_is_an_error() {
    let path = scratch_file("invalid");
    std::fs::write(&path, "{ not json").unwrap();

    let result = Settings::load(&path);
    let _ = std::fs::remove_file(&path);
    assert!(matches!(result, Err(AppError::Config(_))));
}

#[test]
fn test_zero_frame_height_rejected() {
    let settings = Settings {
        frame_height: 0,
        ..Settings::default()
    };
    assert!(matches!(settings.validate(), Err(AppError::Config(_))));
}
