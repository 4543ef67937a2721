// SPDX-License-Identifier: MPL-2.0

//! Integration tests for constants module

use capture_widget::constants::{encoding, inbox, text, timing};
use std::time::Duration;

#[test]
fn test_countdown_text() {
    assert_eq!(text::next_capture_in(5), "Next capture in 5s");
    assert_eq!(text::CAPTURING_NOW, "Capturing now...");
}

#[test]
fn test_camera_unavailable_text() {
    assert_eq!(
        text::camera_unavailable("Permission denied: blocked"),
        "Unable to access camera: Permission denied: blocked"
    );
}

#[test]
fn test_timing_values() {
    // Countdown must tick on whole seconds to line up with the capture timer
    assert_eq!(timing::COUNTDOWN_PERIOD, Duration::from_secs(1));
    assert!(timing::FLASH_DURATION < timing::COUNTDOWN_PERIOD);
}

#[test]
fn test_encoding_values() {
    assert_eq!(encoding::JPEG_QUALITY, 85);
    assert_eq!(encoding::JPEG_MIME, "image/jpeg");
}

#[test]
fn test_inbox_threshold_in_range() {
    assert!(inbox::DUPLICATE_THRESHOLD > 0.0 && inbox::DUPLICATE_THRESHOLD <= 1.0);
    assert!(inbox::RATE_LIMIT_MAX_FRAMES > 0);
}
