// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Seconds between captures when the host sends no (or a falsy) interval
pub const DEFAULT_INTERVAL_SECONDS: u32 = 5;

/// Rendered widget height reported to the host, in pixels
pub const DEFAULT_FRAME_HEIGHT: u32 = 400;

/// Capture timing
pub mod timing {
    use super::Duration;

    /// Period of the countdown display timer
    pub const COUNTDOWN_PERIOD: Duration = Duration::from_secs(1);

    /// How long the capture flash highlight stays visible
    pub const FLASH_DURATION: Duration = Duration::from_millis(300);

    /// Log every Nth frame from a capture thread at debug level
    pub const FRAME_LOG_INTERVAL: u64 = 30;
}

/// Camera request defaults
pub mod camera {
    /// Ideal capture width requested from the camera
    pub const PREFERRED_WIDTH: u32 = 1280;

    /// Ideal capture height requested from the camera
    pub const PREFERRED_HEIGHT: u32 = 720;

    /// Number of memory-mapped buffers for V4L2 streaming
    pub const V4L2_BUFFER_COUNT: u32 = 4;

    /// Prefix of V4L2 device nodes under /dev
    pub const V4L2_DEVICE_PREFIX: &str = "video";
}

/// Still image encoding
pub mod encoding {
    /// JPEG quality for captured frames (0.85 on a 0-1 scale)
    pub const JPEG_QUALITY: u8 = 85;

    /// MIME type placed in the data URL
    pub const JPEG_MIME: &str = "image/jpeg";
}

/// Host-side frame filtering defaults
pub mod inbox {
    use super::Duration;

    /// Frames at least this similar to the last accepted frame are skipped
    pub const DUPLICATE_THRESHOLD: f64 = 0.95;

    /// Maximum accepted frames per rate-limit window
    pub const RATE_LIMIT_MAX_FRAMES: usize = 10;

    /// Sliding window length for the rate limiter
    pub const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);

    /// Side length of the average-hash thumbnail (8x8 = 64 bits)
    pub const HASH_SIZE: u32 = 8;
}

/// Status and display text
pub mod text {
    /// Shown after the camera opens successfully
    pub const STATUS_READY: &str = "Ready";

    /// Shown while the capture loop is running
    pub const STATUS_CAPTURING: &str = "Auto-capturing";

    /// Shown after the capture loop stops
    pub const STATUS_PAUSED: &str = "Paused";

    /// Shown before the camera opens
    pub const STATUS_WAITING: &str = "Waiting for camera";

    /// Shown while camera access is being requested
    pub const LOADING: &str = "Opening camera...";

    /// Shown when the countdown reaches zero
    pub const CAPTURING_NOW: &str = "Capturing now...";

    /// Countdown text for the given number of remaining seconds
    pub fn next_capture_in(seconds: u32) -> String {
        format!("Next capture in {}s", seconds)
    }

    /// Error text for a failed camera acquisition
    pub fn camera_unavailable(message: &str) -> String {
        format!("Unable to access camera: {}", message)
    }
}

/// Application metadata
pub mod app_info {
    /// Application version with git commit hash (set by build.rs)
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }

    /// Directory name under the user config dir
    pub const CONFIG_DIR_NAME: &str = "capture-widget";

    /// Settings file name inside the config dir
    pub const SETTINGS_FILE_NAME: &str = "settings.json";
}
