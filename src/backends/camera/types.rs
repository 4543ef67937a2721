// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use crate::errors::CameraError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;

/// Camera backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CameraBackendType {
    /// Direct V4L2 capture (Linux)
    #[default]
    V4l2,
    /// Synthetic colour bars or a still image
    TestPattern,
}

impl std::fmt::Display for CameraBackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraBackendType::V4l2 => write!(f, "V4L2"),
            CameraBackendType::TestPattern => write!(f, "test pattern"),
        }
    }
}

/// Which way the requested camera should point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Facing the user (selfie / webcam)
    User,
    /// Facing away from the user (rear camera)
    #[default]
    Environment,
}

/// Physical mounting of a camera, when the platform reports it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraLocation {
    Front,
    Back,
    External,
}

impl CameraLocation {
    /// Whether a camera at this location satisfies the facing preference
    pub fn matches(&self, facing: FacingMode) -> bool {
        matches!(
            (self, facing),
            (CameraLocation::Front, FacingMode::User) | (CameraLocation::Back, FacingMode::Environment)
        )
    }

    /// Guess the location from a device name such as "Rear Camera"
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_lowercase();
        if lower.contains("rear") || lower.contains("back") || lower.contains("world") {
            Some(CameraLocation::Back)
        } else if lower.contains("front") || lower.contains("user") || lower.contains("selfie") {
            Some(CameraLocation::Front)
        } else {
            None
        }
    }
}

/// What the widget asks the platform for when opening a camera
///
/// Width and height are ideals: backends pick the closest supported format
/// and only fail when nothing usable exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaConstraints {
    pub ideal_width: u32,
    pub ideal_height: u32,
    pub facing: FacingMode,
    /// Audio is never captured; kept so requests read like the platform API
    pub audio: bool,
    /// Explicit device path, overriding facing-mode selection
    pub device: Option<String>,
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            ideal_width: crate::constants::camera::PREFERRED_WIDTH,
            ideal_height: crate::constants::camera::PREFERRED_HEIGHT,
            facing: FacingMode::Environment,
            audio: false,
            device: None,
        }
    }
}

/// Represents a camera device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    pub name: String,
    pub path: String,              // e.g. /dev/video0, or "test-pattern"
    pub driver: Option<String>,    // V4L2 driver name
    pub location: Option<CameraLocation>,
}

/// Camera format specification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraFormat {
    pub width: u32,
    pub height: u32,
    pub framerate: Option<u32>,
    pub pixel_format: String, // FourCC code (e.g., "MJPG", "YUYV")
}

impl std::fmt::Display for CameraFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(fps) = &self.framerate {
            write!(
                f,
                "{}x{} @ {}fps ({})",
                self.width, self.height, fps, self.pixel_format
            )
        } else {
            write!(f, "{}x{} ({})", self.width, self.height, self.pixel_format)
        }
    }
}

/// Pixel layout of frame data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// RGBA - 32-bit with alpha (4 bytes per pixel)
    RGBA,
    /// RGB24 - 24-bit RGB (3 bytes per pixel, no alpha)
    RGB24,
    /// YUYV - Packed 4:2:2 (Y0 U Y1 V interleaved)
    /// Common raw format from webcam sensors
    YUYV,
    /// UYVY - Packed 4:2:2 (U Y0 V Y1 interleaved)
    UYVY,
    /// Gray8 - 8-bit grayscale (single channel)
    Gray8,
}

impl PixelFormat {
    /// Minimum bytes per row for a frame of the given width
    pub fn min_stride(&self, width: u32) -> u32 {
        match self {
            Self::RGBA => width * 4,
            Self::RGB24 => width * 3,
            // Packed 4:2:2 stores pixel pairs in 4 bytes
            Self::YUYV | Self::UYVY => width.div_ceil(2) * 4,
            Self::Gray8 => width,
        }
    }

    /// Map a V4L2 FourCC to a raw pixel format
    pub fn from_fourcc(fourcc: &str) -> Option<Self> {
        match fourcc {
            "YUYV" | "YUY2" => Some(Self::YUYV),
            "UYVY" => Some(Self::UYVY),
            "GREY" | "Y8  " => Some(Self::Gray8),
            "RGB3" => Some(Self::RGB24),
            "AB24" => Some(Self::RGBA),
            _ => None,
        }
    }
}

/// A single frame from the camera
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// Frame data in `format` layout
    pub data: Arc<[u8]>,
    /// Pixel format of the data
    pub format: PixelFormat,
    /// Row stride (bytes per row, may include padding)
    pub stride: u32,
    /// Monotonic frame counter from the capture source
    pub sequence: u64,
}

impl CameraFrame {
    /// Build a tightly packed frame (stride equals the minimum row size)
    pub fn packed(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data: Arc::from(data),
            format,
            stride: format.min_stride(width),
            sequence: 0,
        }
    }

    /// Bytes needed to hold every row at the declared stride
    pub fn expected_len(&self) -> usize {
        (self.stride as usize) * (self.height as usize)
    }
}

/// Latest-frame sender used by capture threads
pub type FrameSender = watch::Sender<Option<Arc<CameraFrame>>>;

/// Latest-frame receiver for preview surfaces and capture ticks
pub type FrameReceiver = watch::Receiver<Option<Arc<CameraFrame>>>;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, CameraError>;
