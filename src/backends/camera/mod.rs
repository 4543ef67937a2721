// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend abstraction
//!
//! ```text
//! ┌─────────────────────┐
//! │   CaptureWidget     │
//! └──────────┬──────────┘
//!            │ acquire(constraints)
//!            ▼
//! ┌─────────────────────┐
//! │ CameraBackend Trait │  ← Enumeration + acquisition
//! └──────────┬──────────┘
//!            │
//!       ┌────┴─────────┐
//!       ▼              ▼
//!   ┌──────┐    ┌─────────────┐
//!   │ V4L2 │    │ TestPattern │
//!   └──────┘    └─────────────┘
//! ```
//!
//! Acquisition returns a [`CameraStream`], which the widget owns exclusively
//! until it stops it.

pub mod format_converters;
pub mod test_pattern;
pub mod types;
#[cfg(target_os = "linux")]
pub mod v4l2;

pub use test_pattern::TestPatternBackend;
pub use types::*;

use crate::errors::CameraError;
use std::sync::Arc;
use tracing::{debug, warn};

/// Camera backend trait
///
/// `acquire` may block (opening a device and negotiating a format); callers
/// run it off their event loop.
pub trait CameraBackend: Send + Sync {
    /// Human-readable backend name for logs
    fn name(&self) -> &str;

    /// Enumerate available cameras on this backend
    fn enumerate_cameras(&self) -> Vec<CameraDevice>;

    /// Supported formats for a camera device
    fn get_formats(&self, device: &CameraDevice) -> Vec<CameraFormat>;

    /// Open a camera matching the constraints and start streaming
    fn acquire(&self, constraints: &MediaConstraints) -> BackendResult<Box<dyn CameraStream>>;
}

/// An open camera
///
/// Frames are published to a watch channel so preview surfaces and the
/// capture tick always see the newest one.
pub trait CameraStream: Send {
    /// Device this stream was opened on
    fn device(&self) -> &CameraDevice;

    /// Format the device is delivering
    fn format(&self) -> &CameraFormat;

    /// Subscribe to frames (preview surfaces)
    fn subscribe(&self) -> FrameReceiver;

    /// Most recent frame, if any arrived yet
    fn latest_frame(&self) -> Option<Arc<CameraFrame>> {
        self.subscribe().borrow().clone()
    }

    /// Stop all tracks and release the device
    fn stop(&mut self);

    /// Whether the stream is still delivering frames
    fn is_live(&self) -> bool;
}

/// Create the backend for a configured type
pub fn get_backend_for_type(
    backend_type: CameraBackendType,
    pattern_image: Option<std::path::PathBuf>,
) -> Arc<dyn CameraBackend> {
    match backend_type {
        #[cfg(target_os = "linux")]
        CameraBackendType::V4l2 => Arc::new(v4l2::V4l2Backend::new()),
        #[cfg(not(target_os = "linux"))]
        CameraBackendType::V4l2 => {
            warn!("V4L2 is only available on Linux, falling back to the test pattern");
            Arc::new(TestPatternBackend::new(pattern_image))
        }
        CameraBackendType::TestPattern => Arc::new(TestPatternBackend::new(pattern_image)),
    }
}

/// Pick the device to open for a request
///
/// An explicit device path wins; otherwise the first camera whose location
/// matches the facing preference; otherwise the first camera.
pub fn select_device<'a>(
    devices: &'a [CameraDevice],
    constraints: &MediaConstraints,
) -> Result<&'a CameraDevice, CameraError> {
    if let Some(path) = &constraints.device {
        return devices.iter().find(|d| &d.path == path).ok_or_else(|| {
            CameraError::DeviceNotFound(format!("{} is not a capture device", path))
        });
    }

    if let Some(device) = devices.iter().find(|d| {
        d.location
            .map(|loc| loc.matches(constraints.facing))
            .unwrap_or(false)
    }) {
        debug!(device = %device.name, facing = ?constraints.facing, "Selected camera by facing mode");
        return Ok(device);
    }

    let device = devices
        .first()
        .ok_or_else(|| CameraError::DeviceNotFound("No cameras found".to_string()))?;
    if constraints.facing == FacingMode::Environment {
        debug!(device = %device.name, "No environment-facing camera, using first device");
    }
    Ok(device)
}

/// Pick the format closest to the ideal resolution
///
/// Distance is the pixel-count difference; among equals, compressed MJPG is
/// preferred over raw formats because it sustains higher frame rates over USB.
pub fn select_format(formats: &[CameraFormat], constraints: &MediaConstraints) -> Option<CameraFormat> {
    let target = (constraints.ideal_width as i64) * (constraints.ideal_height as i64);

    let best = formats.iter().min_by_key(|f| {
        let pixels = (f.width as i64) * (f.height as i64);
        let format_rank = match f.pixel_format.as_str() {
            "MJPG" => 0,
            "YUYV" => 1,
            _ => 2,
        };
        ((pixels - target).abs(), format_rank)
    });

    if best.is_none() {
        warn!("Device reported no usable formats");
    }
    best.cloned()
}
