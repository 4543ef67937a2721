// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the capture widget
//!
//! Two failure kinds reach the host: [`CameraError`] (the camera could not be
//! opened) and [`CaptureError`] (a frame could not be drawn or encoded). Both
//! are turned into an error payload where they happen; [`AppError`] is only
//! returned from start-up paths such as settings loading or a missing host.

use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Camera acquisition errors
    Camera(CameraError),
    /// Frame capture errors
    Capture(CaptureError),
    /// Host channel errors
    Host(HostError),
    /// Configuration errors
    Config(String),
    /// Generic error with message
    Other(String),
}

/// Camera acquisition failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    /// Access to the device was refused
    PermissionDenied(String),
    /// No usable camera device exists
    DeviceNotFound(String),
    /// The device cannot deliver anything close to the requested format
    ConstraintsUnsatisfiable(String),
    /// The device is opened exclusively by someone else
    Busy,
    /// Other backend failure
    Backend(String),
}

/// Frame capture failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// No camera stream is open
    NoStream,
    /// The stream has not produced a frame yet
    NoFrameAvailable,
    /// Frame has a zero width or height
    InvalidDimensions { width: u32, height: u32 },
    /// Frame buffer is shorter than its declared geometry
    MalformedFrame { expected: usize, actual: usize },
    /// JPEG encoding failed
    EncodingFailed(String),
}

/// Host channel failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// The host side of the channel is gone or was never attached
    Unavailable(String),
    /// Writing to or reading from the host failed
    Io(String),
    /// The host sent something we could not understand
    Protocol(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Camera(e) => write!(f, "Camera error: {}", e),
            AppError::Capture(e) => write!(f, "Capture error: {}", e),
            AppError::Host(e) => write!(f, "Host error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),
            CameraError::DeviceNotFound(msg) => write!(f, "Device not found: {}", msg),
            CameraError::ConstraintsUnsatisfiable(msg) => {
                write!(f, "Requested format not supported: {}", msg)
            }
            CameraError::Busy => write!(f, "Camera is busy"),
            CameraError::Backend(msg) => write!(f, "Backend error: {}", msg),
        }
    }
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::NoStream => write!(f, "No camera stream is open"),
            CaptureError::NoFrameAvailable => write!(f, "No frame available for capture"),
            CaptureError::InvalidDimensions { width, height } => {
                write!(f, "Invalid frame dimensions: {}x{}", width, height)
            }
            CaptureError::MalformedFrame { expected, actual } => write!(
                f,
                "Malformed frame: expected at least {} bytes, got {}",
                expected, actual
            ),
            CaptureError::EncodingFailed(msg) => write!(f, "Encoding failed: {}", msg),
        }
    }
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostError::Unavailable(msg) => write!(f, "Host unavailable: {}", msg),
            HostError::Io(msg) => write!(f, "Host I/O error: {}", msg),
            HostError::Protocol(msg) => write!(f, "Host protocol error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for CameraError {}
impl std::error::Error for CaptureError {}
impl std::error::Error for HostError {}

// Conversions from sub-errors to AppError
impl From<CameraError> for AppError {
    fn from(err: CameraError) -> Self {
        AppError::Camera(err)
    }
}

impl From<CaptureError> for AppError {
    fn from(err: CaptureError) -> Self {
        AppError::Capture(err)
    }
}

impl From<HostError> for AppError {
    fn from(err: HostError) -> Self {
        AppError::Host(err)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<std::io::Error> for CameraError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => CameraError::PermissionDenied(err.to_string()),
            std::io::ErrorKind::NotFound => CameraError::DeviceNotFound(err.to_string()),
            _ if err.raw_os_error() == Some(EBUSY) => CameraError::Busy,
            _ => CameraError::Backend(err.to_string()),
        }
    }
}

impl From<std::io::Error> for HostError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::BrokenPipe => HostError::Unavailable(err.to_string()),
            _ => HostError::Io(err.to_string()),
        }
    }
}

/// errno for "device or resource busy"
const EBUSY: i32 = 16;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_permission_maps_to_permission_denied() {
        let err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "no access");
        assert!(matches!(
            CameraError::from(err),
            CameraError::PermissionDenied(_)
        ));
    }

    #[test]
    fn test_busy_device() {
        let err = std::io::Error::from_raw_os_error(EBUSY);
        assert_eq!(CameraError::from(err), CameraError::Busy);
    }

    #[test]
    fn test_broken_pipe_means_host_gone() {
        let err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed");
        assert!(matches!(HostError::from(err), HostError::Unavailable(_)));
    }

    #[test]
    fn test_display_includes_context() {
        let err: AppError = CaptureError::InvalidDimensions {
            width: 0,
            height: 720,
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Capture error: Invalid frame dimensions: 0x720"
        );
    }
}
