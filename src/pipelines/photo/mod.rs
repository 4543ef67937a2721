// SPDX-License-Identifier: MPL-2.0

//! Still capture pipeline
//!
//! ```text
//! CameraStream → grab latest frame → draw to RGB → JPEG q=85 → data URL
//! ```
//!
//! The whole pipeline runs to completion inside one capture tick, so two
//! captures never overlap.

pub mod capture;
pub mod encoding;

pub use capture::PhotoCapture;
pub use encoding::{EncodedImage, PhotoEncoder};

use crate::backends::camera::CameraStream;
use crate::backends::camera::types::CameraFrame;
use crate::errors::CaptureError;
use tracing::info;

/// Grab, draw and encode in one call
#[derive(Debug, Clone, Copy, Default)]
pub struct PhotoPipeline {
    encoder: PhotoEncoder,
}

impl PhotoPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the newest frame of `stream`
    pub fn capture(&self, stream: Option<&dyn CameraStream>) -> Result<EncodedImage, CaptureError> {
        let frame = PhotoCapture::capture_from_stream(stream)?;
        self.encode_frame(&frame)
    }

    /// Draw and encode an already grabbed frame
    pub fn encode_frame(&self, frame: &CameraFrame) -> Result<EncodedImage, CaptureError> {
        let image = PhotoCapture::draw(frame)?;
        let encoded = self.encoder.encode(&image)?;
        info!(
            width = encoded.width,
            height = encoded.height,
            size = encoded.jpeg_size,
            "Frame captured"
        );
        Ok(encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::test_pattern::colour_bars;

    #[test]
    fn test_encode_colour_bars() {
        let frame = colour_bars(64, 36);
        let encoded = PhotoPipeline::new().encode_frame(&frame).unwrap();
        assert_eq!((encoded.width, encoded.height), (64, 36));
        assert!(encoded.jpeg_size > 0);
    }

    #[test]
    fn test_capture_without_stream() {
        assert_eq!(
            PhotoPipeline::new().capture(None),
            Err(CaptureError::NoStream)
        );
    }
}
