// SPDX-License-Identifier: MPL-2.0

//! Frame grabbing and drawing
//!
//! Pulls the newest frame off an open stream and draws it into an RGB raster
//! at the frame's native resolution. Every way a frame can be unusable is
//! reported as a [`CaptureError`] instead of panicking.

use crate::backends::camera::CameraStream;
use crate::backends::camera::format_converters::frame_to_rgb;
use crate::backends::camera::types::CameraFrame;
use crate::errors::CaptureError;
use image::RgbImage;
use std::sync::Arc;
use tracing::debug;

/// Photo capture handler
pub struct PhotoCapture;

impl PhotoCapture {
    /// Take the most recent frame from a stream
    pub fn capture_from_stream(
        stream: Option<&dyn CameraStream>,
    ) -> Result<Arc<CameraFrame>, CaptureError> {
        let stream = stream.ok_or(CaptureError::NoStream)?;
        let frame = stream
            .latest_frame()
            .ok_or(CaptureError::NoFrameAvailable)?;

        debug!(
            width = frame.width,
            height = frame.height,
            format = ?frame.format,
            sequence = frame.sequence,
            "Frame grabbed from stream"
        );
        Ok(frame)
    }

    /// Draw a frame into an RGB raster sized to the frame
    pub fn draw(frame: &CameraFrame) -> Result<RgbImage, CaptureError> {
        if frame.width == 0 || frame.height == 0 {
            return Err(CaptureError::InvalidDimensions {
                width: frame.width,
                height: frame.height,
            });
        }

        let min_stride = frame.format.min_stride(frame.width);
        if frame.stride < min_stride {
            return Err(CaptureError::MalformedFrame {
                expected: min_stride as usize * frame.height as usize,
                actual: frame.stride as usize * frame.height as usize,
            });
        }

        // Last row only needs its pixels, not the trailing padding
        let needed = frame.stride as usize * (frame.height as usize - 1) + min_stride as usize;
        if frame.data.len() < needed {
            return Err(CaptureError::MalformedFrame {
                expected: needed,
                actual: frame.data.len(),
            });
        }

        let rgb = frame_to_rgb(frame);
        RgbImage::from_raw(frame.width, frame.height, rgb).ok_or_else(|| {
            CaptureError::MalformedFrame {
                expected: frame.width as usize * frame.height as usize * 3,
                actual: frame.data.len(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::types::PixelFormat;

    #[test]
    fn test_no_stream() {
        assert!(matches!(
            PhotoCapture::capture_from_stream(None),
            Err(CaptureError::NoStream)
        ));
    }

    #[test]
    fn test_zero_dimension_frame() {
        let frame = CameraFrame::packed(0, 720, PixelFormat::RGB24, Vec::new());
        assert_eq!(
            PhotoCapture::draw(&frame),
            Err(CaptureError::InvalidDimensions {
                width: 0,
                height: 720
            })
        );
    }

    #[test]
    fn test_truncated_frame() {
        let frame = CameraFrame::packed(4, 4, PixelFormat::RGB24, vec![0; 20]);
        assert_eq!(
            PhotoCapture::draw(&frame),
            Err(CaptureError::MalformedFrame {
                expected: 48,
                actual: 20
            })
        );
    }

    #[test]
    fn test_draw_native_resolution() {
        let frame = CameraFrame::packed(2, 2, PixelFormat::Gray8, vec![0, 64, 128, 255]);
        let image = PhotoCapture::draw(&frame).unwrap();
        assert_eq!(image.dimensions(), (2, 2));
        assert_eq!(image.get_pixel(1, 1).0, [255, 255, 255]);
    }
}
