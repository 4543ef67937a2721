// SPDX-License-Identifier: GPL-3.0-only

//! Still image encoding
//!
//! Captured rasters leave the widget as a JPEG wrapped in a base64 data URL
//! (`data:image/jpeg;base64,...`), the form hosts can drop straight into an
//! `<img>` or forward to an image API.

use crate::constants::encoding::{JPEG_MIME, JPEG_QUALITY};
use crate::errors::CaptureError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::RgbImage;
use tracing::debug;

/// Encoded still ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub data_url: String,
    pub width: u32,
    pub height: u32,
    /// Size of the JPEG before base64 expansion
    pub jpeg_size: usize,
}

/// JPEG encoder with a fixed quality
#[derive(Debug, Clone, Copy)]
pub struct PhotoEncoder {
    quality: u8,
}

impl PhotoEncoder {
    /// Encoder at the default delivery quality (85)
    pub fn new() -> Self {
        Self {
            quality: JPEG_QUALITY,
        }
    }

    /// Encoder with an explicit JPEG quality, clamped to 1..=100
    pub fn with_quality(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Encode a raster as JPEG bytes
    pub fn encode_jpeg(&self, image: &RgbImage) -> Result<Vec<u8>, CaptureError> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);

        let mut encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, self.quality);
        encoder
            .encode(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ExtendedColorType::Rgb8,
            )
            .map_err(|e| CaptureError::EncodingFailed(e.to_string()))?;

        Ok(buffer)
    }

    /// Encode a raster as a JPEG data URL
    pub fn encode(&self, image: &RgbImage) -> Result<EncodedImage, CaptureError> {
        let jpeg = self.encode_jpeg(image)?;
        let data_url = to_data_url(JPEG_MIME, &jpeg);

        debug!(
            width = image.width(),
            height = image.height(),
            jpeg_size = jpeg.len(),
            url_len = data_url.len(),
            "Encoded capture"
        );

        Ok(EncodedImage {
            data_url,
            width: image.width(),
            height: image.height(),
            jpeg_size: jpeg.len(),
        })
    }
}

impl Default for PhotoEncoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Wrap bytes in a base64 data URL
pub fn to_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, BASE64.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_quality() {
        assert_eq!(PhotoEncoder::new().quality(), 85);
        assert_eq!(PhotoEncoder::with_quality(0).quality(), 1);
        assert_eq!(PhotoEncoder::with_quality(250).quality(), 100);
    }

    #[test]
    fn test_jpeg_magic() {
        let image = RgbImage::from_pixel(16, 8, image::Rgb([200, 30, 30]));
        let jpeg = PhotoEncoder::new().encode_jpeg(&image).unwrap();
        assert_eq!(&jpeg[..3], &[0xFF, 0xD8, 0xFF]);
    }

    #[test]
    fn test_data_url_prefix() {
        let image = RgbImage::new(8, 8);
        let encoded = PhotoEncoder::new().encode(&image).unwrap();
        assert!(encoded.data_url.starts_with("data:image/jpeg;base64,/9j/"));
        assert_eq!((encoded.width, encoded.height), (8, 8));
    }

    #[test]
    fn test_to_data_url() {
        assert_eq!(to_data_url("image/png", b"hi"), "data:image/png;base64,aGk=");
    }
}
