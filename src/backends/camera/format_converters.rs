// SPDX-License-Identifier: GPL-3.0-only
//! Pixel format conversion to packed RGB
//!
//! Every backend delivers one of the raw [`PixelFormat`] layouts. The capture
//! pipeline and the terminal preview both work on packed RGB24, so all
//! conversions live here. Rows are read at the frame's stride, which may
//! include driver padding.

use super::types::{CameraFrame, PixelFormat};

/// Convert a single YUV sample to RGB using BT.601 coefficients
#[inline]
pub fn yuv_to_rgb(y: u8, u: u8, v: u8) -> [u8; 3] {
    let y = y as f32;
    let u = u as f32 - 128.0;
    let v = v as f32 - 128.0;

    let r = (y + 1.402 * v).clamp(0.0, 255.0) as u8;
    let g = (y - 0.344 * u - 0.714 * v).clamp(0.0, 255.0) as u8;
    let b = (y + 1.772 * u).clamp(0.0, 255.0) as u8;
    [r, g, b]
}

/// Convert one row of packed 4:2:2 data to RGB
///
/// `y_first` selects YUYV (Y0 U Y1 V) versus UYVY (U Y0 V Y1) ordering.
fn packed_422_row_to_rgb(row: &[u8], width: usize, y_first: bool, out: &mut Vec<u8>) {
    let mut written = 0;
    for chunk in row.chunks_exact(4) {
        let (y0, u, y1, v) = if y_first {
            (chunk[0], chunk[1], chunk[2], chunk[3])
        } else {
            (chunk[1], chunk[0], chunk[3], chunk[2])
        };

        for y in [y0, y1] {
            if written == width {
                return;
            }
            out.extend_from_slice(&yuv_to_rgb(y, u, v));
            written += 1;
        }
    }
}

/// Convert a frame of any supported layout to tightly packed RGB24
///
/// The caller is responsible for checking that `frame.data` covers
/// `stride * height` bytes; short rows are skipped rather than panicking.
pub fn frame_to_rgb(frame: &CameraFrame) -> Vec<u8> {
    let width = frame.width as usize;
    let height = frame.height as usize;
    let stride = frame.stride as usize;
    let row_bytes = frame.format.min_stride(frame.width) as usize;
    let mut rgb = Vec::with_capacity(width * height * 3);

    for row_index in 0..height {
        let start = row_index * stride;
        let Some(row) = frame.data.get(start..start + row_bytes) else {
            break;
        };

        match frame.format {
            PixelFormat::RGB24 => rgb.extend_from_slice(row),
            PixelFormat::RGBA => {
                for px in row.chunks_exact(4) {
                    rgb.extend_from_slice(&px[..3]);
                }
            }
            PixelFormat::Gray8 => {
                for &luma in row {
                    rgb.extend_from_slice(&[luma, luma, luma]);
                }
            }
            PixelFormat::YUYV => packed_422_row_to_rgb(row, width, true, &mut rgb),
            PixelFormat::UYVY => packed_422_row_to_rgb(row, width, false, &mut rgb),
        }
    }

    rgb
}

/// Sample one pixel as RGB without converting the whole frame
///
/// Used by the preview renderer, which only needs a few hundred samples per
/// terminal redraw.
pub fn sample_pixel_rgb(frame: &CameraFrame, x: u32, y: u32) -> [u8; 3] {
    let x = x.min(frame.width.saturating_sub(1)) as usize;
    let y = y.min(frame.height.saturating_sub(1)) as usize;
    let row = y * frame.stride as usize;
    let data = &frame.data;

    let at = |i: usize| data.get(i).copied().unwrap_or(0);

    match frame.format {
        PixelFormat::RGBA => {
            let i = row + x * 4;
            [at(i), at(i + 1), at(i + 2)]
        }
        PixelFormat::RGB24 => {
            let i = row + x * 3;
            [at(i), at(i + 1), at(i + 2)]
        }
        PixelFormat::Gray8 => {
            let luma = at(row + x);
            [luma, luma, luma]
        }
        PixelFormat::YUYV => {
            let pair = row + (x / 2) * 4;
            let y_val = if x % 2 == 0 { at(pair) } else { at(pair + 2) };
            yuv_to_rgb(y_val, at(pair + 1), at(pair + 3))
        }
        PixelFormat::UYVY => {
            let pair = row + (x / 2) * 4;
            let y_val = if x % 2 == 0 { at(pair + 1) } else { at(pair + 3) };
            yuv_to_rgb(y_val, at(pair), at(pair + 2))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yuv_neutral_is_gray() {
        assert_eq!(yuv_to_rgb(128, 128, 128), [128, 128, 128]);
        assert_eq!(yuv_to_rgb(0, 128, 128), [0, 0, 0]);
        assert_eq!(yuv_to_rgb(255, 128, 128), [255, 255, 255]);
    }

    #[test]
    fn test_rgba_drops_alpha() {
        let frame = CameraFrame::packed(2, 1, PixelFormat::RGBA, vec![1, 2, 3, 255, 4, 5, 6, 255]);
        assert_eq!(frame_to_rgb(&frame), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_stride_padding_is_skipped() {
        let mut frame = CameraFrame::packed(1, 2, PixelFormat::Gray8, vec![10, 0xEE, 20, 0xEE]);
        frame.stride = 2;
        assert_eq!(frame_to_rgb(&frame), vec![10, 10, 10, 20, 20, 20]);
    }

    #[test]
    fn test_odd_width_yuyv() {
        // Three pixels need two Y-pairs; the last luma sample is padding
        let frame = CameraFrame::packed(
            3,
            1,
            PixelFormat::YUYV,
            vec![255, 128, 255, 128, 0, 128, 99, 128],
        );
        let rgb = frame_to_rgb(&frame);
        assert_eq!(rgb.len(), 9);
        assert_eq!(&rgb[6..9], &[0, 0, 0]);
    }

    #[test]
    fn test_sample_matches_full_conversion() {
        let frame = CameraFrame::packed(
            2,
            1,
            PixelFormat::UYVY,
            vec![90, 200, 160, 40],
        );
        let full = frame_to_rgb(&frame);
        assert_eq!(sample_pixel_rgb(&frame, 0, 0), [full[0], full[1], full[2]]);
        assert_eq!(sample_pixel_rgb(&frame, 1, 0), [full[3], full[4], full[5]]);
    }
}
