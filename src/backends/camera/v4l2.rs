// SPDX-License-Identifier: GPL-3.0-only

//! Direct V4L2 capture backend
//!
//! Opens a `/dev/video*` node, negotiates the format closest to the requested
//! resolution and runs a capture thread that decodes every buffer into a
//! [`CameraFrame`] and publishes it on a watch channel.

use super::types::*;
use super::{CameraBackend, CameraStream, select_device, select_format};
use crate::constants::{camera, timing};
use crate::errors::CameraError;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use v4l::buffer::Type;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::{Format, FourCC};

/// Pixel formats the capture thread can turn into frames
fn is_supported_fourcc(fourcc: &str) -> bool {
    fourcc == "MJPG" || PixelFormat::from_fourcc(fourcc).is_some()
}

/// V4L2 camera backend
pub struct V4l2Backend;

impl V4l2Backend {
    pub fn new() -> Self {
        Self
    }

    fn query_device(path: &Path) -> Option<CameraDevice> {
        let dev = Device::with_path(path).ok()?;
        let caps = dev.query_caps().ok()?;

        if !caps
            .capabilities
            .contains(v4l::capability::Flags::VIDEO_CAPTURE)
        {
            return None;
        }

        // Metadata nodes advertise capture but have no image formats
        let has_formats = dev
            .enum_formats()
            .map(|formats| !formats.is_empty())
            .unwrap_or(false);
        if !has_formats {
            debug!(path = %path.display(), "Skipping node without capture formats");
            return None;
        }

        Some(CameraDevice {
            location: CameraLocation::from_name(&caps.card),
            name: caps.card,
            path: path.to_string_lossy().to_string(),
            driver: Some(caps.driver),
        })
    }
}

impl Default for V4l2Backend {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraBackend for V4l2Backend {
    fn name(&self) -> &str {
        "v4l2"
    }

    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        let mut paths: Vec<_> = std::fs::read_dir("/dev")
            .into_iter()
            .flatten()
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.starts_with(camera::V4L2_DEVICE_PREFIX))
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();

        let cameras: Vec<_> = paths
            .iter()
            .filter_map(|path| Self::query_device(path))
            .collect();

        info!(count = cameras.len(), "Enumerated V4L2 cameras");
        cameras
    }

    fn get_formats(&self, device: &CameraDevice) -> Vec<CameraFormat> {
        let dev = match Device::with_path(&device.path) {
            Ok(d) => d,
            Err(e) => {
                warn!(path = %device.path, error = %e, "Cannot open device to list formats");
                return Vec::new();
            }
        };

        let mut formats = Vec::new();
        for desc in dev.enum_formats().into_iter().flatten() {
            let fourcc = desc.fourcc.to_string();
            for size in dev.enum_framesizes(desc.fourcc).into_iter().flatten() {
                match size.size {
                    v4l::framesize::FrameSizeEnum::Discrete(discrete) => {
                        formats.push(CameraFormat {
                            width: discrete.width,
                            height: discrete.height,
                            framerate: max_framerate(&dev, desc.fourcc, discrete.width, discrete.height),
                            pixel_format: fourcc.clone(),
                        });
                    }
                    v4l::framesize::FrameSizeEnum::Stepwise(step) => {
                        // Offer the common sizes the range covers
                        for (w, h) in [(1920, 1080), (1280, 720), (640, 480)] {
                            if (step.min_width..=step.max_width).contains(&w)
                                && (step.min_height..=step.max_height).contains(&h)
                            {
                                formats.push(CameraFormat {
                                    width: w,
                                    height: h,
                                    framerate: None,
                                    pixel_format: fourcc.clone(),
                                });
                            }
                        }
                    }
                }
            }
        }

        formats
    }

    fn acquire(&self, constraints: &MediaConstraints) -> BackendResult<Box<dyn CameraStream>> {
        let devices = self.enumerate_cameras();
        let device = select_device(&devices, constraints)?.clone();

        let usable: Vec<_> = self
            .get_formats(&device)
            .into_iter()
            .filter(|f| is_supported_fourcc(&f.pixel_format))
            .collect();
        let wanted = select_format(&usable, constraints).ok_or_else(|| {
            CameraError::ConstraintsUnsatisfiable(format!(
                "{} offers no MJPG or raw YUV format",
                device.name
            ))
        })?;

        info!(device = %device.name, path = %device.path, format = %wanted, "Opening V4L2 camera");
        let dev = Device::with_path(&device.path)?;

        let requested = Format::new(
            wanted.width,
            wanted.height,
            FourCC::new(&fourcc_bytes(&wanted.pixel_format)),
        );
        let negotiated = dev
            .set_format(&requested)
            .map_err(|e| CameraError::ConstraintsUnsatisfiable(e.to_string()))?;

        let negotiated_fourcc = negotiated.fourcc.to_string();
        if negotiated_fourcc != wanted.pixel_format {
            warn!(
                requested = %wanted.pixel_format,
                got = %negotiated_fourcc,
                "Driver substituted the pixel format"
            );
            if !is_supported_fourcc(&negotiated_fourcc) {
                return Err(CameraError::ConstraintsUnsatisfiable(format!(
                    "driver insisted on unsupported format {}",
                    negotiated_fourcc
                )));
            }
        }

        let format = CameraFormat {
            width: negotiated.width,
            height: negotiated.height,
            framerate: wanted.framerate,
            pixel_format: negotiated_fourcc,
        };

        let stream = V4l2Stream::start(dev, device, format, negotiated.stride)?;
        Ok(Box::new(stream))
    }
}

fn fourcc_bytes(fourcc: &str) -> [u8; 4] {
    let mut bytes = [b' '; 4];
    for (slot, b) in bytes.iter_mut().zip(fourcc.bytes()) {
        *slot = b;
    }
    bytes
}

fn max_framerate(dev: &Device, fourcc: FourCC, width: u32, height: u32) -> Option<u32> {
    dev.enum_frameintervals(fourcc, width, height)
        .ok()?
        .into_iter()
        .filter_map(|interval| match interval.interval {
            v4l::frameinterval::FrameIntervalEnum::Discrete(frac) if frac.numerator > 0 => {
                Some(frac.denominator / frac.numerator)
            }
            _ => None,
        })
        .max()
}

/// Open V4L2 camera with its capture thread
pub struct V4l2Stream {
    device: CameraDevice,
    format: CameraFormat,
    receiver: FrameReceiver,
    running: Arc<AtomicBool>,
    thread_handle: Option<std::thread::JoinHandle<()>>,
}

impl V4l2Stream {
    fn start(
        dev: Device,
        device: CameraDevice,
        format: CameraFormat,
        stride: u32,
    ) -> BackendResult<Self> {
        let (sender, receiver) = watch::channel(None);
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();
        let (started_tx, started_rx) = mpsc::sync_channel(1);

        let thread_format = format.clone();
        let thread_handle = std::thread::spawn(move || {
            capture_loop(dev, thread_format, stride, sender, running_clone, started_tx)
        });

        // Wait until buffers are queued so streaming errors surface as
        // acquisition failures
        match started_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = thread_handle.join();
                return Err(e);
            }
            Err(_) => {
                let _ = thread_handle.join();
                return Err(CameraError::Backend("capture thread exited".into()));
            }
        }

        info!(device = %device.name, %format, "V4L2 stream started");
        Ok(Self {
            device,
            format,
            receiver,
            running,
            thread_handle: Some(thread_handle),
        })
    }
}

impl CameraStream for V4l2Stream {
    fn device(&self) -> &CameraDevice {
        &self.device
    }

    fn format(&self) -> &CameraFormat {
        &self.format
    }

    fn subscribe(&self) -> FrameReceiver {
        self.receiver.clone()
    }

    fn stop(&mut self) {
        info!(device = %self.device.name, "Stopping V4L2 stream");
        self.running.store(false, Ordering::SeqCst);

        if let Some(handle) = self.thread_handle.take() {
            match handle.join() {
                Ok(_) => debug!("V4L2 capture thread stopped"),
                Err(_) => error!("V4L2 capture thread panicked"),
            }
        }
    }

    fn is_live(&self) -> bool {
        self.running.load(Ordering::SeqCst)
            && self
                .thread_handle
                .as_ref()
                .map(|h| !h.is_finished())
                .unwrap_or(false)
    }
}

impl Drop for V4l2Stream {
    fn drop(&mut self) {
        // Don't join here; stop() is the orderly path
        self.running.store(false, Ordering::SeqCst);
    }
}

fn capture_loop(
    mut dev: Device,
    format: CameraFormat,
    stride: u32,
    sender: FrameSender,
    running: Arc<AtomicBool>,
    started: mpsc::SyncSender<BackendResult<()>>,
) {
    let mut stream = match MmapStream::with_buffers(&mut dev, Type::VideoCapture, camera::V4L2_BUFFER_COUNT) {
        Ok(stream) => {
            let _ = started.send(Ok(()));
            stream
        }
        Err(e) => {
            let _ = started.send(Err(CameraError::from(e)));
            return;
        }
    };

    let raw_format = PixelFormat::from_fourcc(&format.pixel_format);
    let mut frame_count = 0u64;

    while running.load(Ordering::SeqCst) {
        let (buf, meta) = match stream.next() {
            Ok(next) => next,
            Err(e) => {
                warn!(error = %e, "Failed to dequeue V4L2 buffer");
                std::thread::sleep(std::time::Duration::from_millis(10));
                continue;
            }
        };
        frame_count += 1;
        let payload = filled_part(buf, meta.bytesused);

        let decoded = match raw_format {
            Some(pixel_format) => Ok(CameraFrame {
                width: format.width,
                height: format.height,
                data: Arc::from(payload),
                format: pixel_format,
                stride: stride.max(pixel_format.min_stride(format.width)),
                sequence: u64::from(meta.sequence),
            }),
            None => decode_mjpeg(payload, u64::from(meta.sequence)),
        };

        match decoded {
            Ok(frame) => {
                if frame_count % timing::FRAME_LOG_INTERVAL == 0 {
                    debug!(frame = frame_count, size = frame.data.len(), "V4L2 frame captured");
                }
                if sender.send(Some(Arc::new(frame))).is_err() {
                    debug!("All frame receivers dropped, ending capture");
                    break;
                }
            }
            Err(e) => {
                if frame_count % timing::FRAME_LOG_INTERVAL == 0 {
                    warn!(frame = frame_count, error = %e, "Dropping undecodable frame");
                }
            }
        }
    }

    running.store(false, Ordering::SeqCst);
    info!(frames = frame_count, "V4L2 capture loop ended");
}

/// Bytes the driver actually wrote; mmap buffers keep stale data past that
fn filled_part(buf: &[u8], bytesused: u32) -> &[u8] {
    let used = usize::try_from(bytesused).unwrap_or(usize::MAX);
    &buf[..used.min(buf.len())]
}

fn decode_mjpeg(buf: &[u8], sequence: u64) -> Result<CameraFrame, image::ImageError> {
    let rgb = image::load_from_memory_with_format(buf, image::ImageFormat::Jpeg)?.to_rgb8();
    let (width, height) = rgb.dimensions();
    let mut frame = CameraFrame::packed(width, height, PixelFormat::RGB24, rgb.into_raw());
    frame.sequence = sequence;
    Ok(frame)
}
