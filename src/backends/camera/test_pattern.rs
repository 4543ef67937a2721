// SPDX-License-Identifier: GPL-3.0-only

//! Synthetic camera backend
//!
//! Serves SMPTE-style colour bars (or a still image) at the requested
//! resolution. A thin marker column sweeps across the picture so consecutive
//! frames differ, which keeps preview surfaces visibly alive.

use super::types::*;
use super::{CameraBackend, CameraStream};
use crate::errors::CameraError;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Path reported for the synthetic device
pub const TEST_PATTERN_PATH: &str = "test-pattern";

/// Delay between published frames
const FRAME_PERIOD: Duration = Duration::from_millis(66);

/// 75% colour bars: white, yellow, cyan, green, magenta, red, blue
const BARS: [[u8; 3]; 7] = [
    [191, 191, 191],
    [191, 191, 0],
    [0, 191, 191],
    [0, 191, 0],
    [191, 0, 191],
    [191, 0, 0],
    [0, 0, 191],
];

/// Backend producing generated frames
pub struct TestPatternBackend {
    image_path: Option<PathBuf>,
    failure: Option<CameraError>,
}

impl TestPatternBackend {
    pub fn new(image_path: Option<PathBuf>) -> Self {
        Self {
            image_path,
            failure: None,
        }
    }

    /// A backend whose every acquisition fails with `error`
    pub fn failing(error: CameraError) -> Self {
        Self {
            image_path: None,
            failure: Some(error),
        }
    }

    fn device() -> CameraDevice {
        CameraDevice {
            name: "Test Pattern".to_string(),
            path: TEST_PATTERN_PATH.to_string(),
            driver: None,
            location: Some(CameraLocation::External),
        }
    }

    fn base_frame(&self, width: u32, height: u32) -> BackendResult<CameraFrame> {
        match &self.image_path {
            Some(path) => {
                let img = image::open(path).map_err(|e| {
                    CameraError::DeviceNotFound(format!(
                        "Failed to load image '{}': {}",
                        path.display(),
                        e
                    ))
                })?;
                let rgb = img.to_rgb8();
                let (w, h) = rgb.dimensions();
                info!(path = %path.display(), width = w, height = h, "Loaded test pattern image");
                Ok(CameraFrame::packed(w, h, PixelFormat::RGB24, rgb.into_raw()))
            }
            None => Ok(colour_bars(width, height)),
        }
    }
}

impl CameraBackend for TestPatternBackend {
    fn name(&self) -> &str {
        "test-pattern"
    }

    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        vec![Self::device()]
    }

    fn get_formats(&self, _device: &CameraDevice) -> Vec<CameraFormat> {
        vec![CameraFormat {
            width: crate::constants::camera::PREFERRED_WIDTH,
            height: crate::constants::camera::PREFERRED_HEIGHT,
            framerate: Some((1000 / FRAME_PERIOD.as_millis()) as u32),
            pixel_format: "RGB3".to_string(),
        }]
    }

    fn acquire(&self, constraints: &MediaConstraints) -> BackendResult<Box<dyn CameraStream>> {
        if let Some(error) = &self.failure {
            warn!(%error, "Test pattern configured to fail acquisition");
            return Err(error.clone());
        }

        let devices = self.enumerate_cameras();
        let device = super::select_device(&devices, constraints)?.clone();

        if constraints.ideal_width == 0 || constraints.ideal_height == 0 {
            return Err(CameraError::ConstraintsUnsatisfiable(format!(
                "{}x{}",
                constraints.ideal_width, constraints.ideal_height
            )));
        }

        let base = self.base_frame(constraints.ideal_width, constraints.ideal_height)?;
        let format = CameraFormat {
            width: base.width,
            height: base.height,
            framerate: Some((1000 / FRAME_PERIOD.as_millis()) as u32),
            pixel_format: "RGB3".to_string(),
        };

        Ok(Box::new(TestPatternStream::start(device, format, base)))
    }
}

/// Running generator thread
pub struct TestPatternStream {
    device: CameraDevice,
    format: CameraFormat,
    receiver: FrameReceiver,
    running: Arc<AtomicBool>,
    thread_handle: Option<std::thread::JoinHandle<()>>,
}

impl TestPatternStream {
    fn start(device: CameraDevice, format: CameraFormat, base: CameraFrame) -> Self {
        // First frame is available immediately so a capture right after
        // acquisition never races the generator thread
        let (sender, receiver) = watch::channel(Some(Arc::new(base.clone())));
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();

        let thread_handle = std::thread::spawn(move || generate_loop(base, sender, running_clone));
        info!(device = %device.name, %format, "Test pattern stream started");

        Self {
            device,
            format,
            receiver,
            running,
            thread_handle: Some(thread_handle),
        }
    }
}

impl CameraStream for TestPatternStream {
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
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                warn!("Test pattern thread panicked");
            }
            debug!("Test pattern stream stopped");
        }
    }

    fn is_live(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for TestPatternStream {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

fn generate_loop(base: CameraFrame, sender: FrameSender, running: Arc<AtomicBool>) {
    let mut sequence = 0u64;
    while running.load(Ordering::SeqCst) {
        std::thread::sleep(FRAME_PERIOD);
        sequence += 1;

        let frame = with_marker(&base, sequence);
        if sender.send(Some(Arc::new(frame))).is_err() {
            // Every receiver is gone
            break;
        }
    }
}

/// Generate colour bars as RGB24
pub fn colour_bars(width: u32, height: u32) -> CameraFrame {
    let mut data = Vec::with_capacity((width * height * 3) as usize);
    for _ in 0..height {
        for x in 0..width {
            let bar = (x as usize * BARS.len()) / width.max(1) as usize;
            data.extend_from_slice(&BARS[bar.min(BARS.len() - 1)]);
        }
    }
    CameraFrame::packed(width, height, PixelFormat::RGB24, data)
}

/// Copy `base` and paint a one-pixel white column at a position derived from `sequence`
fn with_marker(base: &CameraFrame, sequence: u64) -> CameraFrame {
    let mut data = base.data.to_vec();
    if base.width > 0 {
        let column = (sequence % u64::from(base.width)) as usize;
        let stride = base.stride as usize;
        for row in 0..base.height as usize {
            let i = row * stride + column * 3;
            if let Some(px) = data.get_mut(i..i + 3) {
                px.copy_from_slice(&[255, 255, 255]);
            }
        }
    }

    CameraFrame {
        data: Arc::from(data),
        sequence,
        ..base.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colour_bars_layout() {
        let frame = colour_bars(7, 2);
        assert_eq!(frame.data.len(), 7 * 2 * 3);
        assert_eq!(&frame.data[0..3], &BARS[0]);
        assert_eq!(&frame.data[18..21], &BARS[6]);
    }

    #[test]
    fn test_acquire_has_frame_immediately() {
        let backend = TestPatternBackend::new(None);
        let constraints = MediaConstraints {
            ideal_width: 64,
            ideal_height: 48,
            ..MediaConstraints::default()
        };
        let mut stream = backend.acquire(&constraints).unwrap();
        let frame = stream.latest_frame().unwrap();
        assert_eq!((frame.width, frame.height), (64, 48));
        assert!(stream.is_live());

        stream.stop();
        assert!(!stream.is_live());
    }

    #[test]
    fn test_failing_backend() {
        let backend = TestPatternBackend::failing(CameraError::PermissionDenied("denied".into()));
        let result = backend.acquire(&MediaConstraints::default());
        assert!(matches!(result, Err(CameraError::PermissionDenied(_))));
    }

    #[test]
    fn test_missing_image_is_not_found() {
        let backend = TestPatternBackend::new(Some(PathBuf::from("/nonexistent/pattern.png")));
        assert!(matches!(
            backend.acquire(&MediaConstraints::default()),
            Err(CameraError::DeviceNotFound(_))
        ));
    }
}
