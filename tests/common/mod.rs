// SPDX-License-Identifier: GPL-3.0-only

//! Shared test fixtures: a fake camera backend and widget harness

#![allow(dead_code)]

use capture_widget::app::{CaptureWidget, WidgetView};
use capture_widget::backends::camera::test_pattern::colour_bars;
use capture_widget::backends::camera::types::*;
use capture_widget::backends::camera::{CameraBackend, CameraStream};
use capture_widget::config::Settings;
use capture_widget::errors::{AppResult, CameraError};
use capture_widget::host::{ChannelHost, HostHandle};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Camera backend that counts acquisitions and stops
#[derive(Clone)]
pub struct FakeBackend {
    acquisitions: Arc<AtomicU32>,
    stops: Arc<AtomicU32>,
    failure: Option<CameraError>,
    /// Acquisitions left that fail with `failure`
    failures_left: Arc<AtomicU32>,
    frame: CameraFrame,
    gate: Arc<Mutex<Option<mpsc::Receiver<()>>>>,
}

impl FakeBackend {
    /// Delivers 64x36 colour bars
    pub fn new() -> Self {
        Self::with_frame(colour_bars(64, 36))
    }

    pub fn with_frame(frame: CameraFrame) -> Self {
        Self {
            acquisitions: Arc::new(AtomicU32::new(0)),
            stops: Arc::new(AtomicU32::new(0)),
            failure: None,
            failures_left: Arc::new(AtomicU32::new(0)),
            frame,
            gate: Arc::new(Mutex::new(None)),
        }
    }

    /// Every acquisition fails with `error`
    pub fn failing(error: CameraError) -> Self {
        Self::failing_times(error, u32::MAX)
    }

    /// The first `times` acquisitions fail with `error`, later ones succeed
    pub fn failing_times(error: CameraError, times: u32) -> Self {
        Self {
            failure: Some(error),
            failures_left: Arc::new(AtomicU32::new(times)),
            ..Self::new()
        }
    }

    /// The next acquisition blocks until the returned sender sends (or is dropped)
    pub fn gated(self) -> (Self, mpsc::Sender<()>) {
        let (tx, rx) = mpsc::channel();
        *self.gate.lock().unwrap() = Some(rx);
        (self, tx)
    }

    pub fn acquisitions(&self) -> u32 {
        self.acquisitions.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> u32 {
        self.stops.load(Ordering::SeqCst)
    }
}

impl CameraBackend for FakeBackend {
    fn name(&self) -> &str {
        "fake"
    }

    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        vec![CameraDevice {
            name: "Fake Camera".to_string(),
            path: "/dev/fake0".to_string(),
            driver: Some("fake".to_string()),
            location: Some(CameraLocation::Back),
        }]
    }

    fn get_formats(&self, _device: &CameraDevice) -> Vec<CameraFormat> {
        vec![CameraFormat {
            width: self.frame.width,
            height: self.frame.height,
            framerate: Some(30),
            pixel_format: "RGB3".to_string(),
        }]
    }

    fn acquire(&self, _constraints: &MediaConstraints) -> BackendResult<Box<dyn CameraStream>> {
        self.acquisitions.fetch_add(1, Ordering::SeqCst);

        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.recv();
        }

        if let Some(error) = &self.failure {
            let failing = self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| match left {
                    0 => None,
                    u32::MAX => Some(u32::MAX),
                    left => Some(left - 1),
                })
                .is_ok();
            if failing {
                return Err(error.clone());
            }
        }

        let devices = self.enumerate_cameras();
        let (_sender, receiver) = watch::channel(Some(Arc::new(self.frame.clone())));
        Ok(Box::new(FakeStream {
            device: devices[0].clone(),
            format: self.get_formats(&devices[0])[0].clone(),
            receiver,
            live: true,
            stops: self.stops.clone(),
        }))
    }
}

pub struct FakeStream {
    device: CameraDevice,
    format: CameraFormat,
    receiver: FrameReceiver,
    live: bool,
    stops: Arc<AtomicU32>,
}

impl CameraStream for FakeStream {
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
        if self.live {
            self.live = false;
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn is_live(&self) -> bool {
        self.live
    }
}

/// A running widget and the host side of its channel
pub struct Harness {
    pub handle: HostHandle,
    pub view: watch::Receiver<WidgetView>,
    pub task: JoinHandle<AppResult<()>>,
}

impl Harness {
    /// Wait until the published view satisfies `condition`
    pub async fn wait_for(&mut self, condition: impl FnMut(&WidgetView) -> bool) -> WidgetView {
        self.view
            .wait_for(condition)
            .await
            .expect("widget exited while waiting")
            .clone()
    }

    /// Current view
    pub fn snapshot(&self) -> WidgetView {
        self.view.borrow().clone()
    }
}

/// Spawn a widget on the current runtime with default settings
pub fn spawn_widget(backend: &FakeBackend) -> Harness {
    let (host, handle, events) = ChannelHost::pair();
    let widget = CaptureWidget::new(
        Box::new(host),
        Arc::new(backend.clone()),
        &Settings::default(),
    );
    let view = widget.view();
    let task = tokio::spawn(widget.run(events));
    Harness { handle, view, task }
}
