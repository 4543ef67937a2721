// SPDX-License-Identifier: GPL-3.0-only

//! Camera lifecycle handlers
//!
//! Acquisition, its result, and teardown.

use crate::app::state::{CameraStatus, CaptureWidget, Message};
use crate::backends::camera::CameraStream;
use crate::constants::text;
use crate::errors::CameraError;
use crate::host::HostValue;
use tracing::{error, info, warn};

impl CaptureWidget {
    // =========================================================================
    // Camera Lifecycle Handlers
    // =========================================================================

    /// Best-effort camera acquisition at start-up
    pub fn initialize(&mut self) {
        self.acquire();
    }

    /// Start acquiring a camera unless one is open or already being opened
    ///
    /// The backend call blocks, so it runs on the blocking pool and reports
    /// back with [`Message::CameraAcquired`].
    pub(crate) fn acquire(&mut self) {
        if self.stream.is_some() || self.camera.is_acquiring() {
            return;
        }

        info!(
            backend = self.backend.name(),
            width = self.constraints.ideal_width,
            height = self.constraints.ideal_height,
            facing = ?self.constraints.facing,
            "Requesting camera"
        );
        self.stats.acquisitions += 1;
        self.camera = CameraStatus::Acquiring;
        self.view.loading = true;
        self.view.error = None;

        let backend = self.backend.clone();
        let constraints = self.constraints.clone();
        let tx = self.internal_tx.clone();
        tokio::task::spawn_blocking(move || {
            let result = backend.acquire(&constraints);
            if let Err(tokio::sync::mpsc::error::SendError(Message::CameraAcquired(Ok(mut stream)))) =
                tx.send(Message::CameraAcquired(result))
            {
                // Widget is gone; don't leave the device running
                stream.stop();
            }
        });
    }

    pub(crate) fn handle_camera_acquired(
        &mut self,
        result: Result<Box<dyn CameraStream>, CameraError>,
    ) {
        self.view.loading = false;

        match result {
            Ok(stream) => {
                info!(
                    device = %stream.device().name,
                    format = %stream.format(),
                    "Camera opened"
                );
                self.view.frames = Some(stream.subscribe());
                self.view.preview_visible = true;
                self.view.error = None;
                self.view.status = text::STATUS_READY.to_string();
                self.stream = Some(stream);
                self.camera = CameraStatus::Open;

                if std::mem::take(&mut self.pending_start) && self.applied.active {
                    self.start_loop();
                }
            }
            Err(e) => {
                let message = e.to_string();
                error!(error = %message, "Camera acquisition failed");
                self.camera = CameraStatus::Failed(message.clone());
                self.view.error = Some(text::camera_unavailable(&message));
                self.pending_start = false;
                self.deliver(HostValue::error(message));
            }
        }
    }

    /// Stop every track of the open stream
    ///
    /// Timers are dropped too: the widget does not outlive teardown.
    pub fn teardown(&mut self) {
        self.capture_timer = None;
        self.countdown_timer = None;
        self.pending_start = false;

        if let Some(mut stream) = self.stream.take() {
            info!(device = %stream.device().name, "Releasing camera");
            stream.stop();
        }

        self.view.preview_visible = false;
        self.view.frames = None;
        if !self.camera.is_acquiring() {
            self.camera = CameraStatus::Released;
        }
    }

    /// After teardown, wait for an acquisition still in flight and stop its stream
    pub(crate) async fn release_pending_acquisition(&mut self) {
        if !self.camera.is_acquiring() {
            return;
        }

        info!("Waiting for in-flight camera acquisition before exit");
        while let Some(message) = self.internal_rx.recv().await {
            if let Message::CameraAcquired(result) = message {
                match result {
                    Ok(mut stream) => stream.stop(),
                    Err(e) => warn!(error = %e, "Acquisition failed after teardown"),
                }
                break;
            }
        }
        self.camera = CameraStatus::Released;
    }

    /// Hand a value to the host; delivery is fire-and-forget
    pub(crate) fn deliver(&mut self, value: HostValue) {
        if value.is_capture() {
            self.stats.captures += 1;
        } else {
            self.stats.errors += 1;
        }
        if let Err(e) = self.host.set_value(value) {
            warn!(error = %e, "Failed to deliver value to host");
        }
    }
}
