// SPDX-License-Identifier: MPL-2.0

//! The capture widget
//!
//! One [`CaptureWidget`] owns a camera stream, two timers and the last applied
//! host config. It runs as a single task that turns every input into a
//! [`Message`] and hands it to [`CaptureWidget::update`]:
//!
//! ```text
//!   host events ─┐
//!   acquisition ─┤  biased select  ┌─▶ handlers::host    (apply config, unload)
//!   countdown   ─┼───────────────▶ ├─▶ handlers::camera  (acquire, teardown)
//!   capture     ─┘                 └─▶ handlers::capture (loop, ticks)
//! ```
//!
//! Nothing runs concurrently with a handler, so two captures or config
//! applications can never interleave. Camera acquisition is the only work
//! moved off the task; its result comes back as a message.
//!
//! # Modules
//!
//! - `state`: widget struct, messages and counters
//! - `timer`: cancellable repeating timers
//! - `view`: published display snapshot
//! - `update`: message dispatch
//! - `handlers`: message handlers by domain

mod handlers;
mod state;
mod timer;
mod update;
mod view;

pub use state::{CameraStatus, CaptureWidget, Flow, Message, WidgetStats};
pub use timer::ScheduledTask;
pub use view::WidgetView;

use crate::backends::camera::CameraBackend;
use crate::config::{Settings, WidgetConfig};
use crate::errors::{AppError, AppResult};
use crate::host::{Host, HostEvent, HostEventReceiver};
use crate::pipelines::photo::PhotoPipeline;
use std::sync::Arc;
use timer::next_tick;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info};

impl CaptureWidget {
    /// Create a widget talking to `host` and opening cameras from `backend`
    pub fn new(host: Box<dyn Host>, backend: Arc<dyn CameraBackend>, settings: &Settings) -> Self {
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();
        let view = WidgetView::default();
        let (view_tx, _) = watch::channel(view.clone());

        Self {
            host,
            backend,
            constraints: settings.constraints(),
            frame_height: settings.frame_height,
            pipeline: PhotoPipeline::new(),
            initial_config: settings.initial,
            applied: WidgetConfig::default(),
            stream: None,
            camera: Default::default(),
            pending_start: false,
            capture_timer: None,
            countdown_timer: None,
            countdown: None,
            stats: WidgetStats::default(),
            view,
            view_tx,
            internal_tx,
            internal_rx,
        }
    }

    /// Subscribe to display snapshots
    pub fn view(&self) -> watch::Receiver<WidgetView> {
        self.view_tx.subscribe()
    }

    /// Last applied config
    pub fn applied_config(&self) -> WidgetConfig {
        self.applied
    }

    pub fn stats(&self) -> WidgetStats {
        self.stats
    }

    /// Run until the host unloads the widget or its event stream ends
    ///
    /// Fails immediately, without touching the camera, when the host does not
    /// accept the ready signal.
    pub async fn run(mut self, mut events: HostEventReceiver) -> AppResult<()> {
        if let Err(e) = self.host.ready() {
            error!(error = %e, "Host channel unavailable, widget stays inert");
            return Err(AppError::Host(e));
        }
        info!(backend = self.backend.name(), "Capture widget ready");

        // Eager acquisition so the preview shows before the first activation
        self.initialize();
        if let Some(config) = self.initial_config.take() {
            self.apply_config(config);
        }
        self.publish_view();

        loop {
            let message = tokio::select! {
                biased;
                event = events.recv() => Message::Host(event.unwrap_or(HostEvent::Unload)),
                Some(message) = self.internal_rx.recv() => message,
                // Countdown before capture so "capturing now" is shown on the
                // instant both fire
                _ = next_tick(&mut self.countdown_timer) => Message::CountdownTick,
                _ = next_tick(&mut self.capture_timer) => Message::CaptureTick,
            };

            debug!(?message, "Widget message");
            let flow = self.update(message);
            self.publish_view();
            if flow == Flow::Exit {
                break;
            }
        }

        self.release_pending_acquisition().await;
        info!(stats = ?self.stats, "Capture widget stopped");
        Ok(())
    }

    /// Push the current view to subscribers
    pub(crate) fn publish_view(&mut self) {
        self.view.stats = self.stats;
        self.view_tx.send_replace(self.view.clone());
    }
}
