// SPDX-License-Identifier: GPL-3.0-only

//! Capture loop handlers
//!
//! The loop is two [`ScheduledTask`]s started from the same instant: the
//! capture timer at the configured interval and the countdown timer every
//! second. Both tick on a shared grid, so the countdown reaches zero on the
//! same instant the capture timer fires.

use crate::app::state::CaptureWidget;
use crate::app::timer::ScheduledTask;
use crate::constants::{text, timing};
use crate::host::HostValue;
use tokio::time::Instant;
use tracing::{debug, info, warn};

impl CaptureWidget {
    // =========================================================================
    // Capture Loop Handlers
    // =========================================================================

    /// Start (or restart) the capture loop
    ///
    /// Any running timers are cancelled first, then one frame is captured
    /// right away and both timers are scheduled.
    pub fn start_loop(&mut self) {
        self.capture_timer = None;
        self.countdown_timer = None;

        let interval = self.applied.interval_seconds;
        info!(interval_seconds = interval, "Starting capture loop");
        self.stats.loop_starts += 1;

        self.capture_tick();

        let start = Instant::now();
        self.countdown = Some(interval);
        self.view.countdown = Some(text::next_capture_in(interval));
        self.capture_timer = Some(ScheduledTask::every_from(start, self.applied.interval()));
        self.countdown_timer = Some(ScheduledTask::every_from(start, timing::COUNTDOWN_PERIOD));

        self.view.status = text::STATUS_CAPTURING.to_string();
        self.view.inactive = false;
    }

    /// Cancel both timers; the camera stays open
    pub fn stop_loop(&mut self) {
        if self.capture_timer.is_some() {
            info!("Stopping capture loop");
        }
        self.capture_timer = None;
        self.countdown_timer = None;
        self.countdown = None;
        self.stats.loop_stops += 1;

        self.view.status = text::STATUS_PAUSED.to_string();
        self.view.countdown = None;
        self.view.inactive = true;
    }

    /// Capture one frame and deliver it
    ///
    /// Does nothing without an open stream. Failures become an error value
    /// for the host and never stop the loop.
    pub fn capture_tick(&mut self) {
        let Some(stream) = self.stream.as_deref() else {
            debug!("Capture skipped, no camera stream");
            return;
        };

        self.view.flash_until = Some(Instant::now() + timing::FLASH_DURATION);

        match self.pipeline.capture(Some(stream)) {
            Ok(encoded) => {
                self.view.error = None;
                self.deliver(HostValue::capture(encoded.data_url));
            }
            Err(e) => {
                warn!(error = %e, "Capture failed");
                self.view.error = Some(e.to_string());
                self.deliver(HostValue::error(e.to_string()));
            }
        }
    }

    /// Capture timer fired: capture and resynchronise the countdown
    pub(crate) fn handle_capture_timer(&mut self) {
        self.capture_tick();
        // Display is left alone; the next countdown tick shows interval - 1
        self.countdown = Some(self.applied.interval_seconds);
    }

    /// One-second countdown display update
    pub fn countdown_tick(&mut self) {
        let remaining = self.countdown.unwrap_or(0).saturating_sub(1);
        self.countdown = Some(remaining);

        self.view.countdown = Some(if remaining == 0 {
            text::CAPTURING_NOW.to_string()
        } else {
            text::next_capture_in(remaining)
        });
    }
}
