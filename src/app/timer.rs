// SPDX-License-Identifier: GPL-3.0-only

//! Cancellable repeating timers
//!
//! A [`ScheduledTask`] is a handle: the timer runs while the handle exists
//! and is cancelled by dropping it. Ticks are driven by the tokio clock, so
//! tests can pause and advance time.

use std::time::Duration;
use tokio::time::{Instant, Interval, MissedTickBehavior};

/// Repeating timer whose first tick is one period after creation
#[derive(Debug)]
pub struct ScheduledTask {
    interval: Interval,
}

impl ScheduledTask {
    /// Start a timer firing every `period`, beginning one period from `start`
    ///
    /// Timers created from the same `start` tick on a common grid.
    pub fn every_from(start: Instant, period: Duration) -> Self {
        let mut interval = tokio::time::interval_at(start + period, period);
        // Late ticks are dropped rather than bunched, keeping the grid
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self { interval }
    }

    /// Start a timer firing every `period` from now
    pub fn every(period: Duration) -> Self {
        Self::every_from(Instant::now(), period)
    }

    /// Wait for the next tick
    pub async fn tick(&mut self) -> Instant {
        self.interval.tick().await
    }
}

/// Wait for the next tick of an optional timer; never resolves for `None`
pub async fn next_tick(task: &mut Option<ScheduledTask>) -> Instant {
    match task {
        Some(task) => task.tick().await,
        None => std::future::pending().await,
    }
}
