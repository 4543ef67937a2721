// SPDX-License-Identifier: GPL-3.0-only

//! What the widget shows
//!
//! The widget renders nothing itself. It publishes a [`WidgetView`] snapshot
//! on a watch channel after every message, and a presentation surface (the
//! terminal preview) draws from the latest snapshot.

use crate::app::state::WidgetStats;
use crate::backends::camera::types::FrameReceiver;
use crate::constants::text;
use tokio::time::Instant;

/// Snapshot of the widget's visible state
#[derive(Debug, Clone)]
pub struct WidgetView {
    /// Main status line ("Ready", "Auto-capturing", "Paused", ...)
    pub status: String,
    /// Countdown line; `None` while the loop is stopped
    pub countdown: Option<String>,
    /// Error text shown over the preview
    pub error: Option<String>,
    /// Camera access is being requested
    pub loading: bool,
    /// The live preview surface is shown
    pub preview_visible: bool,
    /// Dimmed indicator while capture is paused
    pub inactive: bool,
    /// Capture flash highlight is shown until this instant
    pub flash_until: Option<Instant>,
    /// Live frames for the preview surface
    pub frames: Option<FrameReceiver>,
    pub stats: WidgetStats,
}

impl WidgetView {
    /// Whether the flash highlight is visible at `now`
    pub fn is_flashing(&self, now: Instant) -> bool {
        self.flash_until.is_some_and(|until| now < until)
    }
}

impl Default for WidgetView {
    fn default() -> Self {
        Self {
            status: text::STATUS_WAITING.to_string(),
            countdown: None,
            error: None,
            loading: false,
            preview_visible: false,
            inactive: true,
            flash_until: None,
            frames: None,
            stats: WidgetStats::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_flash_expires() {
        let now = Instant::now();
        let view = WidgetView {
            flash_until: Some(now + Duration::from_millis(300)),
            ..WidgetView::default()
        };
        assert!(view.is_flashing(now));
        assert!(view.is_flashing(now + Duration::from_millis(299)));
        assert!(!view.is_flashing(now + Duration::from_millis(300)));
    }

    #[test]
    fn test_default_is_inactive() {
        let view = WidgetView::default();
        assert!(view.inactive);
        assert!(!view.is_flashing(Instant::now()));
    }
}
