// SPDX-License-Identifier: GPL-3.0-only

//! Widget state

use crate::app::timer::ScheduledTask;
use crate::app::view::WidgetView;
use crate::backends::camera::types::MediaConstraints;
use crate::backends::camera::{CameraBackend, CameraStream};
use crate::config::WidgetConfig;
use crate::errors::CameraError;
use crate::host::{Host, HostEvent};
use crate::pipelines::photo::PhotoPipeline;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Camera lifecycle
///
/// ```text
/// Idle ──acquire──▶ Acquiring ──ok──▶ Open ──teardown──▶ Released
///                       │
///                       └──err──▶ Failed ──(re-activation)──▶ Acquiring
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CameraStatus {
    /// No acquisition attempted yet
    #[default]
    Idle,
    /// Acquisition in flight on a blocking thread
    Acquiring,
    /// Stream open and owned by the widget
    Open,
    /// Last acquisition failed with this message
    Failed(String),
    /// Stream stopped by teardown
    Released,
}

impl CameraStatus {
    pub fn is_acquiring(&self) -> bool {
        matches!(self, CameraStatus::Acquiring)
    }
}

/// Counters for status displays and tests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WidgetStats {
    /// Acquisition attempts started
    pub acquisitions: u32,
    /// Capture payloads delivered
    pub captures: u64,
    /// Error payloads delivered (acquisition and capture)
    pub errors: u64,
    /// Times the capture loop was started
    pub loop_starts: u32,
    /// Times the capture loop was stopped
    pub loop_stops: u32,
}

/// Everything the widget's event loop reacts to
pub enum Message {
    /// Pushed by the host
    Host(HostEvent),
    /// Acquisition finished on its blocking thread
    CameraAcquired(Result<Box<dyn CameraStream>, CameraError>),
    /// Capture timer fired
    CaptureTick,
    /// One-second countdown timer fired
    CountdownTick,
}

impl std::fmt::Debug for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Message::Host(event) => f.debug_tuple("Host").field(event).finish(),
            Message::CameraAcquired(Ok(stream)) => f
                .debug_tuple("CameraAcquired")
                .field(&stream.device().name)
                .finish(),
            Message::CameraAcquired(Err(e)) => {
                f.debug_tuple("CameraAcquired").field(e).finish()
            }
            Message::CaptureTick => write!(f, "CaptureTick"),
            Message::CountdownTick => write!(f, "CountdownTick"),
        }
    }
}

/// Whether the event loop keeps running after a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// The capture widget
///
/// All fields are owned by the single task running [`CaptureWidget::run`];
/// nothing here is shared or locked.
pub struct CaptureWidget {
    pub(crate) host: Box<dyn Host>,
    pub(crate) backend: Arc<dyn CameraBackend>,
    pub(crate) constraints: MediaConstraints,
    pub(crate) frame_height: u32,
    pub(crate) pipeline: PhotoPipeline,

    /// Config applied before the host sends anything
    pub(crate) initial_config: Option<WidgetConfig>,
    /// Last applied config; starts inactive with the default interval
    pub(crate) applied: WidgetConfig,

    pub(crate) stream: Option<Box<dyn CameraStream>>,
    pub(crate) camera: CameraStatus,
    /// Start the loop once the in-flight acquisition succeeds
    pub(crate) pending_start: bool,

    pub(crate) capture_timer: Option<ScheduledTask>,
    pub(crate) countdown_timer: Option<ScheduledTask>,
    /// Seconds until the next capture, for display only
    pub(crate) countdown: Option<u32>,

    pub(crate) stats: WidgetStats,
    pub(crate) view: WidgetView,
    pub(crate) view_tx: watch::Sender<WidgetView>,

    pub(crate) internal_tx: mpsc::UnboundedSender<Message>,
    pub(crate) internal_rx: mpsc::UnboundedReceiver<Message>,
}
