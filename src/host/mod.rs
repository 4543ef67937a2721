// SPDX-License-Identifier: GPL-3.0-only

//! Host communication
//!
//! The widget talks to its embedding application through the [`Host`] trait
//! (outbound) and a stream of [`HostEvent`]s (inbound):
//!
//! ```text
//!            ready / set_value / set_frame_height
//!  Widget ──────────────────────────────────────────▶ Host
//!         ◀──────────────────────────────────────────
//!            HostEvent::Render(config) / Unload
//! ```
//!
//! Two adapters are provided: [`ChannelHost`] for in-process hosts and tests,
//! and [`StdioHost`] for a host process speaking JSON lines over stdio.

pub mod channel;
pub mod inbox;
pub mod stdio;

pub use channel::{ChannelHost, HostHandle};
pub use inbox::{FrameInbox, InboxOutcome};
pub use stdio::StdioHost;

use crate::config::WidgetConfig;
use crate::errors::HostError;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Value delivered to the host
///
/// Serialized as `{"type":"capture","data":...,"timestamp":...}` or
/// `{"type":"error","message":...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HostValue {
    /// A captured frame as a JPEG data URL
    Capture {
        data: String,
        /// Epoch milliseconds at capture time
        timestamp: i64,
    },
    /// Acquisition or capture failure
    Error { message: String },
}

impl HostValue {
    pub fn capture(data: String) -> Self {
        HostValue::Capture {
            data,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        HostValue::Error {
            message: message.into(),
        }
    }

    pub fn is_capture(&self) -> bool {
        matches!(self, HostValue::Capture { .. })
    }
}

/// Event pushed by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    /// New configuration (sent on every host re-render)
    Render(WidgetConfig),
    /// The page is going away; release the camera
    Unload,
}

/// Everything the widget sends to the host, as one message type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostMessage {
    Ready,
    SetValue { value: HostValue },
    SetFrameHeight { height: u32 },
}

/// Receiver side of the inbound event stream
pub type HostEventReceiver = mpsc::UnboundedReceiver<HostEvent>;

/// Sender side of the inbound event stream
pub type HostEventSender = mpsc::UnboundedSender<HostEvent>;

/// Outbound host primitives
///
/// `set_value` and `set_frame_height` are fire-and-forget: the widget logs a
/// failure and carries on. A failing `ready` means no host is attached.
pub trait Host: Send {
    /// Signal that the widget is initialised and accepts configuration
    fn ready(&mut self) -> Result<(), HostError>;

    /// Deliver a capture or error value
    fn set_value(&mut self, value: HostValue) -> Result<(), HostError>;

    /// Report the widget's rendered height in pixels
    fn set_frame_height(&mut self, height: u32) -> Result<(), HostError>;
}

impl<H: Host + ?Sized> Host for Box<H> {
    fn ready(&mut self) -> Result<(), HostError> {
        (**self).ready()
    }

    fn set_value(&mut self, value: HostValue) -> Result<(), HostError> {
        (**self).set_value(value)
    }

    fn set_frame_height(&mut self, height: u32) -> Result<(), HostError> {
        (**self).set_frame_height(height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_payload_shape() {
        let value = HostValue::Capture {
            data: "data:image/jpeg;base64,AAAA".into(),
            timestamp: 1_700_000_000_000,
        };
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json["type"], "capture");
        assert_eq!(json["data"], "data:image/jpeg;base64,AAAA");
        assert_eq!(json["timestamp"], 1_700_000_000_000i64);
    }

    #[test]
    fn test_error_payload_shape() {
        let json = serde_json::to_string(&HostValue::error("Permission denied")).unwrap();
        assert_eq!(json, r#"{"type":"error","message":"Permission denied"}"#);
    }

    #[test]
    fn test_render_event_parses() {
        let event: HostEvent =
            serde_json::from_str(r#"{"type":"render","active":true,"interval_seconds":3}"#)
                .unwrap();
        assert_eq!(event, HostEvent::Render(WidgetConfig::new(true, Some(3))));

        let event: HostEvent = serde_json::from_str(r#"{"type":"render"}"#).unwrap();
        assert_eq!(event, HostEvent::Render(WidgetConfig::default()));
    }

    #[test]
    fn test_outbound_message_shape() {
        let json = serde_json::to_string(&HostMessage::SetFrameHeight { height: 400 }).unwrap();
        assert_eq!(json, r#"{"type":"set_frame_height","height":400}"#);
        assert_eq!(
            serde_json::to_string(&HostMessage::Ready).unwrap(),
            r#"{"type":"ready"}"#
        );
    }
}
