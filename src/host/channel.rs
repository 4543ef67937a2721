// SPDX-License-Identifier: GPL-3.0-only

//! In-process host over tokio channels
//!
//! [`ChannelHost`] is handed to the widget; the matching [`HostHandle`] stays
//! with whoever embeds it (the terminal preview, or a test) to push events and
//! read back what the widget sent.

use super::{Host, HostEvent, HostEventReceiver, HostEventSender, HostMessage, HostValue};
use crate::config::WidgetConfig;
use crate::errors::HostError;
use tokio::sync::mpsc;

/// Widget side of an in-process host
pub struct ChannelHost {
    outbound: Option<mpsc::UnboundedSender<HostMessage>>,
}

/// Embedder side of an in-process host
pub struct HostHandle {
    events: HostEventSender,
    messages: mpsc::UnboundedReceiver<HostMessage>,
}

impl ChannelHost {
    /// Create a connected host, its handle, and the event stream for the widget
    pub fn pair() -> (ChannelHost, HostHandle, HostEventReceiver) {
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        (
            ChannelHost {
                outbound: Some(out_tx),
            },
            HostHandle {
                events: event_tx,
                messages: out_rx,
            },
            event_rx,
        )
    }

    /// A host that was never attached; every call fails
    pub fn detached() -> ChannelHost {
        ChannelHost { outbound: None }
    }

    fn send(&self, message: HostMessage) -> Result<(), HostError> {
        let outbound = self
            .outbound
            .as_ref()
            .ok_or_else(|| HostError::Unavailable("no host attached".into()))?;
        outbound
            .send(message)
            .map_err(|_| HostError::Unavailable("host dropped its handle".into()))
    }
}

impl Host for ChannelHost {
    fn ready(&mut self) -> Result<(), HostError> {
        self.send(HostMessage::Ready)
    }

    fn set_value(&mut self, value: HostValue) -> Result<(), HostError> {
        self.send(HostMessage::SetValue { value })
    }

    fn set_frame_height(&mut self, height: u32) -> Result<(), HostError> {
        self.send(HostMessage::SetFrameHeight { height })
    }
}

impl HostHandle {
    /// Push an event to the widget
    pub fn send(&self, event: HostEvent) -> Result<(), HostError> {
        self.events
            .send(event)
            .map_err(|_| HostError::Unavailable("widget has exited".into()))
    }

    /// Push a configuration
    pub fn render(&self, active: bool, interval_seconds: Option<u32>) -> Result<(), HostError> {
        self.send(HostEvent::Render(WidgetConfig::new(active, interval_seconds)))
    }

    /// Ask the widget to tear down
    pub fn unload(&self) -> Result<(), HostError> {
        self.send(HostEvent::Unload)
    }

    /// Wait for the next message from the widget
    pub async fn recv(&mut self) -> Option<HostMessage> {
        self.messages.recv().await
    }

    /// Take a message if one is already queued
    pub fn try_recv(&mut self) -> Option<HostMessage> {
        self.messages.try_recv().ok()
    }

    /// Drain every queued message
    pub fn drain(&mut self) -> Vec<HostMessage> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }

    /// Drain queued messages, keeping only delivered values
    pub fn drain_values(&mut self) -> Vec<HostValue> {
        self.drain()
            .into_iter()
            .filter_map(|message| match message {
                HostMessage::SetValue { value } => Some(value),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detached_host_fails() {
        let mut host = ChannelHost::detached();
        assert!(matches!(host.ready(), Err(HostError::Unavailable(_))));
    }

    #[test]
    fn test_pair_round_trip() {
        let (mut host, mut handle, mut events) = ChannelHost::pair();
        host.ready().unwrap();
        host.set_value(HostValue::error("boom")).unwrap();
        host.set_frame_height(400).unwrap();

        assert_eq!(handle.try_recv(), Some(HostMessage::Ready));
        assert_eq!(handle.drain_values(), vec![HostValue::error("boom")]);

        handle.render(true, None).unwrap();
        assert_eq!(
            events.try_recv().unwrap(),
            HostEvent::Render(WidgetConfig::new(true, Some(5)))
        );
    }
}
