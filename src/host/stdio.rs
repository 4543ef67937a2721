// SPDX-License-Identifier: GPL-3.0-only

//! JSON-lines host over stdio
//!
//! One JSON object per line in each direction. Outbound:
//!
//! ```text
//! {"type":"ready"}
//! {"type":"set_value","value":{"type":"capture","data":"data:image/jpeg;base64,...","timestamp":1700000000000}}
//! {"type":"set_frame_height","height":400}
//! ```
//!
//! Inbound:
//!
//! ```text
//! {"type":"render","active":true,"interval_seconds":5}
//! {"type":"unload"}
//! ```

use super::{Host, HostEvent, HostEventReceiver, HostMessage, HostValue};
use crate::errors::HostError;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Host writing JSON lines to a writer (stdout in production)
pub struct StdioHost<W: Write + Send> {
    writer: W,
}

impl<W: Write + Send> StdioHost<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Give back the writer (used by tests to inspect output)
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_message(&mut self, message: &HostMessage) -> Result<(), HostError> {
        let line =
            serde_json::to_string(message).map_err(|e| HostError::Protocol(e.to_string()))?;
        writeln!(self.writer, "{}", line)?;
        self.writer.flush()?;
        Ok(())
    }
}

impl StdioHost<std::io::Stdout> {
    /// Host on the process's stdout
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> Host for StdioHost<W> {
    fn ready(&mut self) -> Result<(), HostError> {
        self.write_message(&HostMessage::Ready)
    }

    fn set_value(&mut self, value: HostValue) -> Result<(), HostError> {
        self.write_message(&HostMessage::SetValue { value })
    }

    fn set_frame_height(&mut self, height: u32) -> Result<(), HostError> {
        self.write_message(&HostMessage::SetFrameHeight { height })
    }
}

/// Parse one inbound line; blank lines yield `None`
pub fn parse_event(line: &str) -> Result<Option<HostEvent>, HostError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(line)
        .map(Some)
        .map_err(|e| HostError::Protocol(format!("{}: {}", e, line)))
}

/// Read host events from `reader` on a background task
///
/// Malformed lines are logged and skipped. End of input is reported as
/// [`HostEvent::Unload`] so the widget releases the camera when the host
/// process goes away.
pub fn spawn_event_reader<R>(reader: R) -> HostEventReceiver
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let mut lines = reader.lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => match parse_event(&line) {
                    Ok(Some(event)) => {
                        debug!(?event, "Host event");
                        if tx.send(event).is_err() {
                            return;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => warn!(error = %e, "Ignoring malformed host message"),
                },
                Ok(None) => {
                    info!("Host closed its input, unloading");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to read from host, unloading");
                    break;
                }
            }
        }
        let _ = tx.send(HostEvent::Unload);
    });

    rx
}

/// Read host events from the process's stdin
pub fn stdin_events() -> HostEventReceiver {
    spawn_event_reader(tokio::io::BufReader::new(tokio::io::stdin()))
}
