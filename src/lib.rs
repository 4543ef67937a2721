// SPDX-License-Identifier: MPL-2.0

//! Capture widget - periodic webcam snapshots for a host application
//!
//! The widget opens a camera, shows a live preview and, while the host has
//! capture switched on, grabs a frame every few seconds, encodes it as a JPEG
//! data URL and hands it to the host.
//!
//! # Architecture
//!
//! - [`app`]: the widget itself (event loop, timers, handlers, view)
//! - [`backends`]: camera backends (V4L2, test pattern)
//! - [`pipelines`]: frame drawing and JPEG encoding
//! - [`host`]: host channel adapters and host-side frame filtering
//! - [`config`]: host config and start-up settings
//! - [`terminal`]: terminal preview
//!
//! # Example
//!
//! ```no_run
//! use capture_widget::app::CaptureWidget;
//! use capture_widget::backends::camera::TestPatternBackend;
//! use capture_widget::config::Settings;
//! use capture_widget::host::ChannelHost;
//! use std::sync::Arc;
//!
//! # async fn demo() -> capture_widget::errors::AppResult<()> {
//! let (host, handle, events) = ChannelHost::pair();
//! let widget = CaptureWidget::new(
//!     Box::new(host),
//!     Arc::new(TestPatternBackend::new(None)),
//!     &Settings::default(),
//! );
//! handle.render(true, Some(5))?;
//! widget.run(events).await
//! # }
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod host;
pub mod pipelines;
pub mod terminal;

// Re-export commonly used types
pub use app::{CaptureWidget, WidgetView};
pub use config::{Settings, WidgetConfig};
pub use host::{Host, HostEvent, HostValue};
