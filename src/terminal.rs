// SPDX-License-Identifier: GPL-3.0-only

//! Terminal preview of the capture widget
//!
//! Hosts a [`CaptureWidget`] in-process and plays the host's part from the
//! keyboard. The live feed is drawn with Unicode half-block characters for
//! double vertical resolution; the bottom lines show the widget's status,
//! countdown and what the host-side inbox did with delivered frames.

use crate::app::{CaptureWidget, WidgetView};
use crate::backends::camera::CameraBackend;
use crate::backends::camera::format_converters::sample_pixel_rgb;
use crate::backends::camera::types::CameraFrame;
use crate::config::{Settings, WidgetConfig};
use crate::host::{ChannelHost, FrameInbox, HostHandle, HostMessage, InboxOutcome};

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal, backend::CrosstermBackend, buffer::Buffer, layout::Rect, style::Color,
    style::Style, widgets::Widget,
};
use std::io::{self, stdout};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Run the terminal preview until the user quits
pub fn run(
    settings: Settings,
    backend: Arc<dyn CameraBackend>,
) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Runtime::new()?;

    let (host, handle, events) = ChannelHost::pair();
    let widget = CaptureWidget::new(Box::new(host), backend, &settings);
    let view = widget.view();
    let widget_task = runtime.spawn(widget.run(events));

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let mut host = PreviewHost {
        handle,
        config: settings.initial.unwrap_or_default(),
        inbox: FrameInbox::default(),
        last_outcome: String::new(),
    };
    let result = run_app(&mut terminal, &mut host, view);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // Wait for the widget to release the camera
    if let Err(e) = host.handle.unload() {
        warn!(error = %e, "Widget already gone");
    }
    match runtime.block_on(widget_task) {
        Ok(Ok(())) => info!("Widget stopped"),
        Ok(Err(e)) => warn!(error = %e, "Widget exited with error"),
        Err(e) => warn!(error = %e, "Widget task failed"),
    }

    result
}

/// Host-side state of the preview
struct PreviewHost {
    handle: HostHandle,
    config: WidgetConfig,
    inbox: FrameInbox,
    last_outcome: String,
}

impl PreviewHost {
    fn push_config(&mut self) {
        if let Err(e) = self.handle.send(crate::host::HostEvent::Render(self.config)) {
            warn!(error = %e, "Widget no longer accepts config");
        }
    }

    /// Feed everything the widget sent through the inbox
    fn drain(&mut self) {
        while let Some(message) = self.handle.try_recv() {
            let HostMessage::SetValue { value } = message else {
                continue;
            };
            self.last_outcome = match self.inbox.process(&value) {
                InboxOutcome::Accepted(frame) => format!("accepted {} KiB", frame.bytes.len() / 1024),
                InboxOutcome::Replayed => "replayed".to_string(),
                InboxOutcome::Duplicate { similarity } => {
                    format!("duplicate ({:.0}% similar)", similarity * 100.0)
                }
                InboxOutcome::RateLimited { wait } => {
                    format!("rate limited, wait {}s", wait.as_secs())
                }
                InboxOutcome::WidgetError(message) => format!("error: {}", message),
                InboxOutcome::Invalid(message) => format!("invalid: {}", message),
            };
        }
    }
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    host: &mut PreviewHost,
    view: tokio::sync::watch::Receiver<WidgetView>,
) -> Result<(), Box<dyn std::error::Error>> {
    host.push_config();

    loop {
        host.drain();
        let snapshot = view.borrow().clone();
        let frame = snapshot
            .frames
            .as_ref()
            .and_then(|frames| frames.borrow().clone());

        terminal.draw(|f| {
            let area = f.area();

            // Reserve two bottom lines for status
            let camera_area = Rect {
                height: area.height.saturating_sub(2),
                ..area
            };
            f.render_widget(
                FrameWidget {
                    frame: frame.as_deref(),
                    placeholder: snapshot.error.as_deref(),
                },
                camera_area,
            );

            let flashing = snapshot.is_flashing(tokio::time::Instant::now());
            let status_area = Rect {
                y: area.height.saturating_sub(2),
                height: 1,
                ..area
            };
            f.render_widget(
                StatusBar {
                    message: &build_status_line(&snapshot, host),
                    highlight: flashing,
                },
                status_area,
            );

            let help_area = Rect {
                y: area.height.saturating_sub(1),
                height: 1,
                ..area
            };
            f.render_widget(
                StatusBar {
                    message: &build_help_line(host),
                    highlight: false,
                },
                help_area,
            );
        })?;

        // Handle input with timeout for frame updates
        if event::poll(Duration::from_millis(33))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            let ctrl_c =
                key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL);
            match key.code {
                _ if ctrl_c => break,
                KeyCode::Char('q') => break,
                KeyCode::Char(' ') => {
                    host.config.active = !host.config.active;
                    host.push_config();
                }
                KeyCode::Char('+') | KeyCode::Char('=') => {
                    host.config.interval_seconds = host.config.interval_seconds.saturating_add(1);
                    host.push_config();
                }
                KeyCode::Char('-') => {
                    host.config.interval_seconds = host.config.interval_seconds.saturating_sub(1).max(1);
                    host.push_config();
                }
                _ => {}
            }
        }
    }

    Ok(())
}

fn build_status_line(view: &WidgetView, host: &PreviewHost) -> String {
    let mut line = view.status.clone();
    if view.loading {
        line.push_str(" | ");
        line.push_str(crate::constants::text::LOADING);
    }
    if let Some(countdown) = &view.countdown {
        line.push_str(" | ");
        line.push_str(countdown);
    }

    let stats = host.inbox.stats();
    line.push_str(&format!(
        " | sent {} | accepted {} dup {} limited {} errors {}",
        view.stats.captures, stats.accepted, stats.duplicates, stats.rate_limited, stats.errors
    ));
    if !host.last_outcome.is_empty() {
        line.push_str(" | last: ");
        line.push_str(&host.last_outcome);
    }
    line
}

fn build_help_line(host: &PreviewHost) -> String {
    format!(
        "space: {} | +/-: interval ({}s) | q: quit",
        if host.config.active { "pause" } else { "start" },
        host.config.interval_seconds
    )
}

/// Widget that renders a camera frame using half-block characters
struct FrameWidget<'a> {
    frame: Option<&'a CameraFrame>,
    placeholder: Option<&'a str>,
}

impl Widget for FrameWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(frame) = self.frame.filter(|f| f.width > 0 && f.height > 0) else {
            let msg = self.placeholder.unwrap_or("Waiting for camera...");
            let x = area.x + (area.width.saturating_sub(msg.len() as u16)) / 2;
            let y = area.y + area.height / 2;
            if y < area.y + area.height && x < area.x + area.width {
                buf.set_string(x, y, msg, Style::default());
            }
            return;
        };

        // Each terminal cell displays 2 vertical pixels using half-block characters
        let frame_aspect = frame.width as f64 / frame.height as f64;
        let term_width = area.width as f64;
        let term_height = (area.height * 2) as f64;

        let (display_width, display_height) = if term_width / term_height > frame_aspect {
            let w = term_height * frame_aspect;
            (w as u16, (term_height / 2.0) as u16)
        } else {
            let h = term_width / frame_aspect;
            (term_width as u16, (h / 2.0) as u16)
        };
        if display_width == 0 || display_height == 0 {
            return;
        }

        // Center the image
        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;

        let x_scale = frame.width as f64 / display_width as f64;
        let y_scale = frame.height as f64 / (display_height * 2) as f64;

        for ty in 0..display_height {
            for tx in 0..display_width {
                let src_x = (tx as f64 * x_scale) as u32;
                let src_y_top = (ty as f64 * 2.0 * y_scale) as u32;
                let src_y_bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as u32;

                let [r, g, b] = sample_pixel_rgb(frame, src_x, src_y_top);
                let top = Color::Rgb(r, g, b);
                let [r, g, b] = sample_pixel_rgb(frame, src_x, src_y_bottom);
                let bottom = Color::Rgb(r, g, b);

                if let Some(cell) = buf.cell_mut((x_offset + tx, y_offset + ty)) {
                    cell.set_char('▀');
                    cell.set_fg(top);
                    cell.set_bg(bottom);
                }
            }
        }
    }
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
    /// Capture flash
    highlight: bool,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (fg, bg) = if self.highlight {
            (Color::Black, Color::White)
        } else {
            (Color::White, Color::DarkGray)
        };

        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(bg);
            }
        }

        let text: String = self.message.chars().take(area.width as usize).collect();
        buf.set_string(area.x, area.y, text, Style::default().fg(fg).bg(bg));
    }
}
