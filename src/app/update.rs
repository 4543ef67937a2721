// SPDX-License-Identifier: GPL-3.0-only

//! Message dispatch
//!
//! `update` routes each [`Message`] to a handler in `handlers`:
//!
//! - `handlers::host`: config application and unload
//! - `handlers::camera`: acquisition results and teardown
//! - `handlers::capture`: capture loop and timer ticks

use crate::app::state::{CaptureWidget, Flow, Message};

impl CaptureWidget {
    /// Handle one message; returns [`Flow::Exit`] once the widget is torn down
    pub fn update(&mut self, message: Message) -> Flow {
        match message {
            Message::Host(event) => self.handle_host_event(event),
            Message::CameraAcquired(result) => {
                self.handle_camera_acquired(result);
                Flow::Continue
            }
            Message::CaptureTick => {
                self.handle_capture_timer();
                Flow::Continue
            }
            Message::CountdownTick => {
                self.countdown_tick();
                Flow::Continue
            }
        }
    }
}
