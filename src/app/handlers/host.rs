// SPDX-License-Identifier: GPL-3.0-only

//! Host event handlers

use crate::app::state::{CaptureWidget, Flow};
use crate::config::WidgetConfig;
use crate::host::HostEvent;
use tracing::{debug, info, warn};

impl CaptureWidget {
    /// Single entry point for everything the host pushes
    pub fn handle_host_event(&mut self, event: HostEvent) -> Flow {
        match event {
            HostEvent::Render(config) => {
                self.apply_config(config);
                if let Err(e) = self.host.set_frame_height(self.frame_height) {
                    warn!(error = %e, "Failed to report frame height");
                }
                Flow::Continue
            }
            HostEvent::Unload => {
                info!("Host unloading widget");
                self.teardown();
                Flow::Exit
            }
        }
    }

    /// Apply a host config
    ///
    /// A config equal to the last applied one changes nothing. Otherwise the
    /// loop is started (acquiring a camera first if needed) or stopped.
    /// Only a switch from inactive to active retries a failed acquisition;
    /// an interval change while active does not.
    pub fn apply_config(&mut self, config: WidgetConfig) {
        if config == self.applied {
            debug!(?config, "Config unchanged");
            return;
        }

        info!(
            active = config.active,
            interval_seconds = config.interval_seconds,
            "Applying config"
        );
        let was_active = self.applied.active;
        self.applied = config;

        if !config.active {
            self.pending_start = false;
            self.stop_loop();
            return;
        }

        if self.stream.is_some() {
            self.start_loop();
        } else if self.camera.is_acquiring() {
            self.pending_start = true;
        } else if was_active {
            info!("Camera unavailable; toggle capture off and on to retry");
        } else {
            self.pending_start = true;
            self.acquire();
        }
    }
}
