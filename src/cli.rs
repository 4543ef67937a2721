// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! This module provides command-line functionality for:
//! - Listing available cameras
//! - Running the widget against a host on stdio

use capture_widget::app::CaptureWidget;
use capture_widget::backends::camera::CameraBackend;
use capture_widget::config::Settings;
use capture_widget::host::StdioHost;
use capture_widget::host::stdio::stdin_events;
use std::sync::Arc;
use tracing::info;

/// List all available cameras
pub fn list_cameras(backend: Arc<dyn CameraBackend>) -> Result<(), Box<dyn std::error::Error>> {
    let cameras = backend.enumerate_cameras();

    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras ({}):", backend.name());
    println!();
    for (index, camera) in cameras.iter().enumerate() {
        println!("  [{}] {} ({})", index, camera.name, camera.path);
        if let Some(driver) = &camera.driver {
            println!("      Driver: {}", driver);
        }

        let formats = backend.get_formats(camera);
        if !formats.is_empty() {
            // Group by resolution and keep the best framerate
            let mut resolutions: Vec<(u32, u32, Option<u32>, String)> = Vec::new();
            for format in &formats {
                if let Some(existing) = resolutions
                    .iter_mut()
                    .find(|(w, h, _, _)| *w == format.width && *h == format.height)
                {
                    if format.framerate > existing.2 {
                        existing.2 = format.framerate;
                    }
                } else {
                    resolutions.push((
                        format.width,
                        format.height,
                        format.framerate,
                        format.pixel_format.clone(),
                    ));
                }
            }

            // Highest resolution first
            resolutions.sort_by(|a, b| (b.0 * b.1).cmp(&(a.0 * a.1)));

            let res_strs: Vec<String> = resolutions
                .iter()
                .take(4)
                .map(|(w, h, fps, fourcc)| match fps {
                    Some(fps) => format!("{}x{}@{}fps {}", w, h, fps, fourcc),
                    None => format!("{}x{} {}", w, h, fourcc),
                })
                .collect();

            println!("      Formats: {}", res_strs.join(", "));
        }
        println!();
    }

    Ok(())
}

/// Run the widget with a host speaking JSON lines on stdin/stdout
pub fn run_stdio(
    settings: Settings,
    backend: Arc<dyn CameraBackend>,
) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Runtime::new()?;

    let result = runtime.block_on(async move {
        let widget = CaptureWidget::new(Box::new(StdioHost::stdout()), backend, &settings);
        let events = stdin_events();

        info!("Running capture widget on stdio");
        widget.run(events).await
    });

    // A stdin read may still be parked on the blocking pool after unload
    runtime.shutdown_background();
    result?;
    Ok(())
}
