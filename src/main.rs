// SPDX-License-Identifier: GPL-3.0-only

use capture_widget::backends::camera::types::{CameraBackendType, FacingMode};
use capture_widget::backends::camera::{CameraBackend, get_backend_for_type};
use capture_widget::config::{Settings, WidgetConfig};
use capture_widget::constants::app_info;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;

mod cli;

#[derive(Parser)]
#[command(name = "capture-widget")]
#[command(about = "Webcam widget that periodically captures frames for a host application")]
#[command(version = app_info::version())]
#[command(subcommand_required = false)]
struct Cli {
    #[command(flatten)]
    options: Options,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the widget against a host on stdin/stdout (default)
    Run,

    /// Preview the widget in the terminal, acting as the host from the keyboard
    Preview,

    /// List available cameras
    List,
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendArg {
    V4l2,
    TestPattern,
}

#[derive(Clone, Copy, ValueEnum)]
enum FacingArg {
    User,
    Environment,
}

/// Overrides applied on top of the settings file
#[derive(Args)]
struct Options {
    /// Settings file (default: ~/.config/capture-widget/settings.json)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Camera backend
    #[arg(long, global = true, value_enum)]
    backend: Option<BackendArg>,

    /// Camera device path, e.g. /dev/video2
    #[arg(long, global = true)]
    device: Option<String>,

    /// Ideal capture width
    #[arg(long, global = true)]
    width: Option<u32>,

    /// Ideal capture height
    #[arg(long, global = true)]
    height: Option<u32>,

    /// Preferred camera direction
    #[arg(long, global = true, value_enum)]
    facing: Option<FacingArg>,

    /// Start capturing immediately
    #[arg(long, global = true)]
    active: bool,

    /// Seconds between captures
    #[arg(long, global = true)]
    interval: Option<u32>,

    /// Widget height reported to the host
    #[arg(long, global = true)]
    frame_height: Option<u32>,

    /// Image served by the test-pattern backend
    #[arg(long, global = true)]
    pattern_image: Option<PathBuf>,
}

impl Options {
    /// Load the settings file and apply command-line overrides
    fn resolve(&self) -> Result<Settings, Box<dyn std::error::Error>> {
        let mut settings = match self.settings.clone().or_else(Settings::default_path) {
            Some(path) => Settings::load(&path)?,
            None => Settings::default(),
        };

        if let Some(backend) = self.backend {
            settings.backend = match backend {
                BackendArg::V4l2 => CameraBackendType::V4l2,
                BackendArg::TestPattern => CameraBackendType::TestPattern,
            };
        }
        if let Some(device) = &self.device {
            settings.device = Some(device.clone());
        }
        if let Some(width) = self.width {
            settings.width = width;
        }
        if let Some(height) = self.height {
            settings.height = height;
        }
        if let Some(facing) = self.facing {
            settings.facing = match facing {
                FacingArg::User => FacingMode::User,
                FacingArg::Environment => FacingMode::Environment,
            };
        }
        if let Some(frame_height) = self.frame_height {
            settings.frame_height = frame_height;
        }
        if let Some(path) = &self.pattern_image {
            settings.pattern_image = Some(path.clone());
        }
        if self.active || self.interval.is_some() {
            let base = settings.initial.unwrap_or_default();
            settings.initial = Some(WidgetConfig::new(
                self.active || base.active,
                self.interval.or(Some(base.interval_seconds)),
            ));
        }

        settings.validate()?;
        Ok(settings)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging on stderr; stdout carries the host protocol
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=capture_widget=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let settings = cli.options.resolve()?;
    let backend: Arc<dyn CameraBackend> =
        get_backend_for_type(settings.backend, settings.pattern_image.clone());

    match cli.command {
        Some(Commands::List) => cli::list_cameras(backend),
        Some(Commands::Preview) => capture_widget::terminal::run(settings, backend),
        Some(Commands::Run) | None => cli::run_stdio(settings, backend),
    }
}
