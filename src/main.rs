//! # Joystick Remote
//!
//! Fly an ArduPilot vehicle with a game controller.
//!
//! Reads a joystick on a capture thread, keeps the latest roll, pitch,
//! throttle, yaw and mode values in shared state, and sends them to the
//! vehicle as UDP RC input packets every 10ms.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use joystick_remote::cli::Cli;
use joystick_remote::config::Config;
use joystick_remote::controller::capture::{CaptureFailure, InputCapture};
use joystick_remote::controller::channel_mapper::ChannelMapper;
use joystick_remote::controller::event::EventSource;
use joystick_remote::controller::profile::Profile;
use joystick_remote::controller::{list_devices, open_device};
use joystick_remote::remote::console::ConsoleDisplay;
use joystick_remote::remote::sink::FrameSink;
use joystick_remote::remote::UdpRemote;
use joystick_remote::scheduler::Transmitter;
use joystick_remote::state::ControlState;

/// Main entry point for Joystick Remote
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Parse the command line and merge it over the configuration file
///    - Set up logging (stderr, plus an optional log file)
///    - Resolve the controller profile and build the channel lookup tables
///    - Open the input device
///    - Resolve the vehicle address (or open the simulation display)
///    - Start the capture thread
///
/// 2. **Main Loop**
///    - Send the current channel values every period
///    - Log status every `status_interval_packets` packets
///
/// 3. **Shutdown**
///    - Ctrl+C stops transmission and exits cleanly
///    - A lost or failing input device stops transmission and exits non-zero
///
/// # Errors
///
/// Returns error if:
/// - The configuration is missing, malformed or invalid
/// - The profile or mapping is invalid
/// - The input device cannot be opened
/// - The vehicle address cannot be resolved
/// - The input device fails while running
///
/// # Examples
///
/// ```bash
/// joystick-remote -d /dev/input/js0 -t xbox360 -r 192.168.1.1:777
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };
    cli.apply_to(&mut config);

    let _log_guard = init_logging(&config)?;

    if cli.list {
        print_devices()?;
        return Ok(());
    }

    config.validate()?;

    info!("Joystick Remote v{} starting...", env!("CARGO_PKG_VERSION"));

    let profile = Profile::resolve(&config.profile.name, config.mapping())?;
    info!("Using joystick type: {}", profile.name);
    let mapper = Arc::new(ChannelMapper::from_profile(&profile)?);
    let state = Arc::new(ControlState::new(profile.mode_default));

    let source = open_device(&config.device.path)
        .with_context(|| format!("Failed to open input device {}", config.device.path))?;
    info!("Opened {}", source.info());

    let period = Duration::from_millis(config.transmit.period_ms);
    let status_interval = config.transmit.status_interval_packets;

    // The output is ready before the capture thread starts, so a bad
    // destination aborts without leaving a thread behind
    if config.transmit.simulation {
        info!("Simulation mode: channel values are not sent");
        let transmitter = Transmitter::new(state, ConsoleDisplay::stdout(), period, status_interval);
        run_pipeline(source, mapper, transmitter).await
    } else {
        let remote = UdpRemote::connect(&config.remote.address).await?;
        let transmitter = Transmitter::new(state, remote, period, status_interval);
        run_pipeline(source, mapper, transmitter).await
    }
}

/// Start the capture thread and transmit until Ctrl+C or a capture failure
async fn run_pipeline<S: FrameSink>(
    source: Box<dyn EventSource>,
    mapper: Arc<ChannelMapper>,
    transmitter: Transmitter<S>,
) -> Result<()> {
    let (capture, failure) = InputCapture::spawn(source, mapper, transmitter.state())?;

    let outcome = run_until_interrupted(transmitter, failure).await;

    if capture.is_finished() {
        capture.join()?;
    } else {
        // The capture thread may be blocked in a device read; it ends with the process
        capture.shutdown();
    }

    outcome
}

/// Run the transmission loop until Ctrl+C or a fatal capture error
async fn run_until_interrupted<S: FrameSink>(
    mut transmitter: Transmitter<S>,
    failure: CaptureFailure,
) -> Result<()> {
    info!("Press Ctrl+C to exit");

    let outcome = tokio::select! {
        result = transmitter.run(failure) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
            Ok(())
        }
    };

    info!("Total packets sent: {}", transmitter.packets_sent());
    outcome.context("Transmission stopped")
}

/// Set up the tracing subscriber
///
/// Logs go to stderr; with `logging.file` set they are also written to that
/// file through a non-blocking writer whose guard must be kept alive.
fn init_logging(config: &Config) -> Result<Option<WorkerGuard>> {
    let level = if config.logging.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    let (file_layer, guard) = match config.log_file() {
        Some(path) => {
            let directory = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new("."));
            let file_name = path
                .file_name()
                .with_context(|| format!("Invalid log file path {}", path.display()))?;

            let appender = tracing_appender::rolling::never(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(guard)
}

/// Print the available input devices
fn print_devices() -> Result<()> {
    let devices = list_devices()?;
    if devices.is_empty() {
        warn!("No input devices found");
    }
    for device in devices {
        println!("{}", device);
    }
    Ok(())
}
