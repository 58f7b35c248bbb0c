//! Command-line interface.
//!
//! Every flag except `--list` and `--config` overrides the matching
//! configuration file value.

use std::path::PathBuf;

use clap::Parser;

use crate::config::Config;

#[derive(Parser, Debug, Default)]
#[command(name = "joystick-remote")]
#[command(version)]
#[command(about = "Fly an ArduPilot vehicle with a game controller over UDP")]
pub struct Cli {
    /// Input device (e.g. /dev/input/js0 or /dev/input/event3)
    #[arg(short, long, value_name = "PATH")]
    pub device: Option<String>,

    /// Joystick type: xbox360 (x), skycontroller (s), playstation3 (ps3),
    /// nvidiashield (nvda) or custom (c)
    #[arg(short = 't', long = "type", value_name = "NAME")]
    pub joystick_type: Option<String>,

    /// Custom mapping: six mode buttons, then axis,direction pairs for
    /// roll, pitch, throttle and yaw
    #[arg(short, long, value_name = "STRING", allow_hyphen_values = true)]
    pub mapping: Option<String>,

    /// Vehicle address
    #[arg(short, long, value_name = "HOST:PORT")]
    pub remote: Option<String>,

    /// Show channel values on the terminal instead of sending them
    #[arg(short, long)]
    pub simulation: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// List input devices and exit
    #[arg(short, long)]
    pub list: bool,

    /// Configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Apply command-line overrides to a loaded configuration
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(device) = &self.device {
            config.device.path = device.clone();
        }
        if let Some(name) = &self.joystick_type {
            config.profile.name = name.clone();
        }
        if let Some(mapping) = &self.mapping {
            config.profile.mapping = mapping.clone();
        }
        if let Some(remote) = &self.remote {
            config.remote.address = remote.clone();
        }
        if self.simulation {
            config.transmit.simulation = true;
        }
        if self.verbose {
            config.logging.verbose = true;
        }
    }
}
