//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every section and field is optional when parsing; missing values take the
//! defaults below. The input device and joystick type have no default and
//! must be given in the file or on the command line. Command-line flags are applied on top (see [`crate::cli`]) and the
//! merged result is checked with [`Config::validate`].

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::controller::profile::{mapping_valid, Profile};
use crate::error::{JoystickRemoteError, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub device: DeviceConfig,
    pub profile: ProfileConfig,
    pub remote: RemoteConfig,
    pub transmit: TransmitConfig,
    pub logging: LoggingConfig,
}

/// Input device configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DeviceConfig {
    /// Input device node, required
    #[serde(default)]
    pub path: String,
}

/// Controller profile configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ProfileConfig {
    /// Joystick type or alias, required
    #[serde(default)]
    pub name: String,

    /// Custom mapping string, used when `name` is `custom`
    #[serde(default)]
    pub mapping: String,
}

/// Destination configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct RemoteConfig {
    /// `host:port` of the vehicle
    #[serde(default)]
    pub address: String,
}

/// Transmission loop configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TransmitConfig {
    #[serde(default = "default_period_ms")]
    pub period_ms: u64,

    #[serde(default = "default_status_interval_packets")]
    pub status_interval_packets: u64,

    /// Draw channel values on the terminal instead of sending them
    #[serde(default)]
    pub simulation: bool,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub verbose: bool,

    /// Optional log file, written in addition to stderr
    #[serde(default)]
    pub file: String,
}

// Default value functions
fn default_period_ms() -> u64 { 10 }
fn default_status_interval_packets() -> u64 { 1000 }

impl Default for TransmitConfig {
    fn default() -> Self {
        Self {
            period_ms: default_period_ms(),
            status_interval_packets: default_status_interval_packets(),
            simulation: false,
        }
    }
}

fn invalid(msg: &str) -> JoystickRemoteError {
    JoystickRemoteError::Config(toml::de::Error::custom(msg))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// The file is parsed but not validated; validate after command-line
    /// overrides have been applied.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use joystick_remote::config::Config;
    ///
    /// let config = Config::load("joystick-remote.toml")?;
    /// config.validate()?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns `Config` error if any value is missing or out of range
    pub fn validate(&self) -> Result<()> {
        if self.device.path.is_empty() {
            return Err(invalid("no input device specified (use -d or [device] path)"));
        }

        if self.profile.name.is_empty() {
            return Err(invalid("no joystick type specified (use -t or [profile] name)"));
        }

        if !Profile::is_known_name(&self.profile.name) {
            return Err(invalid(&format!(
                "unknown joystick type \"{}\" (expected xbox360, skycontroller, playstation3, nvidiashield or custom)",
                self.profile.name
            )));
        }

        if Profile::is_custom_name(&self.profile.name) {
            if self.profile.mapping.is_empty() {
                return Err(invalid("custom joystick type requires a mapping"));
            }
            if !mapping_valid(&self.profile.mapping) {
                return Err(invalid("mapping must have exactly 14 comma-separated fields"));
            }
        }

        if !self.transmit.simulation && self.remote.address.is_empty() {
            return Err(invalid("remote address is required unless running in simulation"));
        }

        if self.transmit.period_ms == 0 || self.transmit.period_ms > 1000 {
            return Err(invalid("period_ms must be between 1 and 1000"));
        }

        if self.transmit.status_interval_packets == 0 {
            return Err(invalid("status_interval_packets must be greater than 0"));
        }

        Ok(())
    }

    /// Custom mapping string, if one is configured
    pub fn mapping(&self) -> Option<&str> {
        Some(self.profile.mapping.as_str()).filter(|m| !m.is_empty())
    }

    /// Log file path, if one is configured
    pub fn log_file(&self) -> Option<&Path> {
        Some(self.logging.file.as_str())
            .filter(|f| !f.is_empty())
            .map(Path::new)
    }
}
