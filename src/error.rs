//! # Error Types
//!
//! Custom error types for Joystick Remote using `thiserror`.

use thiserror::Error;

/// Main error type for Joystick Remote
#[derive(Debug, Error)]
pub enum JoystickRemoteError {
    /// RC input wire protocol errors
    #[error("RC input protocol error: {0}")]
    Protocol(String),

    /// Input device errors (open, read, capability query)
    #[error("Input device error: {0}")]
    Device(String),

    /// Input device hung up while the capture loop was running
    #[error("Input device disconnected: {0}")]
    DeviceDisconnected(String),

    /// Profile name not present in the catalog
    #[error("Unknown joystick type: {0}")]
    UnknownProfile(String),

    /// Malformed custom mapping string or conflicting mapping entries
    #[error("Invalid mapping: {0}")]
    InvalidMapping(String),

    /// Destination parsing, resolution or socket errors
    #[error("Remote error: {0}")]
    Remote(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Joystick Remote
pub type Result<T> = std::result::Result<T, JoystickRemoteError>;
