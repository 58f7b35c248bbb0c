//! # Joystick Remote Library
//!
//! Fly an ArduPilot vehicle with a game controller.
//!
//! Joystick events are mapped to five RC channels (roll, pitch, throttle,
//! yaw, flight mode) and the current values are sent to the vehicle every
//! 10ms as a UDP RC input packet.

pub mod cli;
pub mod config;
pub mod controller;
pub mod error;
pub mod rcinput;
pub mod remote;
pub mod scheduler;
pub mod state;
