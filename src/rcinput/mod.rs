//! # RC Input UDP Protocol Module
//!
//! Implementation of the ArduPilot `RCInput_UDP` packet format.
//!
//! This module handles:
//! - Packet layout constants (version, channel count, PWM range)
//! - Encoding a channel set into the 44-byte little-endian wire record
//! - Decoding received records for diagnostics and tests

pub mod protocol;
pub mod encoder;
pub mod decoder;
