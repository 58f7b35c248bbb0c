//! # RC Input Packet Decoder
//!
//! Decodes received RC input records. The bridge itself only transmits;
//! decoding is used by receiver-side tooling and to check what went out.

use bytes::Buf;

use super::protocol::*;
use crate::error::{JoystickRemoteError, Result};

/// Decode an RC input record
///
/// # Arguments
///
/// * `datagram` - Received bytes (exactly one record)
///
/// # Returns
///
/// * `Result<RcPacket>` - Decoded packet, or error if invalid
///
/// # Errors
///
/// Returns error if:
/// - Datagram size differs from [`RCINPUT_UDP_PACKET_SIZE`]
/// - Version field is not [`RCINPUT_UDP_VERSION`]
pub fn decode_rc_packet(datagram: &[u8]) -> Result<RcPacket> {
    if datagram.len() != RCINPUT_UDP_PACKET_SIZE {
        return Err(JoystickRemoteError::Protocol(format!(
            "Bad packet size: expected {} bytes, got {}",
            RCINPUT_UDP_PACKET_SIZE,
            datagram.len()
        )));
    }

    let mut buf = datagram;
    let version = buf.get_u32_le();
    if version != RCINPUT_UDP_VERSION {
        return Err(JoystickRemoteError::Protocol(format!(
            "Unsupported version: {}",
            version
        )));
    }

    let timestamp_us = buf.get_u64_le();
    let mut pwms = [0u16; RCINPUT_UDP_NUM_CHANNELS];
    for pwm in pwms.iter_mut() {
        *pwm = buf.get_u16_le();
    }

    Ok(RcPacket {
        version,
        timestamp_us,
        pwms,
    })
}
