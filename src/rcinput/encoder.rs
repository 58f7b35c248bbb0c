//! # RC Input Packet Encoder
//!
//! Encodes an [`RcPacket`] into its fixed-size wire form.

use bytes::{BufMut, Bytes, BytesMut};

use super::protocol::*;

/// Encode an RC input packet
///
/// # Arguments
///
/// * `packet` - Packet to encode
///
/// # Returns
///
/// * `Bytes` - 44-byte little-endian record (version + timestamp + 16 PWM slots)
///
/// # Examples
///
/// ```
/// use joystick_remote::rcinput::encoder::encode_rc_packet;
/// use joystick_remote::rcinput::protocol::RcPacket;
///
/// let packet = RcPacket::new(0, &[1500; 5]);
/// let bytes = encode_rc_packet(&packet);
/// assert_eq!(bytes.len(), 44);
/// assert_eq!(&bytes[0..4], &[1, 0, 0, 0]);
/// ```
pub fn encode_rc_packet(packet: &RcPacket) -> Bytes {
    let mut buf = BytesMut::with_capacity(RCINPUT_UDP_PACKET_SIZE);

    buf.put_u32_le(packet.version);
    buf.put_u64_le(packet.timestamp_us);
    for &pwm in packet.pwms.iter() {
        buf.put_u16_le(pwm);
    }

    buf.freeze()
}
