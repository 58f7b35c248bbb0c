//! # RC Input Protocol Constants and Types
//!
//! Core definitions for the UDP RC input record.
//!
//! ## Wire Layout
//!
//! All fields are little-endian and packed with no padding:
//!
//! | Offset | Field | Type |
//! |--------|-------|------|
//! | 0 | version | u32 |
//! | 4 | timestamp_us | u64 |
//! | 12 | pwms | 16 × u16 |

/// Protocol version carried in every packet
pub const RCINPUT_UDP_VERSION: u32 = 1;

/// Number of PWM slots in a packet
pub const RCINPUT_UDP_NUM_CHANNELS: usize = 16;

/// Encoded packet size: version(4) + timestamp(8) + 16 channels × 2
pub const RCINPUT_UDP_PACKET_SIZE: usize = 4 + 8 + RCINPUT_UDP_NUM_CHANNELS * 2;

/// PWM value range for mapped control channels
pub const PWM_VALUE_MIN: u16 = 1100;
pub const PWM_VALUE_MAX: u16 = 1900;
pub const PWM_VALUE_CENTER: u16 = 1500;

/// PWM slots array type (unused slots are zero)
pub type RcPwms = [u16; RCINPUT_UDP_NUM_CHANNELS];

/// One RC input record as sent on the wire
///
/// Built fresh for every transmission; it holds no state between sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RcPacket {
    /// Protocol version, always [`RCINPUT_UDP_VERSION`] for packets we build
    pub version: u32,

    /// Monotonic microseconds since the transmission loop started
    pub timestamp_us: u64,

    /// PWM slots
    pub pwms: RcPwms,
}

impl RcPacket {
    /// Create a packet from the leading channel values
    ///
    /// Copies at most [`RCINPUT_UDP_NUM_CHANNELS`] values; the remaining
    /// slots stay zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use joystick_remote::rcinput::protocol::RcPacket;
    ///
    /// let packet = RcPacket::new(1234, &[1500, 1500, 1100, 1500, 1165]);
    /// assert_eq!(packet.version, 1);
    /// assert_eq!(packet.pwms[4], 1165);
    /// assert_eq!(packet.pwms[5], 0);
    /// ```
    #[must_use]
    pub fn new(timestamp_us: u64, channels: &[u16]) -> Self {
        let mut pwms = [0u16; RCINPUT_UDP_NUM_CHANNELS];
        let len = channels.len().min(RCINPUT_UDP_NUM_CHANNELS);
        pwms[..len].copy_from_slice(&channels[..len]);

        Self {
            version: RCINPUT_UDP_VERSION,
            timestamp_us,
            pwms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pwm_value_ranges() {
        assert_eq!(PWM_VALUE_MIN, 1100);
        assert_eq!(PWM_VALUE_MAX, 1900);
        assert_eq!(PWM_VALUE_CENTER, 1500);
    }

    #[test]
    fn test_packet_constants() {
        assert_eq!(RCINPUT_UDP_VERSION, 1);
        assert_eq!(RCINPUT_UDP_NUM_CHANNELS, 16);
        assert_eq!(RCINPUT_UDP_PACKET_SIZE, 44);
    }

    #[test]
    fn test_new_pads_unused_slots() {
        let packet = RcPacket::new(42, &[1500, 1600, 1700, 1800, 1165]);
        assert_eq!(packet.timestamp_us, 42);
        assert_eq!(&packet.pwms[..5], &[1500, 1600, 1700, 1800, 1165]);
        assert!(packet.pwms[5..].iter().all(|&pwm| pwm == 0));
    }

    #[test]
    fn test_new_truncates_extra_channels() {
        let channels = [1200u16; 20];
        let packet = RcPacket::new(0, &channels);
        assert_eq!(packet.pwms, [1200u16; RCINPUT_UDP_NUM_CHANNELS]);
    }
}
