//! # Control State Module
//!
//! The single shared record of the latest channel values.
//!
//! The capture thread writes one field per input event through
//! [`ControlState::apply`]; the transmission loop copies the whole set through
//! [`ControlState::snapshot`]. Both hold the same lock for their whole critical
//! section, so a snapshot never sees a half-written value.
//!
//! ## Usage
//!
//! ```
//! use std::sync::Arc;
//! use joystick_remote::state::{Channel, ChannelUpdate, ControlState};
//!
//! let state = Arc::new(ControlState::new(1500));
//! state.apply(ChannelUpdate::new(Channel::Roll, 1900));
//!
//! let channels = state.snapshot();
//! assert_eq!(channels.roll, 1900);
//! ```

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::rcinput::protocol::{PWM_VALUE_CENTER, PWM_VALUE_MAX, PWM_VALUE_MIN};

/// Number of control channels carried by a [`ChannelSet`].
pub const NUM_CONTROL_CHANNELS: usize = 5;

/// The five control channels, in wire slot order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Roll,
    Pitch,
    Throttle,
    Yaw,
    Mode,
}

impl Channel {
    /// All channels in wire slot order.
    pub const ALL: [Channel; NUM_CONTROL_CHANNELS] = [
        Channel::Roll,
        Channel::Pitch,
        Channel::Throttle,
        Channel::Yaw,
        Channel::Mode,
    ];

    /// Human-readable label used by logs and the simulation display.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Channel::Roll => "Roll",
            Channel::Pitch => "Pitch",
            Channel::Throttle => "Throttle",
            Channel::Yaw => "Yaw",
            Channel::Mode => "Mode",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Latest PWM value of every control channel.
///
/// Every field stays within [`PWM_VALUE_MIN`]..=[`PWM_VALUE_MAX`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelSet {
    pub roll: u16,
    pub pitch: u16,
    pub throttle: u16,
    pub yaw: u16,
    pub mode: u16,
}

impl ChannelSet {
    /// Creates a neutral channel set: sticks centered, mode at `mode_default`.
    ///
    /// `mode_default` is clamped into the PWM range.
    #[must_use]
    pub fn neutral(mode_default: u16) -> Self {
        Self {
            roll: PWM_VALUE_CENTER,
            pitch: PWM_VALUE_CENTER,
            throttle: PWM_VALUE_CENTER,
            yaw: PWM_VALUE_CENTER,
            mode: mode_default.clamp(PWM_VALUE_MIN, PWM_VALUE_MAX),
        }
    }

    /// Returns the value of one channel.
    #[must_use]
    pub fn get(&self, channel: Channel) -> u16 {
        match channel {
            Channel::Roll => self.roll,
            Channel::Pitch => self.pitch,
            Channel::Throttle => self.throttle,
            Channel::Yaw => self.yaw,
            Channel::Mode => self.mode,
        }
    }

    fn set(&mut self, channel: Channel, value: u16) {
        let value = value.clamp(PWM_VALUE_MIN, PWM_VALUE_MAX);
        match channel {
            Channel::Roll => self.roll = value,
            Channel::Pitch => self.pitch = value,
            Channel::Throttle => self.throttle = value,
            Channel::Yaw => self.yaw = value,
            Channel::Mode => self.mode = value,
        }
    }

    /// Returns the values in wire slot order (roll, pitch, throttle, yaw, mode).
    ///
    /// # Examples
    ///
    /// ```
    /// use joystick_remote::state::ChannelSet;
    ///
    /// let set = ChannelSet::neutral(1165);
    /// assert_eq!(set.to_array(), [1500, 1500, 1500, 1500, 1165]);
    /// ```
    #[must_use]
    pub fn to_array(&self) -> [u16; NUM_CONTROL_CHANNELS] {
        [self.roll, self.pitch, self.throttle, self.yaw, self.mode]
    }
}

impl Default for ChannelSet {
    fn default() -> Self {
        Self::neutral(PWM_VALUE_CENTER)
    }
}

/// A single-field write produced by the channel mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelUpdate {
    pub channel: Channel,
    pub value: u16,
}

impl ChannelUpdate {
    #[must_use]
    pub fn new(channel: Channel, value: u16) -> Self {
        Self { channel, value }
    }
}

/// Lock-guarded [`ChannelSet`] shared between the capture and transmit loops.
///
/// # Thread Safety
///
/// `ControlState` is `Sync`; share it with `Arc<ControlState>`.
#[derive(Debug)]
pub struct ControlState {
    channels: Mutex<ChannelSet>,
}

impl Default for ControlState {
    fn default() -> Self {
        Self::new(PWM_VALUE_CENTER)
    }
}

impl ControlState {
    /// Creates a control state holding a neutral channel set.
    #[must_use]
    pub fn new(mode_default: u16) -> Self {
        Self {
            channels: Mutex::new(ChannelSet::neutral(mode_default)),
        }
    }

    /// Writes one channel value under the lock.
    pub fn apply(&self, update: ChannelUpdate) {
        self.lock().set(update.channel, update.value);
    }

    /// Copies the whole channel set under the lock.
    #[must_use]
    pub fn snapshot(&self) -> ChannelSet {
        *self.lock()
    }

    // A writer that panicked mid-update cannot leave a torn value behind:
    // every write is a single clamped field store.
    fn lock(&self) -> MutexGuard<'_, ChannelSet> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_neutral_channel_set() {
        let set = ChannelSet::neutral(1500);
        assert_eq!(set.to_array(), [1500; NUM_CONTROL_CHANNELS]);
    }

    #[test]
    fn test_neutral_clamps_mode_default() {
        assert_eq!(ChannelSet::neutral(0).mode, PWM_VALUE_MIN);
        assert_eq!(ChannelSet::neutral(u16::MAX).mode, PWM_VALUE_MAX);
    }

    #[test]
    fn test_get_matches_array_order() {
        let set = ChannelSet {
            roll: 1100,
            pitch: 1200,
            throttle: 1300,
            yaw: 1400,
            mode: 1685,
        };
        let array = set.to_array();
        for (index, channel) in Channel::ALL.iter().enumerate() {
            assert_eq!(set.get(*channel), array[index]);
        }
    }

    #[test]
    fn test_apply_updates_single_field() {
        let state = ControlState::new(1500);
        state.apply(ChannelUpdate::new(Channel::Throttle, 1100));

        let set = state.snapshot();
        assert_eq!(set.throttle, 1100);
        assert_eq!(set.roll, 1500);
        assert_eq!(set.pitch, 1500);
        assert_eq!(set.yaw, 1500);
        assert_eq!(set.mode, 1500);
    }

    #[test]
    fn test_apply_clamps_out_of_range() {
        let state = ControlState::default();
        state.apply(ChannelUpdate::new(Channel::Yaw, 3000));
        state.apply(ChannelUpdate::new(Channel::Pitch, 10));

        let set = state.snapshot();
        assert_eq!(set.yaw, PWM_VALUE_MAX);
        assert_eq!(set.pitch, PWM_VALUE_MIN);
    }

    #[test]
    fn test_apply_same_update_twice_is_idempotent() {
        let state = ControlState::default();
        state.apply(ChannelUpdate::new(Channel::Roll, 1750));
        let first = state.snapshot();
        state.apply(ChannelUpdate::new(Channel::Roll, 1750));
        assert_eq!(state.snapshot(), first);
    }

    #[test]
    fn test_concurrent_snapshot_stays_in_range() {
        let state = Arc::new(ControlState::default());

        let writers: Vec<_> = Channel::ALL
            .iter()
            .map(|&channel| {
                let state = Arc::clone(&state);
                thread::spawn(move || {
                    for i in 0..5_000u32 {
                        let value = if i % 2 == 0 { PWM_VALUE_MIN } else { PWM_VALUE_MAX };
                        state.apply(ChannelUpdate::new(channel, value));
                    }
                })
            })
            .collect();

        for _ in 0..5_000 {
            let set = state.snapshot();
            for value in set.to_array() {
                assert!((PWM_VALUE_MIN..=PWM_VALUE_MAX).contains(&value));
            }
        }

        for writer in writers {
            writer.join().unwrap();
        }
    }

    #[test]
    fn test_channel_labels() {
        assert_eq!(Channel::Roll.to_string(), "Roll");
        assert_eq!(Channel::Mode.label(), "Mode");
    }
}
