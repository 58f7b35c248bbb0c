//! # RC Channel Mapper Module
//!
//! Maps raw joystick events to control channel updates.
//!
//! ## Value Ranges
//!
//! - Raw axis input: -32767 to 32767 (after direction sign)
//! - PWM output: 1100 to 1900
//! - Center value: 1500
//!
//! ## Usage
//!
//! ```
//! use joystick_remote::controller::channel_mapper::ChannelMapper;
//! use joystick_remote::controller::event::RawEvent;
//! use joystick_remote::controller::profile::Profile;
//! use joystick_remote::state::{Channel, ChannelUpdate};
//!
//! let mapper = ChannelMapper::from_profile(&Profile::xbox360())?;
//!
//! // Right stick full right on an Xbox 360 pad
//! let update = mapper.map_event(&RawEvent::axis(3, 32767));
//! assert_eq!(update, Some(ChannelUpdate::new(Channel::Roll, 1900)));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::collections::HashMap;

use tracing::debug;

use super::event::{EventKind, RawEvent};
use super::profile::{Profile, AXIS_CHANNELS};
use crate::error::{JoystickRemoteError, Result};
use crate::rcinput::protocol::{PWM_VALUE_MAX, PWM_VALUE_MIN};
use crate::state::{Channel, ChannelUpdate};

/// Raw axis range (symmetric, joystick API convention).
pub const AXIS_MIN: i32 = -32767;
/// Raw axis range (symmetric, joystick API convention).
pub const AXIS_MAX: i32 = 32767;

/// Button value reported on press.
pub const BUTTON_PRESSED: i16 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AxisBinding {
    channel: Channel,
    direction: i8,
}

/// Lookup tables from raw indices to channel updates.
///
/// Built once from the active [`Profile`]; immutable afterwards, so it can be
/// shared with the capture thread through an `Arc`.
#[derive(Debug, Clone)]
pub struct ChannelMapper {
    axes: HashMap<u8, AxisBinding>,
    buttons: HashMap<u8, u16>,
}

impl ChannelMapper {
    /// Builds the lookup tables for a profile.
    ///
    /// # Errors
    ///
    /// Returns `InvalidMapping` if two axis channels share a raw axis index or
    /// two mode slots share a raw button index.
    pub fn from_profile(profile: &Profile) -> Result<Self> {
        let mut axes = HashMap::with_capacity(AXIS_CHANNELS.len());
        for (mapping, &channel) in profile.axes.iter().zip(AXIS_CHANNELS.iter()) {
            let binding = AxisBinding {
                channel,
                direction: mapping.direction,
            };
            if let Some(previous) = axes.insert(mapping.number, binding) {
                return Err(JoystickRemoteError::InvalidMapping(format!(
                    "axis {} is assigned to both {} and {}",
                    mapping.number, previous.channel, channel
                )));
            }
        }

        let mut buttons = HashMap::with_capacity(profile.buttons.len());
        for (slot, (&number, &pwm)) in profile.buttons.iter().zip(profile.mode_pwms.iter()).enumerate() {
            if buttons.insert(number, pwm).is_some() {
                return Err(JoystickRemoteError::InvalidMapping(format!(
                    "button {} is assigned to more than one mode (mode {})",
                    number,
                    slot + 1
                )));
            }
        }

        Ok(Self { axes, buttons })
    }

    /// Maps one raw event to at most one channel update.
    ///
    /// Unmapped indices, button releases and unknown event kinds yield `None`.
    #[must_use]
    pub fn map_event(&self, event: &RawEvent) -> Option<ChannelUpdate> {
        match event.kind {
            EventKind::Axis => self.map_axis(event.number, event.value),
            EventKind::Button => self.map_button(event.number, event.value),
            EventKind::Other(kind) => {
                debug!("Ignoring unexpected event type {}", kind);
                None
            }
        }
    }

    /// Maps an axis event.
    #[must_use]
    pub fn map_axis(&self, number: u8, value: i16) -> Option<ChannelUpdate> {
        match self.axes.get(&number) {
            Some(binding) => {
                let signed = i32::from(binding.direction) * i32::from(value);
                Some(ChannelUpdate::new(binding.channel, axis_to_pwm(signed)))
            }
            None => {
                debug!("Unmapped axis {} (value {})", number, value);
                None
            }
        }
    }

    /// Maps a button event. Only presses select a mode.
    #[must_use]
    pub fn map_button(&self, number: u8, value: i16) -> Option<ChannelUpdate> {
        if value != BUTTON_PRESSED {
            return None;
        }

        match self.buttons.get(&number) {
            Some(&pwm) => Some(ChannelUpdate::new(Channel::Mode, pwm)),
            None => {
                debug!("Unmapped button {}", number);
                None
            }
        }
    }
}

/// Rescales a signed axis value to the PWM range.
///
/// The input is clamped to [`AXIS_MIN`]..=[`AXIS_MAX`] first; the result is
/// truncated toward zero.
///
/// # Examples
///
/// ```
/// use joystick_remote::controller::channel_mapper::axis_to_pwm;
///
/// assert_eq!(axis_to_pwm(-32767), 1100);
/// assert_eq!(axis_to_pwm(0), 1500);
/// assert_eq!(axis_to_pwm(32767), 1900);
/// ```
#[must_use]
pub fn axis_to_pwm(value: i32) -> u16 {
    let clamped = value.clamp(AXIS_MIN, AXIS_MAX) as f32;
    let axis_span = (AXIS_MAX - AXIS_MIN) as f32;
    let pwm_span = f32::from(PWM_VALUE_MAX - PWM_VALUE_MIN);

    let pwm = (clamped - AXIS_MIN as f32) / axis_span * pwm_span + f32::from(PWM_VALUE_MIN);

    (pwm as u16).clamp(PWM_VALUE_MIN, PWM_VALUE_MAX)
}
