//! # Raw Input Events
//!
//! Device-independent event model shared by the joydev and evdev backends.
//!
//! Every backend reduces its native events to a [`RawEvent`]: an axis or
//! button index in joystick numbering plus a signed 16-bit value. Axis values
//! span [-32767, 32767]; button values are 1 for press and 0 for release.

use std::fmt;

use crate::error::Result;

/// Kind of a raw input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Absolute axis movement
    Axis,
    /// Button press or release
    Button,
    /// Anything else the device reported (raw type code)
    Other(u8),
}

/// One input event in joystick numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEvent {
    pub kind: EventKind,
    pub number: u8,
    pub value: i16,
}

impl RawEvent {
    /// Creates an axis event.
    #[must_use]
    pub fn axis(number: u8, value: i16) -> Self {
        Self {
            kind: EventKind::Axis,
            number,
            value,
        }
    }

    /// Creates a button event (`pressed` maps to value 1, release to 0).
    #[must_use]
    pub fn button(number: u8, pressed: bool) -> Self {
        Self {
            kind: EventKind::Button,
            number,
            value: i16::from(pressed),
        }
    }
}

/// One-time description of an opened input device.
///
/// Only used for diagnostics; mapping never depends on it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeviceInfo {
    pub path: String,
    pub name: Option<String>,
    pub axes: Option<usize>,
    pub buttons: Option<usize>,
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn count(value: Option<usize>) -> String {
            value.map_or_else(|| "?".to_string(), |n| n.to_string())
        }

        write!(
            f,
            "{}: {} ({} axes, {} buttons)",
            self.path,
            self.name.as_deref().unwrap_or("unknown device"),
            count(self.axes),
            count(self.buttons)
        )
    }
}

/// Blocking source of raw input events.
///
/// Implemented by [`JoydevDevice`](super::joydev::JoydevDevice) and
/// [`EvdevDevice`](super::event_device::EvdevDevice). The capture loop owns the
/// source on its own thread, so implementations must be `Send`.
#[cfg_attr(test, mockall::automock)]
pub trait EventSource: Send {
    /// Blocks until the next event is available.
    ///
    /// # Errors
    ///
    /// - `DeviceDisconnected`: the device hung up
    /// - `Device`: any other read failure
    fn next_event(&mut self) -> Result<RawEvent>;

    /// Returns the device description gathered at open time.
    fn info(&self) -> &DeviceInfo;
}
