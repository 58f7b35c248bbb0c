//! # Evdev Controller Module
//!
//! Reads game controllers through the Linux evdev interface
//! (`/dev/input/event*`) and presents them in joystick numbering, so the same
//! profiles work for both device kinds.
//!
//! ## Numbering
//!
//! - Axes: supported absolute axes in ascending code order
//!   (ABS_X = 0, ABS_Y = 1, ...)
//! - Buttons: supported keys from BTN_JOYSTICK upward first, then
//!   BTN_MISC..BTN_JOYSTICK, each in ascending code order
//!
//! Axis values are rescaled from the axis' reported `absinfo` range to
//! [-32767, 32767].

use std::collections::{HashMap, VecDeque};
use std::path::Path;

use evdev::{Device, InputEvent, InputEventKind};
use tracing::{debug, info};

use super::channel_mapper::AXIS_MAX;
use super::event::{DeviceInfo, EventKind, EventSource, RawEvent};
use crate::error::{JoystickRemoteError, Result};

/// First key code treated as a joystick button.
const BTN_MISC: u16 = 0x100;

/// Key code where joystick-class buttons start.
const BTN_JOYSTICK: u16 = 0x120;

/// `errno` reported by reads on an unplugged input device.
const ENODEV: i32 = 19;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AxisSlot {
    number: u8,
    minimum: i32,
    maximum: i32,
}

/// Evdev controller handle
///
/// Represents an open evdev device plus the code-to-index tables built at
/// open time.
pub struct EvdevDevice {
    device: Device,
    info: DeviceInfo,
    axes: HashMap<u16, AxisSlot>,
    buttons: HashMap<u16, u8>,
    pending: VecDeque<RawEvent>,
}

impl std::fmt::Debug for EvdevDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvdevDevice")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

impl EvdevDevice {
    /// Open an evdev controller
    ///
    /// # Arguments
    ///
    /// * `path` - Device path (e.g., "/dev/input/event5")
    ///
    /// # Errors
    ///
    /// - `Device`: permission denied, missing node, or absinfo query failure
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use joystick_remote::controller::event_device::EvdevDevice;
    /// use joystick_remote::controller::event::EventSource;
    ///
    /// let device = EvdevDevice::open("/dev/input/event5")?;
    /// println!("{}", device.info());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let device = Device::open(path).map_err(|e| {
            JoystickRemoteError::Device(format!("Failed to open {}: {}", path.display(), e))
        })?;

        let abs_state = device.get_abs_state().map_err(|e| {
            JoystickRemoteError::Device(format!(
                "Failed to query axes of {}: {}",
                path.display(),
                e
            ))
        })?;

        let mut axes = HashMap::new();
        for (number, code) in absolute_axis_codes(&device).into_iter().enumerate() {
            let Ok(number) = u8::try_from(number) else {
                break;
            };
            let absinfo = &abs_state[usize::from(code)];
            axes.insert(
                code,
                AxisSlot {
                    number,
                    minimum: absinfo.minimum,
                    maximum: absinfo.maximum,
                },
            );
        }

        let buttons: HashMap<u16, u8> = joystick_button_order(button_codes(&device))
            .into_iter()
            .zip(0..=u8::MAX)
            .collect();

        // Report resting stick positions before the first change arrives
        let pending = initial_axis_events(&axes, |code| abs_state[usize::from(code)].value);

        let info = device_info(path, &device);
        info!("Opened evdev controller {}", info);

        Ok(Self {
            device,
            info,
            axes,
            buttons,
            pending,
        })
    }

    fn translate(&self, event: &InputEvent) -> Option<RawEvent> {
        match event.kind() {
            InputEventKind::AbsAxis(axis) => {
                let slot = self.axes.get(&axis.0)?;
                Some(RawEvent::axis(
                    slot.number,
                    scale_axis(event.value(), slot.minimum, slot.maximum),
                ))
            }
            InputEventKind::Key(key) => {
                let number = *self.buttons.get(&key.code())?;
                // 2 is autorepeat; keep it distinct from a press
                let value = i16::try_from(event.value()).unwrap_or(i16::MAX);
                Some(RawEvent {
                    kind: EventKind::Button,
                    number,
                    value,
                })
            }
            InputEventKind::Synchronization(_) | InputEventKind::Misc(_) => None,
            _ => Some(RawEvent {
                kind: EventKind::Other(event.event_type().0 as u8),
                number: 0,
                value: 0,
            }),
        }
    }
}

impl EventSource for EvdevDevice {
    fn next_event(&mut self) -> Result<RawEvent> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Ok(event);
            }

            let events: Vec<InputEvent> = match self.device.fetch_events() {
                Ok(events) => events.collect(),
                Err(e) if e.raw_os_error() == Some(ENODEV) => {
                    return Err(JoystickRemoteError::DeviceDisconnected(self.info.path.clone()));
                }
                Err(e) => {
                    return Err(JoystickRemoteError::Device(format!(
                        "Failed to fetch events from {}: {}",
                        self.info.path, e
                    )));
                }
            };

            for event in &events {
                if let Some(raw) = self.translate(event) {
                    self.pending.push_back(raw);
                }
            }
        }
    }

    fn info(&self) -> &DeviceInfo {
        &self.info
    }
}

/// Build one axis event per known axis from its current value, in axis order.
///
/// The joystick driver replays this state on open; evdev only reports
/// changes, so it is read from the absinfo table instead.
fn initial_axis_events(
    axes: &HashMap<u16, AxisSlot>,
    current: impl Fn(u16) -> i32,
) -> VecDeque<RawEvent> {
    let mut slots: Vec<(u16, &AxisSlot)> = axes.iter().map(|(&code, slot)| (code, slot)).collect();
    slots.sort_unstable_by_key(|(_, slot)| slot.number);

    slots
        .into_iter()
        .map(|(code, slot)| {
            RawEvent::axis(slot.number, scale_axis(current(code), slot.minimum, slot.maximum))
        })
        .collect()
}

/// Describe an evdev device without keeping it open
///
/// # Errors
///
/// Returns `Device` error if the node cannot be opened.
pub fn probe_info(path: &Path) -> Result<DeviceInfo> {
    let device = Device::open(path).map_err(|e| {
        JoystickRemoteError::Device(format!("Failed to open {}: {}", path.display(), e))
    })?;
    Ok(device_info(path, &device))
}

fn device_info(path: &Path, device: &Device) -> DeviceInfo {
    let info = DeviceInfo {
        path: path.display().to_string(),
        name: device.name().map(str::to_string),
        axes: Some(absolute_axis_codes(device).len()),
        buttons: Some(button_codes(device).len()),
    };
    debug!("Probed {}: {:?}", path.display(), info);
    info
}

fn absolute_axis_codes(device: &Device) -> Vec<u16> {
    let mut codes: Vec<u16> = device
        .supported_absolute_axes()
        .map(|axes| axes.iter().map(|axis| axis.0).collect())
        .unwrap_or_default();
    codes.sort_unstable();
    codes
}

fn button_codes(device: &Device) -> Vec<u16> {
    device
        .supported_keys()
        .map(|keys| {
            keys.iter()
                .map(|key| key.code())
                .filter(|&code| code >= BTN_MISC)
                .collect()
        })
        .unwrap_or_default()
}

/// Order button codes the way the joystick driver numbers them
///
/// # Examples
///
/// ```
/// use joystick_remote::controller::event_device::joystick_button_order;
///
/// // BTN_0 (0x100), BTN_SOUTH (0x130), BTN_EAST (0x131)
/// assert_eq!(
///     joystick_button_order(vec![0x100, 0x131, 0x130]),
///     vec![0x130, 0x131, 0x100]
/// );
/// ```
#[must_use]
pub fn joystick_button_order(mut codes: Vec<u16>) -> Vec<u16> {
    codes.sort_unstable_by_key(|&code| (code < BTN_JOYSTICK, code));
    codes
}

/// Rescale an evdev axis value into [-32767, 32767]
///
/// Degenerate ranges (minimum == maximum) report center.
///
/// # Examples
///
/// ```
/// use joystick_remote::controller::event_device::scale_axis;
///
/// // DualSense sticks report 0..255
/// assert_eq!(scale_axis(0, 0, 255), -32767);
/// assert_eq!(scale_axis(255, 0, 255), 32767);
/// ```
#[must_use]
pub fn scale_axis(value: i32, minimum: i32, maximum: i32) -> i16 {
    let span = i64::from(maximum) - i64::from(minimum);
    if span <= 0 {
        return 0;
    }

    let offset = 2 * (i64::from(value) - i64::from(minimum)) - span;
    let max = i64::from(AXIS_MAX);
    let scaled = (offset * max / span).clamp(-max, max);

    scaled as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_axis_full_range() {
        assert_eq!(scale_axis(-32768, -32768, 32767), -32767);
        assert_eq!(scale_axis(32767, -32768, 32767), 32767);
    }

    #[test]
    fn test_scale_axis_byte_range_center() {
        // 128 of 0..255 is just past center
        let center = scale_axis(128, 0, 255);
        assert!(center.abs() < 200, "center scaled to {}", center);
    }

    #[test]
    fn test_scale_axis_clamps_out_of_range() {
        assert_eq!(scale_axis(-10, 0, 255), -32767);
        assert_eq!(scale_axis(300, 0, 255), 32767);
    }

    #[test]
    fn test_scale_axis_degenerate_range() {
        assert_eq!(scale_axis(5, 7, 7), 0);
        assert_eq!(scale_axis(5, 9, 7), 0);
    }

    #[test]
    fn test_scale_axis_hat() {
        assert_eq!(scale_axis(-1, -1, 1), -32767);
        assert_eq!(scale_axis(0, -1, 1), 0);
        assert_eq!(scale_axis(1, -1, 1), 32767);
    }

    #[test]
    fn test_initial_axis_events_follow_resting_position() {
        let mut axes = HashMap::new();
        // ABS_Y (throttle stick resting low) and ABS_X centered, 0..255 range
        axes.insert(0x01, AxisSlot { number: 1, minimum: 0, maximum: 255 });
        axes.insert(0x00, AxisSlot { number: 0, minimum: 0, maximum: 255 });
        // ABS_HAT0X, -1..1
        axes.insert(0x10, AxisSlot { number: 2, minimum: -1, maximum: 1 });

        let events = initial_axis_events(&axes, |code| match code {
            0x00 => 128,
            0x01 => 255,
            _ => 0,
        });

        let numbers: Vec<u8> = events.iter().map(|e| e.number).collect();
        assert_eq!(numbers, vec![0, 1, 2]);
        assert!(events.iter().all(|e| e.kind == EventKind::Axis));
        assert!(events[0].value.abs() < 200);
        assert_eq!(events[1], RawEvent::axis(1, 32767));
        assert_eq!(events[2], RawEvent::axis(2, 0));
    }

    #[test]
    fn test_initial_axis_events_empty() {
        assert!(initial_axis_events(&HashMap::new(), |_| 0).is_empty());
    }

    #[test]
    fn test_button_order_joystick_buttons_first() {
        let order = joystick_button_order(vec![0x13c, 0x101, 0x130, 0x120, 0x100]);
        assert_eq!(order, vec![0x120, 0x130, 0x13c, 0x100, 0x101]);
    }

    #[test]
    fn test_open_nonexistent_device() {
        let result = EvdevDevice::open("/dev/input/nonexistent_event_12345");
        match result {
            Err(JoystickRemoteError::Device(msg)) => assert!(msg.contains("nonexistent_event_12345")),
            other => panic!("Expected Device error, got: {:?}", other.map(|_| ())),
        }
    }

    // Integration test - only runs with real hardware
    #[test]
    #[ignore]
    fn test_open_with_real_hardware() {
        let device = EvdevDevice::open("/dev/input/event0").expect("No device at event0");
        println!("{}", device.info());
    }
}
