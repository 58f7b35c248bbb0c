//! # Joystick API Device Module
//!
//! Reads the Linux joystick interface (`/dev/input/js*`).
//!
//! ## Event Record
//!
//! The kernel delivers fixed 8-byte records:
//!
//! | Offset | Field | Type |
//! |--------|-------|------|
//! | 0 | time (ms) | u32 |
//! | 4 | value | i16 |
//! | 6 | type | u8 |
//! | 7 | number | u8 |
//!
//! Right after open the driver replays the current state of every axis and
//! button with the `JS_EVENT_INIT` flag set. The flag is stripped so replayed
//! and live events are handled the same way.

use std::fs::{self, File};
use std::io::{self, Read};
use std::os::unix::fs::FileTypeExt;
use std::path::{Path, PathBuf};

use bytes::Buf;
use tracing::{debug, info};

use super::event::{DeviceInfo, EventKind, EventSource, RawEvent};
use crate::error::{JoystickRemoteError, Result};

/// Size of one `js_event` record.
pub const JS_EVENT_SIZE: usize = 8;

/// Button pressed/released
pub const JS_EVENT_BUTTON: u8 = 0x01;
/// Joystick moved
pub const JS_EVENT_AXIS: u8 = 0x02;
/// Initial state replay flag
pub const JS_EVENT_INIT: u8 = 0x80;

/// First key code counted as a joystick button (BTN_MISC).
const BTN_MISC: usize = 0x100;

/// `errno` reported by reads on an unplugged input device.
const ENODEV: i32 = 19;

/// Sysfs root for input class devices.
const SYSFS_INPUT: &str = "/sys/class/input";

/// Joystick interface device handle
pub struct JoydevDevice {
    file: File,
    info: DeviceInfo,
}

impl std::fmt::Debug for JoydevDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JoydevDevice")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

impl JoydevDevice {
    /// Open a joystick device
    ///
    /// # Arguments
    ///
    /// * `path` - Device path (e.g., "/dev/input/js0")
    ///
    /// # Errors
    ///
    /// Returns `Device` error if the path is not a character device or cannot
    /// be opened for reading.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use joystick_remote::controller::joydev::JoydevDevice;
    /// use joystick_remote::controller::event::EventSource;
    ///
    /// let device = JoydevDevice::open("/dev/input/js0")?;
    /// println!("{}", device.info());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            JoystickRemoteError::Device(format!("Failed to open {}: {}", path.display(), e))
        })?;

        let metadata = file.metadata().map_err(|e| {
            JoystickRemoteError::Device(format!("Failed to stat {}: {}", path.display(), e))
        })?;
        if !metadata.file_type().is_char_device() {
            return Err(JoystickRemoteError::Device(format!(
                "{} is not a joystick device",
                path.display()
            )));
        }

        let info = probe_info(path);
        info!("Opened joystick {}", info);

        Ok(Self { file, info })
    }
}

impl EventSource for JoydevDevice {
    fn next_event(&mut self) -> Result<RawEvent> {
        read_js_event(&mut self.file, &self.info.path)
    }

    fn info(&self) -> &DeviceInfo {
        &self.info
    }
}

/// Read and decode one record from a joystick stream
///
/// The driver hands out whole records, so a zero-byte read is a hang-up and
/// any other partial read is an error.
///
/// # Errors
///
/// - `DeviceDisconnected`: end of stream or ENODEV
/// - `Device`: short read or any other read failure
pub fn read_js_event<R: Read>(reader: &mut R, path: &str) -> Result<RawEvent> {
    let mut record = [0u8; JS_EVENT_SIZE];

    let read = loop {
        match reader.read(&mut record) {
            Ok(n) => break n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(read_error(path, e)),
        }
    };

    match read {
        0 => Err(JoystickRemoteError::DeviceDisconnected(format!(
            "{}: end of stream",
            path
        ))),
        JS_EVENT_SIZE => Ok(decode_js_event(&record)),
        n => Err(JoystickRemoteError::Device(format!(
            "{}: short read of {} bytes",
            path, n
        ))),
    }
}

fn read_error(path: &str, e: io::Error) -> JoystickRemoteError {
    if e.raw_os_error() == Some(ENODEV) {
        JoystickRemoteError::DeviceDisconnected(path.to_string())
    } else {
        JoystickRemoteError::Device(format!("Failed to read {}: {}", path, e))
    }
}

/// Decode one `js_event` record
///
/// The record is in host byte order; every platform this runs on is
/// little-endian.
///
/// # Examples
///
/// ```
/// use joystick_remote::controller::joydev::decode_js_event;
/// use joystick_remote::controller::event::RawEvent;
///
/// // Axis 3 at full positive deflection, replayed at open time
/// let record = [0, 0, 0, 0, 0xFF, 0x7F, 0x82, 0x03];
/// assert_eq!(decode_js_event(&record), RawEvent::axis(3, 32767));
/// ```
#[must_use]
pub fn decode_js_event(record: &[u8; JS_EVENT_SIZE]) -> RawEvent {
    let mut buf = &record[..];
    let _time_ms = buf.get_u32_le();
    let value = buf.get_i16_le();
    let event_type = buf.get_u8() & !JS_EVENT_INIT;
    let number = buf.get_u8();

    let kind = match event_type {
        JS_EVENT_BUTTON => EventKind::Button,
        JS_EVENT_AXIS => EventKind::Axis,
        other => EventKind::Other(other),
    };

    RawEvent { kind, number, value }
}

/// Gather diagnostics for a joystick node from sysfs
///
/// Never fails; fields that cannot be read are left as `None`.
#[must_use]
pub fn probe_info(path: &Path) -> DeviceInfo {
    let mut info = DeviceInfo {
        path: path.display().to_string(),
        ..DeviceInfo::default()
    };

    let Some(node) = path.file_name() else {
        return info;
    };
    let device_dir = PathBuf::from(SYSFS_INPUT).join(node).join("device");

    info.name = fs::read_to_string(device_dir.join("name"))
        .ok()
        .map(|name| name.trim().to_string());

    info.axes = fs::read_to_string(device_dir.join("capabilities/abs"))
        .ok()
        .map(|bitmap| bitmap_bits(&bitmap).len());

    info.buttons = fs::read_to_string(device_dir.join("capabilities/key"))
        .ok()
        .map(|bitmap| bitmap_bits(&bitmap).iter().filter(|&&bit| bit >= BTN_MISC).count());

    debug!("Probed {}: {:?}", path.display(), info);
    info
}

/// Decode a sysfs capability bitmap into the set bit indices
///
/// Sysfs prints the bitmap as space-separated hex words of `usize` width,
/// most significant word first.
#[must_use]
pub fn bitmap_bits(bitmap: &str) -> Vec<usize> {
    let word_bits = usize::BITS as usize;
    let mut bits = Vec::new();

    for (word_index, word) in bitmap.split_whitespace().rev().enumerate() {
        let Ok(value) = u64::from_str_radix(word, 16) else {
            continue;
        };
        for bit in 0..64usize.min(word_bits) {
            if value & (1u64 << bit) != 0 {
                bits.push(word_index * word_bits + bit);
            }
        }
    }

    bits
}
