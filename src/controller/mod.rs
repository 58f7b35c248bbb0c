//! # Controller Module
//!
//! Game controller input handling.
//!
//! This module handles:
//! - Opening joystick (`js*`) and evdev (`event*`) devices
//! - Listing the controllers attached to the system
//! - Selecting the axis/button profile for a controller model
//! - Mapping raw events to control channel updates
//! - Running the blocking capture loop on its own thread

pub mod capture;
pub mod channel_mapper;
pub mod event;
pub mod event_device;
pub mod joydev;
pub mod profile;

use std::path::Path;

use tracing::debug;

use crate::error::{JoystickRemoteError, Result};
use event::{DeviceInfo, EventSource};
use event_device::EvdevDevice;
use joydev::JoydevDevice;

/// Directory scanned for input devices
const INPUT_DIR: &str = "/dev/input";

/// Input device interface, picked from the device node name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    /// Joystick API node (`js*`)
    Joydev,
    /// Event interface node (`event*`)
    Evdev,
}

impl DeviceKind {
    /// Classify a device path by its file name.
    ///
    /// # Examples
    ///
    /// ```
    /// use joystick_remote::controller::DeviceKind;
    ///
    /// assert_eq!(DeviceKind::from_path("/dev/input/js0"), Some(DeviceKind::Joydev));
    /// assert_eq!(DeviceKind::from_path("/dev/input/event3"), Some(DeviceKind::Evdev));
    /// assert_eq!(DeviceKind::from_path("/dev/input/mice"), None);
    /// ```
    #[must_use]
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let name = path.as_ref().file_name()?.to_string_lossy();
        if name.starts_with("js") {
            Some(DeviceKind::Joydev)
        } else if name.starts_with("event") {
            Some(DeviceKind::Evdev)
        } else {
            None
        }
    }
}

/// Open an input device with the backend matching its node name.
///
/// Paths that are neither `js*` nor `event*` (e.g. a udev symlink under
/// `/dev/input/by-id`) are read through the joystick API.
///
/// # Errors
///
/// Returns `Device` error if the device cannot be opened.
pub fn open_device<P: AsRef<Path>>(path: P) -> Result<Box<dyn EventSource>> {
    let path = path.as_ref();
    match DeviceKind::from_path(path) {
        Some(DeviceKind::Evdev) => Ok(Box::new(EvdevDevice::open(path)?)),
        Some(DeviceKind::Joydev) | None => Ok(Box::new(JoydevDevice::open(path)?)),
    }
}

/// List input devices usable as controllers.
///
/// Scans `/dev/input` in sorted order. Joystick nodes are always listed;
/// event nodes are listed when they can be opened and report at least one
/// axis or button.
///
/// # Errors
///
/// Returns `Device` error if `/dev/input` cannot be read.
pub fn list_devices() -> Result<Vec<DeviceInfo>> {
    list_devices_in(Path::new(INPUT_DIR))
}

fn list_devices_in(dir: &Path) -> Result<Vec<DeviceInfo>> {
    let mut entries: Vec<_> = std::fs::read_dir(dir)
        .map_err(|e| JoystickRemoteError::Device(format!("Failed to read {}: {}", dir.display(), e)))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| JoystickRemoteError::Device(format!("Failed to read directory entry: {}", e)))?;

    // Sort entries for deterministic listing
    entries.sort_by_key(|entry| entry.path());

    let mut devices = Vec::new();
    for entry in entries {
        let path = entry.path();
        match DeviceKind::from_path(&path) {
            Some(DeviceKind::Joydev) => devices.push(joydev::probe_info(&path)),
            Some(DeviceKind::Evdev) => match event_device::probe_info(&path) {
                Ok(info) if info.axes.unwrap_or(0) > 0 || info.buttons.unwrap_or(0) > 0 => {
                    devices.push(info);
                }
                Ok(_) => debug!("Skipping {}: no axes or buttons", path.display()),
                // Permission denied or other errors - skip device
                Err(e) => debug!("Skipping {}: {}", path.display(), e),
            },
            None => {}
        }
    }

    Ok(devices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_kind_by_name() {
        assert_eq!(DeviceKind::from_path("/dev/input/js1"), Some(DeviceKind::Joydev));
        assert_eq!(DeviceKind::from_path("/dev/input/event12"), Some(DeviceKind::Evdev));
        assert_eq!(DeviceKind::from_path("/dev/input/by-id/usb-pad"), None);
        assert_eq!(DeviceKind::from_path("/"), None);
    }

    #[test]
    fn test_open_device_missing() {
        assert!(open_device("/dev/input/js_missing_12345").is_err());
        assert!(open_device("/dev/input/event_missing_12345").is_err());
    }

    #[test]
    fn test_open_device_rejects_regular_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("js0");
        std::fs::write(&path, b"").unwrap();

        assert!(matches!(open_device(&path), Err(JoystickRemoteError::Device(_))));
    }

    #[test]
    fn test_list_devices_in_missing_dir() {
        let result = list_devices_in(Path::new("/nonexistent/input/dir"));
        assert!(matches!(result, Err(JoystickRemoteError::Device(_))));
    }

    #[test]
    fn test_list_devices_in_lists_js_nodes_only() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["js1", "js0", "mice", "mouse0"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        let devices = list_devices_in(dir.path()).unwrap();
        let paths: Vec<_> = devices.iter().map(|info| info.path.clone()).collect();

        assert_eq!(
            paths,
            vec![
                dir.path().join("js0").display().to_string(),
                dir.path().join("js1").display().to_string(),
            ]
        );
    }

    // Integration test - only runs with real hardware
    #[test]
    #[ignore]
    fn test_list_devices_with_real_hardware() {
        for device in list_devices().unwrap() {
            println!("{}", device);
        }
    }
}
