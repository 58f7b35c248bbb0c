//! # Controller Profiles
//!
//! Per-controller-model axis and button assignments.
//!
//! ## Catalog
//!
//! | Name | Alias | Mode buttons | Roll | Pitch | Throttle | Yaw |
//! |------|-------|--------------|------|-------|----------|-----|
//! | xbox360 | x | 0 1 2 3 4 5 | 3 | 4 | 1 (inv) | 0 |
//! | skycontroller | s | 8 9 2 0 1 3 | 2 | 3 (inv) | 1 (inv) | 0 |
//! | playstation3 | ps3 | 0 1 2 3 5 4 | 2 | 3 (inv) | 1 (inv) | 0 |
//! | nvidiashield | nvda | 0 1 2 3 4 5 | 0 | 1 | 3 | 2 |
//!
//! ## Custom Mapping String
//!
//! `custom` (alias `c`) profiles are read from fourteen comma-separated fields:
//!
//! ```text
//! b1,b2,b3,b4,b5,b6,roll_axis,roll_dir,pitch_axis,pitch_dir,throttle_axis,throttle_dir,yaw_axis,yaw_dir
//! ```
//!
//! `b1`..`b6` are the buttons selecting flight modes 1 to 6. Directions are
//! `1` or `-1`.

use crate::error::{JoystickRemoteError, Result};
use crate::rcinput::protocol::PWM_VALUE_CENTER;
use crate::state::Channel;

/// Number of stick axes mapped by a profile (roll, pitch, throttle, yaw).
pub const NUM_AXES: usize = 4;

/// Number of flight mode slots.
pub const NUM_MODES: usize = 6;

/// Mode PWM ladder. Each value sits in the middle of one ArduPilot flight
/// mode band.
pub const DEFAULT_MODE_PWMS: [u16; NUM_MODES] = [1165, 1295, 1425, 1555, 1685, 1815];

/// Channels driven by [`Profile::axes`], in table order.
pub const AXIS_CHANNELS: [Channel; NUM_AXES] =
    [Channel::Roll, Channel::Pitch, Channel::Throttle, Channel::Yaw];

/// Commas in a well-formed custom mapping string (fourteen fields).
const MAPPING_SEPARATORS: usize = 13;

/// Raw axis index plus the sign applied to its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisMapping {
    pub number: u8,
    /// `1` or `-1`
    pub direction: i8,
}

impl AxisMapping {
    #[must_use]
    pub const fn new(number: u8, direction: i8) -> Self {
        Self { number, direction }
    }
}

/// Complete input assignment for one controller model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    /// Canonical profile name
    pub name: String,
    /// Axis mappings for roll, pitch, throttle and yaw, in that order
    pub axes: [AxisMapping; NUM_AXES],
    /// Raw button index for each mode slot
    pub buttons: [u8; NUM_MODES],
    /// PWM value for each mode slot
    pub mode_pwms: [u16; NUM_MODES],
    /// Mode channel value before any mode button is pressed
    pub mode_default: u16,
}

impl Profile {
    fn builtin(name: &str, buttons: [u8; NUM_MODES], axes: [AxisMapping; NUM_AXES]) -> Self {
        Self {
            name: name.to_string(),
            axes,
            buttons,
            mode_pwms: DEFAULT_MODE_PWMS,
            mode_default: PWM_VALUE_CENTER,
        }
    }

    /// Microsoft Xbox 360 controller.
    #[must_use]
    pub fn xbox360() -> Self {
        Self::builtin(
            "xbox360",
            [0, 1, 2, 3, 4, 5],
            [
                AxisMapping::new(3, 1),
                AxisMapping::new(4, 1),
                AxisMapping::new(1, -1),
                AxisMapping::new(0, 1),
            ],
        )
    }

    /// Parrot Skycontroller.
    #[must_use]
    pub fn skycontroller() -> Self {
        Self::builtin(
            "skycontroller",
            [8, 9, 2, 0, 1, 3],
            [
                AxisMapping::new(2, 1),
                AxisMapping::new(3, -1),
                AxisMapping::new(1, -1),
                AxisMapping::new(0, 1),
            ],
        )
    }

    /// Sony PlayStation 3 controller.
    #[must_use]
    pub fn playstation3() -> Self {
        Self::builtin(
            "playstation3",
            [0, 1, 2, 3, 5, 4],
            [
                AxisMapping::new(2, 1),
                AxisMapping::new(3, -1),
                AxisMapping::new(1, -1),
                AxisMapping::new(0, 1),
            ],
        )
    }

    /// NVIDIA Shield controller.
    #[must_use]
    pub fn nvidiashield() -> Self {
        Self::builtin(
            "nvidiashield",
            [0, 1, 2, 3, 4, 5],
            [
                AxisMapping::new(0, 1),
                AxisMapping::new(1, 1),
                AxisMapping::new(3, 1),
                AxisMapping::new(2, 1),
            ],
        )
    }

    /// Looks up a catalog profile by name or alias.
    ///
    /// Returns `None` for unknown names and for `custom`, which needs a
    /// mapping string (see [`Profile::resolve`]).
    ///
    /// # Examples
    ///
    /// ```
    /// use joystick_remote::controller::profile::Profile;
    ///
    /// assert_eq!(Profile::from_catalog("x"), Some(Profile::xbox360()));
    /// assert!(Profile::from_catalog("gamecube").is_none());
    /// ```
    #[must_use]
    pub fn from_catalog(name: &str) -> Option<Self> {
        match name {
            "x" | "xbox360" => Some(Self::xbox360()),
            "s" | "skycontroller" => Some(Self::skycontroller()),
            "ps3" | "playstation3" => Some(Self::playstation3()),
            "nvda" | "nvidiashield" => Some(Self::nvidiashield()),
            _ => None,
        }
    }

    /// Returns true if `name` selects the custom-string profile.
    #[must_use]
    pub fn is_custom_name(name: &str) -> bool {
        matches!(name, "c" | "custom")
    }

    /// Returns true if `name` selects any profile (catalog or custom).
    #[must_use]
    pub fn is_known_name(name: &str) -> bool {
        Self::is_custom_name(name) || Self::from_catalog(name).is_some()
    }

    /// Selects the startup profile.
    ///
    /// # Arguments
    ///
    /// * `name` - Catalog name, alias, or `custom`
    /// * `mapping` - Custom mapping string, required for `custom`
    ///
    /// # Errors
    ///
    /// - `UnknownProfile`: name is not in the catalog
    /// - `InvalidMapping`: `custom` without a mapping, or a malformed mapping
    pub fn resolve(name: &str, mapping: Option<&str>) -> Result<Self> {
        if Self::is_custom_name(name) {
            let mapping = mapping.filter(|m| !m.is_empty()).ok_or_else(|| {
                JoystickRemoteError::InvalidMapping(
                    "custom joystick type requires a mapping string".to_string(),
                )
            })?;
            return Self::parse_mapping(mapping);
        }

        Self::from_catalog(name).ok_or_else(|| JoystickRemoteError::UnknownProfile(name.to_string()))
    }

    /// Parses a custom mapping string.
    ///
    /// # Errors
    ///
    /// Returns `InvalidMapping` if the string does not have exactly thirteen
    /// commas, a field is not a number, an index does not fit in `u8`, or a
    /// direction is not `1`/`-1`.
    ///
    /// # Examples
    ///
    /// ```
    /// use joystick_remote::controller::profile::{AxisMapping, Profile};
    ///
    /// let profile = Profile::parse_mapping("0,1,2,3,4,5,0,1,1,-1,2,-1,3,1")?;
    /// assert_eq!(profile.buttons, [0, 1, 2, 3, 4, 5]);
    /// assert_eq!(profile.axes[1], AxisMapping::new(1, -1)); // pitch
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn parse_mapping(mapping: &str) -> Result<Self> {
        if !mapping_valid(mapping) {
            return Err(JoystickRemoteError::InvalidMapping(format!(
                "expected {} comma-separated fields, got \"{}\"",
                MAPPING_SEPARATORS + 1,
                mapping
            )));
        }

        let fields: Vec<&str> = mapping.split(',').map(str::trim).collect();

        let mut buttons = [0u8; NUM_MODES];
        for (slot, field) in fields[..NUM_MODES].iter().enumerate() {
            buttons[slot] = parse_index(field, "button")?;
        }

        let mut axes = [AxisMapping::new(0, 1); NUM_AXES];
        for (slot, pair) in fields[NUM_MODES..].chunks(2).enumerate() {
            let number = parse_index(pair[0], "axis")?;
            let direction = parse_direction(pair[1])?;
            axes[slot] = AxisMapping::new(number, direction);
        }

        Ok(Self::builtin("custom", buttons, axes))
    }
}

/// Returns true if `mapping` has exactly the thirteen separators of a
/// fourteen-field custom mapping.
#[must_use]
pub fn mapping_valid(mapping: &str) -> bool {
    mapping.matches(',').count() == MAPPING_SEPARATORS
}

fn parse_index(field: &str, what: &str) -> Result<u8> {
    field.parse::<u8>().map_err(|_| {
        JoystickRemoteError::InvalidMapping(format!("{} index \"{}\" is not in 0-255", what, field))
    })
}

fn parse_direction(field: &str) -> Result<i8> {
    match field.parse::<i8>() {
        Ok(direction @ (1 | -1)) => Ok(direction),
        _ => Err(JoystickRemoteError::InvalidMapping(format!(
            "axis direction \"{}\" must be 1 or -1",
            field
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_MAPPING: &str = "0,1,2,3,4,5,0,1,1,-1,2,-1,3,1";

    #[test]
    fn test_mode_ladder_spans_range() {
        assert_eq!(DEFAULT_MODE_PWMS, [1165, 1295, 1425, 1555, 1685, 1815]);
        for pair in DEFAULT_MODE_PWMS.windows(2) {
            assert_eq!(pair[1] - pair[0], 130, "Ladder should be evenly spaced");
        }
    }

    #[test]
    fn test_catalog_aliases() {
        assert_eq!(Profile::from_catalog("x"), Profile::from_catalog("xbox360"));
        assert_eq!(Profile::from_catalog("s"), Profile::from_catalog("skycontroller"));
        assert_eq!(Profile::from_catalog("ps3"), Profile::from_catalog("playstation3"));
        assert_eq!(Profile::from_catalog("nvda"), Profile::from_catalog("nvidiashield"));
    }

    #[test]
    fn test_catalog_defaults() {
        for name in ["xbox360", "skycontroller", "playstation3", "nvidiashield"] {
            let profile = Profile::from_catalog(name).unwrap();
            assert_eq!(profile.name, name);
            assert_eq!(profile.mode_pwms, DEFAULT_MODE_PWMS);
            assert_eq!(profile.mode_default, 1500);
        }
    }

    #[test]
    fn test_xbox360_roll_axis() {
        let profile = Profile::xbox360();
        assert_eq!(profile.axes[0], AxisMapping::new(3, 1));
        assert_eq!(profile.buttons[4], 4);
    }

    #[test]
    fn test_known_names() {
        assert!(Profile::is_known_name("xbox360"));
        assert!(Profile::is_known_name("c"));
        assert!(Profile::is_known_name("custom"));
        assert!(!Profile::is_known_name("gamecube"));
        assert!(!Profile::is_known_name(""));
    }

    #[test]
    fn test_parse_sample_mapping() {
        let profile = Profile::parse_mapping(SAMPLE_MAPPING).unwrap();

        assert_eq!(profile.name, "custom");
        assert_eq!(profile.buttons, [0, 1, 2, 3, 4, 5]);
        assert_eq!(
            profile.axes,
            [
                AxisMapping::new(0, 1),  // roll
                AxisMapping::new(1, -1), // pitch
                AxisMapping::new(2, -1), // throttle
                AxisMapping::new(3, 1),  // yaw
            ]
        );
    }

    #[test]
    fn test_parse_mapping_allows_spaces() {
        let profile = Profile::parse_mapping("8, 9, 2, 0, 1, 3, 2, 1, 3, -1, 1, -1, 0, 1").unwrap();
        assert_eq!(profile.buttons, [8, 9, 2, 0, 1, 3]);
        assert_eq!(profile.axes[2], AxisMapping::new(1, -1));
    }

    #[test]
    fn test_mapping_valid_counts_commas() {
        assert!(mapping_valid(SAMPLE_MAPPING));
        assert!(!mapping_valid("0,1,2,3,4,5,0,1,1,-1,2,-1,3"));
        assert!(!mapping_valid("0,1,2,3,4,5,0,1,1,-1,2,-1,3,1,"));
        assert!(!mapping_valid(""));
    }

    #[test]
    fn test_parse_mapping_too_few_fields() {
        let result = Profile::parse_mapping("0,1,2,3,4,5,0,1,1,-1,2,-1,3");
        assert!(matches!(result, Err(JoystickRemoteError::InvalidMapping(_))));
    }

    #[test]
    fn test_parse_mapping_non_numeric() {
        let result = Profile::parse_mapping("a,1,2,3,4,5,0,1,1,-1,2,-1,3,1");
        assert!(matches!(result, Err(JoystickRemoteError::InvalidMapping(_))));
    }

    #[test]
    fn test_parse_mapping_index_out_of_range() {
        let result = Profile::parse_mapping("0,1,2,3,4,256,0,1,1,-1,2,-1,3,1");
        assert!(matches!(result, Err(JoystickRemoteError::InvalidMapping(_))));
    }

    #[test]
    fn test_parse_mapping_bad_direction() {
        let result = Profile::parse_mapping("0,1,2,3,4,5,0,2,1,-1,2,-1,3,1");
        match result {
            Err(JoystickRemoteError::InvalidMapping(msg)) => assert!(msg.contains("direction")),
            other => panic!("Expected InvalidMapping error, got: {:?}", other),
        }
    }

    #[test]
    fn test_resolve_catalog() {
        assert_eq!(Profile::resolve("xbox360", None).unwrap(), Profile::xbox360());
    }

    #[test]
    fn test_resolve_unknown() {
        match Profile::resolve("gamecube", None) {
            Err(JoystickRemoteError::UnknownProfile(name)) => assert_eq!(name, "gamecube"),
            other => panic!("Expected UnknownProfile error, got: {:?}", other),
        }
    }

    #[test]
    fn test_resolve_custom_requires_mapping() {
        assert!(Profile::resolve("custom", None).is_err());
        assert!(Profile::resolve("c", Some("")).is_err());
        assert!(Profile::resolve("c", Some(SAMPLE_MAPPING)).is_ok());
    }

    #[test]
    fn test_axis_channels_order() {
        assert_eq!(
            AXIS_CHANNELS,
            [Channel::Roll, Channel::Pitch, Channel::Throttle, Channel::Yaw]
        );
    }
}
