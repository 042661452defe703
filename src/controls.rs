//! Camera property overrides and their V4L2 control mapping.
//!
//! The capture tool receives properties as `key=value` tokens. Keys with a
//! V4L2 counterpart become control writes; the rest select the device node
//! or are logged and ignored.

use tracing::{debug, warn};

use crate::traits::CameraDevice;

/// V4L2 control ids used by the property mapping (`linux/v4l2-controls.h`).
pub mod cid {
    /// `V4L2_CID_BRIGHTNESS`
    pub const BRIGHTNESS: u32 = 0x0098_0900;
    /// `V4L2_CID_FOCUS_AUTO`
    pub const FOCUS_AUTO: u32 = 0x009a_090c;
    /// `V4L2_CID_ZOOM_ABSOLUTE`
    pub const ZOOM_ABSOLUTE: u32 = 0x009a_090d;
    /// `V4L2_CID_AUTO_N_PRESET_WHITE_BALANCE`
    pub const AUTO_N_PRESET_WHITE_BALANCE: u32 = 0x009a_0914;
    /// `V4L2_CID_ISO_SENSITIVITY`
    pub const ISO_SENSITIVITY: u32 = 0x009a_0917;
    /// `V4L2_CID_ISO_SENSITIVITY_AUTO`
    pub const ISO_SENSITIVITY_AUTO: u32 = 0x009a_0918;
}

const ISO_SENSITIVITY_MANUAL: i64 = 0;
const ISO_SENSITIVITY_AUTO: i64 = 1;

/// Errors in the property token list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControlError {
    /// A token without `=`.
    #[error("property {0:?} is not key=value")]
    MissingValue(String),
    /// A numeric property with a non-numeric value.
    #[error("property {key} expects a number, got {value:?}")]
    InvalidNumber {
        /// Property key.
        key: String,
        /// Offending value.
        value: String,
    },
}

/// One parsed camera property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraProperty {
    /// Which sensor node to open.
    Device(u32),
    /// Focus mode; 0 is off.
    Focus(i64),
    /// White balance preset.
    Awb(i64),
    /// ISO speed; 0 is automatic.
    IsoSpeed(i64),
    /// Brightness level.
    Brightness(i64),
    /// Zoom factor.
    Zoom(i64),
    /// Anything without a V4L2 counterpart (`ldc`, `nsf`, ...).
    Other {
        /// Property key.
        key: String,
        /// Property value.
        value: String,
    },
}

impl CameraProperty {
    /// Parse a single `key=value` token.
    pub fn parse(token: &str) -> Result<Self, ControlError> {
        let (key, value) = token
            .split_once('=')
            .ok_or_else(|| ControlError::MissingValue(token.to_owned()))?;

        let number = || {
            value.parse::<i64>().map_err(|_| ControlError::InvalidNumber {
                key: key.to_owned(),
                value: value.to_owned(),
            })
        };

        Ok(match key {
            "device" => Self::Device(device_index(value)),
            "focus" => Self::Focus(number()?),
            "awb" => Self::Awb(number()?),
            "iso_speed" | "iso-speed" => Self::IsoSpeed(number()?),
            "bright" | "brightness" => Self::Brightness(number()?),
            "zoom" => Self::Zoom(number()?),
            _ => Self::Other {
                key: key.to_owned(),
                value: value.to_owned(),
            },
        })
    }

    /// Control writes that realize this property, in order.
    #[must_use]
    pub fn controls(&self) -> Vec<(u32, i64)> {
        match *self {
            Self::Focus(mode) => vec![(cid::FOCUS_AUTO, i64::from(mode != 0))],
            Self::Awb(preset) => vec![(cid::AUTO_N_PRESET_WHITE_BALANCE, preset)],
            Self::IsoSpeed(0) => vec![(cid::ISO_SENSITIVITY_AUTO, ISO_SENSITIVITY_AUTO)],
            Self::IsoSpeed(iso) => vec![
                (cid::ISO_SENSITIVITY_AUTO, ISO_SENSITIVITY_MANUAL),
                (cid::ISO_SENSITIVITY, iso),
            ],
            Self::Brightness(level) => vec![(cid::BRIGHTNESS, level)],
            Self::Zoom(factor) => vec![(cid::ZOOM_ABSOLUTE, factor)],
            Self::Device(_) | Self::Other { .. } => Vec::new(),
        }
    }
}

/// Map a device tag to a `/dev/video*` index: `primary` is 0, `secondary`
/// is 1, a number is used as-is, anything else falls back to 0.
#[must_use]
pub fn device_index(tag: &str) -> u32 {
    match tag {
        "primary" => 0,
        "secondary" => 1,
        other => other.parse().unwrap_or_else(|_| {
            warn!(device = other, "unknown device tag, using primary");
            0
        }),
    }
}

/// Parse property tokens. Each argument may hold several whitespace
/// separated tokens.
pub fn parse_properties<S: AsRef<str>>(args: &[S]) -> Result<Vec<CameraProperty>, ControlError> {
    args.iter()
        .flat_map(|arg| arg.as_ref().split_whitespace())
        .map(CameraProperty::parse)
        .collect()
}

/// Device index selected by the last `device=` property, 0 if none.
#[must_use]
pub fn selected_device(properties: &[CameraProperty]) -> u32 {
    properties
        .iter()
        .rev()
        .find_map(|prop| match prop {
            CameraProperty::Device(index) => Some(*index),
            _ => None,
        })
        .unwrap_or(0)
}

/// Write every mappable property to the device. Rejected controls are
/// logged and skipped. Returns the number of control writes that succeeded.
pub fn apply_properties<D: CameraDevice>(device: &mut D, properties: &[CameraProperty]) -> usize {
    let mut applied = 0;
    for property in properties {
        if let CameraProperty::Other { key, value } = property {
            debug!(%key, %value, "no V4L2 control for property, skipping");
            continue;
        }
        for (id, value) in property.controls() {
            match device.set_control(id, value) {
                Ok(()) => applied += 1,
                Err(err) => warn!(?property, error = %err, "control rejected"),
            }
        }
    }
    applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockDevice;

    #[test]
    fn test_parse_split_and_joined_tokens() {
        let joined = parse_properties(&["device=secondary focus=2 ldc=true"]).expect("parses");
        let split =
            parse_properties(&["device=secondary", "focus=2", "ldc=true"]).expect("parses");
        assert_eq!(joined, split);
        assert_eq!(
            joined,
            [
                CameraProperty::Device(1),
                CameraProperty::Focus(2),
                CameraProperty::Other {
                    key: "ldc".to_owned(),
                    value: "true".to_owned()
                },
            ]
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            CameraProperty::parse("zoom"),
            Err(ControlError::MissingValue("zoom".to_owned()))
        );
        assert!(matches!(
            CameraProperty::parse("iso_speed=fast"),
            Err(ControlError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn test_device_index() {
        assert_eq!(device_index("primary"), 0);
        assert_eq!(device_index("secondary"), 1);
        assert_eq!(device_index("3"), 3);
        assert_eq!(device_index("front"), 0);
    }

    #[test]
    fn test_last_device_wins() {
        let props = parse_properties(&["device=secondary device=4"]).expect("parses");
        assert_eq!(selected_device(&props), 4);
        assert_eq!(selected_device(&[]), 0);
    }

    #[test]
    fn test_iso_mapping() {
        assert_eq!(
            CameraProperty::IsoSpeed(0).controls(),
            [(cid::ISO_SENSITIVITY_AUTO, 1)]
        );
        assert_eq!(
            CameraProperty::IsoSpeed(400).controls(),
            [(cid::ISO_SENSITIVITY_AUTO, 0), (cid::ISO_SENSITIVITY, 400)]
        );
    }

    #[test]
    fn test_focus_mapping() {
        assert_eq!(CameraProperty::Focus(0).controls(), [(cid::FOCUS_AUTO, 0)]);
        assert_eq!(CameraProperty::Focus(3).controls(), [(cid::FOCUS_AUTO, 1)]);
    }

    #[test]
    fn test_apply_skips_rejected_controls() {
        let mut device = MockDevice::new().rejecting(cid::ZOOM_ABSOLUTE);
        let props =
            parse_properties(&["awb=3 zoom=200 bright=50 nsf=on"]).expect("parses");

        assert_eq!(apply_properties(&mut device, &props), 2);
        assert_eq!(
            device.controls(),
            [(cid::AUTO_N_PRESET_WHITE_BALANCE, 3), (cid::BRIGHTNESS, 50)]
        );
    }
}
