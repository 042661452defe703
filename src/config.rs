//! Sweep configuration: parameter tables, cycle intervals and plan files.
//!
//! The built-in tables reproduce the stress run used on the camera bring-up
//! boards. A TOML plan file can replace any subset of axes:
//!
//! ```toml
//! [iso]
//! values = [0, 400, 1600]
//! interval = 3
//!
//! [image_resolution]
//! widths = [1920, 1280]
//! heights = [1080, 720]
//! interval = 10
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::invocation::{ImageFormat, InvocationError, NoiseFilter, PixelFormat};

/// Device tag that selects the low-resolution sensor tables.
pub const SECONDARY_TAG: &str = "secondary";

/// Errors that abort startup before the first iteration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An axis would never advance, or advance by division by zero.
    #[error("axis {axis}: interval must be positive")]
    ZeroInterval {
        /// Axis name.
        axis: &'static str,
    },
    /// An axis with nothing to cycle through.
    #[error("axis {axis}: value table is empty")]
    EmptyTable {
        /// Axis name.
        axis: &'static str,
    },
    /// Width and height tables of a paired axis differ in length.
    #[error("axis {axis}: {widths} widths but {heights} heights")]
    MismatchedPair {
        /// Axis name.
        axis: &'static str,
        /// Width table length.
        widths: usize,
        /// Height table length.
        heights: usize,
    },
    /// A table entry the camera would reject.
    #[error("axis {axis}: {source}")]
    InvalidValue {
        /// Axis name.
        axis: &'static str,
        /// What was wrong with the value.
        source: InvocationError,
    },
    /// The plan file could not be read.
    #[error("cannot read plan {}: {source}", .path.display())]
    Read {
        /// Plan file path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The plan file is not valid TOML for a plan.
    #[error("cannot parse plan: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Which sensor the sweep targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    /// Main high-resolution sensor.
    Primary,
    /// Secondary low-resolution sensor.
    Secondary,
}

impl DeviceClass {
    /// `"secondary"` picks the secondary sensor, anything else the primary.
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        if tag == SECONDARY_TAG {
            Self::Secondary
        } else {
            Self::Primary
        }
    }
}

/// Values and advance interval of one axis.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AxisSpec<V> {
    /// Candidate values, cycled in order.
    pub values: Vec<V>,
    /// The axis advances on iterations divisible by this.
    pub interval: u32,
}

impl<V: Clone> AxisSpec<V> {
    fn new(values: &[V], interval: u32) -> Self {
        Self {
            values: values.to_vec(),
            interval,
        }
    }
}

/// Width and height tables of a paired resolution axis.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolutionSpec {
    /// Widths, index-aligned with `heights`.
    pub widths: Vec<u32>,
    /// Heights, index-aligned with `widths`.
    pub heights: Vec<u32>,
    /// The pair advances on iterations divisible by this.
    pub interval: u32,
}

impl ResolutionSpec {
    fn new(widths: &[u32], heights: &[u32], interval: u32) -> Self {
        Self {
            widths: widths.to_vec(),
            heights: heights.to_vec(),
            interval,
        }
    }
}

/// Everything needed to build a [`SweepState`](crate::sweep::SweepState).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepConfig {
    /// Device tag as given on the command line, forwarded as `device=`.
    pub device_tag: String,
    /// Focus mode axis.
    pub focus: AxisSpec<u32>,
    /// White balance axis.
    pub awb: AxisSpec<u32>,
    /// ISO speed axis.
    pub iso: AxisSpec<u32>,
    /// Brightness axis.
    pub bright: AxisSpec<u32>,
    /// Zoom axis.
    pub zoom: AxisSpec<u32>,
    /// Still image resolution pair.
    pub image_resolution: ResolutionSpec,
    /// Preview resolution pair.
    pub preview_resolution: ResolutionSpec,
    /// Preview pixel format axis.
    pub preview_format: AxisSpec<PixelFormat>,
    /// Still image format, fixed for the whole sweep.
    pub image_format: ImageFormat,
    /// Lens distortion correction, fixed for the whole sweep.
    pub ldc: bool,
    /// Noise suppression filter, fixed for the whole sweep.
    pub nsf: NoiseFilter,
}

impl SweepConfig {
    /// Built-in tables for the given device tag.
    #[must_use]
    pub fn defaults(device_tag: &str) -> Self {
        let image_resolution = match DeviceClass::from_tag(device_tag) {
            DeviceClass::Secondary => ResolutionSpec::new(
                &[2592, 1296, 864, 2048],
                &[1944, 972, 648, 1536],
                23,
            ),
            DeviceClass::Primary => ResolutionSpec::new(
                &[4032, 3648, 3264, 2584, 2048, 640],
                &[3024, 2736, 2448, 1936, 1536, 480],
                23,
            ),
        };

        Self {
            device_tag: device_tag.to_owned(),
            focus: AxisSpec::new(&[0, 1, 2, 3], 19),
            awb: AxisSpec::new(&[0, 1, 2, 3, 4, 5, 6, 7, 8, 9], 1),
            iso: AxisSpec::new(&[0, 100, 200, 400, 800, 1000, 1600], 7),
            bright: AxisSpec::new(&[30, 34, 38, 42, 46, 50, 54, 58, 62, 66, 70], 5),
            zoom: AxisSpec::new(&[100, 200, 300, 400, 500, 600, 700, 800], 11),
            image_resolution,
            preview_resolution: ResolutionSpec::new(&[640, 320, 640], &[480, 240, 480], 93),
            preview_format: AxisSpec::new(&[PixelFormat::Nv12, PixelFormat::Uyvy], 47),
            image_format: ImageFormat::Jpeg,
            ldc: true,
            nsf: NoiseFilter::On,
        }
    }

    /// Replace the axes a plan names, keeping the rest.
    #[must_use]
    pub fn with_plan(mut self, plan: Plan) -> Self {
        if let Some(axis) = plan.focus {
            self.focus = axis;
        }
        if let Some(axis) = plan.awb {
            self.awb = axis;
        }
        if let Some(axis) = plan.iso {
            self.iso = axis;
        }
        if let Some(axis) = plan.bright {
            self.bright = axis;
        }
        if let Some(axis) = plan.zoom {
            self.zoom = axis;
        }
        if let Some(axis) = plan.image_resolution {
            self.image_resolution = axis;
        }
        if let Some(axis) = plan.preview_resolution {
            self.preview_resolution = axis;
        }
        if let Some(axis) = plan.preview_format {
            self.preview_format = axis;
        }
        if let Some(ldc) = plan.ldc {
            self.ldc = ldc;
        }
        if let Some(nsf) = plan.nsf {
            self.nsf = nsf;
        }
        self
    }
}

/// A partial override of the built-in tables, read from TOML.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Plan {
    /// Focus mode axis.
    pub focus: Option<AxisSpec<u32>>,
    /// White balance axis.
    pub awb: Option<AxisSpec<u32>>,
    /// ISO speed axis.
    pub iso: Option<AxisSpec<u32>>,
    /// Brightness axis.
    pub bright: Option<AxisSpec<u32>>,
    /// Zoom axis.
    pub zoom: Option<AxisSpec<u32>>,
    /// Still image resolution pair.
    pub image_resolution: Option<ResolutionSpec>,
    /// Preview resolution pair.
    pub preview_resolution: Option<ResolutionSpec>,
    /// Preview pixel format axis.
    pub preview_format: Option<AxisSpec<PixelFormat>>,
    /// Lens distortion correction.
    pub ldc: Option<bool>,
    /// Noise suppression filter.
    pub nsf: Option<NoiseFilter>,
}

impl Plan {
    /// Parse a plan from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a plan file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}
