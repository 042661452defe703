//! Typed argument list for the capture collaborator.
//!
//! A [`CaptureInvocation`] is what one sweep iteration hands to the external
//! capture process. Every field is range-checked by the builder so a bad
//! parameter table can never produce a malformed command line. The positional
//! contract is:
//!
//! ```text
//! <preview_w> <preview_h> <preview_fmt> <image_w> <image_h> <image_fmt> <output> "<camera params>"
//! ```

use std::ffi::OsString;
use std::fmt;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;

use crate::traits::FourCC;

/// Focus modes understood by the camera: off, on, auto, autolock.
pub const FOCUS_RANGE: RangeInclusive<u32> = 0..=3;
/// White balance presets, from "off" through "horizon".
pub const AWB_RANGE: RangeInclusive<u32> = 0..=9;
/// ISO speed, 0 meaning automatic.
pub const ISO_RANGE: RangeInclusive<u32> = 0..=1600;
/// Brightness level.
pub const BRIGHTNESS_RANGE: RangeInclusive<u32> = 0..=100;
/// Digital zoom factor in percent.
pub const ZOOM_RANGE: RangeInclusive<u32> = 100..=800;

/// Errors raised while building or parsing an invocation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvocationError {
    /// A required builder field was never set.
    #[error("missing {0}")]
    Missing(&'static str),
    /// A width or height of zero.
    #[error("{0} has a zero dimension")]
    ZeroDimension(&'static str),
    /// The output location is empty.
    #[error("output path is empty")]
    EmptyOutput,
    /// A camera parameter outside what the device accepts.
    #[error("{field}={value} is outside {min}..={max}")]
    OutOfRange {
        /// Parameter name.
        field: &'static str,
        /// Offending value.
        value: u32,
        /// Inclusive lower bound.
        min: u32,
        /// Inclusive upper bound.
        max: u32,
    },
    /// A pixel format token nobody recognizes.
    #[error("unknown pixel format {0:?}")]
    UnknownFormat(String),
    /// A device tag that would not survive as a single `device=` token.
    #[error("device tag {0:?} must be non-empty without whitespace or '='")]
    InvalidDevice(String),
}

/// Check `value` against an inclusive range, naming the field on failure.
pub fn check_range(
    field: &'static str,
    value: u32,
    range: &RangeInclusive<u32>,
) -> Result<(), InvocationError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(InvocationError::OutOfRange {
            field,
            value,
            min: *range.start(),
            max: *range.end(),
        })
    }
}

/// A device tag must stay one `key=value` token once the camera properties
/// are split on whitespace.
pub fn check_device_tag(tag: &str) -> Result<(), InvocationError> {
    if tag.is_empty() || tag.contains(|c: char| c == '=' || c.is_whitespace()) {
        Err(InvocationError::InvalidDevice(tag.to_owned()))
    } else {
        Ok(())
    }
}

/// A width/height pair. Paired sweep axes cycle over these so the two
/// dimensions can never drift apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Resolution {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Resolution {
    /// Create a resolution.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    fn check(self, field: &'static str) -> Result<Self, InvocationError> {
        if self.width == 0 || self.height == 0 {
            Err(InvocationError::ZeroDimension(field))
        } else {
            Ok(self)
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Uncompressed preview pixel formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum PixelFormat {
    /// 4:2:0 semi-planar.
    #[serde(rename = "NV12")]
    Nv12,
    /// 4:2:2 packed, chroma first.
    #[serde(rename = "UYVY")]
    Uyvy,
    /// 4:2:2 packed, luma first.
    #[serde(rename = "YUYV")]
    Yuyv,
}

impl PixelFormat {
    /// V4L2 fourcc for this format.
    #[must_use]
    pub const fn fourcc(self) -> FourCC {
        match self {
            Self::Nv12 => FourCC::NV12,
            Self::Uyvy => FourCC::UYVY,
            Self::Yuyv => FourCC::YUYV,
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Nv12 => "NV12",
            Self::Uyvy => "UYVY",
            Self::Yuyv => "YUYV",
        })
    }
}

impl FromStr for PixelFormat {
    type Err = InvocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "NV12" => Ok(Self::Nv12),
            "UYVY" => Ok(Self::Uyvy),
            "YUYV" | "YUY2" => Ok(Self::Yuyv),
            _ => Err(InvocationError::UnknownFormat(s.to_owned())),
        }
    }
}

/// Still image formats. The sweep always asks for JPEG; raw stills exist for
/// devices without a compressed path (e.g. vivid).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    /// `image/jpeg`
    #[default]
    Jpeg,
    /// An uncompressed frame written as-is.
    Raw(PixelFormat),
}

impl ImageFormat {
    /// V4L2 fourcc for this format.
    #[must_use]
    pub const fn fourcc(self) -> FourCC {
        match self {
            Self::Jpeg => FourCC::MJPG,
            Self::Raw(pixel) => pixel.fourcc(),
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jpeg => f.write_str("image/jpeg"),
            Self::Raw(pixel) => pixel.fmt(f),
        }
    }
}

impl FromStr for ImageFormat {
    type Err = InvocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("image/jpeg") {
            return Ok(Self::Jpeg);
        }
        s.parse().map(Self::Raw)
    }
}

/// ISO noise suppression filter mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoiseFilter {
    /// Disabled.
    Off,
    /// Enabled.
    #[default]
    On,
    /// Left to the sensor.
    Auto,
}

impl fmt::Display for NoiseFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Off => "off",
            Self::On => "on",
            Self::Auto => "auto",
        })
    }
}

/// Camera property overrides passed as `key=value` tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraParams {
    /// Device class tag, forwarded verbatim.
    pub device: String,
    /// Focus mode.
    pub focus: u32,
    /// White balance preset.
    pub awb: u32,
    /// ISO speed.
    pub iso_speed: u32,
    /// Brightness level.
    pub bright: u32,
    /// Zoom factor.
    pub zoom: u32,
    /// Lens distortion correction.
    pub ldc: bool,
    /// Noise suppression filter.
    pub nsf: NoiseFilter,
}

impl CameraParams {
    /// Check the device tag and range-check every numeric property.
    pub fn validate(&self) -> Result<(), InvocationError> {
        check_device_tag(&self.device)?;
        check_range("focus", self.focus, &FOCUS_RANGE)?;
        check_range("awb", self.awb, &AWB_RANGE)?;
        check_range("iso_speed", self.iso_speed, &ISO_RANGE)?;
        check_range("bright", self.bright, &BRIGHTNESS_RANGE)?;
        check_range("zoom", self.zoom, &ZOOM_RANGE)
    }

    /// The `key=value` tokens in the order the collaborator expects.
    #[must_use]
    pub fn tokens(&self) -> Vec<String> {
        vec![
            format!("device={}", self.device),
            format!("focus={}", self.focus),
            format!("awb={}", self.awb),
            format!("iso_speed={}", self.iso_speed),
            format!("bright={}", self.bright),
            format!("zoom={}", self.zoom),
            format!("ldc={}", self.ldc),
            format!("nsf={}", self.nsf),
        ]
    }
}

impl fmt::Display for CameraParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tokens().join(" "))
    }
}

/// One fully validated capture command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureInvocation {
    /// Preview stream resolution.
    pub preview: Resolution,
    /// Preview stream pixel format.
    pub preview_format: PixelFormat,
    /// Still image resolution.
    pub image: Resolution,
    /// Still image format.
    pub image_format: ImageFormat,
    /// Output file, optionally with a `%d` frame-index placeholder.
    pub output: PathBuf,
    /// Camera property overrides.
    pub camera: CameraParams,
}

impl CaptureInvocation {
    /// Start building an invocation.
    #[must_use]
    pub fn builder() -> CaptureInvocationBuilder {
        CaptureInvocationBuilder::default()
    }

    /// Serialize to positional process arguments.
    ///
    /// The camera properties travel as one whitespace-delimited argument.
    #[must_use]
    pub fn to_args(&self) -> Vec<OsString> {
        vec![
            self.preview.width.to_string().into(),
            self.preview.height.to_string().into(),
            self.preview_format.to_string().into(),
            self.image.width.to_string().into(),
            self.image.height.to_string().into(),
            self.image_format.to_string().into(),
            self.output.clone().into_os_string(),
            self.camera.to_string().into(),
        ]
    }
}

impl fmt::Display for CaptureInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {} {} \"{}\"",
            self.preview.width,
            self.preview.height,
            self.preview_format,
            self.image.width,
            self.image.height,
            self.image_format,
            self.output.display(),
            self.camera
        )
    }
}

/// Builder for [`CaptureInvocation`]; validation happens in [`build`](Self::build).
#[derive(Debug, Clone, Default)]
pub struct CaptureInvocationBuilder {
    preview: Option<(Resolution, PixelFormat)>,
    image: Option<Resolution>,
    image_format: ImageFormat,
    output: Option<PathBuf>,
    camera: Option<CameraParams>,
}

impl CaptureInvocationBuilder {
    /// Preview resolution and pixel format.
    #[must_use]
    pub fn preview(mut self, resolution: Resolution, format: PixelFormat) -> Self {
        self.preview = Some((resolution, format));
        self
    }

    /// Still image resolution and format.
    #[must_use]
    pub fn image(mut self, resolution: Resolution, format: ImageFormat) -> Self {
        self.image = Some(resolution);
        self.image_format = format;
        self
    }

    /// Output location.
    #[must_use]
    pub fn output<P: Into<PathBuf>>(mut self, output: P) -> Self {
        self.output = Some(output.into());
        self
    }

    /// Camera property overrides.
    #[must_use]
    pub fn camera(mut self, camera: CameraParams) -> Self {
        self.camera = Some(camera);
        self
    }

    /// Validate every field and produce the invocation.
    pub fn build(self) -> Result<CaptureInvocation, InvocationError> {
        let (preview, preview_format) = self.preview.ok_or(InvocationError::Missing("preview"))?;
        let image = self.image.ok_or(InvocationError::Missing("image"))?;
        let output = self.output.ok_or(InvocationError::Missing("output"))?;
        let camera = self.camera.ok_or(InvocationError::Missing("camera"))?;

        if output.as_os_str().is_empty() {
            return Err(InvocationError::EmptyOutput);
        }
        camera.validate()?;

        Ok(CaptureInvocation {
            preview: preview.check("preview")?,
            preview_format,
            image: image.check("image")?,
            image_format: self.image_format,
            output,
            camera,
        })
    }
}
