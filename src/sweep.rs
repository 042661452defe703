//! Cyclic parameter axes and the sweep state that owns them.
//!
//! Each axis advances its index on iterations divisible by its interval and
//! wraps at the end of its table. Width/height tables are zipped into a single
//! [`Resolution`] axis, so a pair always shares one index.

use std::path::Path;

use crate::config::{AxisSpec, ConfigError, ResolutionSpec, SweepConfig};
use crate::invocation::{
    check_device_tag, check_range, CameraParams, CaptureInvocation, ImageFormat, InvocationError,
    NoiseFilter, PixelFormat, Resolution, AWB_RANGE, BRIGHTNESS_RANGE, FOCUS_RANGE, ISO_RANGE,
    ZOOM_RANGE,
};

/// One independently cycling parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Axis<V> {
    name: &'static str,
    values: Vec<V>,
    idx: usize,
    interval: u32,
}

impl<V> Axis<V> {
    /// Create an axis positioned on its first value.
    pub fn new(name: &'static str, values: Vec<V>, interval: u32) -> Result<Self, ConfigError> {
        if interval == 0 {
            return Err(ConfigError::ZeroInterval { axis: name });
        }
        if values.is_empty() {
            return Err(ConfigError::EmptyTable { axis: name });
        }
        Ok(Self {
            name,
            values,
            idx: 0,
            interval,
        })
    }

    /// Step to the next value if `iteration` is a multiple of the interval.
    ///
    /// Returns whether the index moved.
    pub fn advance(&mut self, iteration: u64) -> bool {
        if iteration % u64::from(self.interval) != 0 {
            return false;
        }
        self.idx = (self.idx + 1) % self.values.len();
        true
    }

    /// Currently selected value.
    #[must_use]
    #[allow(clippy::indexing_slicing)] // idx < values.len() and values is never empty
    pub fn current(&self) -> &V {
        &self.values[self.idx]
    }

    /// Axis name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Current index into the value table.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.idx
    }

    /// Advance interval.
    #[must_use]
    pub const fn interval(&self) -> u32 {
        self.interval
    }

    /// Number of candidate values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false; empty tables are rejected at construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Axis<u32> {
    fn numeric(
        name: &'static str,
        spec: &AxisSpec<u32>,
        range: &std::ops::RangeInclusive<u32>,
    ) -> Result<Self, ConfigError> {
        for &value in &spec.values {
            check_range(name, value, range)
                .map_err(|source| ConfigError::InvalidValue { axis: name, source })?;
        }
        Self::new(name, spec.values.clone(), spec.interval)
    }
}

impl Axis<Resolution> {
    fn paired(name: &'static str, spec: &ResolutionSpec) -> Result<Self, ConfigError> {
        if spec.widths.len() != spec.heights.len() {
            return Err(ConfigError::MismatchedPair {
                axis: name,
                widths: spec.widths.len(),
                heights: spec.heights.len(),
            });
        }
        let values: Vec<Resolution> = spec
            .widths
            .iter()
            .zip(&spec.heights)
            .map(|(&width, &height)| Resolution::new(width, height))
            .collect();
        if values.iter().any(|res| res.width == 0 || res.height == 0) {
            return Err(ConfigError::InvalidValue {
                axis: name,
                source: InvocationError::ZeroDimension(name),
            });
        }
        Self::new(name, values, spec.interval)
    }
}

/// All axes of a sweep plus the last iteration applied to them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepState {
    device_tag: String,
    focus: Axis<u32>,
    awb: Axis<u32>,
    iso: Axis<u32>,
    bright: Axis<u32>,
    zoom: Axis<u32>,
    image_resolution: Axis<Resolution>,
    preview_resolution: Axis<Resolution>,
    preview_format: Axis<PixelFormat>,
    image_format: ImageFormat,
    ldc: bool,
    nsf: NoiseFilter,
    iteration: u64,
}

impl SweepState {
    /// Build and validate every axis. Any bad interval, empty table,
    /// mismatched pair or out-of-range value is reported here, before the
    /// first iteration runs.
    pub fn new(config: &SweepConfig) -> Result<Self, ConfigError> {
        check_device_tag(&config.device_tag).map_err(|source| ConfigError::InvalidValue {
            axis: "device",
            source,
        })?;
        Ok(Self {
            device_tag: config.device_tag.clone(),
            focus: Axis::<u32>::numeric("focus", &config.focus, &FOCUS_RANGE)?,
            awb: Axis::<u32>::numeric("awb", &config.awb, &AWB_RANGE)?,
            iso: Axis::<u32>::numeric("iso", &config.iso, &ISO_RANGE)?,
            bright: Axis::<u32>::numeric("bright", &config.bright, &BRIGHTNESS_RANGE)?,
            zoom: Axis::<u32>::numeric("zoom", &config.zoom, &ZOOM_RANGE)?,
            image_resolution: Axis::<Resolution>::paired(
                "image_resolution",
                &config.image_resolution,
            )?,
            preview_resolution: Axis::<Resolution>::paired(
                "preview_resolution",
                &config.preview_resolution,
            )?,
            preview_format: Axis::new(
                "preview_format",
                config.preview_format.values.clone(),
                config.preview_format.interval,
            )?,
            image_format: config.image_format,
            ldc: config.ldc,
            nsf: config.nsf,
            iteration: 0,
        })
    }

    /// Apply `iteration` to every axis.
    ///
    /// Iterations at or below the last applied one are ignored, so a repeated
    /// call never double-advances. Returns whether the iteration was applied.
    pub fn advance(&mut self, iteration: u64) -> bool {
        if iteration <= self.iteration {
            return false;
        }
        self.iteration = iteration;

        let moved = [
            self.focus.advance(iteration),
            self.awb.advance(iteration),
            self.iso.advance(iteration),
            self.bright.advance(iteration),
            self.zoom.advance(iteration),
            self.image_resolution.advance(iteration),
            self.preview_resolution.advance(iteration),
            self.preview_format.advance(iteration),
        ];
        tracing::trace!(
            iteration,
            moved = moved.iter().filter(|&&m| m).count(),
            "advanced sweep"
        );
        true
    }

    /// Current selection as a validated capture invocation writing to `output`.
    pub fn render(&self, output: &Path) -> Result<CaptureInvocation, InvocationError> {
        CaptureInvocation::builder()
            .preview(*self.preview_resolution.current(), *self.preview_format.current())
            .image(*self.image_resolution.current(), self.image_format)
            .output(output)
            .camera(self.camera_params())
            .build()
    }

    /// Current camera property selection.
    #[must_use]
    pub fn camera_params(&self) -> CameraParams {
        CameraParams {
            device: self.device_tag.clone(),
            focus: *self.focus.current(),
            awb: *self.awb.current(),
            iso_speed: *self.iso.current(),
            bright: *self.bright.current(),
            zoom: *self.zoom.current(),
            ldc: self.ldc,
            nsf: self.nsf,
        }
    }

    /// Last iteration applied, 0 before the first.
    #[must_use]
    pub const fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Focus axis.
    #[must_use]
    pub const fn focus(&self) -> &Axis<u32> {
        &self.focus
    }

    /// White balance axis.
    #[must_use]
    pub const fn awb(&self) -> &Axis<u32> {
        &self.awb
    }

    /// ISO axis.
    #[must_use]
    pub const fn iso(&self) -> &Axis<u32> {
        &self.iso
    }

    /// Brightness axis.
    #[must_use]
    pub const fn bright(&self) -> &Axis<u32> {
        &self.bright
    }

    /// Zoom axis.
    #[must_use]
    pub const fn zoom(&self) -> &Axis<u32> {
        &self.zoom
    }

    /// Still image resolution axis.
    #[must_use]
    pub const fn image_resolution(&self) -> &Axis<Resolution> {
        &self.image_resolution
    }

    /// Preview resolution axis.
    #[must_use]
    pub const fn preview_resolution(&self) -> &Axis<Resolution> {
        &self.preview_resolution
    }

    /// Preview pixel format axis.
    #[must_use]
    pub const fn preview_format(&self) -> &Axis<PixelFormat> {
        &self.preview_format
    }
}
