//! Single-shot high-quality capture: preview, then one still.
//!
//! This is what `hq-capture` runs for each sweep iteration. The sequence
//! mirrors a camera's half-press/full-press flow: controls are applied, the
//! preview format streams for a while so exposure and focus can settle, then
//! the device switches to the still format and one frame is written out.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::controls::{apply_properties, CameraProperty};
use crate::invocation::{ImageFormat, PixelFormat, Resolution};
use crate::traits::{CameraDevice, CameraError, CaptureStream, Format, Frame, Result};
use crate::validation::{is_next_sequence, validate_still};

/// Preview frames streamed before the still when not overridden.
pub const DEFAULT_PREVIEW_FRAMES: u32 = 30;

const PREVIEW_BUFFERS: u32 = 4;
const IMAGE_BUFFERS: u32 = 1;

/// Everything one capture needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRequest {
    /// Preview resolution.
    pub preview: Resolution,
    /// Preview pixel format.
    pub preview_format: PixelFormat,
    /// Still resolution.
    pub image: Resolution,
    /// Still format.
    pub image_format: ImageFormat,
    /// Output location, optionally containing a `%d` placeholder.
    pub output: String,
    /// Camera properties to apply before streaming.
    pub properties: Vec<CameraProperty>,
    /// Preview frames to stream before the still.
    pub preview_frames: u32,
}

/// What a capture produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureReport {
    /// File the still was written to.
    pub path: PathBuf,
    /// Bytes written.
    pub bytes: usize,
    /// Preview frames streamed.
    pub preview_frames: usize,
    /// Places in the preview where the driver skipped sequence numbers.
    pub preview_gaps: usize,
    /// Control writes the device accepted.
    pub controls_applied: usize,
    /// Still format the driver actually used.
    pub image_format: Format,
}

/// Expand the first `%d` or `%0Nd` placeholder in `template` with `index`.
/// Templates without a placeholder are returned unchanged.
#[must_use]
pub fn expand_location(template: &str, index: u32) -> String {
    let Some(start) = template.find('%') else {
        return template.to_owned();
    };
    let (head, rest) = template.split_at(start);
    let spec = rest.strip_prefix('%').unwrap_or(rest);

    let digits_len = spec.bytes().take_while(u8::is_ascii_digit).count();
    let (digits, tail) = spec.split_at(digits_len);
    let Some(tail) = tail.strip_prefix('d') else {
        return template.to_owned();
    };

    let width: usize = digits.parse().unwrap_or(0);
    let number = if digits.starts_with('0') {
        format!("{index:0width$}")
    } else {
        format!("{index:width$}")
    };
    format!("{head}{number}{tail}")
}

/// Set `wanted` and check the driver kept the pixel format.
fn negotiate<D: CameraDevice>(device: &mut D, wanted: &Format) -> Result<Format> {
    let actual = device.set_format(wanted)?;
    if actual.fourcc != wanted.fourcc {
        return Err(CameraError::FormatNotSupported {
            requested: wanted.fourcc,
            actual: actual.fourcc,
        });
    }
    if (actual.width, actual.height) != (wanted.width, wanted.height) {
        warn!(
            wanted = %format_args!("{}x{}", wanted.width, wanted.height),
            actual = %format_args!("{}x{}", actual.width, actual.height),
            "driver adjusted resolution"
        );
    }
    Ok(actual)
}

/// Preview frames streamed and sequence gaps seen among them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct PreviewStats {
    frames: usize,
    gaps: usize,
}

/// Stream `count` preview frames, dropping each one once its sequence number
/// has been checked against the previous frame.
fn stream_preview<D: CameraDevice>(device: &mut D, count: u32) -> Result<PreviewStats> {
    let mut stream = device.create_stream(PREVIEW_BUFFERS)?;
    let mut stats = PreviewStats::default();
    let mut previous = None;
    for _ in 0..count {
        let sequence = stream.next_frame()?.metadata.sequence;
        if let Some(prev) = previous {
            if !is_next_sequence(prev, sequence) {
                warn!(previous = prev, sequence, "preview dropped frames");
                stats.gaps += 1;
            }
        }
        previous = Some(sequence);
        stats.frames += 1;
    }
    Ok(stats)
}

fn grab_still<D: CameraDevice>(device: &mut D) -> Result<Frame> {
    let mut stream = device.create_stream(IMAGE_BUFFERS)?;
    stream.next_frame()
}

/// Run one capture against `device` and write the still to disk.
pub fn run_capture<D: CameraDevice>(
    device: &mut D,
    request: &CaptureRequest,
) -> Result<CaptureReport> {
    let controls_applied = apply_properties(device, &request.properties);
    debug!(controls_applied, "camera properties applied");

    let preview = Format::new(
        request.preview.width,
        request.preview.height,
        request.preview_format.fourcc(),
    );
    let preview = negotiate(device, &preview)?;
    info!(
        format = %preview.fourcc,
        width = preview.width,
        height = preview.height,
        "starting preview"
    );

    let preview_stats = stream_preview(device, request.preview_frames)?;

    info!("switching to image capture");
    let still_format = Format::new(
        request.image.width,
        request.image.height,
        request.image_format.fourcc(),
    );
    let still_format = negotiate(device, &still_format)?;
    let still = grab_still(device)?;
    validate_still(&still, &still_format)?;

    let path = PathBuf::from(expand_location(&request.output, 0));
    write_still(&path, still.payload())?;
    info!(path = %path.display(), bytes = still.payload().len(), "still written");

    Ok(CaptureReport {
        bytes: still.payload().len(),
        path,
        preview_frames: preview_stats.frames,
        preview_gaps: preview_stats.gaps,
        controls_applied,
        image_format: still_format,
    })
}

fn write_still(path: &Path, payload: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, payload)?;
    Ok(())
}
