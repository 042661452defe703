//! Frame validation for captured stills and preview streams.
//!
//! These checks are deliberately shallow: they catch truncated transfers and
//! format mix-ups before a bad file lands on disk, not decode errors.

use crate::traits::{CameraError, Format, FourCC, Frame, Result};

const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];
const JPEG_EOI: [u8; 2] = [0xFF, 0xD9];

/// Validates that a frame holds a JPEG image: it must start with the SOI
/// marker and contain an EOI marker.
pub fn validate_jpeg(frame: &Frame) -> Result<()> {
    let payload = frame.payload();

    if !payload.starts_with(&JPEG_SOI) {
        return Err(CameraError::InvalidFrame(format!(
            "missing JPEG start marker in {} byte payload",
            payload.len()
        )));
    }

    // Some sensors pad after EOI, so search instead of checking the tail
    if !payload.windows(2).any(|pair| pair == JPEG_EOI) {
        return Err(CameraError::InvalidFrame(
            "missing JPEG end marker".to_owned(),
        ));
    }

    Ok(())
}

/// Bytes an uncompressed frame of this format must carry, if known.
const fn raw_frame_size(format: &Format) -> Option<usize> {
    let pixels = format.width as usize * format.height as usize;
    match format.fourcc.0 {
        [b'N', b'V', b'1', b'2'] => Some(pixels * 3 / 2),
        [b'Y', b'U', b'Y', b'V'] | [b'U', b'Y', b'V', b'Y'] => Some(pixels * 2),
        _ => None,
    }
}

/// Validates that an uncompressed frame is at least as large as its format
/// requires.
pub fn validate_raw_size(frame: &Frame, format: &Format) -> Result<()> {
    let expected = raw_frame_size(format).ok_or_else(|| {
        CameraError::InvalidFrame(format!("no size rule for {}", format.fourcc))
    })?;
    let actual = frame.payload().len();

    if actual < expected {
        return Err(CameraError::InvalidFrame(format!(
            "{} frame {}x{} has {actual} bytes, expected {expected}",
            format.fourcc, format.width, format.height
        )));
    }

    Ok(())
}

/// Validates a still image according to the format it was captured in.
pub fn validate_still(frame: &Frame, format: &Format) -> Result<()> {
    if format.fourcc == FourCC::MJPG {
        validate_jpeg(frame)
    } else {
        validate_raw_size(frame, format)
    }
}

/// Whether sequence number `current` directly follows `previous`, allowing
/// for wraparound.
#[must_use]
pub const fn is_next_sequence(previous: u32, current: u32) -> bool {
    current == previous.wrapping_add(1)
}

/// Validates that a sequence of frames has incrementing sequence numbers.
///
/// # Errors
///
/// Returns `StreamError` if:
/// - The frames slice is empty
/// - Any sequence number doesn't increment by exactly 1 from the previous
pub fn validate_frame_sequence(frames: &[Frame]) -> Result<()> {
    if frames.is_empty() {
        return Err(CameraError::StreamError(
            "Cannot validate empty frame sequence".to_owned(),
        ));
    }

    for (i, pair) in frames.windows(2).enumerate() {
        let [prev, curr] = pair else { continue };
        let prev_seq = prev.metadata.sequence;
        let curr_seq = curr.metadata.sequence;

        if !is_next_sequence(prev_seq, curr_seq) {
            return Err(CameraError::StreamError(format!(
                "Frame sequence gap at index {}: expected {}, got {curr_seq}",
                i + 1,
                prev_seq.wrapping_add(1)
            )));
        }
    }

    Ok(())
}
