//! Mock device implementation for testing without hardware.

use crate::traits::{
    CameraDevice, CameraError, CaptureStream, DeviceCapabilities, Format, FourCC, Frame,
    FrameMetadata, Result,
};
use std::time::Duration;

/// Mock device for testing without hardware.
pub struct MockDevice {
    capabilities: DeviceCapabilities,
    format: Format,
    frame_count: u32,
    controls: Vec<(u32, i64)>,
    rejected: Vec<u32>,
    formats_set: Vec<Format>,
    forced_fourcc: Option<FourCC>,
    drop_every: Option<u32>,
    pattern: TestPattern,
}

impl Default for MockDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDevice {
    /// Create a new mock device with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            capabilities: DeviceCapabilities {
                driver: "mock".to_owned(),
                card: "Mock Camera".to_owned(),
                bus_info: "mock:0".to_owned(),
                can_capture: true,
                can_stream: true,
            },
            format: Format::new(640, 480, FourCC::UYVY),
            frame_count: 0,
            controls: Vec::new(),
            rejected: Vec::new(),
            formats_set: Vec::new(),
            forced_fourcc: None,
            drop_every: None,
            pattern: TestPattern::Valid,
        }
    }

    /// Make the device refuse writes to control `id`.
    #[must_use]
    pub fn rejecting(mut self, id: u32) -> Self {
        self.rejected.push(id);
        self
    }

    /// Make the device ignore the requested pixel format and use `fourcc`.
    #[must_use]
    pub fn forcing_fourcc(mut self, fourcc: FourCC) -> Self {
        self.forced_fourcc = Some(fourcc);
        self
    }

    /// Skip every positive sequence number that is a multiple of `n`, as a driver does
    /// when it drops a frame.
    #[must_use]
    pub fn dropping_every(mut self, n: u32) -> Self {
        self.drop_every = Some(n);
        self
    }

    /// Set the frame pattern produced by streams.
    #[must_use]
    pub fn with_pattern(mut self, pattern: TestPattern) -> Self {
        self.pattern = pattern;
        self
    }

    /// Control writes accepted so far.
    #[must_use]
    pub fn controls(&self) -> &[(u32, i64)] {
        &self.controls
    }

    /// Every format applied, in order.
    #[must_use]
    pub fn formats_set(&self) -> &[Format] {
        &self.formats_set
    }
}

impl CameraDevice for MockDevice {
    type Stream<'a> = MockStream<'a>;

    fn capabilities(&self) -> &DeviceCapabilities {
        &self.capabilities
    }

    fn format(&self) -> Result<Format> {
        Ok(self.format.clone())
    }

    fn set_format(&mut self, format: &Format) -> Result<Format> {
        let fourcc = self.forced_fourcc.unwrap_or(format.fourcc);
        self.format = Format::new(format.width, format.height, fourcc);
        self.formats_set.push(self.format.clone());
        Ok(self.format.clone())
    }

    fn set_control(&mut self, id: u32, value: i64) -> Result<()> {
        if self.rejected.contains(&id) {
            return Err(CameraError::ControlFailed {
                id,
                reason: "Invalid argument".to_owned(),
            });
        }
        self.controls.push((id, value));
        Ok(())
    }

    fn create_stream(&mut self, _buffer_count: u32) -> Result<Self::Stream<'_>> {
        Ok(MockStream { device: self })
    }
}

/// Frame contents produced by the mock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestPattern {
    /// Well-formed frames for the current format.
    Valid,
    /// Frames cut short, as a driver would hand out on a bad transfer.
    Truncated,
}

/// Mock capture stream for testing.
pub struct MockStream<'a> {
    device: &'a mut MockDevice,
}

impl CaptureStream for MockStream<'_> {
    fn next_frame(&mut self) -> Result<Frame> {
        let data = generate_test_frame(&self.device.format, self.device.pattern);

        let seq = self.device.frame_count;
        self.device.frame_count += 1;
        if self
            .device
            .drop_every
            .is_some_and(|n| n > 0 && self.device.frame_count % n == 0)
        {
            self.device.frame_count += 1;
        }

        #[allow(clippy::cast_possible_truncation)]
        let bytes_used = data.len() as u32;

        Ok(Frame {
            data,
            metadata: FrameMetadata {
                sequence: seq,
                timestamp: Duration::from_millis(u64::from(seq) * 33), // ~30fps
                bytes_used,
            },
        })
    }
}

/// Generate frame data for the format's pixel layout.
fn generate_test_frame(format: &Format, pattern: TestPattern) -> Vec<u8> {
    let mut data = if format.fourcc == FourCC::MJPG {
        generate_jpeg(format.width, format.height)
    } else {
        let mut data = vec![0u8; format.size as usize];
        generate_gray(&mut data, format.fourcc);
        data
    };

    if pattern == TestPattern::Truncated {
        data.truncate(data.len() / 2);
    }
    data
}

/// A JPEG-framed payload: SOI, a few filler bytes, EOI.
fn generate_jpeg(width: u32, height: u32) -> Vec<u8> {
    let mut data = vec![0xFF, 0xD8];
    data.extend_from_slice(&width.to_be_bytes());
    data.extend_from_slice(&height.to_be_bytes());
    data.extend_from_slice(&[0xFF, 0xD9]);
    data
}

/// Mid-gray in the given raw layout.
fn generate_gray(data: &mut [u8], fourcc: FourCC) {
    if fourcc == FourCC::NV12 {
        data.fill(128);
        return;
    }
    // Packed 4:2:2: luma at even offsets for YUYV, odd for UYVY
    let luma_first = fourcc == FourCC::YUYV;
    for (i, byte) in data.iter_mut().enumerate() {
        let is_luma = (i % 2 == 0) == luma_first;
        *byte = if is_luma { 126 } else { 128 };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_device_creation() {
        let device = MockDevice::new();
        assert_eq!(device.capabilities().driver, "mock");
        assert!(device.capabilities().can_capture);
        assert!(device.capabilities().can_stream);
    }

    #[test]
    fn test_mock_device_format() {
        let mut device = MockDevice::new();
        let format = device.format().expect("format should succeed");
        assert_eq!(format.width, 640);
        assert_eq!(format.height, 480);

        let new_format = Format::new(1280, 720, FourCC::NV12);
        let actual = device
            .set_format(&new_format)
            .expect("set_format should succeed");
        assert_eq!(actual, new_format);
        assert_eq!(device.formats_set(), [new_format]);
    }

    #[test]
    fn test_forced_fourcc() {
        let mut device = MockDevice::new().forcing_fourcc(FourCC::YUYV);
        let actual = device
            .set_format(&Format::new(640, 480, FourCC::MJPG))
            .expect("set_format should succeed");
        assert_eq!(actual.fourcc, FourCC::YUYV);
    }

    #[test]
    fn test_mock_stream_capture() {
        let mut device = MockDevice::new();
        let mut stream = device
            .create_stream(4)
            .expect("create_stream should succeed");

        let frame1 = stream.next_frame().expect("next_frame should succeed");
        assert_eq!(frame1.metadata.sequence, 0);
        assert_eq!(frame1.data.len(), 640 * 480 * 2);

        let frame2 = stream.next_frame().expect("next_frame should succeed");
        assert_eq!(frame2.metadata.sequence, 1);
    }

    #[test]
    fn test_dropping_every_skips_sequence_numbers() {
        let mut device = MockDevice::new().dropping_every(3);
        let mut stream = device.create_stream(4).expect("create_stream should succeed");
        let seqs: Vec<u32> = (0..5)
            .map(|_| {
                stream
                    .next_frame()
                    .expect("next_frame should succeed")
                    .metadata
                    .sequence
            })
            .collect();
        assert_eq!(seqs, [0, 1, 2, 4, 5]);
    }

    #[test]
    fn test_jpeg_frame_is_framed() {
        let data = generate_test_frame(&Format::new(64, 48, FourCC::MJPG), TestPattern::Valid);
        assert_eq!(data.first(), Some(&0xFF));
        assert_eq!(data.get(1), Some(&0xD8));
        assert_eq!(data.get(data.len() - 2..), Some(&[0xFF, 0xD9][..]));
    }

    #[test]
    fn test_uyvy_chroma_first() {
        let data = generate_test_frame(&Format::new(4, 2, FourCC::UYVY), TestPattern::Valid);
        assert_eq!(data.get(..4), Some(&[128, 126, 128, 126][..]));
    }

    #[test]
    fn test_truncated_pattern() {
        let format = Format::new(64, 64, FourCC::NV12);
        let data = generate_test_frame(&format, TestPattern::Truncated);
        assert_eq!(data.len(), format.size as usize / 2);
    }

    #[test]
    fn test_rejected_control() {
        let mut device = MockDevice::new().rejecting(7);
        assert!(device.set_control(7, 1).is_err());
        assert!(device.set_control(8, 1).is_ok());
        assert_eq!(device.controls(), [(8, 1)]);
    }
}
