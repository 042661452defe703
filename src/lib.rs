//! Pi-Cam-Sweep: camera parameter stress testing over V4L2
//!
//! The sweep driver cycles focus, white balance, ISO, brightness, zoom and
//! resolutions across a bounded number of iterations, launching one capture
//! per iteration. The capture side is trait-based so it runs against real
//! hardware or a mock device.

pub mod capture;
pub mod config;
pub mod controls;
pub mod device;
pub mod dispatch;
pub mod driver;
pub mod invocation;
pub mod sweep;
pub mod traits;
pub mod validation;

#[cfg(test)]
pub mod mock;

pub use config::{ConfigError, Plan, SweepConfig};
pub use device::V4L2Device;
pub use dispatch::{DispatchOutcome, Dispatcher, DryRunDispatcher, ProcessDispatcher};
pub use driver::{SweepDriver, SweepError};
pub use invocation::{CameraParams, CaptureInvocation, ImageFormat, PixelFormat, Resolution};
pub use sweep::{Axis, SweepState};
pub use traits::{
    CameraDevice, CameraError, CaptureStream, DeviceCapabilities, Format, FourCC, Frame,
    FrameMetadata,
};
