//! High-quality still capture, launched once per sweep iteration.
//!
//! ```text
//! hq-capture 640 480 UYVY 2048 1536 image/jpeg shot.jpg "device=primary focus=1 awb=5 zoom=200"
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use pi_cam_sweep::capture::{run_capture, CaptureRequest, DEFAULT_PREVIEW_FRAMES};
use pi_cam_sweep::controls::{parse_properties, selected_device};
use pi_cam_sweep::{CameraDevice, ImageFormat, PixelFormat, Resolution, V4L2Device};

/// Preview a camera, then capture one still
#[derive(Parser, Debug)]
#[command(name = "hq-capture")]
#[command(version)]
struct Args {
    /// Preview width in pixels
    preview_width: u32,

    /// Preview height in pixels
    preview_height: u32,

    /// Preview pixel format (NV12, UYVY, YUYV)
    preview_format: PixelFormat,

    /// Still width in pixels
    image_width: u32,

    /// Still height in pixels
    image_height: u32,

    /// Still format (image/jpeg, or a raw pixel format)
    image_format: ImageFormat,

    /// Output file; a %d or %0Nd placeholder is replaced by the frame index
    output: String,

    /// Camera properties as key=value, in one argument or several
    properties: Vec<String>,

    /// Preview frames to stream before the still
    #[arg(long, default_value_t = DEFAULT_PREVIEW_FRAMES)]
    preview_frames: u32,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let properties = parse_properties(&args.properties)?;

    let request = CaptureRequest {
        preview: Resolution::new(args.preview_width, args.preview_height),
        preview_format: args.preview_format,
        image: Resolution::new(args.image_width, args.image_height),
        image_format: args.image_format,
        output: args.output,
        properties,
        preview_frames: args.preview_frames,
    };

    let index = selected_device(&request.properties);
    let mut device =
        V4L2Device::open(index).with_context(|| format!("cannot open camera {index}"))?;
    info!(
        card = %device.capabilities().card,
        driver = %device.capabilities().driver,
        "camera opened"
    );

    let report = run_capture(&mut device, &request).context("capture failed")?;
    info!(
        path = %report.path.display(),
        bytes = report.bytes,
        format = %report.image_format.fourcc,
        "finishing up"
    );
    Ok(())
}
