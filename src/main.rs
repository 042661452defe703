//! Pi-cam-sweep binary: cycles camera parameters and launches one capture
//! per iteration.
//!
//! ```bash
//! pi-cam-sweep primary 43200 /tmp/shot.jpg
//! pi-cam-sweep secondary 500 /tmp/shot%03d.jpg --plan quick.toml --dry-run
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use pi_cam_sweep::{
    Dispatcher, DryRunDispatcher, Plan, ProcessDispatcher, SweepConfig, SweepDriver, SweepState,
};

/// Name of the capture tool shipped alongside this binary.
const CAPTURE_TOOL: &str = "hq-capture";

/// Camera parameter sweep
#[derive(Parser, Debug)]
#[command(name = "pi-cam-sweep")]
#[command(about = "Cycle camera parameters and capture one still per iteration")]
#[command(version)]
struct Args {
    /// Sensor to exercise; "secondary" selects the low-resolution tables
    device_class: String,

    /// Iterations run are 1..CYCLES; zero or negative runs nothing
    #[arg(allow_negative_numbers = true)]
    cycles: i64,

    /// Output file handed to every capture
    output: PathBuf,

    /// Capture program to launch (defaults to hq-capture next to this binary)
    #[arg(long)]
    capture_cmd: Option<PathBuf>,

    /// TOML plan overriding parameter tables and intervals
    #[arg(long)]
    plan: Option<PathBuf>,

    /// Print progress lines without launching captures
    #[arg(long)]
    dry_run: bool,
}

fn default_capture_cmd() -> PathBuf {
    std::env::current_exe()
        .map(|exe| exe.with_file_name(CAPTURE_TOOL))
        .unwrap_or_else(|_| PathBuf::from(CAPTURE_TOOL))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = SweepConfig::defaults(&args.device_class);
    if let Some(path) = &args.plan {
        let plan = Plan::from_file(path)?;
        config = config.with_plan(plan);
        info!(plan = %path.display(), "loaded sweep plan");
    }
    let state = SweepState::new(&config).context("invalid sweep configuration")?;

    let cycles = u64::try_from(args.cycles).unwrap_or(0);
    let program = args.capture_cmd.unwrap_or_else(default_capture_cmd);
    info!(
        device = %args.device_class,
        cycles,
        capture = %program.display(),
        "starting sweep"
    );

    let ran = if args.dry_run {
        run(state, args.output, DryRunDispatcher::new(program), cycles)?
    } else {
        run(state, args.output, ProcessDispatcher::new(program), cycles)?
    };

    info!(iterations = ran, "sweep finished");
    Ok(())
}

fn run<D: Dispatcher>(
    state: SweepState,
    output: PathBuf,
    dispatcher: D,
    cycles: u64,
) -> Result<u64> {
    let mut driver = SweepDriver::new(state, output, dispatcher);
    let stdout = std::io::stdout();
    let ran = driver.run(cycles, &mut stdout.lock())?;
    Ok(ran)
}
