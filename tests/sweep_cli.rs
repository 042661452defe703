//! End-to-end sweep runs through the built binaries.
//!
//! No camera is needed: dry runs never launch anything, and a live run whose
//! captures all fail must still complete every iteration.

use std::fs;
use std::path::PathBuf;
use std::process::Command;

use pi_cam_sweep::{
    DispatchOutcome, Dispatcher, Plan, ProcessDispatcher, SweepConfig, SweepDriver, SweepState,
};

fn sweep_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_pi-cam-sweep"))
}

#[test]
fn test_dry_run_prints_one_line_per_iteration() {
    let output = sweep_bin()
        .args(["secondary", "6", "/tmp/shot.jpg", "--dry-run"])
        .args(["--capture-cmd", "./hq-capture"])
        .output()
        .expect("sweep binary runs");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("utf-8");
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 5);
    assert_eq!(
        lines.first().copied(),
        Some(
            "[1] >>>: ./hq-capture 640 480 NV12 2592 1944 image/jpeg /tmp/shot.jpg \
             \"device=secondary focus=0 awb=1 iso_speed=0 bright=30 zoom=100 ldc=true nsf=on\""
        )
    );
    // brightness moves on iteration 5
    assert!(lines.get(4).is_some_and(|line| line.contains("bright=34")));
}

#[test]
fn test_single_cycle_is_empty() {
    let output = sweep_bin()
        .args(["primary", "1", "/tmp/shot.jpg", "--dry-run"])
        .output()
        .expect("sweep binary runs");

    assert!(output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn test_bad_plan_aborts_before_first_iteration() {
    let dir = tempfile::tempdir().expect("tempdir");
    let plan = dir.path().join("plan.toml");
    fs::write(
        &plan,
        "[image_resolution]\nwidths = [640, 320]\nheights = [480]\ninterval = 2\n",
    )
    .expect("write plan");

    let output = sweep_bin()
        .args(["primary", "10", "/tmp/shot.jpg", "--dry-run", "--plan"])
        .arg(&plan)
        .output()
        .expect("sweep binary runs");

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("image_resolution"), "stderr: {stderr}");
}

#[test]
fn test_plan_file_drives_the_tables() {
    let dir = tempfile::tempdir().expect("tempdir");
    let plan_path = dir.path().join("plan.toml");
    fs::write(
        &plan_path,
        r#"
        [zoom]
        values = [200, 400]
        interval = 1

        [preview_format]
        values = ["UYVY"]
        interval = 3
        "#,
    )
    .expect("write plan");

    let plan = Plan::from_file(&plan_path).expect("plan parses");
    let config = SweepConfig::defaults("primary").with_plan(plan);
    let mut state = SweepState::new(&config).expect("plan is valid");

    state.advance(1);
    let invocation = state.render(&dir.path().join("x.jpg")).expect("renders");
    assert_eq!(invocation.camera.zoom, 400);
    assert_eq!(invocation.preview_format.to_string(), "UYVY");
}

/// Launches the real capture tool; without a camera every capture fails.
struct CountingDispatcher {
    inner: ProcessDispatcher,
    outcomes: Vec<DispatchOutcome>,
}

impl Dispatcher for CountingDispatcher {
    fn program(&self) -> &std::path::Path {
        self.inner.program()
    }

    fn dispatch(&mut self, invocation: &pi_cam_sweep::CaptureInvocation) -> DispatchOutcome {
        let outcome = self.inner.dispatch(invocation);
        self.outcomes.push(outcome.clone());
        outcome
    }
}

#[test]
fn test_capture_failures_never_stop_the_sweep() {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = SweepState::new(&SweepConfig::defaults("9")).expect("valid defaults");
    let dispatcher = CountingDispatcher {
        inner: ProcessDispatcher::new(PathBuf::from(env!("CARGO_BIN_EXE_hq-capture"))),
        outcomes: Vec::new(),
    };

    let mut driver = SweepDriver::new(state, dir.path().join("shot.jpg"), dispatcher);
    let mut progress = Vec::new();
    let ran = driver.run(4, &mut progress).expect("sweep completes");

    assert_eq!(ran, 3);
    let outcomes = driver.into_dispatcher().outcomes;
    assert_eq!(outcomes.len(), 3);
    assert!(outcomes
        .iter()
        .all(|outcome| !matches!(outcome, DispatchOutcome::SpawnFailed(_))));
}

#[test]
fn test_bundled_quick_plan_is_valid() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos/quick_plan.toml");
    let plan = Plan::from_file(&path).expect("bundled plan parses");
    let config = SweepConfig::defaults("primary").with_plan(plan);
    let mut state = SweepState::new(&config).expect("bundled plan is valid");

    for iteration in 1..=30 {
        state.advance(iteration);
    }
    assert_eq!(state.image_resolution().index(), 0);
    assert_eq!(state.iso().index(), 1);
    assert!(state.camera_params().to_string().ends_with("nsf=auto"));
}

#[test]
fn test_non_positive_cycles_run_nothing() {
    for cycles in ["0", "-5"] {
        let output = sweep_bin()
            .args(["primary", cycles, "/tmp/shot.jpg", "--dry-run"])
            .output()
            .expect("sweep binary runs");

        assert!(output.status.success(), "cycles {cycles}");
        assert!(output.stdout.is_empty(), "cycles {cycles}");
    }
}

#[test]
fn test_device_tag_with_space_aborts_before_first_iteration() {
    let output = sweep_bin()
        .args(["my cam", "5", "/tmp/shot.jpg", "--dry-run"])
        .output()
        .expect("sweep binary runs");

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}
