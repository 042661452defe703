//! Launching the capture collaborator.
//!
//! Dispatch is best-effort: whatever happens to the external process is
//! reported as a [`DispatchOutcome`] and logged, never turned into an error.
//! The sweep keeps going regardless.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, warn};

use crate::invocation::CaptureInvocation;

/// What happened to one external invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The process ran and exited successfully.
    Completed,
    /// The process ran and exited unsuccessfully; `None` when killed by a signal.
    Failed(Option<i32>),
    /// The process could not be started.
    SpawnFailed(String),
    /// Nothing was launched.
    Skipped,
}

/// Something that can carry out a capture invocation.
pub trait Dispatcher {
    /// Program shown in progress lines.
    fn program(&self) -> &Path;

    /// Run one invocation. Must not fail the caller.
    fn dispatch(&mut self, invocation: &CaptureInvocation) -> DispatchOutcome;
}

/// Runs the collaborator as a child process and waits for it.
#[derive(Debug, Clone)]
pub struct ProcessDispatcher {
    program: PathBuf,
}

impl ProcessDispatcher {
    /// Dispatch to `program`.
    #[must_use]
    pub const fn new(program: PathBuf) -> Self {
        Self { program }
    }
}

impl Dispatcher for ProcessDispatcher {
    fn program(&self) -> &Path {
        &self.program
    }

    fn dispatch(&mut self, invocation: &CaptureInvocation) -> DispatchOutcome {
        let status = Command::new(&self.program)
            .args(invocation.to_args())
            .status();

        match status {
            Ok(status) if status.success() => {
                debug!(program = %self.program.display(), "capture completed");
                DispatchOutcome::Completed
            }
            Ok(status) => {
                warn!(program = %self.program.display(), %status, "capture process failed");
                DispatchOutcome::Failed(status.code())
            }
            Err(err) => {
                warn!(program = %self.program.display(), error = %err, "cannot launch capture process");
                DispatchOutcome::SpawnFailed(err.to_string())
            }
        }
    }
}

/// Prints what would run without launching anything.
#[derive(Debug, Clone)]
pub struct DryRunDispatcher {
    program: PathBuf,
}

impl DryRunDispatcher {
    /// Pretend to dispatch to `program`.
    #[must_use]
    pub const fn new(program: PathBuf) -> Self {
        Self { program }
    }
}

impl Dispatcher for DryRunDispatcher {
    fn program(&self) -> &Path {
        &self.program
    }

    fn dispatch(&mut self, _invocation: &CaptureInvocation) -> DispatchOutcome {
        DispatchOutcome::Skipped
    }
}
