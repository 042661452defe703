//! The bounded sweep loop.

use std::io::Write;
use std::path::PathBuf;

use crate::dispatch::Dispatcher;
use crate::invocation::InvocationError;
use crate::sweep::SweepState;

/// Errors that stop a sweep midway.
#[derive(Debug, thiserror::Error)]
pub enum SweepError {
    /// The current selection did not form a valid invocation.
    #[error("cannot render iteration {iteration}: {source}")]
    Render {
        /// Iteration being rendered.
        iteration: u64,
        /// What was wrong.
        source: InvocationError,
    },
    /// The progress line could not be written.
    #[error("cannot write progress: {0}")]
    Progress(#[from] std::io::Error),
}

/// Drives a [`SweepState`] through iterations `1..cycles`, dispatching one
/// capture per iteration.
pub struct SweepDriver<D> {
    state: SweepState,
    output: PathBuf,
    dispatcher: D,
}

impl<D: Dispatcher> SweepDriver<D> {
    /// Create a driver writing captures to `output`.
    pub const fn new(state: SweepState, output: PathBuf, dispatcher: D) -> Self {
        Self {
            state,
            output,
            dispatcher,
        }
    }

    /// Run iterations `1..cycles`, printing one progress line per iteration
    /// to `progress`. Returns the number of iterations run.
    ///
    /// Dispatch outcomes are logged and otherwise ignored; a failing capture
    /// never stops the sweep.
    pub fn run<W: Write>(&mut self, cycles: u64, progress: &mut W) -> Result<u64, SweepError> {
        let mut ran = 0;
        for iteration in 1..cycles {
            self.state.advance(iteration);
            let invocation = self
                .state
                .render(&self.output)
                .map_err(|source| SweepError::Render { iteration, source })?;

            writeln!(
                progress,
                "[{iteration}] >>>: {} {invocation}",
                self.dispatcher.program().display()
            )?;
            progress.flush()?;

            // Outcomes are logged by the dispatcher and never change the loop
            self.dispatcher.dispatch(&invocation);
            ran += 1;
        }
        Ok(ran)
    }

    /// Current sweep state.
    pub const fn state(&self) -> &SweepState {
        &self.state
    }

    /// Give back the dispatcher.
    pub fn into_dispatcher(self) -> D {
        self.dispatcher
    }
}
