//! Step execution: one stage, one child process.
//!
//! [`StepRunner`] applies the step selection and turns a child's exit status
//! into a [`BookPipeError`]. Process spawning sits behind [`StageExecutor`] so
//! the pipeline can be driven without real stage programs.

use std::ffi::{OsStr, OsString};
use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Instant;

use tokio::process::Command;
use tracing::{debug, info, warn};

use bookpipe_shared::{BookPipeError, Result, StepId, StepSet};

use crate::pipeline::ProgressReporter;

// ---------------------------------------------------------------------------
// Invocation
// ---------------------------------------------------------------------------

/// A fully resolved command line for one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageInvocation {
    pub step: StepId,
    pub program: String,
    pub args: Vec<OsString>,
    /// Directory the child runs in.
    pub working_dir: PathBuf,
}

impl StageInvocation {
    pub fn new(step: StepId, program: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            step,
            program: program.into(),
            args: Vec::new(),
            working_dir: working_dir.into(),
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Append `flag value` when `value` is present.
    pub fn opt_arg(self, flag: &str, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.arg(flag).arg(value.to_string()),
            None => self,
        }
    }

    /// Arguments as lossy UTF-8, for display and assertions.
    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    /// Shell-like rendering of the command line.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.clone())
            .chain(self.args_lossy())
            .map(|part| {
                if part.is_empty() || part.contains(char::is_whitespace) {
                    format!("'{}'", part.replace('\'', r"'\''"))
                } else {
                    part
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

// ---------------------------------------------------------------------------
// Executor
// ---------------------------------------------------------------------------

/// How a stage program ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageExit {
    Code(i32),
    /// Terminated by a signal, no exit code.
    Signal,
}

/// Runs a stage invocation to completion.
pub trait StageExecutor: Sync {
    fn execute(
        &self,
        invocation: &StageInvocation,
    ) -> impl Future<Output = Result<StageExit>> + Send;
}

/// Spawns the stage as a child process with inherited stdio.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessExecutor;

impl StageExecutor for ProcessExecutor {
    async fn execute(&self, invocation: &StageInvocation) -> Result<StageExit> {
        debug!(
            step = %invocation.step,
            cwd = %invocation.working_dir.display(),
            "spawning stage process"
        );

        let status = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.working_dir)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|source| BookPipeError::Spawn {
                step: invocation.step,
                program: invocation.program.clone(),
                source,
            })?;

        Ok(match status.code() {
            Some(code) => StageExit::Code(code),
            None => StageExit::Signal,
        })
    }
}

// ---------------------------------------------------------------------------
// Step runner
// ---------------------------------------------------------------------------

/// What happened to a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Completed,
    /// Not in the selected set.
    Skipped,
    /// Selected, but only printed (dry run).
    Planned,
}

/// Executes selected steps and skips the rest.
pub struct StepRunner<'a, E> {
    selected: &'a StepSet,
    executor: &'a E,
    progress: &'a dyn ProgressReporter,
    dry_run: bool,
}

impl<'a, E: StageExecutor> StepRunner<'a, E> {
    pub fn new(
        selected: &'a StepSet,
        executor: &'a E,
        progress: &'a dyn ProgressReporter,
        dry_run: bool,
    ) -> Self {
        Self {
            selected,
            executor,
            progress,
            dry_run,
        }
    }

    /// Run one step, or skip it if it is not selected.
    ///
    /// Any non-zero exit is returned as an error; callers stop on it.
    pub async fn run(&self, invocation: &StageInvocation) -> Result<StepOutcome> {
        let step = invocation.step;

        if !self.selected.contains(step) {
            info!(%step, "step not selected, skipping");
            self.progress.step_skipped(step);
            return Ok(StepOutcome::Skipped);
        }

        if self.dry_run {
            self.progress.step_planned(invocation);
            return Ok(StepOutcome::Planned);
        }

        self.progress.step_started(invocation);
        info!(%step, command = %invocation.command_line(), "running step");

        let start = Instant::now();
        let exit = self.executor.execute(invocation).await?;

        match exit {
            StageExit::Code(0) => {
                let elapsed = start.elapsed();
                info!(%step, elapsed_ms = elapsed.as_millis(), "step complete");
                self.progress.step_finished(step, elapsed);
                Ok(StepOutcome::Completed)
            }
            StageExit::Code(code) => {
                warn!(%step, code, "step failed");
                Err(BookPipeError::StageFailed { step, code })
            }
            StageExit::Signal => {
                warn!(%step, "step terminated by signal");
                Err(BookPipeError::StageSignaled { step })
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Test support
// ---------------------------------------------------------------------------
