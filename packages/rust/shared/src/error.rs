//! Error types for bookpipe.
//!
//! Library crates use [`BookPipeError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics and maps it to
//! a process exit code with [`BookPipeError::exit_code`].

use std::path::PathBuf;

use crate::types::StepId;

/// Top-level error type for all bookpipe operations.
#[derive(Debug, thiserror::Error)]
pub enum BookPipeError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Malformed invocation (bad slug, bad chapter selection, ...).
    #[error("usage error: {message}")]
    Usage { message: String },

    /// A precondition on the inputs does not hold.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The stage program could not be started at all.
    #[error("failed to start {step} stage ({program}): {source}")]
    Spawn {
        step: StepId,
        program: String,
        source: std::io::Error,
    },

    /// The stage program ran and exited with a non-zero status.
    #[error("{step} stage failed with exit code {code}")]
    StageFailed { step: StepId, code: i32 },

    /// The stage program was terminated by a signal.
    #[error("{step} stage was terminated by a signal")]
    StageSignaled { step: StepId },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BookPipeError>;

impl BookPipeError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a usage error from any displayable message.
    pub fn usage(msg: impl Into<String>) -> Self {
        Self::Usage {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// The step this error originated from, if it came from a stage.
    pub fn step(&self) -> Option<StepId> {
        match self {
            Self::Spawn { step, .. }
            | Self::StageFailed { step, .. }
            | Self::StageSignaled { step } => Some(*step),
            _ => None,
        }
    }

    /// Process exit status for this error.
    ///
    /// A stage that exited non-zero propagates its own code; everything else
    /// maps to 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::StageFailed { code, .. } if *code != 0 => *code,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = BookPipeError::config("bad interpreter");
        assert_eq!(err.to_string(), "config error: bad interpreter");

        let err = BookPipeError::StageFailed {
            step: StepId::Translate,
            code: 3,
        };
        assert_eq!(err.to_string(), "translate stage failed with exit code 3");
    }

    #[test]
    fn stage_failure_propagates_exit_code() {
        let err = BookPipeError::StageFailed {
            step: StepId::Summarize,
            code: 42,
        };
        assert_eq!(err.exit_code(), 42);
        assert_eq!(err.step(), Some(StepId::Summarize));
    }

    #[test]
    fn other_errors_exit_with_one() {
        assert_eq!(BookPipeError::usage("missing slug").exit_code(), 1);
        assert_eq!(
            BookPipeError::StageSignaled {
                step: StepId::Audio
            }
            .exit_code(),
            1
        );
        let spawn = BookPipeError::Spawn {
            step: StepId::Extract,
            program: "python3".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(spawn.exit_code(), 1);
        assert_eq!(spawn.step(), Some(StepId::Extract));
        assert_eq!(BookPipeError::validation("x").step(), None);
    }
}
