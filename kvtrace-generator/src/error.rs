//! Errors of a generation run.

use thiserror::Error;

use crate::profile::ProfileError;

/// Errors that abort a generation run.
///
/// None of these are recoverable within a run. A failed run never leaves a trace file behind
/// under its final name, see [`TraceFile`](crate::TraceFile).
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// The profile failed validation.
    #[error("invalid profile: {0}")]
    InvalidConfig(#[from] ProfileError),

    /// Rejection sampling did not find an unused key within its attempt budget.
    #[error("no unused key found after {attempts} attempts")]
    ExhaustedKeySpace {
        /// Number of candidate keys drawn before giving up.
        attempts: u32,
    },

    /// Opening, writing, flushing or persisting the output failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The run was cancelled before all operations were emitted.
    #[error("generation cancelled after {completed} operations")]
    Cancelled {
        /// Number of operations emitted before cancellation was observed.
        completed: u64,
    },
}

/// Result type for generation operations.
pub type GeneratorResult<T> = Result<T, GeneratorError>;
