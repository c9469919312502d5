//! Error types for running commands and probing.

use std::borrow::Cow;
use std::io;
use std::time::Duration;
use thiserror::Error;

use crate::CollectorError;

/// Errors that can occur while running one bounded invocation.
///
/// None of these describe what the command reported. A command exiting non-zero is a regular
/// [crate::ProcessResult].
#[derive(Debug, Error)]
pub enum RunError {
    /// Failed to spawn the process.
    #[error("Failed to spawn process '{process_name}': {source}")]
    SpawnFailed {
        /// The command line of the process being spawned.
        process_name: Cow<'static, str>,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// A general IO error occurred while waiting for the process.
    #[error("IO error occurred while waiting for process '{process_name}': {source}")]
    IoError {
        /// The command line of the process.
        process_name: Cow<'static, str>,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// Failed to terminate the process after its deadline expired.
    #[error(
        "Failed to terminate process '{process_name}'. Graceful termination failed with: {graceful_error}. Forceful termination failed with: {forceful_error}"
    )]
    TerminationFailed {
        /// The command line of the process.
        process_name: Cow<'static, str>,
        /// The error that occurred during the graceful termination attempt.
        graceful_error: io::Error,
        /// The error that occurred during the forceful termination attempt.
        #[source]
        forceful_error: io::Error,
    },

    /// A stream collector failed to hand back its output.
    #[error("Collector failed to collect output of process '{process_name}': {source}")]
    CollectorFailed {
        /// The command line of the process.
        process_name: Cow<'static, str>,
        /// The underlying collector error.
        #[source]
        source: CollectorError,
    },
}

/// Fatal errors of a probe run. A run failing with one of these produces no verdict.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The shared deadline of the run expired.
    #[error("plugin timed out after {} seconds (while running '{process_name}')", .budget.as_secs())]
    Timeout {
        /// The command line that was in flight when the deadline expired.
        process_name: Cow<'static, str>,
        /// The budget the run was armed with.
        budget: Duration,
    },
}
