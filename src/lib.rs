//! Reports pending apt package updates the way a monitoring plugin does.
//!
//! A [Probe] optionally refreshes the package index, then asks `apt-get` to simulate an
//! upgrade and classifies what it printed. Every command runs through a [BoundedRunner], which
//! captures stdout and stderr concurrently and enforces one [Deadline] shared by the whole run.

mod classifier;
mod collector;
mod command;
mod config;
mod deadline;
mod error;
mod line_buffer;
mod output;
mod output_stream;
mod probe;
mod process_handle;
mod report;
mod runner;
mod severity;
mod signal;

pub use classifier::{
    ECHO_TARGET, UPDATE_MARKER, count_updates, echo_lines, is_update_line, stderr_signal,
};
pub use collector::{Collector, CollectorError};
pub use command::{AptCommands, CommandLine, UpgradeMode};
pub use config::{DEFAULT_TIMEOUT_SECS, ProbeConfig};
pub use deadline::Deadline;
pub use error::{ProbeError, RunError};
pub use line_buffer::{CapturedStream, LineBuffer, capture};
pub use output::{NO_EXIT_CODE, ProcessResult};
pub use output_stream::{CaptureOptions, StreamType, capture_stream};
pub use probe::{Probe, RunState, RunVerdict};
pub use process_handle::{ProcessHandle, RunningState};
pub use report::{STDERR_HINT, failure_line, status_line};
pub use runner::{BoundedRunner, DEFAULT_TERMINATION_GRACE};
pub use severity::Severity;
