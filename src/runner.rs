use crate::command::CommandLine;
use crate::deadline::Deadline;
use crate::line_buffer::CapturedStream;
use crate::output::{NO_EXIT_CODE, ProcessResult};
use crate::output_stream::CaptureOptions;
use crate::process_handle::ProcessHandle;
use crate::RunError;
use std::time::Duration;

/// Default time a child gets to exit after being asked to terminate, before it is killed.
pub const DEFAULT_TERMINATION_GRACE: Duration = Duration::from_secs(1);

/// Runs commands to completion under a shared [Deadline].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundedRunner {
    capture_options: CaptureOptions,
    termination_grace: Duration,
}

impl Default for BoundedRunner {
    fn default() -> Self {
        Self {
            capture_options: CaptureOptions::default(),
            termination_grace: DEFAULT_TERMINATION_GRACE,
        }
    }
}

impl BoundedRunner {
    pub fn new(capture_options: CaptureOptions, termination_grace: Duration) -> Self {
        Self {
            capture_options,
            termination_grace,
        }
    }

    /// Runs `command` until it exits or `deadline` expires.
    ///
    /// A deadline that already expired spawns nothing and reports the invocation as timed out.
    /// A non-zero exit is not an error here; it is reported through
    /// [ProcessResult::exit_code].
    pub async fn run(
        &self,
        command: &CommandLine,
        deadline: &Deadline,
    ) -> Result<ProcessResult, RunError> {
        if deadline.is_expired() {
            tracing::warn!(process = %command, "Deadline expired before process could be spawned");
            return Ok(ProcessResult {
                exit_code: NO_EXIT_CODE,
                stdout: CapturedStream::default(),
                stderr: CapturedStream::default(),
                timed_out: true,
            });
        }

        tracing::debug!(process = %command, remaining = ?deadline.remaining(), "Running process");
        ProcessHandle::spawn(command, self.capture_options)?
            .wait_with_output(deadline, self.termination_grace)
            .await
    }
}
