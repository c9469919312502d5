use crate::collector::{Collector, CollectorError};
use crate::command::CommandLine;
use crate::deadline::Deadline;
use crate::line_buffer::CapturedStream;
use crate::output::{NO_EXIT_CODE, ProcessResult};
use crate::output_stream::{CaptureOptions, StreamType, capture_stream};
use crate::{RunError, signal};
use std::borrow::Cow;
use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::Child;

/// Represents the running state of a process.
#[derive(Debug)]
pub enum RunningState {
    /// The process is still running.
    Running,

    /// The process has terminated with the given exit status.
    Terminated(ExitStatus),

    /// Failed to determine process state.
    Uncertain(io::Error),
}

impl RunningState {
    pub fn as_bool(&self) -> bool {
        match self {
            RunningState::Running => true,
            RunningState::Terminated(_) | RunningState::Uncertain(_) => false,
        }
    }
}

/// A spawned child whose stdout and stderr are being captured.
///
/// Both streams are drained by their own tokio task from the moment the child is spawned.
/// The child is killed when the handle is dropped before it completed.
#[derive(Debug)]
pub struct ProcessHandle {
    name: Cow<'static, str>,
    child: Child,
    stdout: Collector<CapturedStream>,
    stderr: Collector<CapturedStream>,
}

impl ProcessHandle {
    /// Spawns `command` with piped stdout/stderr and a closed stdin.
    pub fn spawn(command: &CommandLine, options: CaptureOptions) -> Result<Self, RunError> {
        let name: Cow<'static, str> = command.to_string().into();

        let mut cmd = command.to_command();
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| RunError::SpawnFailed {
            process_name: name.clone(),
            source,
        })?;

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            return Err(RunError::SpawnFailed {
                process_name: name,
                source: io::Error::other("child was spawned without piped stdout/stderr"),
            });
        };

        tracing::debug!(process = %name, pid = ?child.id(), "Spawned process");

        Ok(Self {
            stdout: capture_stream(stdout, StreamType::StdOut, options),
            stderr: capture_stream(stderr, StreamType::StdErr, options),
            name,
            child,
        })
    }

    //noinspection RsSelfConvention
    pub fn is_running(&mut self) -> RunningState {
        match self.child.try_wait() {
            Ok(None) => RunningState::Running,
            Ok(Some(exit_status)) => RunningState::Terminated(exit_status),
            Err(err) => RunningState::Uncertain(err),
        }
    }

    /// Waits for the child to exit and both of its streams to close, or for `deadline`,
    /// whichever comes first.
    ///
    /// When the deadline wins, the child is terminated (see [ProcessHandle::terminate]) and the
    /// returned result is marked `timed_out`, holding whatever output was captured until then.
    pub async fn wait_with_output(
        mut self,
        deadline: &Deadline,
        termination_grace: Duration,
    ) -> Result<ProcessResult, RunError> {
        let waited = tokio::select! {
            status = self.child.wait() => Some(status),
            () = deadline.expired() => None,
        };

        let exit_status = match waited {
            Some(Ok(exit_status)) => Some(exit_status),
            Some(Err(source)) => {
                return Err(RunError::IoError {
                    process_name: self.name,
                    source,
                });
            }
            None => {
                tracing::warn!(
                    process = %self.name,
                    budget = ?deadline.budget(),
                    "Deadline expired, terminating process"
                );
                self.terminate(termination_grace).await?;
                None
            }
        };

        // A grandchild may still hold a pipe open after the child exited. The deadline bounds
        // that wait as well.
        let ProcessHandle {
            name,
            stdout,
            stderr,
            ..
        } = self;
        let (stdout, stderr) = tokio::join!(
            stdout.wait_or_cancel_at(deadline),
            stderr.wait_or_cancel_at(deadline)
        );
        let collector_failed = |source: CollectorError| RunError::CollectorFailed {
            process_name: name.clone(),
            source,
        };
        let (stdout, stdout_cut) = stdout.map_err(&collector_failed)?;
        let (stderr, stderr_cut) = stderr.map_err(&collector_failed)?;

        let exit_code = exit_status
            .and_then(|exit_status| exit_status.code())
            .unwrap_or(NO_EXIT_CODE);
        let timed_out = exit_status.is_none() || stdout_cut || stderr_cut;

        tracing::debug!(
            process = %name,
            exit_code,
            timed_out,
            stdout_lines = stdout.lines.len(),
            stderr_bytes = stderr.byte_len,
            "Process completed"
        );

        Ok(ProcessResult {
            exit_code,
            stdout,
            stderr,
            timed_out,
        })
    }

    /// Asks the child to terminate, killing it if it is still running after `grace`.
    pub async fn terminate(&mut self, grace: Duration) -> Result<ExitStatus, RunError> {
        if let RunningState::Terminated(exit_status) = self.is_running() {
            tracing::debug!(process = %self.name, "Process already terminated");
            return Ok(exit_status);
        }

        // Try a graceful shutdown first.
        let graceful_err = match signal::send_terminate(&self.child) {
            Ok(()) => match tokio::time::timeout(grace, self.child.wait()).await {
                Ok(Ok(exit_status)) => return Ok(exit_status),
                Ok(Err(err)) => err,
                Err(elapsed) => elapsed.into(),
            },
            Err(err) => err,
        };

        tracing::warn!(
            process = %self.name,
            error = %graceful_err,
            "Graceful shutdown failed, attempting forceful termination"
        );

        match self.child.kill().await {
            Ok(()) => self.child.wait().await.map_err(|source| RunError::IoError {
                process_name: self.name.clone(),
                source,
            }),
            Err(forceful_err) => Err(RunError::TerminationFailed {
                process_name: self.name.clone(),
                graceful_error: graceful_err,
                forceful_error: forceful_err,
            }),
        }
    }
}
