use crate::line_buffer::CapturedStream;

/// Exit status reported for a child that was ended by a signal and therefore has no code.
pub const NO_EXIT_CODE: i32 = -1;

/// Full output of one bounded invocation.
///
/// Both its `stdout` and `stderr` streams were captured as individual lines. When `timed_out`
/// is set the child was terminated early and both captures only hold what it wrote until then.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessResult {
    /// Code the process exited with. `0` means the tool did not fail internally.
    pub exit_code: i32,

    /// The processes entire output on its `stdout` stream.
    pub stdout: CapturedStream,

    /// The processes entire output on its `stderr` stream.
    pub stderr: CapturedStream,

    /// Whether the shared deadline expired before the process completed on its own.
    pub timed_out: bool,
}

impl ProcessResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0 && !self.timed_out
    }
}
