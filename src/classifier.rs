//! Classification of captured package manager output.

use crate::line_buffer::CapturedStream;
use crate::output_stream::StreamType;

/// Prefix of a simulated-upgrade line announcing one package that would be installed.
pub const UPDATE_MARKER: &str = "Inst";

/// Tracing target of echoed output lines. Events on it carry nothing but the line itself.
pub const ECHO_TARGET: &str = "apt_update_probe::echo";

/// Whether `line` announces a pending update.
///
/// The check is case-sensitive and anchored at the very first byte; leading whitespace is not
/// skipped.
pub fn is_update_line(line: &str) -> bool {
    line.starts_with(UPDATE_MARKER)
}

/// Counts the pending updates in the stdout capture of an upgrade simulation.
///
/// Every other line (`Conf` lines, blank lines, summaries) is ignored. With `verbosity > 0`
/// each matched line is echoed to the log.
pub fn count_updates(stdout: &CapturedStream, verbosity: u8) -> usize {
    stdout
        .lines
        .iter()
        .filter(|line| is_update_line(line))
        .inspect(|line| {
            if verbosity > 0 {
                tracing::info!(target: ECHO_TARGET, "{line}");
            }
        })
        .count()
}

/// Whether anything at all was written to stderr.
///
/// Only the byte length matters, so even a lone newline counts. With `verbosity > 0` every
/// stderr line is echoed to the log when the signal is raised.
pub fn stderr_signal(stderr: &CapturedStream, verbosity: u8) -> bool {
    if stderr.is_empty() {
        return false;
    }
    if verbosity > 0 {
        echo_lines(stderr, StreamType::StdErr);
    }
    true
}

/// Echoes every captured line to the log, verbatim.
pub fn echo_lines(captured: &CapturedStream, ty: StreamType) {
    tracing::trace!(stream = %ty, lines = captured.lines.len(), "Echoing captured output");
    for line in &captured.lines {
        tracing::info!(target: ECHO_TARGET, "{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line_buffer::capture;
    use assertr::prelude::*;
    use tracing_test::traced_test;

    fn captured(lines: &[&str]) -> CapturedStream {
        let mut raw = String::new();
        for line in lines {
            raw.push_str(line);
            raw.push('\n');
        }
        capture(raw.as_bytes())
    }

    #[test]
    fn counts_only_exact_prefix_matches() {
        let stdout = captured(&["Inst foo 1.0", "Conf foo", "Inst bar 2.0", ""]);

        assert_that(count_updates(&stdout, 0)).is_equal_to(2);
    }

    #[test]
    fn marker_is_case_sensitive_and_anchored() {
        assert_that(is_update_line("Inst libc6 [2.36-9] (2.36-9+deb12u4 Debian:12.5/stable)"))
            .is_true();
        assert_that(is_update_line("inst libc6")).is_false();
        assert_that(is_update_line(" Inst libc6")).is_false();
        assert_that(is_update_line("\tInst libc6")).is_false();
        assert_that(is_update_line("Ins")).is_false();
        assert_that(is_update_line("")).is_false();
    }

    #[test]
    fn empty_stdout_has_no_updates() {
        assert_that(count_updates(&CapturedStream::default(), 1)).is_equal_to(0);
    }

    #[test]
    fn any_stderr_byte_raises_the_signal() {
        assert_that(stderr_signal(&capture(b"\n"), 0)).is_true();
        assert_that(stderr_signal(&capture(b"W: Some index files failed"), 0)).is_true();
        assert_that(stderr_signal(&CapturedStream::default(), 0)).is_false();
    }

    #[test]
    #[traced_test]
    fn verbose_mode_echoes_matched_lines_only() {
        let stdout = captured(&["Inst echoed-package", "Conf silent-package"]);

        assert_that(count_updates(&stdout, 1)).is_equal_to(1);
        assert_that(logs_contain("Inst echoed-package")).is_true();
        assert_that(logs_contain("silent-package")).is_false();
    }

    #[test]
    #[traced_test]
    fn quiet_mode_echoes_nothing() {
        let stdout = captured(&["Inst quiet-package"]);
        let stderr = captured(&["W: quiet-warning"]);

        assert_that(count_updates(&stdout, 0)).is_equal_to(1);
        assert_that(stderr_signal(&stderr, 0)).is_true();
        assert_that(logs_contain("quiet-package")).is_false();
        assert_that(logs_contain("quiet-warning")).is_false();
    }

    #[test]
    #[traced_test]
    fn verbose_mode_echoes_every_stderr_line() {
        let stderr = captured(&["W: first-warning", "E: second-error"]);

        assert_that(stderr_signal(&stderr, 2)).is_true();
        assert_that(logs_contain("W: first-warning")).is_true();
        assert_that(logs_contain("E: second-error")).is_true();
    }
}
