//! Rendering of verdicts for monitoring systems.

use crate::command::UpgradeMode;
use crate::probe::RunVerdict;
use crate::severity::Severity;
use crate::ProbeError;

/// Hint logged when some invocation wrote to stderr.
pub const STDERR_HINT: &str =
    "warning, output detected on stderr. re-run with -v for more information.";

/// The single status line describing `verdict`.
///
/// Example: `APT WARNING: 3 packages available for upgrade. (warnings detected)`
pub fn status_line(verdict: &RunVerdict, mode: UpgradeMode) -> String {
    format!(
        "APT {}: {} packages available for {}.{}{}{}",
        verdict.severity,
        verdict.update_count,
        mode,
        if verdict.stderr_warning {
            " (warnings detected)"
        } else {
            ""
        },
        if verdict.stderr_warning && verdict.exec_warning {
            ","
        } else {
            ""
        },
        if verdict.exec_warning {
            " (errors detected)"
        } else {
            ""
        },
    )
}

/// The status line of a run that failed without a verdict, and its severity.
pub fn failure_line(err: &ProbeError) -> (String, Severity) {
    match err {
        ProbeError::Timeout { budget, .. } => (
            format!(
                "APT {}: plugin timed out after {} seconds",
                Severity::Unknown,
                budget.as_secs()
            ),
            Severity::Unknown,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assertr::prelude::*;
    use std::borrow::Cow;
    use std::time::Duration;

    fn verdict(severity: Severity, update_count: usize, stderr: bool, exec: bool) -> RunVerdict {
        RunVerdict {
            severity,
            update_count,
            stderr_warning: stderr,
            exec_warning: exec,
        }
    }

    #[test]
    fn clean_run() {
        assert_that(status_line(&verdict(Severity::Ok, 0, false, false), UpgradeMode::Upgrade))
            .is_equal_to("APT OK: 0 packages available for upgrade.".to_string());
    }

    #[test]
    fn pending_dist_upgrade() {
        assert_that(status_line(
            &verdict(Severity::Warning, 12, false, false),
            UpgradeMode::DistUpgrade,
        ))
        .is_equal_to("APT WARNING: 12 packages available for dist-upgrade.".to_string());
    }

    #[test]
    fn warnings_and_errors_are_separated_by_a_comma() {
        assert_that(status_line(
            &verdict(Severity::Unknown, 1, true, true),
            UpgradeMode::Upgrade,
        ))
        .is_equal_to(
            "APT UNKNOWN: 1 packages available for upgrade. (warnings detected), (errors detected)"
                .to_string(),
        );
        assert_that(status_line(
            &verdict(Severity::Unknown, 0, false, true),
            UpgradeMode::Upgrade,
        ))
        .is_equal_to("APT UNKNOWN: 0 packages available for upgrade. (errors detected)".to_string());
    }

    #[test]
    fn timeout_is_unknown() {
        let (line, severity) = failure_line(&ProbeError::Timeout {
            process_name: Cow::Borrowed("/usr/bin/apt-get -q update"),
            budget: Duration::from_secs(10),
        });

        assert_that(line).is_equal_to("APT UNKNOWN: plugin timed out after 10 seconds".to_string());
        assert_that(severity).is_equal_to(Severity::Unknown);
    }
}
