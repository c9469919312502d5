use std::fmt::{Display, Formatter};

/// Monitoring verdict level.
///
/// The declaration order is the aggregation order: `Ok < Warning < Critical < Unknown`.
/// `Unknown` doubles as the unset state of a run that has not produced anything yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Severity {
    Ok = 0,
    Warning = 1,
    Critical = 2,
    #[default]
    Unknown = 3,
}

impl Severity {
    /// Worst-wins combination of two severities.
    ///
    /// Commutative, associative and idempotent. Folding with this never lowers a value.
    #[must_use]
    pub fn combine(self, other: Severity) -> Severity {
        self.max(other)
    }

    /// Severity implied by the number of packages that would be upgraded.
    pub fn from_update_count(update_count: usize) -> Severity {
        match update_count {
            0 => Severity::Ok,
            _ => Severity::Warning,
        }
    }

    /// The process exit code a monitoring system expects for this severity.
    pub fn exit_code(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Ok => "OK",
            Severity::Warning => "WARNING",
            Severity::Critical => "CRITICAL",
            Severity::Unknown => "UNKNOWN",
        }
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::Severity;
    use assertr::prelude::*;

    const ALL: [Severity; 4] = [
        Severity::Ok,
        Severity::Warning,
        Severity::Critical,
        Severity::Unknown,
    ];

    #[test]
    fn combine_picks_the_worse_severity() {
        assert_that(Severity::Ok.combine(Severity::Warning)).is_equal_to(Severity::Warning);
        assert_that(Severity::Warning.combine(Severity::Unknown)).is_equal_to(Severity::Unknown);
        assert_that(Severity::Unknown.combine(Severity::Critical)).is_equal_to(Severity::Unknown);
        assert_that(Severity::Critical.combine(Severity::Ok)).is_equal_to(Severity::Critical);
    }

    #[test]
    fn combine_is_commutative_associative_and_idempotent() {
        for a in ALL {
            assert_that(a.combine(a)).is_equal_to(a);
            for b in ALL {
                assert_that(a.combine(b)).is_equal_to(b.combine(a));
                for c in ALL {
                    assert_that(a.combine(b).combine(c)).is_equal_to(a.combine(b.combine(c)));
                }
            }
        }
    }

    #[test]
    fn combine_never_lowers_the_running_value() {
        for running in ALL {
            for next in ALL {
                assert_that(running.combine(next) >= running).is_true();
            }
        }
    }

    #[test]
    fn update_count_maps_to_ok_or_warning() {
        assert_that(Severity::from_update_count(0)).is_equal_to(Severity::Ok);
        assert_that(Severity::from_update_count(1)).is_equal_to(Severity::Warning);
        assert_that(Severity::from_update_count(250)).is_equal_to(Severity::Warning);
    }

    #[test]
    fn exit_codes_follow_the_ordinal() {
        assert_that(Severity::Ok.exit_code()).is_equal_to(0);
        assert_that(Severity::Warning.exit_code()).is_equal_to(1);
        assert_that(Severity::Critical.exit_code()).is_equal_to(2);
        assert_that(Severity::Unknown.exit_code()).is_equal_to(3);
        assert_that(Severity::default()).is_equal_to(Severity::Unknown);
    }

    #[test]
    fn displays_monitoring_state_text() {
        assert_that(Severity::Warning.to_string()).is_equal_to("WARNING");
        assert_that(Severity::Unknown.to_string()).is_equal_to("UNKNOWN");
    }
}
