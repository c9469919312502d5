use crate::command::UpgradeMode;
use std::time::Duration;

/// Timeout used when none is configured, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Settings of one probe run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeConfig {
    /// Echo matched update lines and stderr output to the log when greater than zero.
    pub verbosity: u8,

    /// Refresh the package index before simulating the upgrade.
    pub refresh: bool,

    /// Which upgrade to simulate.
    pub upgrade: UpgradeMode,

    /// Wall-clock budget for the whole run. `None` disables the deadline.
    pub timeout: Option<Duration>,
}

impl ProbeConfig {
    /// Interprets a timeout given in whole seconds, where `0` disables the deadline.
    pub fn timeout_from_secs(secs: u64) -> Option<Duration> {
        match secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            verbosity: 0,
            refresh: false,
            upgrade: UpgradeMode::Upgrade,
            timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assertr::prelude::*;

    #[test]
    fn defaults_simulate_a_plain_upgrade_within_ten_seconds() {
        let config = ProbeConfig::default();

        assert_that(config.verbosity).is_equal_to(0);
        assert_that(config.refresh).is_false();
        assert_that(config.upgrade).is_equal_to(UpgradeMode::Upgrade);
        assert_that(config.timeout).is_equal_to(Some(Duration::from_secs(10)));
    }

    #[test]
    fn zero_seconds_disables_the_deadline() {
        assert_that(ProbeConfig::timeout_from_secs(0)).is_none();
        assert_that(ProbeConfig::timeout_from_secs(30)).is_equal_to(Some(Duration::from_secs(30)));
    }
}
