use apt_update_probe::{
    DEFAULT_TIMEOUT_SECS, ECHO_TARGET, Probe, ProbeConfig, STDERR_HINT, UpgradeMode,
    failure_line, status_line,
};
use clap::Parser;
use std::process::ExitCode;
use tracing::Subscriber;
use tracing_subscriber::filter::{FilterExt, filter_fn};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

/// Checks for software updates on systems that use package management systems based on the
/// apt-get(8) command found in Debian GNU/Linux.
#[derive(Parser, Debug)]
#[command(name = "check_apt", version, about)]
pub struct Cli {
    /// Show details of matched updates and stderr output (repeat for debug logging)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Seconds before the whole check times out (0 disables the timeout)
    #[arg(short, long, value_name = "SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    /// First perform an 'apt-get update' (requires root, you may also need to raise -t)
    #[arg(short, long)]
    update: bool,

    /// Perform a dist-upgrade instead of normal upgrade
    #[arg(short, long)]
    dist_upgrade: bool,
}

impl Cli {
    fn probe_config(&self) -> ProbeConfig {
        ProbeConfig {
            verbosity: self.verbose,
            refresh: self.update,
            upgrade: if self.dist_upgrade {
                UpgradeMode::DistUpgrade
            } else {
                UpgradeMode::Upgrade
            },
            timeout: ProbeConfig::timeout_from_secs(self.timeout),
        }
    }
}

fn default_log_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Prints echoed output lines exactly as the child wrote them, without level or fields.
fn echo_layer<S, W>(make_writer: W) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    fmt::layer()
        .with_writer(make_writer)
        .with_ansi(false)
        .with_level(false)
        .with_target(false)
        .without_time()
        .with_filter(filter_fn(|meta| meta.target() == ECHO_TARGET))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_directive(cli.verbose)));
    let log_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .with_filter(filter.and(filter_fn(|meta| meta.target() != ECHO_TARGET)));
    tracing_subscriber::registry()
        .with(echo_layer::<Registry, _>(std::io::stderr))
        .with(log_layer)
        .init();

    tracing::debug!(?cli, "parsed CLI arguments");

    let config = cli.probe_config();
    match Probe::new(config).run().await {
        Ok(verdict) => {
            if verdict.stderr_warning {
                tracing::warn!("{STDERR_HINT}");
            }
            println!("{}", status_line(&verdict, config.upgrade));
            ExitCode::from(verdict.exit_code())
        }
        Err(err) => {
            tracing::error!(error = %err, "Probe run aborted");
            let (line, severity) = failure_line(&err);
            println!("{line}");
            ExitCode::from(severity.exit_code())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apt_update_probe::{StreamType, capture, echo_lines};
    use assertr::prelude::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn defaults_map_to_default_config() {
        let cli = Cli::parse_from(["check_apt"]);

        assert_that(cli.probe_config()).is_equal_to(ProbeConfig::default());
    }

    #[test]
    fn short_flags_map_to_config() {
        let cli = Cli::parse_from(["check_apt", "-vv", "-u", "-d", "-t", "60"]);
        let config = cli.probe_config();

        assert_that(config.verbosity).is_equal_to(2);
        assert_that(config.refresh).is_true();
        assert_that(config.upgrade).is_equal_to(UpgradeMode::DistUpgrade);
        assert_that(config.timeout).is_equal_to(Some(Duration::from_secs(60)));
    }

    #[test]
    fn any_u64_timeout_is_accepted() {
        let cli = Cli::parse_from(["check_apt", "-t", "18446744073709551615"]);

        assert_that(cli.probe_config().timeout).is_equal_to(Some(Duration::from_secs(u64::MAX)));
    }

    #[test]
    fn echoed_lines_are_printed_verbatim() {
        let buf = SharedBuf::default();
        let writer = buf.clone();
        let subscriber =
            tracing_subscriber::registry().with(echo_layer::<Registry, _>(move || writer.clone()));

        tracing::subscriber::with_default(subscriber, || {
            echo_lines(
                &capture(b"Inst libc6 [2.36-9] (2.36-9+deb12u4 Debian:12.5/stable)\n"),
                StreamType::StdOut,
            );
            tracing::warn!("not an echo");
        });

        assert_that(buf.contents()).is_equal_to(
            "Inst libc6 [2.36-9] (2.36-9+deb12u4 Debian:12.5/stable)\n".to_string(),
        );
    }

    #[test]
    fn zero_timeout_disables_the_deadline() {
        let cli = Cli::parse_from(["check_apt", "--timeout", "0"]);

        assert_that(cli.probe_config().timeout).is_none();
    }

    #[test]
    fn verbosity_selects_log_level() {
        assert_that(default_log_directive(0)).is_equal_to("warn");
        assert_that(default_log_directive(1)).is_equal_to("info");
        assert_that(default_log_directive(7)).is_equal_to("trace");
    }
}
