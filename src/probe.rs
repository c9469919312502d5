//! The probe run: an optional index refresh followed by exactly one upgrade simulation.

use crate::classifier::{count_updates, echo_lines, stderr_signal};
use crate::command::{AptCommands, CommandLine};
use crate::config::ProbeConfig;
use crate::deadline::Deadline;
use crate::output::ProcessResult;
use crate::output_stream::StreamType;
use crate::runner::BoundedRunner;
use crate::severity::Severity;
use crate::{ProbeError, RunError};
use std::borrow::Cow;

/// The outcome of a probe run that finished within its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunVerdict {
    pub severity: Severity,

    /// Number of packages the upgrade simulation would install or upgrade.
    pub update_count: usize,

    /// Some invocation wrote to stderr.
    pub stderr_warning: bool,

    /// Some invocation failed internally, as opposed to merely finding updates.
    pub exec_warning: bool,
}

impl RunVerdict {
    pub fn exit_code(&self) -> u8 {
        self.severity.exit_code()
    }
}

/// States a run moves through. `Refreshing` is skipped unless a refresh was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Init,
    Refreshing,
    Upgrading,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Refresh,
    Upgrade,
}

/// What one invocation contributes to the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StepOutcome {
    severity: Severity,
    stderr_warning: bool,
    exec_warning: bool,
}

impl StepOutcome {
    fn exec_failure() -> Self {
        Self {
            severity: Severity::Unknown,
            stderr_warning: false,
            exec_warning: true,
        }
    }
}

/// Running state of one probe run.
///
/// Until the first invocation reports back, the severity is unset and the verdict would be
/// `Unknown`. The first contribution replaces the unset value, every later one is combined
/// with it.
#[derive(Debug, Default)]
struct Accumulator {
    severity: Option<Severity>,
    update_count: usize,
    stderr_warning: bool,
    exec_warning: bool,
}

impl Accumulator {
    fn raise(&mut self, severity: Severity) {
        self.severity = Some(match self.severity {
            Some(current) => current.combine(severity),
            None => severity,
        });
    }

    fn fold(&mut self, outcome: StepOutcome) {
        self.raise(outcome.severity);
        self.stderr_warning |= outcome.stderr_warning;
        self.exec_warning |= outcome.exec_warning;
    }

    fn into_verdict(self) -> RunVerdict {
        RunVerdict {
            severity: self.severity.unwrap_or_default(),
            update_count: self.update_count,
            stderr_warning: self.stderr_warning,
            exec_warning: self.exec_warning,
        }
    }
}

/// Determines whether the host has pending package updates.
///
/// Each call to [Probe::run] is an independent run with its own deadline and state.
#[derive(Debug, Clone)]
pub struct Probe {
    config: ProbeConfig,
    commands: AptCommands,
    runner: BoundedRunner,
}

impl Probe {
    pub fn new(config: ProbeConfig) -> Self {
        Self {
            config,
            commands: AptCommands::default(),
            runner: BoundedRunner::default(),
        }
    }

    /// Replaces the invoked command lines.
    pub fn with_commands(mut self, commands: AptCommands) -> Self {
        self.commands = commands;
        self
    }

    /// Replaces the runner, e.g. to shorten the termination grace period.
    pub fn with_runner(mut self, runner: BoundedRunner) -> Self {
        self.runner = runner;
        self
    }

    /// Arms the configured deadline and performs one run under it.
    pub async fn run(&self) -> Result<RunVerdict, ProbeError> {
        let deadline = Deadline::from_budget(self.config.timeout);
        self.run_until(&deadline).await
    }

    /// Performs one run under an already armed `deadline`.
    ///
    /// Returns [ProbeError::Timeout] when the deadline expires at any point of the run. Every
    /// other failure is folded into the verdict.
    pub async fn run_until(&self, deadline: &Deadline) -> Result<RunVerdict, ProbeError> {
        let mut acc = Accumulator::default();
        let mut state = RunState::Init;

        loop {
            tracing::trace!(?state, "Probe state");
            state = match state {
                RunState::Init if self.config.refresh => RunState::Refreshing,
                RunState::Init => RunState::Upgrading,
                RunState::Refreshing => {
                    let (outcome, _) = self.invoke(Step::Refresh, deadline).await?;
                    acc.fold(outcome);
                    RunState::Upgrading
                }
                RunState::Upgrading => {
                    let (outcome, update_count) = self.invoke(Step::Upgrade, deadline).await?;
                    acc.fold(outcome);
                    acc.update_count = update_count;
                    acc.raise(Severity::from_update_count(update_count));
                    RunState::Done
                }
                RunState::Done => break,
            };
        }

        let verdict = acc.into_verdict();
        tracing::debug!(?verdict, "Probe run completed");
        Ok(verdict)
    }

    fn command_for(&self, step: Step) -> &CommandLine {
        match step {
            Step::Refresh => &self.commands.refresh,
            Step::Upgrade => self.commands.upgrade_for(self.config.upgrade),
        }
    }

    /// Runs the command of `step` and classifies its result.
    ///
    /// Also returns the number of pending updates, which only the upgrade step counts.
    async fn invoke(
        &self,
        step: Step,
        deadline: &Deadline,
    ) -> Result<(StepOutcome, usize), ProbeError> {
        let command = self.command_for(step);
        let timeout = || ProbeError::Timeout {
            process_name: Cow::Owned(command.to_string()),
            budget: deadline.budget().unwrap_or_default(),
        };

        let result = match self.runner.run(command, deadline).await {
            Ok(result) => result,
            Err(RunError::TerminationFailed { .. }) => return Err(timeout()),
            Err(err) => {
                tracing::error!(process = %command, error = %err, "'{command}' could not be run.");
                return Ok((StepOutcome::exec_failure(), 0));
            }
        };
        if result.timed_out {
            return Err(timeout());
        }

        Ok(self.classify(step, command, &result))
    }

    fn classify(
        &self,
        step: Step,
        command: &CommandLine,
        result: &ProcessResult,
    ) -> (StepOutcome, usize) {
        let verbosity = self.config.verbosity;
        let mut outcome = StepOutcome {
            severity: Severity::Ok,
            stderr_warning: false,
            exec_warning: false,
        };

        // apt-get only changes its exit status on an internal error.
        if result.exit_code != 0 {
            outcome = StepOutcome::exec_failure();
            match step {
                Step::Refresh => tracing::error!(
                    process = %command,
                    exit_code = result.exit_code,
                    "'{command}' exited with non-zero status."
                ),
                Step::Upgrade => tracing::error!(
                    process = %command,
                    exit_code = result.exit_code,
                    "'{command}' exited with non-zero status. Run again with -v for more info."
                ),
            }
        }

        let update_count = match step {
            Step::Refresh => {
                if verbosity > 0 {
                    echo_lines(&result.stdout, StreamType::StdOut);
                }
                0
            }
            Step::Upgrade => count_updates(&result.stdout, verbosity),
        };

        if stderr_signal(&result.stderr, verbosity) {
            outcome.stderr_warning = true;
            outcome.severity = outcome.severity.combine(Severity::Warning);
        }

        (outcome, update_count)
    }
}
