use std::borrow::Cow;
use std::ffi::OsStr;
use std::fmt::{Display, Formatter};

const APT_GET: &str = "/usr/bin/apt-get";

/// A fixed program and argument vector.
///
/// Arguments are handed to the program as-is. No shell is involved, so nothing in a command
/// line is ever expanded or interpolated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: Cow<'static, str>,
    args: Vec<Cow<'static, str>>,
}

impl CommandLine {
    pub fn new(program: impl Into<Cow<'static, str>>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<Cow<'static, str>>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Cow<'static, str>>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> impl Iterator<Item = &str> {
        self.args.iter().map(AsRef::as_ref)
    }

    /// Builds the tokio command for spawning this command line.
    pub(crate) fn to_command(&self) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(OsStr::new(self.program.as_ref()));
        cmd.args(self.args.iter().map(|arg| OsStr::new(arg.as_ref())));
        cmd
    }
}

/// Renders the command the way it would be typed into a shell, for diagnostics.
impl Display for CommandLine {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " '{arg}'")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Which simulated upgrade to ask the package manager for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpgradeMode {
    #[default]
    Upgrade,
    DistUpgrade,
}

impl UpgradeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            UpgradeMode::Upgrade => "upgrade",
            UpgradeMode::DistUpgrade => "dist-upgrade",
        }
    }
}

impl Display for UpgradeMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The command lines a probe run may invoke.
///
/// [AptCommands::default] holds the real `apt-get` invocations. Locking is disabled for the
/// simulations so that they can run unprivileged and next to a running package manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AptCommands {
    pub refresh: CommandLine,
    pub upgrade: CommandLine,
    pub dist_upgrade: CommandLine,
}

impl AptCommands {
    pub fn upgrade_for(&self, mode: UpgradeMode) -> &CommandLine {
        match mode {
            UpgradeMode::Upgrade => &self.upgrade,
            UpgradeMode::DistUpgrade => &self.dist_upgrade,
        }
    }
}

fn apt_get_simulation(action: &'static str) -> CommandLine {
    CommandLine::new(APT_GET).args(["-o", "Debug::NoLocking=true", "-s", "-qq", action])
}

impl Default for AptCommands {
    fn default() -> Self {
        Self {
            refresh: CommandLine::new(APT_GET).args(["-q", "update"]),
            upgrade: apt_get_simulation("upgrade"),
            dist_upgrade: apt_get_simulation("dist-upgrade"),
        }
    }
}
