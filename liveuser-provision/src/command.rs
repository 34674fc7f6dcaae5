//! Execution of external commands on the host.
//!
//! All mutations of the account database go through a [`Host`], which runs a [`HostCommand`] and
//! hands back its captured [`CommandOutput`].
//! Whether a non-zero exit is fatal is decided by the caller, see [`run_checked`].

use std::{
    fmt::Display,
    io::Write,
    path::PathBuf,
    process::{Command, ExitStatus, Stdio},
};

use log::{Level, debug, log};
use nix::unistd::User;
use secrecy::{ExposeSecret, SecretString};
use which::which;

use crate::Error;

/// Visibility of the output of executed commands.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum OutputMode {
    /// Command output is only logged at debug level.
    #[default]
    Quiet,

    /// Command output is logged at info level.
    Verbose,
}

impl OutputMode {
    /// Returns the [`Level`] at which command output is logged.
    pub fn level(&self) -> Level {
        match self {
            Self::Quiet => Level::Debug,
            Self::Verbose => Level::Info,
        }
    }
}

/// An external command to run on a [`Host`].
///
/// Data written to the standard input of the command is kept secret and never shows up in the
/// [`Display`] representation of the command.
#[derive(Clone, Debug)]
pub struct HostCommand {
    program: String,
    args: Vec<String>,
    stdin: Option<SecretString>,
}

impl HostCommand {
    /// Creates a new [`HostCommand`] for `program`.
    ///
    /// # Examples
    ///
    /// ```
    /// use liveuser_provision::command::HostCommand;
    ///
    /// let command = HostCommand::new("usermod").args(["--login", "alice", "live"]);
    /// assert_eq!(command.to_string(), "usermod --login alice live");
    /// ```
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin: None,
        }
    }

    /// Appends a single argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments.
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Sets secret data, that is written to the standard input of the command.
    pub fn stdin_secret(mut self, secret: SecretString) -> Self {
        self.stdin = Some(secret);
        self
    }

    /// Returns the name of the program.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Returns the arguments.
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Returns the secret data for the standard input, if any.
    pub fn stdin(&self) -> Option<&SecretString> {
        self.stdin.as_ref()
    }
}

impl Display for HostCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in self.args.iter() {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// The captured result of a [`HostCommand`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommandOutput {
    /// The exit status.
    pub status: ExitStatus,
    /// The standard output.
    pub stdout: String,
    /// The standard error.
    pub stderr: String,
}

impl CommandOutput {
    /// Returns whether the command exited successfully.
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

/// A host on which accounts are provisioned.
pub trait Host: std::fmt::Debug {
    /// Runs `command` and returns its captured output.
    ///
    /// A non-zero exit of `command` is not considered an error.
    ///
    /// # Errors
    ///
    /// Returns an error if `command` can not be found or can not be executed.
    fn run(&self, command: &HostCommand) -> Result<CommandOutput, Error>;

    /// Returns whether an account named `name` exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the account database can not be queried.
    fn user_exists(&self, name: &str) -> Result<bool, Error>;
}

/// The local system as [`Host`].
///
/// Executables are looked up in `$PATH` and accounts in the system account database.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalHost;

impl Host for LocalHost {
    fn run(&self, command: &HostCommand) -> Result<CommandOutput, Error> {
        let mut process = Command::new(get_command(command.program())?);
        process
            .args(command.get_args())
            .stdin(if command.stdin().is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = process.spawn().map_err(|source| Error::CommandExec {
            command: command.to_string(),
            source,
        })?;

        if let Some(secret) = command.stdin() {
            // stdin is closed when dropped at the end of this block
            child
                .stdin
                .take()
                .ok_or(Error::CommandAttachToStdin {
                    command: command.to_string(),
                })?
                .write_all(secret.expose_secret().as_bytes())
                .map_err(|source| Error::CommandWriteToStdin {
                    command: command.to_string(),
                    source,
                })?;
        }

        let output = child
            .wait_with_output()
            .map_err(|source| Error::CommandExec {
                command: command.to_string(),
                source,
            })?;

        Ok(CommandOutput {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn user_exists(&self, name: &str) -> Result<bool, Error> {
        User::from_name(name)
            .map(|user| user.is_some())
            .map_err(|source| Error::UserLookup {
                user: name.to_string(),
                source,
            })
    }
}

/// Returns the path to a `command`.
///
/// Searches for an executable in `$PATH` of the current environment and returns the first one
/// found.
///
/// # Errors
///
/// Returns an error if no executable matches the provided `command`.
fn get_command(command: &str) -> Result<PathBuf, Error> {
    which(command).map_err(|source| Error::ExecutableNotFound {
        command: command.to_string(),
        source,
    })
}

/// Runs `command` on `host` and fails on a non-zero exit.
///
/// The captured output of `command` is logged line by line at the level of `mode`.
///
/// # Errors
///
/// Returns an error if
/// - `command` can not be executed,
/// - or `command` exits with a non-zero status.
pub fn run_checked(
    host: &impl Host,
    command: &HostCommand,
    mode: OutputMode,
) -> Result<CommandOutput, Error> {
    debug!("Running \"{command}\"");
    let output = host.run(command)?;

    for line in output.stdout.lines().chain(output.stderr.lines()) {
        log!(mode.level(), "{}: {line}", command.program());
    }

    if !output.success() {
        return Err(Error::CommandNonZero {
            command: command.to_string(),
            exit_status: output.status,
            stderr: output.stderr,
        });
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use std::os::unix::process::ExitStatusExt;

    use rstest::rstest;
    use testresult::TestResult;

    use super::*;

    /// A [`Host`] that answers every command with the same exit code.
    #[derive(Debug)]
    struct FixedHost(i32);

    impl Host for FixedHost {
        fn run(&self, _command: &HostCommand) -> Result<CommandOutput, Error> {
            Ok(CommandOutput {
                status: ExitStatus::from_raw(self.0 << 8),
                stdout: "out".to_string(),
                stderr: "err".to_string(),
            })
        }

        fn user_exists(&self, _name: &str) -> Result<bool, Error> {
            Ok(false)
        }
    }

    #[test]
    fn display_hides_stdin() {
        let command = HostCommand::new("chpasswd")
            .stdin_secret(SecretString::new("alice:s3cr3t\n".into()));
        assert_eq!(command.to_string(), "chpasswd");
        assert!(!format!("{command:?}").contains("s3cr3t"));
    }

    #[rstest]
    #[case(OutputMode::Quiet, Level::Debug)]
    #[case(OutputMode::Verbose, Level::Info)]
    fn output_mode_level(#[case] mode: OutputMode, #[case] level: Level) {
        assert_eq!(mode.level(), level);
    }

    #[test]
    fn run_checked_succeeds() -> TestResult {
        let output = run_checked(&FixedHost(0), &HostCommand::new("true"), OutputMode::Quiet)?;
        assert_eq!(output.stdout, "out");
        Ok(())
    }

    #[test]
    fn run_checked_fails_on_non_zero() {
        let result = run_checked(&FixedHost(3), &HostCommand::new("false"), OutputMode::Verbose);
        match result {
            Err(Error::CommandNonZero {
                command,
                exit_status,
                stderr,
            }) => {
                assert_eq!(command, "false");
                assert_eq!(exit_status.code(), Some(3));
                assert_eq!(stderr, "err");
            }
            other => panic!("Expected a non-zero exit error, got {other:?}"),
        }
    }

    #[test]
    fn local_host_missing_executable() {
        let result = LocalHost.run(&HostCommand::new("liveuser-does-not-exist"));
        assert!(matches!(result, Err(Error::ExecutableNotFound { .. })));
    }

    #[test]
    fn local_host_root_exists() -> TestResult {
        assert!(LocalHost.user_exists("root")?);
        Ok(())
    }
}
