//! Test utilities for provisioning against a simulated host.

use std::{
    cell::RefCell,
    collections::BTreeSet,
    fs::{create_dir_all, read_to_string, write},
    os::unix::process::ExitStatusExt,
    path::{Path, PathBuf},
    process::ExitStatus,
};

use liveuser_provision::{
    Error,
    Host,
    ProvisionConfig,
    command::{CommandOutput, HostCommand},
};
use secrecy::ExposeSecret;
use testresult::TestResult;

/// Account database with a placeholder account.
pub const PASSWD: &str = include_str!("../../fixtures/passwd");

/// GTK bookmarks of the placeholder account.
pub const BOOKMARKS: &str = include_str!("../../fixtures/bookmarks");

/// A command as it has been run on a [`FakeHost`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RecordedCommand {
    /// The program name.
    pub program: String,
    /// The arguments.
    pub args: Vec<String>,
    /// The exposed secret stdin.
    pub stdin: Option<String>,
}

/// A simulated host.
///
/// Keeps a set of existing accounts and mimics `usermod --login`, `groupmod`, `useradd` and
/// `chpasswd` on it.
/// Renaming a login also renames it in the passwd file of the sandbox, like `usermod` does.
#[derive(Debug, Default)]
pub struct FakeHost {
    users: RefCell<BTreeSet<String>>,
    commands: RefCell<Vec<RecordedCommand>>,
    failing: Vec<String>,
    missing: Vec<String>,
    passwd_file: Option<PathBuf>,
}

impl FakeHost {
    /// Creates a host on which `users` exist.
    pub fn with_users(users: &[&str]) -> Self {
        Self {
            users: RefCell::new(users.iter().map(|user| user.to_string()).collect()),
            ..Default::default()
        }
    }

    /// Lets every invocation of `program` exit with a non-zero status.
    pub fn failing(mut self, program: &str) -> Self {
        self.failing.push(program.to_string());
        self
    }

    /// Pretends that `program` is not installed.
    pub fn missing(mut self, program: &str) -> Self {
        self.missing.push(program.to_string());
        self
    }

    /// Keeps the login names in `passwd_file` in sync with renames.
    pub fn passwd_file(mut self, passwd_file: &Path) -> Self {
        self.passwd_file = Some(passwd_file.to_path_buf());
        self
    }

    /// Returns whether `name` exists on the host.
    pub fn has_user(&self, name: &str) -> bool {
        self.users.borrow().contains(name)
    }

    /// Returns all commands run so far.
    pub fn commands(&self) -> Vec<RecordedCommand> {
        self.commands.borrow().clone()
    }

    /// Returns the names of all programs run so far.
    pub fn programs(&self) -> Vec<String> {
        self.commands
            .borrow()
            .iter()
            .map(|command| command.program.clone())
            .collect()
    }

    fn apply(&self, command: &RecordedCommand) -> std::io::Result<()> {
        let args: Vec<&str> = command.args.iter().map(String::as_str).collect();
        match (command.program.as_str(), args.as_slice()) {
            ("usermod", ["--login", new, old]) => {
                let mut users = self.users.borrow_mut();
                users.remove(*old);
                users.insert(new.to_string());
                if let Some(passwd_file) = &self.passwd_file {
                    let content = read_to_string(passwd_file)?;
                    let renamed: String = content
                        .lines()
                        .map(|line| match line.strip_prefix(&format!("{old}:")) {
                            Some(rest) => format!("{new}:{rest}\n"),
                            None => format!("{line}\n"),
                        })
                        .collect();
                    write(passwd_file, renamed)?;
                }
            }
            ("useradd", [.., user]) => {
                self.users.borrow_mut().insert(user.to_string());
                if let Some(index) = args.iter().position(|arg| *arg == "--home-dir") {
                    create_dir_all(args[index + 1])?;
                }
            }
            _ => {}
        }
        Ok(())
    }
}

impl Host for FakeHost {
    fn run(&self, command: &HostCommand) -> Result<CommandOutput, Error> {
        if self.missing.iter().any(|program| program == command.program()) {
            return Err(Error::CommandExec {
                command: command.to_string(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            });
        }

        let recorded = RecordedCommand {
            program: command.program().to_string(),
            args: command.get_args().to_vec(),
            stdin: command
                .stdin()
                .map(|secret| secret.expose_secret().to_string()),
        };
        self.commands.borrow_mut().push(recorded.clone());

        if self.failing.iter().any(|program| program == command.program()) {
            return Ok(CommandOutput {
                status: ExitStatus::from_raw(1 << 8),
                stdout: String::new(),
                stderr: format!("{}: simulated failure", command.program()),
            });
        }

        self.apply(&recorded).map_err(|source| Error::CommandExec {
            command: command.to_string(),
            source,
        })?;

        Ok(CommandOutput {
            status: ExitStatus::from_raw(0),
            stdout: String::new(),
            stderr: String::new(),
        })
    }

    fn user_exists(&self, name: &str) -> Result<bool, Error> {
        Ok(self.has_user(name))
    }
}

/// Creates a sandbox below `dir` with a home base directory and a passwd file.
///
/// Home directories in the passwd file are rebased on the home base directory of the sandbox.
///
/// Returns a [`ProvisionConfig`] pointing at the sandbox.
pub fn sandbox_config(dir: &Path) -> TestResult<ProvisionConfig> {
    let home_base_dir = dir.join("home");
    create_dir_all(&home_base_dir)?;
    let passwd_file = dir.join("passwd");
    write(
        &passwd_file,
        PASSWD.replace(":/home/", &format!(":{}/", home_base_dir.display())),
    )?;

    Ok(ProvisionConfig {
        home_base_dir,
        passwd_file,
        ..Default::default()
    })
}

/// Creates a placeholder home with GTK bookmarks at `home`.
///
/// The bookmarks reference `/home/live`, rebased on the home base directory of `config`.
pub fn create_placeholder_home(config: &ProvisionConfig, home: &Path) -> TestResult {
    let bookmarks = home.join(&config.bookmarks_file);
    if let Some(parent) = bookmarks.parent() {
        create_dir_all(parent)?;
    }
    write(
        &bookmarks,
        BOOKMARKS.replace("/home/", &format!("{}/", config.home_base_dir.display())),
    )?;
    Ok(())
}
