//! Provisioning of the primary user account.
//!
//! The placeholder account of a live image is adapted to the requested username.
//! If that is not possible, a fresh account is created instead.
//! In both cases the password of the account is set afterwards.

use std::fmt::Display;

use log::{info, warn};
use secrecy::SecretString;

use crate::{
    Error,
    Password,
    ProvisionConfig,
    Username,
    command::{CommandOutput, Host, HostCommand, OutputMode, run_checked},
    home::{PlaceholderHome, check_home_move, move_home, rewrite_bookmarks},
    passwd,
};

/// A step of adapting the placeholder account.
#[derive(Clone, Copy, Debug, Eq, PartialEq, strum::Display)]
pub enum AdaptStep {
    /// The login name of the placeholder account has been renamed.
    #[strum(to_string = "rename login")]
    RenameLogin,

    /// The primary group of the placeholder account has been renamed.
    #[strum(to_string = "rename group")]
    RenameGroup,

    /// References to the placeholder home in the GTK bookmarks have been rewritten.
    #[strum(to_string = "rewrite bookmarks")]
    RewriteBookmarks,

    /// The placeholder home has been moved.
    #[strum(to_string = "move home")]
    MoveHome,

    /// The account database entry has been rewritten.
    #[strum(to_string = "rewrite account database")]
    RewritePasswd,
}

/// The way in which an account has been provisioned.
#[derive(Clone, Copy, Debug, Eq, PartialEq, strum::Display)]
pub enum ProvisionPath {
    /// The placeholder account has been adapted.
    #[strum(to_string = "adapted placeholder account")]
    Adapted,

    /// A fresh account has been created.
    #[strum(to_string = "created new account")]
    Created,

    /// The account existed already.
    #[strum(to_string = "reused existing account")]
    Existing,
}

/// A summary of a finished provisioning.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProvisionReport {
    /// The user the account has been provisioned for.
    pub user: Username,

    /// The way in which the account has been provisioned.
    pub path: ProvisionPath,

    /// The steps of adapting the placeholder account, that have been applied.
    ///
    /// If `path` is not [`ProvisionPath::Adapted`], these are the steps that were applied before
    /// adapting the placeholder account failed.
    pub applied: Vec<AdaptStep>,
}

impl Display for ProvisionReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Provisioned \"{}\" ({})", self.user, self.path)?;
        if self.path != ProvisionPath::Adapted && !self.applied.is_empty() {
            write!(
                f,
                ", partially applied before fallback: {}",
                join_steps(&self.applied)
            )?;
        }
        Ok(())
    }
}

/// Adapting the placeholder account failed.
#[derive(Debug, thiserror::Error)]
#[error(
    "Adapting the placeholder account failed after {} applied step(s):\n{source}",
    .applied.len()
)]
pub struct AdaptFailure {
    /// The steps that have been applied before the failure.
    pub applied: Vec<AdaptStep>,

    /// The source error.
    pub source: Error,
}

/// Returns `steps` as comma separated list.
fn join_steps(steps: &[AdaptStep]) -> String {
    steps
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Provisions the primary user account on a [`Host`].
#[derive(Debug)]
pub struct Provisioner<'a, H: Host> {
    host: &'a H,
    config: &'a ProvisionConfig,
    output: OutputMode,
}

impl<'a, H: Host> Provisioner<'a, H> {
    /// Creates a new [`Provisioner`].
    pub fn new(host: &'a H, config: &'a ProvisionConfig, output: OutputMode) -> Self {
        Self {
            host,
            config,
            output,
        }
    }

    /// Provisions the account of `user` and sets its `password`.
    ///
    /// First tries to adapt the placeholder account (see [`Provisioner::adapt_placeholder`]).
    /// If any step of that fails, the failure and the steps applied so far are logged and an
    /// account is created instead (see [`Provisioner::create_account`]).
    /// Afterwards the password is set (see [`Provisioner::set_password`]).
    ///
    /// # Errors
    ///
    /// Returns an error if
    /// - adapting the placeholder account and creating a new account both fail,
    /// - or the password can not be set.
    pub fn provision(
        &self,
        user: &Username,
        password: &Password,
    ) -> Result<ProvisionReport, Error> {
        info!(
            "Provisioning account \"{user}\" from placeholder account \"{}\"",
            self.config.placeholder
        );

        let report = match self.adapt_placeholder(user) {
            Ok(applied) => ProvisionReport {
                user: user.clone(),
                path: ProvisionPath::Adapted,
                applied,
            },
            Err(failure) => {
                warn!("{failure}");
                if !failure.applied.is_empty() {
                    warn!(
                        "Steps applied before the failure: {}",
                        join_steps(&failure.applied)
                    );
                }
                info!("Falling back to creating the account \"{user}\"");
                ProvisionReport {
                    user: user.clone(),
                    path: self.create_account(user)?,
                    applied: failure.applied,
                }
            }
        };

        self.set_password(user, password)?;
        info!("{report}");

        Ok(report)
    }

    /// Adapts the placeholder account to `user`.
    ///
    /// Renames the login and primary group of the placeholder account, rewrites references to its
    /// home in the GTK bookmarks, moves its home and rewrites its account database entry.
    /// Rewriting the bookmarks is skipped if there is no placeholder home.
    /// Stops at the first failing step.
    ///
    /// Returns the list of applied steps.
    ///
    /// # Errors
    ///
    /// Returns an [`AdaptFailure`] with the steps applied so far if
    /// - the placeholder account does not exist,
    /// - an account named `user` exists already,
    /// - the placeholder home can not be moved to the home of `user` (see
    ///   [`check_home_move`]),
    /// - or any of the steps fails.
    ///
    /// No step is applied if any of the first three conditions is met.
    pub fn adapt_placeholder(&self, user: &Username) -> Result<Vec<AdaptStep>, AdaptFailure> {
        let mut applied = Vec::new();
        match self.apply_adapt_steps(user, &mut applied) {
            Ok(()) => Ok(applied),
            Err(source) => Err(AdaptFailure { applied, source }),
        }
    }

    fn apply_adapt_steps(
        &self,
        user: &Username,
        applied: &mut Vec<AdaptStep>,
    ) -> Result<(), Error> {
        let placeholder = &self.config.placeholder;

        if !self.host.user_exists(placeholder.as_ref())? {
            return Err(Error::PlaceholderMissing {
                user: placeholder.to_string(),
            });
        }
        if self.host.user_exists(user.as_ref())? {
            return Err(Error::AccountExists {
                user: user.to_string(),
            });
        }

        let old_home = self.config.placeholder_home();
        let new_home = self.config.home_for(user);
        let placeholder_home = PlaceholderHome::locate(self.config);
        check_home_move(self.config, placeholder_home.as_ref(), &new_home)?;

        self.run(
            &HostCommand::new("usermod")
                .arg("--login")
                .arg(user.as_ref())
                .arg(placeholder.as_ref()),
        )?;
        applied.push(AdaptStep::RenameLogin);

        self.run(
            &HostCommand::new("groupmod")
                .arg("--new-name")
                .arg(user.as_ref())
                .arg(placeholder.as_ref()),
        )?;
        applied.push(AdaptStep::RenameGroup);

        if let Some(home) = &placeholder_home {
            rewrite_bookmarks(
                &home.path().join(&self.config.bookmarks_file),
                &old_home,
                &new_home,
            )?;
            applied.push(AdaptStep::RewriteBookmarks);
        }

        let moved = move_home(self.config, placeholder_home.as_ref(), &new_home)?;
        info!("Home of \"{user}\": {moved}");
        applied.push(AdaptStep::MoveHome);

        passwd::rewrite_file(
            &self.config.passwd_file,
            user,
            placeholder,
            &old_home,
            &new_home,
        )?;
        applied.push(AdaptStep::RewritePasswd);

        Ok(())
    }

    /// Creates a new account for `user`.
    ///
    /// The account receives a home below [`ProvisionConfig::home_base_dir`], the configured login
    /// shell and the configured supplementary groups.
    /// If an account named `user` exists already, its creation is skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if
    /// - the account database can not be queried,
    /// - or the account can not be created.
    pub fn create_account(&self, user: &Username) -> Result<ProvisionPath, Error> {
        if self.host.user_exists(user.as_ref())? {
            warn!("The account \"{user}\" exists already, skipping its creation");
            return Ok(ProvisionPath::Existing);
        }

        let mut command = HostCommand::new("useradd")
            .arg("--create-home")
            .arg("--home-dir")
            .arg(self.config.home_for(user).to_string_lossy())
            .arg("--shell")
            .arg(self.config.shell.as_str());
        if !self.config.groups.is_empty() {
            command = command.arg("--groups").arg(self.config.groups.join(","));
        }
        self.run(&command.arg(user.as_ref()))?;
        info!("Created account \"{user}\"");

        Ok(ProvisionPath::Created)
    }

    /// Sets the password of `user` to `password`.
    ///
    /// The record `user:password` is passed to `chpasswd` on stdin.
    ///
    /// # Errors
    ///
    /// Returns an error if `chpasswd` can not be executed or fails.
    pub fn set_password(&self, user: &Username, password: &Password) -> Result<(), Error> {
        let record = SecretString::new(format!("{user}:{}\n", password.expose_borrowed()).into());
        self.run(&HostCommand::new("chpasswd").stdin_secret(record))?;
        info!("Set password of \"{user}\"");

        Ok(())
    }

    fn run(&self, command: &HostCommand) -> Result<CommandOutput, Error> {
        run_checked(self.host, command, self.output)
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn report_display_adapted() -> TestResult {
        let report = ProvisionReport {
            user: Username::new("alice".to_string())?,
            path: ProvisionPath::Adapted,
            applied: vec![AdaptStep::RenameLogin, AdaptStep::RenameGroup],
        };
        assert_eq!(
            report.to_string(),
            "Provisioned \"alice\" (adapted placeholder account)"
        );
        Ok(())
    }

    #[test]
    fn report_display_partial() -> TestResult {
        let report = ProvisionReport {
            user: Username::new("alice".to_string())?,
            path: ProvisionPath::Existing,
            applied: vec![AdaptStep::RenameLogin, AdaptStep::RenameGroup],
        };
        assert_eq!(
            report.to_string(),
            "Provisioned \"alice\" (reused existing account), partially applied before fallback: rename login, rename group"
        );
        Ok(())
    }

    #[test]
    fn adapt_failure_display() {
        let failure = AdaptFailure {
            applied: vec![AdaptStep::RenameLogin],
            source: Error::HomeMissing {
                path: "/home/live".into(),
            },
        };
        assert_eq!(
            failure.to_string(),
            "Adapting the placeholder account failed after 1 applied step(s):\nThe home directory /home/live does not exist"
        );
    }
}
