#![doc = include_str!("../README.md")]

use nix::unistd::{User, geteuid};

pub mod cli;
pub mod command;
pub mod config;
pub mod error;
pub mod home;
pub mod passwd;
pub mod provision;
pub mod user;

pub use command::{Host, LocalHost, OutputMode};
pub use config::ProvisionConfig;
pub use error::{Error, ErrorExitCode};
pub use provision::{AdaptStep, ProvisionPath, ProvisionReport, Provisioner};
pub use user::{Password, Username};

/// Checks whether the current process is run by root.
///
/// Evaluates the effective user ID of the current process.
///
/// # Errors
///
/// Returns an error if the effective user ID is not that of root.
pub fn ensure_root() -> Result<(), Error> {
    let euid = geteuid();
    if euid.is_root() {
        return Ok(());
    }

    let user = match User::from_uid(euid) {
        Ok(Some(user)) => user.name,
        _ => euid.to_string(),
    };
    Err(Error::NotRoot { user })
}
