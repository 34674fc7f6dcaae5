//! Common, top-level error type for all components of liveuser-provision.

use std::{
    path::PathBuf,
    process::{ExitCode, ExitStatus},
};

/// An error that may occur when provisioning a user account.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The account that should be created or renamed to exists already.
    #[error("The account \"{user}\" exists already")]
    AccountExists {
        /// The name of the existing account.
        user: String,
    },

    /// Unable to attach to stdin of a command.
    #[error("Unable to attach to stdin of command \"{command}\"")]
    CommandAttachToStdin {
        /// The command for which attaching to stdin failed.
        command: String,
    },

    /// A command could not be executed.
    #[error("The command \"{command}\" could not be executed:\n{source}")]
    CommandExec {
        /// The command that could not be executed.
        command: String,
        /// The source error.
        source: std::io::Error,
    },

    /// A command exited unsuccessfully.
    #[error(
        "The command \"{command}\" exited with non-zero status code \"{exit_status}\":\nstderr:\n{stderr}"
    )]
    CommandNonZero {
        /// The command that exited with a non-zero exit code.
        command: String,
        /// The exit status of `command`.
        exit_status: ExitStatus,
        /// The stderr of `command`.
        stderr: String,
    },

    /// Unable to write to stdin of a command.
    #[error("Unable to write to stdin of command \"{command}\":\n{source}")]
    CommandWriteToStdin {
        /// The command for which writing to stdin failed.
        command: String,
        /// The source error.
        source: std::io::Error,
    },

    /// A setting of the configuration is not valid.
    #[error("The configuration setting \"{key}\" is invalid: {reason}")]
    ConfigInvalid {
        /// The name of the offending setting.
        key: &'static str,
        /// The reason why the setting is invalid.
        reason: String,
    },

    /// A configuration file can not be deserialized.
    #[error("Unable to read {path} as a liveuser configuration:\n{source}")]
    ConfigRead {
        /// The path of the configuration file.
        path: PathBuf,
        /// The source error.
        source: Box<toml::de::Error>,
    },

    /// An executable that is supposed to be called, is not found.
    #[error("Unable to to find executable \"{command}\"")]
    ExecutableNotFound {
        /// The executable that could not be found.
        command: String,
        /// The source error.
        source: which::Error,
    },

    /// Neither the placeholder home nor the target home exist.
    #[error("The home directory {path} does not exist")]
    HomeMissing {
        /// The expected location of the placeholder home.
        path: PathBuf,
    },

    /// The target home is the directory wrapping a nested placeholder home.
    #[error("The home directory {path} wraps the nested placeholder home and can not be its target")]
    HomeWrapsPlaceholder {
        /// The target home.
        path: PathBuf,
    },

    /// A password is not usable.
    #[error("Invalid password: {reason}")]
    InvalidPassword {
        /// The reason why the password is rejected.
        reason: &'static str,
    },

    /// A username is not a valid login name.
    #[error("Invalid username \"{name}\": {reason}")]
    InvalidUsername {
        /// The rejected name.
        name: String,
        /// The reason why the name is rejected.
        reason: &'static str,
    },

    /// An I/O error occurred for a file.
    #[error("I/O error for file {path} while {context}:\n{source}")]
    IoPath {
        /// The path to the file for which the error occurred.
        path: PathBuf,
        /// The context in which the error occurs.
        ///
        /// This is meant to complete the sentence "I/O error for file {path} while ".
        context: &'static str,
        /// The error source.
        source: std::io::Error,
    },

    /// Logging could not be set up.
    #[error(transparent)]
    Logging(#[from] liveuser_common::logging::Error),

    /// The application is not run as root.
    #[error("This application must be run as root, but is run as \"{user}\"")]
    NotRoot {
        /// The calling user.
        user: String,
    },

    /// The account database has no entry for a user.
    #[error("No entry for user \"{user}\" in {path}")]
    PasswdEntryMissing {
        /// The user without an entry.
        user: String,
        /// The account database file.
        path: PathBuf,
    },

    /// The placeholder account does not exist.
    #[error("The placeholder account \"{user}\" does not exist")]
    PlaceholderMissing {
        /// The name of the placeholder account.
        user: String,
    },

    /// Looking up a user in the account database failed.
    #[error("Unable to look up user \"{user}\":\n{source}")]
    UserLookup {
        /// The name of the user.
        user: String,
        /// The source error.
        source: nix::errno::Errno,
    },
}

/// Mapping for relevant [`Error`] variants to an [`ExitCode`].
#[derive(Clone, Copy, Debug, Eq, num_enum::IntoPrimitive, Ord, PartialEq, PartialOrd)]
#[repr(u8)]
pub enum ErrorExitCode {
    /// Mapping for [`Error::AccountExists`].
    AccountExists = 10,

    /// Mapping for [`Error::CommandAttachToStdin`].
    CommandAttachToStdin = 11,

    /// Mapping for [`Error::CommandExec`].
    CommandExec = 12,

    /// Mapping for [`Error::CommandNonZero`].
    CommandNonZero = 13,

    /// Mapping for [`Error::CommandWriteToStdin`].
    CommandWriteToStdin = 14,

    /// Mapping for [`Error::ConfigInvalid`].
    ConfigInvalid = 20,

    /// Mapping for [`Error::ConfigRead`].
    ConfigRead = 21,

    /// Mapping for [`Error::ExecutableNotFound`].
    ExecutableNotFound = 15,

    /// Mapping for [`Error::HomeMissing`].
    HomeMissing = 30,

    /// Mapping for [`Error::HomeWrapsPlaceholder`].
    HomeWrapsPlaceholder = 35,

    /// Mapping for [`Error::InvalidPassword`].
    InvalidPassword = 40,

    /// Mapping for [`Error::InvalidUsername`].
    InvalidUsername = 41,

    /// Mapping for [`Error::IoPath`].
    IoPath = 31,

    /// Mapping for [`Error::Logging`].
    Logging = 50,

    /// Mapping for [`Error::NotRoot`].
    NotRoot = 51,

    /// Mapping for [`Error::PasswdEntryMissing`].
    PasswdEntryMissing = 32,

    /// Mapping for [`Error::PlaceholderMissing`].
    PlaceholderMissing = 33,

    /// Mapping for [`Error::UserLookup`].
    UserLookup = 34,
}

impl From<&Error> for ErrorExitCode {
    fn from(value: &Error) -> Self {
        match value {
            Error::AccountExists { .. } => Self::AccountExists,
            Error::CommandAttachToStdin { .. } => Self::CommandAttachToStdin,
            Error::CommandExec { .. } => Self::CommandExec,
            Error::CommandNonZero { .. } => Self::CommandNonZero,
            Error::CommandWriteToStdin { .. } => Self::CommandWriteToStdin,
            Error::ConfigInvalid { .. } => Self::ConfigInvalid,
            Error::ConfigRead { .. } => Self::ConfigRead,
            Error::ExecutableNotFound { .. } => Self::ExecutableNotFound,
            Error::HomeMissing { .. } => Self::HomeMissing,
            Error::HomeWrapsPlaceholder { .. } => Self::HomeWrapsPlaceholder,
            Error::InvalidPassword { .. } => Self::InvalidPassword,
            Error::InvalidUsername { .. } => Self::InvalidUsername,
            Error::IoPath { .. } => Self::IoPath,
            Error::Logging(_) => Self::Logging,
            Error::NotRoot { .. } => Self::NotRoot,
            Error::PasswdEntryMissing { .. } => Self::PasswdEntryMissing,
            Error::PlaceholderMissing { .. } => Self::PlaceholderMissing,
            Error::UserLookup { .. } => Self::UserLookup,
        }
    }
}

impl From<Error> for ErrorExitCode {
    fn from(value: Error) -> Self {
        Self::from(&value)
    }
}

impl From<ErrorExitCode> for ExitCode {
    fn from(value: ErrorExitCode) -> Self {
        Self::from(std::convert::Into::<u8>::into(value))
    }
}

impl From<ErrorExitCode> for i32 {
    fn from(value: ErrorExitCode) -> Self {
        Self::from(std::convert::Into::<u8>::into(value))
    }
}
