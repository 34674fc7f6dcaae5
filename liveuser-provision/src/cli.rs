//! Command line interface for `make-user`.

use std::path::PathBuf;

use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};
use liveuser_common::config::{
    CONFIG_FILE,
    DEFAULT_CONFIG_DIR,
    ETC_OVERRIDE_CONFIG_DIR,
    RUN_OVERRIDE_CONFIG_DIR,
    USR_LOCAL_OVERRIDE_CONFIG_DIR,
};

use crate::{OutputMode, Password, Username};

/// The name of the executable.
pub const BIN_NAME: &str = "make-user";

/// Command line arguments for provisioning the primary user account.
#[derive(Debug, Parser)]
#[command(
    about = "Provision the primary user account of a customized live image",
    name = BIN_NAME,
    long_about = format!("Provision the primary user account of a customized live image

NOTE: This command must be run as root!

The placeholder account shipped with the image (\"live\" by default) is renamed to USERNAME.
Its primary group, its home directory, references to its home in the GTK bookmarks and its entry in the account database are adjusted accordingly.
If the placeholder account can not be adapted, a new account is created using `useradd`.
Afterwards the password of the account is set to PASSWORD using `chpasswd`.

By default, one of the following configuration files is used if it exists, in the following order:

- \"{ETC_OVERRIDE_CONFIG_DIR}{CONFIG_FILE}\"

- \"{RUN_OVERRIDE_CONFIG_DIR}{CONFIG_FILE}\"

- \"{USR_LOCAL_OVERRIDE_CONFIG_DIR}{CONFIG_FILE}\"

- \"{DEFAULT_CONFIG_DIR}{CONFIG_FILE}\"

If none of the above are found, built-in defaults are used.
Alternatively a custom configuration file location can be specified using the \"--config\"/ \"-c\" option."),
)]
pub struct Cli {
    /// The login name of the account.
    #[arg(value_name = "USERNAME")]
    pub username: Username,

    /// The password of the account.
    #[arg(value_name = "PASSWORD")]
    pub password: Password,

    /// Show the output of the executed commands (any value enables it).
    #[arg(value_name = "OUTPUT")]
    pub output: Option<String>,

    /// The path to a custom configuration file.
    #[arg(env = "LIVEUSER_CONFIG", long, short)]
    pub config: Option<PathBuf>,

    /// Log verbosity.
    #[command(flatten)]
    pub verbosity: Verbosity<InfoLevel>,
}

impl Cli {
    /// Returns the [`OutputMode`] selected by the optional `OUTPUT` argument.
    pub fn output_mode(&self) -> OutputMode {
        if self.output.is_some() {
            OutputMode::Verbose
        } else {
            OutputMode::Quiet
        }
    }
}
