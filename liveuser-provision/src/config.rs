//! Configuration of the account provisioning.
//!
//! # Examples
//!
//! ```
//! use liveuser_provision::ProvisionConfig;
//!
//! # fn main() -> testresult::TestResult {
//! let config: ProvisionConfig = toml::from_str(
//!     r#"
//! placeholder = "demo"
//! groups = ["sudo", "audio"]
//! "#,
//! )?;
//! config.validate()?;
//! assert_eq!(config.placeholder_home().to_string_lossy(), "/home/demo");
//! # Ok(())
//! # }
//! ```

use std::{
    fs::read_to_string,
    path::{Path, PathBuf},
};

use liveuser_common::{
    config::get_config_file,
    system_user::{
        DEFAULT_SHELL,
        get_default_groups,
        get_home_base_dir_path,
        get_passwd_file_path,
        get_relative_bookmarks_file,
    },
};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{Error, Username};

/// The directory name, that wraps a placeholder home nested one level too deep.
const NESTED_HOME_WRAPPER: &str = "home";

/// Settings for provisioning a user account.
///
/// All settings are optional in a configuration file and fall back to the defaults for
/// Debian-based live images.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProvisionConfig {
    /// The placeholder account shipped with the image.
    pub placeholder: Username,

    /// The directory below which user homes are located.
    pub home_base_dir: PathBuf,

    /// The text file holding the system account database.
    pub passwd_file: PathBuf,

    /// The login shell of freshly created accounts.
    pub shell: String,

    /// The supplementary groups of freshly created accounts.
    pub groups: Vec<String>,

    /// The GTK bookmarks file, relative to a home directory.
    pub bookmarks_file: PathBuf,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            placeholder: Username::placeholder(),
            home_base_dir: get_home_base_dir_path(),
            passwd_file: get_passwd_file_path(),
            shell: DEFAULT_SHELL.to_string(),
            groups: get_default_groups(),
            bookmarks_file: get_relative_bookmarks_file(),
        }
    }
}

impl ProvisionConfig {
    /// Loads a [`ProvisionConfig`] from file.
    ///
    /// If `path` is [`None`], the first configuration file found in the default locations is
    /// used (see [`get_config_file`]).
    /// If there is none, the default [`ProvisionConfig`] is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if
    /// - the configuration file can not be read,
    /// - the configuration file can not be deserialized,
    /// - or the configuration is not valid (see [`ProvisionConfig::validate`]).
    pub fn new_from_file(path: Option<&Path>) -> Result<Self, Error> {
        let path = if let Some(path) = path {
            path.to_path_buf()
        } else {
            let Some(path) = get_config_file() else {
                debug!("No configuration file found, using defaults");
                return Ok(Self::default());
            };
            path
        };
        info!("Loading configuration file {path:?}");

        let config: Self = toml::from_str(&read_to_string(&path).map_err(|source| {
            Error::IoPath {
                path: path.clone(),
                context: "reading it to string",
                source,
            }
        })?)
        .map_err(|source| Error::ConfigRead {
            path,
            source: Box::new(source),
        })?;
        config.validate()?;

        Ok(config)
    }

    /// Validates the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if
    /// - `home_base_dir`, `passwd_file` or `shell` are not absolute paths,
    /// - `bookmarks_file` is not a relative path,
    /// - or one of `groups` is empty or contains `,`, `:` or whitespace.
    pub fn validate(&self) -> Result<(), Error> {
        for (key, path) in [
            ("home_base_dir", self.home_base_dir.as_path()),
            ("passwd_file", self.passwd_file.as_path()),
            ("shell", Path::new(&self.shell)),
        ] {
            if !path.is_absolute() {
                return Err(Error::ConfigInvalid {
                    key,
                    reason: format!("{path:?} is not an absolute path"),
                });
            }
        }

        if !self.bookmarks_file.is_relative() {
            return Err(Error::ConfigInvalid {
                key: "bookmarks_file",
                reason: format!("{:?} is not a relative path", self.bookmarks_file),
            });
        }

        if let Some(group) = self.groups.iter().find(|group| {
            group.is_empty()
                || group.contains([',', ':'])
                || group.chars().any(char::is_whitespace)
        }) {
            return Err(Error::ConfigInvalid {
                key: "groups",
                reason: format!("\"{group}\" is not a valid group name"),
            });
        }

        Ok(())
    }

    /// Returns the home directory of the placeholder account.
    pub fn placeholder_home(&self) -> PathBuf {
        self.home_for(&self.placeholder)
    }

    /// Returns the location of a placeholder home nested one level too deep.
    pub fn nested_placeholder_home(&self) -> PathBuf {
        self.nested_home_wrapper()
            .join(self.placeholder.as_ref())
    }

    /// Returns the directory wrapping a placeholder home nested one level too deep.
    pub fn nested_home_wrapper(&self) -> PathBuf {
        self.home_base_dir.join(NESTED_HOME_WRAPPER)
    }

    /// Returns the home directory of `user`.
    pub fn home_for(&self, user: &Username) -> PathBuf {
        self.home_base_dir.join(user.as_ref())
    }
}
