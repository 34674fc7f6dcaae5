//! Default locations for liveuser configuration files.
//!
//! # Examples
//!
//! ```
//! use liveuser_common::config::{
//!     get_config_file,
//!     get_config_file_paths,
//!     get_default_config_file_path,
//!     get_etc_override_config_file_path,
//! };
//!
//! // Get the file path of the default configuration file and the one overriding it below /etc.
//! println!("{:?}", get_default_config_file_path());
//! println!("{:?}", get_etc_override_config_file_path());
//!
//! // Get the first config file found, according to directory precedence.
//! println!("{:?}", get_config_file());
//!
//! // Get all configuration file paths, sorted by directory precedence.
//! println!("{:?}", get_config_file_paths());
//! ```

use std::path::PathBuf;

/// The default config directory below "/usr".
pub const DEFAULT_CONFIG_DIR: &str = "/usr/share/liveuser/";

/// The override config directory below "/etc".
pub const ETC_OVERRIDE_CONFIG_DIR: &str = "/etc/liveuser/";

/// The override config directory below "/run".
pub const RUN_OVERRIDE_CONFIG_DIR: &str = "/run/liveuser/";

/// The override config directory below "/usr/local".
pub const USR_LOCAL_OVERRIDE_CONFIG_DIR: &str = "/usr/local/share/liveuser/";

/// The filename of a liveuser configuration file.
pub const CONFIG_FILE: &str = "config.toml";

/// Returns the first liveuser configuration file available, or [`None`] if none found.
///
/// Considers files named `config.toml` in the following directories in descending priority:
/// - `/etc/liveuser`
/// - `/run/liveuser`
/// - `/usr/local/share/liveuser`
/// - `/usr/share/liveuser`
///
/// The first existing file is returned.
/// If no file is found [`None`] is returned.
pub fn get_config_file() -> Option<PathBuf> {
    get_config_file_paths()
        .into_iter()
        .find(|file| file.is_file())
}

/// Returns a list of all configuration file locations, sorted by precedence.
pub fn get_config_file_paths() -> Vec<PathBuf> {
    vec![
        get_etc_override_config_file_path(),
        get_run_override_config_file_path(),
        get_usr_local_override_config_file_path(),
        get_default_config_file_path(),
    ]
}

/// Returns the file path of the configuration file override below /etc.
pub fn get_etc_override_config_file_path() -> PathBuf {
    PathBuf::from([ETC_OVERRIDE_CONFIG_DIR, CONFIG_FILE].concat())
}

/// Returns the file path of the configuration file override below /run.
pub fn get_run_override_config_file_path() -> PathBuf {
    PathBuf::from([RUN_OVERRIDE_CONFIG_DIR, CONFIG_FILE].concat())
}

/// Returns the file path of the configuration file override below /usr/local.
pub fn get_usr_local_override_config_file_path() -> PathBuf {
    PathBuf::from([USR_LOCAL_OVERRIDE_CONFIG_DIR, CONFIG_FILE].concat())
}

/// Returns the file path of the default configuration file below /usr.
pub fn get_default_config_file_path() -> PathBuf {
    PathBuf::from([DEFAULT_CONFIG_DIR, CONFIG_FILE].concat())
}
