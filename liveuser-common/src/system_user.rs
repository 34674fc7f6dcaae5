//! Defaults for the provisioned system user.
//!
//! ```
//! use liveuser_common::system_user::{
//!     get_default_groups,
//!     get_home_base_dir_path,
//!     get_passwd_file_path,
//! };
//!
//! // Get the base directory below which user homes are located.
//! println!("{:?}", get_home_base_dir_path());
//!
//! // Get the account database file.
//! println!("{:?}", get_passwd_file_path());
//!
//! // Get the supplementary groups of freshly created users.
//! println!("{}", get_default_groups().join(","));
//! ```

use std::path::PathBuf;

/// The login name of the placeholder account shipped with live images.
pub const PLACEHOLDER_USER: &str = "live";

/// The base directory below which user homes are located.
const HOME_BASE_DIR: &str = "/home";

/// The text file holding the system account database.
const PASSWD_FILE: &str = "/etc/passwd";

/// The login shell of freshly created users.
pub const DEFAULT_SHELL: &str = "/bin/bash";

/// The supplementary groups of freshly created users.
const DEFAULT_GROUPS: &[&str] = &[
    "adm", "cdrom", "sudo", "audio", "dip", "plugdev", "lpadmin",
];

/// The GTK bookmarks file.
///
/// The path is evaluated relative to a user's home.
const GTK_BOOKMARKS_FILE: &str = ".config/gtk-3.0/bookmarks";

/// Returns the base directory below which user homes are located.
pub fn get_home_base_dir_path() -> PathBuf {
    PathBuf::from(HOME_BASE_DIR)
}

/// Returns the path of the system account database.
pub fn get_passwd_file_path() -> PathBuf {
    PathBuf::from(PASSWD_FILE)
}

/// Returns the supplementary groups of freshly created users.
pub fn get_default_groups() -> Vec<String> {
    DEFAULT_GROUPS.iter().map(|group| group.to_string()).collect()
}

/// Returns the GTK bookmarks file path relative to a user's home.
pub fn get_relative_bookmarks_file() -> PathBuf {
    PathBuf::from(GTK_BOOKMARKS_FILE)
}
