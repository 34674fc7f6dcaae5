//! Rewriting of entries in the system account database.
//!
//! Renaming the login of an account leaves its home directory field and its full name untouched.
//! After the home directory has been moved, the entry is adjusted in place.

use std::{
    fs::{read_to_string, set_permissions},
    io::Write,
    path::Path,
};

use log::info;
use tempfile::NamedTempFile;

use crate::{Error, Username};

/// The number of `:` separated fields in an account database entry.
const PASSWD_FIELDS: usize = 7;

/// The index of the GECOS field in an account database entry.
const GECOS_FIELD: usize = 4;

/// The index of the home directory field in an account database entry.
const HOME_FIELD: usize = 5;

/// Rewrites the account database entry of `user`.
///
/// In the entry whose login name is `user`
/// - a home directory `old_home` (or a path below it) is moved to `new_home`,
/// - and a full name (the first `,` separated part of the GECOS field) equal to `placeholder` is
///   replaced with `user`.
///
/// All other lines are returned unchanged.
/// Returns [`None`] if there is no entry for `user`.
///
/// # Examples
///
/// ```
/// use liveuser_provision::{Username, passwd::rewrite_entry};
///
/// # fn main() -> testresult::TestResult {
/// let content = "root:x:0:0:root:/root:/bin/bash\nalice:x:1000:1000:live,,,:/home/live:/bin/bash\n";
/// let rewritten = rewrite_entry(
///     content,
///     &Username::new("alice".to_string())?,
///     &Username::placeholder(),
///     "/home/live",
///     "/home/alice",
/// );
/// assert_eq!(
///     rewritten.as_deref(),
///     Some("root:x:0:0:root:/root:/bin/bash\nalice:x:1000:1000:alice,,,:/home/alice:/bin/bash\n")
/// );
/// # Ok(())
/// # }
/// ```
pub fn rewrite_entry(
    content: &str,
    user: &Username,
    placeholder: &Username,
    old_home: &str,
    new_home: &str,
) -> Option<String> {
    let mut found = false;
    let lines: Vec<String> = content
        .lines()
        .map(|line| {
            let mut fields: Vec<String> = line.split(':').map(str::to_string).collect();
            if fields.len() != PASSWD_FIELDS || fields[0] != user.as_ref() {
                return line.to_string();
            }
            found = true;

            let gecos = {
                let mut parts: Vec<&str> = fields[GECOS_FIELD].split(',').collect();
                if parts.first() == Some(&placeholder.as_ref()) {
                    parts[0] = user.as_ref();
                }
                parts.join(",")
            };
            fields[GECOS_FIELD] = gecos;

            let home = match fields[HOME_FIELD].strip_prefix(old_home) {
                Some(rest) if rest.is_empty() || rest.starts_with('/') => {
                    Some([new_home, rest].concat())
                }
                _ => None,
            };
            if let Some(home) = home {
                fields[HOME_FIELD] = home;
            }

            fields.join(":")
        })
        .collect();

    if !found {
        return None;
    }

    let mut rewritten = lines.join("\n");
    if content.ends_with('\n') {
        rewritten.push('\n');
    }
    Some(rewritten)
}

/// Rewrites the entry of `user` in the account database `file`.
///
/// The entry is adjusted using [`rewrite_entry`].
/// The new contents are written to a temporary file next to `file`, which receives the
/// permissions of `file` and then replaces it.
///
/// # Errors
///
/// Returns an error if
/// - `file` can not be read,
/// - there is no entry for `user` in `file`,
/// - or the new contents can not be written to `file`.
pub fn rewrite_file(
    file: &Path,
    user: &Username,
    placeholder: &Username,
    old_home: &Path,
    new_home: &Path,
) -> Result<(), Error> {
    let content = read_to_string(file).map_err(|source| Error::IoPath {
        path: file.to_path_buf(),
        context: "reading the account database",
        source,
    })?;

    let Some(rewritten) = rewrite_entry(
        &content,
        user,
        placeholder,
        &old_home.to_string_lossy(),
        &new_home.to_string_lossy(),
    ) else {
        return Err(Error::PasswdEntryMissing {
            user: user.to_string(),
            path: file.to_path_buf(),
        });
    };

    if rewritten == content {
        info!("The entry of \"{user}\" in {file:?} is up to date");
        return Ok(());
    }

    let dir = file.parent().unwrap_or(Path::new("/"));
    let mut tmp = NamedTempFile::new_in(dir).map_err(|source| Error::IoPath {
        path: dir.to_path_buf(),
        context: "creating a temporary file in it",
        source,
    })?;
    tmp.write_all(rewritten.as_bytes())
        .map_err(|source| Error::IoPath {
            path: tmp.path().to_path_buf(),
            context: "writing the account database",
            source,
        })?;

    let permissions = file
        .metadata()
        .map_err(|source| Error::IoPath {
            path: file.to_path_buf(),
            context: "retrieving its metadata",
            source,
        })?
        .permissions();
    set_permissions(tmp.path(), permissions).map_err(|source| Error::IoPath {
        path: tmp.path().to_path_buf(),
        context: "applying the permissions of the account database",
        source,
    })?;

    tmp.persist(file).map_err(|error| Error::IoPath {
        path: file.to_path_buf(),
        context: "replacing it",
        source: error.error,
    })?;
    info!("Rewrote the entry of \"{user}\" in {file:?}");

    Ok(())
}
