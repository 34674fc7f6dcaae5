//! Handling of home directories and files referencing them.

use std::{
    fs::{read_to_string, remove_dir, remove_dir_all, rename, write},
    io::ErrorKind,
    path::{Path, PathBuf},
};

use log::{debug, info, warn};

use crate::{Error, ProvisionConfig};

/// The location at which a placeholder home has been found.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PlaceholderHome {
    /// The home is located directly below the home base directory.
    Regular(PathBuf),

    /// The home is nested one level too deep, below a stray `home` directory.
    Nested(PathBuf),
}

impl PlaceholderHome {
    /// Locates the home of the placeholder account.
    ///
    /// Prefers [`ProvisionConfig::placeholder_home`] and falls back to
    /// [`ProvisionConfig::nested_placeholder_home`].
    /// Returns [`None`] if neither is a directory.
    pub fn locate(config: &ProvisionConfig) -> Option<Self> {
        let regular = config.placeholder_home();
        if regular.is_dir() {
            return Some(Self::Regular(regular));
        }

        let nested = config.nested_placeholder_home();
        if nested.is_dir() {
            warn!("Found placeholder home nested one level too deep at {nested:?}");
            return Some(Self::Nested(nested));
        }

        None
    }

    /// Returns the path of the home directory.
    pub fn path(&self) -> &Path {
        match self {
            Self::Regular(path) | Self::Nested(path) => path,
        }
    }
}

/// The outcome of [`move_home`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, strum::Display)]
pub enum HomeMove {
    /// The placeholder home has been renamed to the target home.
    #[strum(to_string = "renamed placeholder home")]
    Renamed,

    /// The target home existed already and the placeholder home has been removed.
    #[strum(to_string = "removed leftover placeholder home")]
    LeftoverRemoved,

    /// There is no placeholder home, but the target home exists already.
    #[strum(to_string = "kept existing home")]
    TargetKept,
}

/// Checks whether the placeholder home can be moved to `target`.
///
/// # Errors
///
/// Returns an error if
/// - neither `placeholder_home` nor `target` exist,
/// - or `placeholder_home` is [`PlaceholderHome::Nested`] and `target` is the directory wrapping
///   it.
pub fn check_home_move(
    config: &ProvisionConfig,
    placeholder_home: Option<&PlaceholderHome>,
    target: &Path,
) -> Result<(), Error> {
    match placeholder_home {
        None if !target.is_dir() => Err(Error::HomeMissing {
            path: config.placeholder_home(),
        }),
        Some(PlaceholderHome::Nested(_)) if target == config.nested_home_wrapper() => {
            Err(Error::HomeWrapsPlaceholder {
                path: target.to_path_buf(),
            })
        }
        _ => Ok(()),
    }
}

/// Moves the placeholder home to `target`.
///
/// If `target` exists already, the leftover `placeholder_home` is removed instead.
/// If `placeholder_home` is [`PlaceholderHome::Nested`], the stray wrapper directory
/// ([`ProvisionConfig::nested_home_wrapper`]) is removed afterwards, unless it still has other
/// contents.
///
/// # Errors
///
/// Returns an error if
/// - [`check_home_move`] fails,
/// - `placeholder_home` can not be renamed or removed,
/// - or the stray wrapper directory can not be removed.
pub fn move_home(
    config: &ProvisionConfig,
    placeholder_home: Option<&PlaceholderHome>,
    target: &Path,
) -> Result<HomeMove, Error> {
    check_home_move(config, placeholder_home, target)?;

    let outcome = match (placeholder_home, target.is_dir()) {
        (Some(home), true) => {
            warn!(
                "The home {target:?} exists already, removing leftover placeholder home {:?}",
                home.path()
            );
            remove_dir_all(home.path()).map_err(|source| Error::IoPath {
                path: home.path().to_path_buf(),
                context: "removing the leftover placeholder home",
                source,
            })?;
            HomeMove::LeftoverRemoved
        }
        (Some(home), false) => {
            info!("Moving home {:?} to {target:?}", home.path());
            rename(home.path(), target).map_err(|source| Error::IoPath {
                path: home.path().to_path_buf(),
                context: "renaming it",
                source,
            })?;
            HomeMove::Renamed
        }
        (None, true) => {
            info!("There is no placeholder home, keeping the existing home {target:?}");
            HomeMove::TargetKept
        }
        (None, false) => {
            return Err(Error::HomeMissing {
                path: config.placeholder_home(),
            });
        }
    };

    if let Some(PlaceholderHome::Nested(_)) = placeholder_home {
        remove_nested_home_wrapper(&config.nested_home_wrapper())?;
    }

    Ok(outcome)
}

/// Removes the stray directory that wrapped a nested placeholder home.
///
/// The directory is kept if it is not empty.
fn remove_nested_home_wrapper(wrapper: &Path) -> Result<(), Error> {
    match remove_dir(wrapper) {
        Ok(()) => {
            info!("Removed stray directory {wrapper:?}");
            Ok(())
        }
        Err(error) if error.kind() == ErrorKind::DirectoryNotEmpty => {
            warn!("Keeping stray directory {wrapper:?}, as it is not empty");
            Ok(())
        }
        Err(source) => Err(Error::IoPath {
            path: wrapper.to_path_buf(),
            context: "removing it",
            source,
        }),
    }
}

/// Replaces each occurrence of the path `old` in `content` with `new`.
///
/// Only whole path prefixes are replaced, i.e. occurrences followed by `/`, whitespace or the end
/// of `content`.
/// This way `/home/live` is replaced in `file:///home/live/Music`, but not in
/// `file:///home/lively`.
///
/// # Examples
///
/// ```
/// use liveuser_provision::home::replace_path_prefix;
///
/// assert_eq!(
///     replace_path_prefix("file:///home/live/Music\nfile:///home/lively\n", "/home/live", "/home/alice"),
///     "file:///home/alice/Music\nfile:///home/lively\n",
/// );
/// ```
pub fn replace_path_prefix(content: &str, old: &str, new: &str) -> String {
    if old.is_empty() {
        return content.to_string();
    }

    let mut replaced = String::with_capacity(content.len());
    let mut rest = content;
    while let Some(index) = rest.find(old) {
        let (before, matched) = rest.split_at(index);
        let after = &matched[old.len()..];

        replaced.push_str(before);
        if after
            .chars()
            .next()
            .is_none_or(|char| char == '/' || char.is_whitespace())
        {
            replaced.push_str(new);
        } else {
            replaced.push_str(old);
        }
        rest = after;
    }
    replaced.push_str(rest);

    replaced
}

/// Rewrites references to `old_home` in the GTK bookmarks `file` to `new_home`.
///
/// A missing `file` is not an error.
/// Returns whether `file` has been changed.
///
/// # Errors
///
/// Returns an error if `file` exists, but can not be read or written.
pub fn rewrite_bookmarks(file: &Path, old_home: &Path, new_home: &Path) -> Result<bool, Error> {
    if !file.is_file() {
        debug!("There is no bookmarks file {file:?}");
        return Ok(false);
    }

    let content = read_to_string(file).map_err(|source| Error::IoPath {
        path: file.to_path_buf(),
        context: "reading bookmarks",
        source,
    })?;
    let rewritten = replace_path_prefix(
        &content,
        &old_home.to_string_lossy(),
        &new_home.to_string_lossy(),
    );
    if rewritten == content {
        debug!("The bookmarks file {file:?} does not reference {old_home:?}");
        return Ok(false);
    }

    write(file, rewritten).map_err(|source| Error::IoPath {
        path: file.to_path_buf(),
        context: "writing bookmarks",
        source,
    })?;
    info!("Rewrote references to {old_home:?} in {file:?}");

    Ok(true)
}

#[cfg(test)]
mod tests {
    use std::fs::{create_dir_all, read_dir};

    use rstest::rstest;
    use testdir::testdir;
    use testresult::TestResult;

    use super::*;

    fn config_for(home_base_dir: &Path) -> ProvisionConfig {
        ProvisionConfig {
            home_base_dir: home_base_dir.to_path_buf(),
            ..Default::default()
        }
    }

    #[rstest]
    #[case("file:///home/live", "file:///home/alice")]
    #[case("file:///home/live/Documents Documents", "file:///home/alice/Documents Documents")]
    #[case("file:///home/live\tTab", "file:///home/alice\tTab")]
    #[case("file:///home/lively/Music", "file:///home/lively/Music")]
    #[case(
        "file:///home/live/a\nfile:///home/live-old/b\n",
        "file:///home/alice/a\nfile:///home/live-old/b\n"
    )]
    #[case("", "")]
    fn replace_path_prefix_cases(#[case] content: &str, #[case] expected: &str) {
        assert_eq!(
            replace_path_prefix(content, "/home/live", "/home/alice"),
            expected
        );
    }

    #[test]
    fn replace_path_prefix_with_empty_old() {
        assert_eq!(replace_path_prefix("abc", "", "x"), "abc");
    }

    #[test]
    fn rewrite_bookmarks_missing_file() -> TestResult {
        let dir = testdir!();
        assert!(!rewrite_bookmarks(
            &dir.join("bookmarks"),
            Path::new("/home/live"),
            Path::new("/home/alice"),
        )?);
        Ok(())
    }

    #[test]
    fn rewrite_bookmarks_replaces_home() -> TestResult {
        let file = testdir!().join("bookmarks");
        write(&file, "file:///home/live/Downloads\nsftp://server/srv\n")?;

        assert!(rewrite_bookmarks(
            &file,
            Path::new("/home/live"),
            Path::new("/home/alice"),
        )?);
        assert_eq!(
            read_to_string(&file)?,
            "file:///home/alice/Downloads\nsftp://server/srv\n"
        );
        Ok(())
    }

    #[test]
    fn locate_prefers_regular_home() -> TestResult {
        let base = testdir!();
        let config = config_for(&base);
        create_dir_all(config.placeholder_home())?;
        create_dir_all(config.nested_placeholder_home())?;

        assert_eq!(
            PlaceholderHome::locate(&config),
            Some(PlaceholderHome::Regular(config.placeholder_home()))
        );
        Ok(())
    }

    #[test]
    fn locate_nothing() {
        let config = config_for(&testdir!());
        assert_eq!(PlaceholderHome::locate(&config), None);
    }

    #[test]
    fn move_home_renames() -> TestResult {
        let base = testdir!();
        let config = config_for(&base);
        create_dir_all(config.placeholder_home().join("Desktop"))?;
        let target = base.join("alice");

        let home = PlaceholderHome::locate(&config);
        assert_eq!(
            move_home(&config, home.as_ref(), &target)?,
            HomeMove::Renamed
        );
        assert!(target.join("Desktop").is_dir());
        assert!(!config.placeholder_home().exists());
        Ok(())
    }

    #[test]
    fn move_home_removes_leftover() -> TestResult {
        let base = testdir!();
        let config = config_for(&base);
        create_dir_all(config.placeholder_home())?;
        let target = base.join("alice");
        create_dir_all(target.join("keep"))?;

        let home = PlaceholderHome::locate(&config);
        assert_eq!(
            move_home(&config, home.as_ref(), &target)?,
            HomeMove::LeftoverRemoved
        );
        assert!(!config.placeholder_home().exists());
        assert!(target.join("keep").is_dir());
        Ok(())
    }

    #[test]
    fn move_home_recovers_nested_home() -> TestResult {
        let base = testdir!();
        let config = config_for(&base);
        create_dir_all(config.nested_placeholder_home().join(".config"))?;
        let target = base.join("alice");

        let home = PlaceholderHome::locate(&config);
        assert!(matches!(home, Some(PlaceholderHome::Nested(_))));
        assert_eq!(
            move_home(&config, home.as_ref(), &target)?,
            HomeMove::Renamed
        );
        assert!(target.join(".config").is_dir());
        assert!(!config.nested_home_wrapper().exists());
        assert_eq!(read_dir(&base)?.count(), 1);
        Ok(())
    }

    #[test]
    fn move_home_keeps_non_empty_wrapper() -> TestResult {
        let base = testdir!();
        let config = config_for(&base);
        create_dir_all(config.nested_placeholder_home())?;
        create_dir_all(config.nested_home_wrapper().join("other"))?;
        let target = base.join("alice");

        let home = PlaceholderHome::locate(&config);
        move_home(&config, home.as_ref(), &target)?;
        assert!(target.is_dir());
        assert!(config.nested_home_wrapper().join("other").is_dir());
        Ok(())
    }

    #[test]
    fn move_home_keeps_existing_target() -> TestResult {
        let base = testdir!();
        let config = config_for(&base);
        let target = base.join("alice");
        create_dir_all(&target)?;

        assert_eq!(move_home(&config, None, &target)?, HomeMove::TargetKept);
        Ok(())
    }

    #[test]
    fn move_home_refuses_wrapper_as_target() -> TestResult {
        let base = testdir!();
        let config = config_for(&base);
        create_dir_all(config.nested_placeholder_home())?;
        write(config.nested_placeholder_home().join("thesis.txt"), "draft")?;
        let target = config.nested_home_wrapper();

        let home = PlaceholderHome::locate(&config);
        assert!(matches!(
            move_home(&config, home.as_ref(), &target),
            Err(Error::HomeWrapsPlaceholder { .. })
        ));
        assert_eq!(
            read_to_string(config.nested_placeholder_home().join("thesis.txt"))?,
            "draft"
        );
        Ok(())
    }

    #[test]
    fn move_home_fails_without_any_home() {
        let base = testdir!();
        let config = config_for(&base);

        assert!(matches!(
            move_home(&config, None, &base.join("alice")),
            Err(Error::HomeMissing { .. })
        ));
    }
}
