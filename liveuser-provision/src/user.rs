//! Login names and passwords of provisioned accounts.

use std::{fmt::Display, str::FromStr};

use liveuser_common::system_user::PLACEHOLDER_USER;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::Error;

/// The maximum length of a login name.
const USERNAME_MAX_LENGTH: usize = 32;

/// The login name of a user on a Unix system.
///
/// A login name starts with a lowercase ASCII letter or `_` and may otherwise only contain
/// lowercase ASCII letters, digits, `_` and `-`.
/// It is at most 32 characters long.
///
/// This rules out all characters that carry meaning in the account database (e.g. `:`) or in
/// paths (e.g. `/`).
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(into = "String", try_from = "String")]
pub struct Username(String);

impl Username {
    /// Creates a new [`Username`].
    ///
    /// # Errors
    ///
    /// Returns an error if `name`
    /// - is empty or longer than 32 characters,
    /// - does not start with a lowercase ASCII letter or `_`,
    /// - or contains chars other than lowercase ASCII letters, digits, `_` or `-`.
    ///
    /// # Examples
    ///
    /// ```
    /// use liveuser_provision::Username;
    ///
    /// # fn main() -> testresult::TestResult {
    /// Username::new("alice".to_string())?;
    /// Username::new("_build-01".to_string())?;
    /// assert!(Username::new("al/ice".to_string()).is_err());
    /// assert!(Username::new("al:ice".to_string()).is_err());
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(name: String) -> Result<Self, Error> {
        let reason = if name.is_empty() {
            Some("the name is empty")
        } else if name.len() > USERNAME_MAX_LENGTH {
            Some("the name is longer than 32 characters")
        } else if !name
            .chars()
            .next()
            .is_some_and(|char| char.is_ascii_lowercase() || char == '_')
        {
            Some("the name must start with a lowercase letter or \"_\"")
        } else if !name.chars().all(|char| {
            char.is_ascii_lowercase() || char.is_ascii_digit() || char == '_' || char == '-'
        }) {
            Some("only lowercase letters, digits, \"_\" and \"-\" are allowed")
        } else {
            None
        };

        if let Some(reason) = reason {
            return Err(Error::InvalidUsername { name, reason });
        }
        Ok(Self(name))
    }

    /// Returns the [`Username`] of the placeholder account shipped with live images.
    pub fn placeholder() -> Self {
        Self(PLACEHOLDER_USER.to_string())
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Username {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

impl FromStr for Username {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl TryFrom<String> for Username {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// A secret login password.
///
/// The password is held by a [`SecretString`], which guarantees zeroing of memory on destruct and
/// keeps it out of [`Debug`] output.
#[derive(Clone, Debug)]
pub struct Password(SecretString);

impl Password {
    /// Creates a new [`Password`].
    ///
    /// # Errors
    ///
    /// Returns an error if `password` is empty or contains line breaks.
    /// The batch password-change utility reads one `name:password` record per line, so a line
    /// break would inject additional records.
    ///
    /// # Examples
    ///
    /// ```
    /// use liveuser_provision::Password;
    ///
    /// # fn main() -> testresult::TestResult {
    /// let password = Password::new("s3cr3t".to_string())?;
    /// assert_eq!(password.expose_borrowed(), "s3cr3t");
    /// assert!(Password::new("s3cr3t\nroot:x".to_string()).is_err());
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(password: String) -> Result<Self, Error> {
        if password.is_empty() {
            return Err(Error::InvalidPassword {
                reason: "the password is empty",
            });
        }
        if password.contains(['\n', '\r']) {
            return Err(Error::InvalidPassword {
                reason: "the password contains a line break",
            });
        }
        Ok(Self(SecretString::new(password.into())))
    }

    /// Exposes the secret password as borrowed [`str`].
    pub fn expose_borrowed(&self) -> &str {
        self.0.expose_secret()
    }
}

impl FromStr for Password {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}
