//! Session credentials loaded from a TOML file.
//!
//! ```toml
//! remixsid = "..."
//! user_id = 123456789
//! ```
//!
//! The file grants access to the account: keep it private.

use std::{fs, io};

use serde::Deserialize;
use veil::Redact;

use crate::{
    error::{Error, Result},
    protocol::UserId,
};

/// Largest secrets file that will be read.
const MAX_FILE_SIZE: u64 = 1024;

#[derive(Clone, PartialEq, Eq, Hash, Deserialize, Redact)]
pub struct Secrets {
    /// Value of the `remixsid` session cookie.
    #[redact]
    pub remixsid: String,

    /// ID of the account the session belongs to, used to decode audio URLs.
    pub user_id: UserId,
}

impl Secrets {
    /// Reads and validates the secrets in `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is too large, is not
    /// valid TOML, or has an empty session cookie.
    pub fn from_file(path: &str) -> Result<Self> {
        // Prevent out-of-memory condition: the secrets file should be small.
        let file_size = fs::metadata(path)?.len();
        if file_size > MAX_FILE_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{path} is too large"),
            )
            .into());
        }

        let contents = fs::read_to_string(path)?;
        contents.parse()
    }
}

impl std::str::FromStr for Secrets {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let secrets: Self = toml::from_str(s)?;
        if secrets.remixsid.is_empty() {
            return Err(Error::invalid_argument("remixsid should not be empty"));
        }

        Ok(secrets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_secrets() {
        let secrets: Secrets = "remixsid = \"abc\"\nuser_id = 42\n".parse().unwrap();
        assert_eq!(secrets.remixsid, "abc");
        assert_eq!(secrets.user_id, 42);
        assert!(!format!("{secrets:?}").contains("abc"));
    }

    #[test]
    fn rejects_empty_cookie() {
        let result: Result<Secrets> = "remixsid = \"\"\nuser_id = 42\n".parse();
        assert!(result.is_err());

        let result: Result<Secrets> = "user_id = 42\n".parse();
        assert!(result.is_err());
    }
}
