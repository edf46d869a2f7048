//! Protocol types and structures for the VK audio section.
//!
//! There is no documented protocol: what the site returns is a mix of JSON
//! envelopes, positional arrays and HTML pages with JSON embedded in them.
//! This module contains the typed view on the shapes that are consumed:
//!
//! # Submodules
//!
//! * [`audio_tuple`] - The positional audio tuple and its field table
//! * [`catalog`] - Listing, catalog and batch resolve envelopes
//!
//! # Shared Functionality
//!
//! * JSON parsing with consistent error handling and logging
//! * Stripping of the `<!--` escaping that `al_audio.php` prepends
//! * Endpoint URLs

pub mod audio_tuple;
pub mod catalog;

pub use audio_tuple::{AudioRecord, Field};

use std::{borrow::Cow, fmt::Debug};

use serde::Deserialize;

use crate::error::Result;

/// Identifier of a page owner: positive for users, negative for groups.
pub type OwnerId = i64;

/// Identifier of the logged-in account.
pub type UserId = i64;

/// Mobile site audio endpoint (listings and batch resolve).
pub const MOBILE_AUDIO_URL: &str = "https://m.vk.com/audio";

/// Mobile site root, fetched once to warm up the session.
pub const MOBILE_HOME_URL: &str = "https://m.vk.com/";

/// Mobile site root for audio and wall pages.
pub const MOBILE_BASE_URL: &str = "https://m.vk.com";

/// Desktop audio section (popular and new releases pages).
pub const DESKTOP_AUDIO_URL: &str = "https://vk.com/audio";

/// Desktop site root for audio pages.
pub const DESKTOP_BASE_URL: &str = "https://vk.com";

/// Desktop AJAX endpoint for catalog sections.
pub const AL_AUDIO_URL: &str = "https://vk.com/al_audio.php";

/// Marker that `al_audio.php` prepends to its JSON bodies.
const COMMENT_ESCAPE: &str = "<!--";

/// Removes the `<!--` comment-escaping from an `al_audio.php` body.
#[must_use]
pub fn strip_comment(body: &str) -> Cow<'_, str> {
    if body.contains(COMMENT_ESCAPE) {
        Cow::Owned(body.replace(COMMENT_ESCAPE, ""))
    } else {
        Cow::Borrowed(body)
    }
}

/// Parses and logs JSON responses.
///
/// # Arguments
///
/// * `body` - Response body text to parse
/// * `origin` - Description of the endpoint for logging
///
/// # Errors
///
/// Returns error if:
/// * Response body is not valid JSON
/// * JSON structure doesn't match type `T`
///
/// # Logging
///
/// * Success: Logs parsed structure at TRACE level
/// * Parse Error: Logs raw JSON at TRACE level if valid JSON
/// * Invalid JSON: Logs error and raw text at ERROR level
pub fn json<T>(body: &str, origin: &str) -> Result<T>
where
    T: for<'de> Deserialize<'de> + Debug,
{
    match serde_json::from_str(body) {
        Ok(result) => {
            trace!("{origin}: {result:#?}");
            Ok(result)
        }
        Err(e) => {
            if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
                trace!("{origin}: {json:#?}");
            } else {
                error!("{origin}: failed parsing response ({e:?})");
                trace!("{body}");
            }
            Err(e.into())
        }
    }
}

/// Renders a JSON scalar the way the site's own scripts stringify it.
///
/// Strings are taken as is, numbers in their decimal form. `null` and
/// `false` render as empty, so that they fail truthiness checks.
#[must_use]
pub fn text(value: &serde_json::Value) -> Cow<'_, str> {
    use serde_json::Value;
    match value {
        Value::String(s) => Cow::Borrowed(s),
        Value::Number(n) => Cow::Owned(n.to_string()),
        Value::Bool(true) => Cow::Borrowed("true"),
        Value::Null | Value::Bool(false) => Cow::Borrowed(""),
        other => Cow::Owned(other.to_string()),
    }
}

/// Whether a JSON value counts as present: not `null`, `false`, `0`, `""`,
/// `[]` or `{}`.
#[must_use]
pub fn is_truthy(value: &serde_json::Value) -> bool {
    use serde_json::Value;
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn strips_comment_escape() {
        assert_eq!(strip_comment(r#"<!--{"payload":[]}"#), r#"{"payload":[]}"#);
        assert!(matches!(strip_comment("{}"), Cow::Borrowed("{}")));
    }

    #[test]
    fn renders_scalars() {
        assert_eq!(text(&json!(-15)), "-15");
        assert_eq!(text(&json!("abc")), "abc");
        assert_eq!(text(&json!(null)), "");
        assert_eq!(text(&json!(false)), "");
    }

    #[test]
    fn truthiness() {
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!([])));
        assert!(is_truthy(&json!({"list": []})));
        assert!(is_truthy(&json!("x")));
    }
}
