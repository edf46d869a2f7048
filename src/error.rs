//! Error handling for vkaudio.
//!
//! Provides a unified error handling system based on gRPC status codes,
//! with mapping from various underlying errors to appropriate categories.
//!
//! # Error Categories
//!
//! Errors are categorized into standard types that map to HTTP status codes:
//! * Authorization failures (403), including owners or albums that cannot be
//!   browsed
//! * Resource state (404, 409)
//! * Client errors (400, 429)
//! * Server errors (500, 503)
//! * Timeouts and cancellation (499, 504)
//!
//! Scraping failures keep their original error inside, so callers that need
//! to tell them apart can [`Error::downcast`] to
//! [`ScrapeError`](crate::scrape::ScrapeError) or
//! [`DecodeError`](crate::url_decoder::DecodeError).
//!
//! # Example
//!
//! ```rust
//! use vkaudio::error::{Error, ErrorKind, Result};
//!
//! fn do_something() -> Result<()> {
//!     if condition {
//!         return Err(Error::not_found("album doesn't exist"));
//!     }
//!
//!     let file = std::fs::File::open("secrets.toml")?;
//!
//!     Ok(())
//! }
//! ```

#![allow(clippy::enum_glob_use)]

use std::fmt;
use thiserror::Error;

use crate::{scrape::ScrapeError, url_decoder::DecodeError};

/// Main error type combining error kind and details.
///
/// Provides:
/// * Categorized error types ([`ErrorKind`])
/// * Underlying error details
/// * Conversion from common error types
#[derive(Debug)]
pub struct Error {
    /// Classification of the error
    pub kind: ErrorKind,

    /// Details of the underlying error
    pub error: Box<dyn std::error::Error + Send + Sync>,
}

impl Error {
    /// Attempts to downcast the underlying error to a concrete type.
    ///
    /// # Example
    /// ```
    /// use vkaudio::scrape::ScrapeError;
    ///
    /// if let Some(ScrapeError::MissingRoot(selector)) = error.downcast::<ScrapeError>() {
    ///     println!("page has no {selector}");
    /// }
    /// ```
    #[must_use]
    pub fn downcast<E>(&self) -> Option<&E>
    where
        E: std::error::Error + 'static,
    {
        self.error.downcast_ref::<E>()
    }
}

/// Standard result type for vkaudio operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories based on gRPC status codes.
///
/// See [gRPC status codes](https://github.com/googleapis/googleapis/blob/master/google/rpc/code.proto)
/// for the original definitions.
#[expect(clippy::module_name_repetitions)]
#[derive(Clone, Copy, Debug, Eq, Error, Hash, Ord, PartialEq, PartialOrd)]
#[repr(u32)]
pub enum ErrorKind {
    /// HTTP Mapping: 499 Client Closed Request
    #[error("operation was cancelled")]
    Cancelled = 1,

    /// HTTP Mapping: 500 Internal Server Error
    #[error("unknown error")]
    Unknown = 2,

    /// HTTP Mapping: 400 Bad Request
    #[error("invalid argument specified")]
    InvalidArgument = 3,

    /// HTTP Mapping: 504 Gateway Timeout
    #[error("operation timed out")]
    DeadlineExceeded = 4,

    /// HTTP Mapping: 404 Not Found
    #[error("not found")]
    NotFound = 5,

    /// HTTP Mapping: 409 Conflict
    #[error("attempt to create what already exists")]
    AlreadyExists = 6,

    /// HTTP Mapping: 403 Forbidden
    #[error("permission denied")]
    PermissionDenied = 7,

    /// HTTP Mapping: 429 Too Many Requests
    #[error("resource has been exhausted")]
    ResourceExhausted = 8,

    /// HTTP Mapping: 400 Bad Request
    #[error("invalid state")]
    FailedPrecondition = 9,

    /// HTTP Mapping: 409 Conflict
    #[error("operation aborted")]
    Aborted = 10,

    /// HTTP Mapping: 500 Internal Server Error
    #[error("internal error")]
    Internal = 13,

    /// HTTP Mapping: 503 Service Unavailable
    #[error("service unavailable")]
    Unavailable = 14,

    /// HTTP Mapping: 500 Internal Server Error
    #[error("unrecoverable data loss or corruption")]
    DataLoss = 15,
}

impl Error {
    /// Creates a new error with specified kind and details.
    ///
    /// # Examples
    ///
    /// ```rust
    /// let err = Error::new(ErrorKind::NotFound, "album not found");
    /// assert_eq!(err.kind, ErrorKind::NotFound);
    /// ```
    pub fn new<E>(kind: ErrorKind, error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self {
            kind,
            error: error.into(),
        }
    }

    /// Creates an error for data corruption or loss.
    ///
    /// Maps to HTTP 500 Internal Server Error. Use when a response was
    /// received but its contents are truncated or structurally unusable.
    ///
    /// # Examples
    ///
    /// ```rust
    /// let err = Error::data_loss("audio tuple truncated");
    /// assert_eq!(err.kind, ErrorKind::DataLoss);
    /// ```
    pub fn data_loss<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::DataLoss, error)
    }

    /// Creates an error for internal errors.
    ///
    /// Maps to HTTP 500 Internal Server Error. Use for unexpected internal
    /// errors that shouldn't occur during normal operation, like a constant
    /// selector that does not parse.
    pub fn internal<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::Internal, error)
    }

    /// Creates an error for invalid arguments.
    ///
    /// Maps to HTTP 400 Bad Request.
    ///
    /// # Examples
    ///
    /// ```rust
    /// let err = Error::invalid_argument("user id must be numeric");
    /// assert_eq!(err.kind, ErrorKind::InvalidArgument);
    /// ```
    pub fn invalid_argument<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::InvalidArgument, error)
    }

    /// Creates an error for missing resources.
    ///
    /// Maps to HTTP 404 Not Found.
    pub fn not_found<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::NotFound, error)
    }

    /// Creates an error for permission denied conditions.
    ///
    /// Maps to HTTP 403 Forbidden. Use when the owner or album cannot be
    /// browsed with the current session.
    ///
    /// # Examples
    ///
    /// ```rust
    /// let err = Error::permission_denied("you don't have permissions to browse 1's audio");
    /// assert_eq!(err.kind, ErrorKind::PermissionDenied);
    /// ```
    pub fn permission_denied<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::PermissionDenied, error)
    }
}

/// Returns the underlying error source.
impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.error.source()
    }
}

/// Formats the error for display, showing both kind and details.
///
/// Format: "{kind}: {details}"
impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "{}: ", self.kind)?;
        self.error.fmt(fmt)
    }
}

/// Converts scraping failures into their fixed error kinds.
///
/// * `AccessDenied` and `MissingRoot` -> `PermissionDenied`
/// * `PatternNotFound` -> `InvalidArgument`
/// * `ShortRecord` -> `DataLoss`
impl From<ScrapeError> for Error {
    fn from(err: ScrapeError) -> Self {
        use ScrapeError::*;
        match err {
            AccessDenied(_) | MissingRoot(_) => Self::permission_denied(err),
            PatternNotFound(_) => Self::invalid_argument(err),
            ShortRecord { .. } => Self::data_loss(err),
        }
    }
}

/// Converts URL de-obfuscation failures to `InvalidArgument`.
impl From<DecodeError> for Error {
    fn from(err: DecodeError) -> Self {
        Self::invalid_argument(err)
    }
}

/// Converts IO errors, which mostly come from reading the secrets file.
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind::*;
        let kind = match err.kind() {
            NotFound => ErrorKind::NotFound,
            PermissionDenied => ErrorKind::PermissionDenied,
            AddrNotAvailable | ConnectionRefused | NotConnected => ErrorKind::Unavailable,
            BrokenPipe | ConnectionReset | ConnectionAborted => ErrorKind::Aborted,
            Interrupted => ErrorKind::Cancelled,
            UnexpectedEof => ErrorKind::DataLoss,
            TimedOut => ErrorKind::DeadlineExceeded,
            InvalidInput | InvalidData => ErrorKind::InvalidArgument,
            _ => ErrorKind::Unknown,
        };
        Self::new(kind, err)
    }
}

/// Converts HTTP client errors into appropriate error kinds.
///
/// Responses are read in full, so a failing body means the page arrived
/// truncated.
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_body() || err.is_decode() {
            ErrorKind::DataLoss
        } else if err.is_builder() {
            ErrorKind::Internal
        } else if err.is_connect() {
            ErrorKind::Unavailable
        } else if err.is_redirect() {
            ErrorKind::ResourceExhausted
        } else if err.is_timeout() {
            ErrorKind::DeadlineExceeded
        } else {
            ErrorKind::Unknown
        };
        Self::new(kind, err)
    }
}

/// Converts JSON errors through IO error mapping.
///
/// JSON errors are first converted to IO errors, then mapped
/// using the IO error conversion rules.
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        std::io::Error::from(err).into()
    }
}

/// Converts TOML errors to `InvalidArgument`.
impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Self::invalid_argument(e)
    }
}

/// Converts URL parsing errors to `Internal`.
impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Self::internal(e.to_string())
    }
}

/// Converts cookie store errors into appropriate error kinds.
///
/// A cookie for the wrong domain is a programming error; anything else is
/// a session value that cannot be sent as a cookie.
impl From<cookie_store::CookieError> for Error {
    fn from(e: cookie_store::CookieError) -> Self {
        use cookie_store::CookieError::*;
        match e {
            DomainMismatch | PublicSuffix => Self::internal(e),
            _ => Self::invalid_argument(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scrape_errors_keep_their_kind() {
        let denied: Error = ScrapeError::AccessDenied(42).into();
        assert_eq!(denied.kind, ErrorKind::PermissionDenied);

        let root: Error = ScrapeError::MissingRoot(".audios_list".to_owned()).into();
        assert_eq!(root.kind, ErrorKind::PermissionDenied);
        assert!(matches!(
            root.downcast::<ScrapeError>(),
            Some(ScrapeError::MissingRoot(_))
        ));

        let pattern: Error = ScrapeError::PatternNotFound("new AudioPage(").into();
        assert_eq!(pattern.kind, ErrorKind::InvalidArgument);
    }

    #[test]
    fn display_prefixes_kind() {
        let err = Error::not_found("album 7 not found");
        assert_eq!(err.to_string(), "not found: album 7 not found");
    }
}
