//! Error types shared across the crate.
//!
//! Internally everything propagates as `anyhow::Error`. At the command boundary an error is
//! tagged with an `ErrorType` so the front end can tell the user which part of the system failed
//! instead of leaving the details in the log.

use std::fmt::{Display, Formatter};

pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// The broad category of a user-facing failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// The home directory or `config.json` is missing or invalid.
    Config,
    /// The storage medium could not be opened, read or written.
    Storage,
    /// A snapshot could not be decoded, parsed or applied.
    Import,
    /// The user supplied a value that cannot be used, such as an unknown id.
    Input,
    /// A file outside the storage medium could not be read or written.
    Io,
}

serde_plain::derive_display_from_serialize!(ErrorType);

/// An error that has been categorized for presentation to the user.
#[derive(Debug)]
pub struct PublicError {
    error_type: ErrorType,
    source: Error,
}

impl PublicError {
    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }
}

impl Display for PublicError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} error: {:#}", self.error_type, self.source)
    }
}

impl std::error::Error for PublicError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

/// Attaches an `ErrorType` to the error side of a result.
pub trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T, E> IntoResult<T> for std::result::Result<T, E>
where
    E: Into<Error>,
{
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| {
            let source = e.into();
            // Keep the innermost category when errors are tagged more than once.
            if source.downcast_ref::<PublicError>().is_some() {
                return source;
            }
            Error::new(PublicError { error_type, source })
        })
    }
}

/// Returns the `ErrorType` attached to `e`, if any.
pub fn error_type(e: &Error) -> Option<ErrorType> {
    e.downcast_ref::<PublicError>().map(PublicError::error_type)
}
