//! Error type for the derivation pipeline: a plain enum of kinds plus
//! a struct carrying a human-readable message, rather than a
//! derive-macro error type.

use std::fmt;

/// The kind of failure that aborted a derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivationErrorKind {
    /// The request had no user name.
    MissingUser,
    /// The request had no site name.
    MissingSite,
    /// The site counter was zero.
    InvalidCounter,
    /// The requested password type has no templates in the catalog.
    UnknownType,
    /// A template referenced a character class the catalog doesn't define.
    InvalidTemplate,
    /// scrypt or HMAC failed (typically an allocation or parameter error).
    DerivationFailed,
    /// A catalog document could not be parsed or failed validation.
    CatalogLoadFailed,
}

/// An error produced by the derivation pipeline.
#[derive(Debug, Clone)]
pub struct DerivationError {
    pub kind: DerivationErrorKind,
    pub message: String,
}

impl DerivationError {
    pub fn new(kind: DerivationErrorKind, message: impl Into<String>) -> Self {
        DerivationError {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for DerivationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for DerivationError {}

impl From<std::io::Error> for DerivationError {
    fn from(e: std::io::Error) -> DerivationError {
        DerivationError::new(DerivationErrorKind::DerivationFailed, e.to_string())
    }
}
