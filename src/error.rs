//! Unified error type.

use std::fmt;

/// The error type returned by decoy's fallible startup operations.
///
/// Request-level failures (a missing artifact, an unreadable body) never
/// surface here: they become HTTP responses or log events. This type covers
/// the process itself: reading configuration, binding the listener.
#[derive(Debug)]
pub enum Error {
    /// A configuration variable holds a value that cannot be used.
    Config { key: &'static str, value: String },
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { key, value } => write!(f, "config: invalid {key} value `{value}`"),
            Self::Io(e) => write!(f, "io: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config { .. } => None,
            Self::Io(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
