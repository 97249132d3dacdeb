//! Error types for hostprobe.

use std::error::Error as StdError;
use std::fmt;
use std::result;

/// A specialized Result type for hostprobe operations.
pub type Result<T> = result::Result<T, Error>;

/// The error type for metric collection operations.
#[derive(Debug)]
pub enum Error {
    /// An underlying metric source could not be queried. The cause is kept
    /// unchanged and exposed through `source()`.
    Unavailable(Box<dyn StdError + Send + Sync>),
    /// I/O errors from procfs reads
    Io(std::io::Error),
    /// Configuration errors
    Config(String),
    /// Invalid caller input
    Validation(String),
}

impl Error {
    /// Wraps a metric source failure, preserving the underlying cause.
    pub fn unavailable<E>(err: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        Error::Unavailable(err.into())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Unavailable(err) => write!(f, "Metric source unavailable: {}", err),
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::Validation(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Unavailable(err) => {
                let cause: &(dyn StdError + 'static) = err.as_ref();
                Some(cause)
            }
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Unavailable(Box::new(err))
    }
}
