//! Error types for the sayword application.
//!
//! This module defines the custom error types used throughout the application.
//! It uses the `thiserror` crate to derive error implementations and provides
//! convenient conversions from common error types.

use thiserror::Error;

/// Custom error type for the sayword application.
///
/// Session level failures (`Recognition`) are absorbed by the listen loop and
/// never reach the caller. `Unsupported` is the only one that stops the loop.
#[derive(Error, Debug)]
pub enum Error {
    /// The speech recognition capability is absent on this host
    #[error("Speech recognition not supported")]
    Unsupported,

    /// Error reported by the recognition engine, carrying its error code
    #[error("Recognition error: {0}")]
    Recognition(String),

    /// Error related to speech synthesis
    #[error("Speech synthesis error: {0}")]
    Synthesis(String),

    /// Invalid vocabulary supplied for the exercise
    #[error("Vocabulary error: {0}")]
    Vocabulary(String),

    /// Error related to file system operations
    #[error("File system error: {0}")]
    FileSystem(String),

    /// Error related to application configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catch-all for unexpected errors
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl Error {
    /// Short machine readable code surfaced in the status line.
    pub fn code(&self) -> &str {
        match self {
            Error::Unsupported => "not-supported",
            Error::Recognition(code) => code.as_str(),
            Error::Synthesis(_) => "synthesis",
            Error::Vocabulary(_) => "vocabulary",
            Error::FileSystem(_) => "file-system",
            Error::Config(_) => "config",
            Error::Unknown(_) => "unknown",
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Unknown(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::FileSystem(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognition_code_is_passed_through() {
        let err = Error::Recognition("no-speech".to_string());
        assert_eq!(err.code(), "no-speech");
        assert_eq!(err.to_string(), "Recognition error: no-speech");
    }

    #[test]
    fn test_io_conversion() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, Error::FileSystem(msg) if msg == "gone"));
    }
}
