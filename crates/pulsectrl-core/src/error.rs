//! Error types for pulsectrl core.

use thiserror::Error;

/// Core error type, produced when a command line is rejected.
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    #[error("Empty command line")]
    EmptyLine,

    #[error("Unknown device kind: {0}")]
    UnknownKind(String),

    #[error("Unknown verb: {0}")]
    UnknownVerb(String),

    #[error("Missing argument for verb: {0}")]
    MissingArgument(String),

    #[error("Invalid volume value: {0}")]
    InvalidVolume(String),

    #[error("Unexpected trailing token: {0}")]
    UnexpectedToken(String),
}

/// Result type alias for pulsectrl core operations.
pub type Result<T> = std::result::Result<T, Error>;
