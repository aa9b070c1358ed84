//! Audio server error types.

use thiserror::Error;

/// Audio server error type.
#[derive(Debug, Error)]
pub enum PulseError {
    #[error("MainLoop error: {0}")]
    MainLoopError(String),

    #[error("Context creation failed: {0}")]
    ContextFailed(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Runtime channel closed")]
    ChannelClosed,
}

/// Result type for audio server operations.
pub type PulseResult<T> = Result<T, PulseError>;
