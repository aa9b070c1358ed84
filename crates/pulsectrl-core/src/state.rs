//! Connection session state.

use std::fmt;

/// Lifecycle state of the audio server session.
///
/// Exactly one of these is live per process; mutations are only issued while
/// the session is [`SessionState::Ready`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No connection, either before the first attempt or after shutdown
    #[default]
    Disconnected,
    /// Connection opened, handshake in progress
    Connecting,
    /// Handshake complete, subscribed to change events
    Ready,
    /// Connection failed or was lost; a retry follows the backoff delay
    Failed,
}

impl SessionState {
    /// Whether commands may be dispatched in this state.
    #[must_use]
    pub fn accepts_commands(self) -> bool {
        matches!(self, Self::Ready)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Ready => "ready",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}
