//! Connection session: the reconnecting event loop.
//!
//! The session runs on one thread and owns the server connection, the
//! reactor and all loop-side state. Commands reach it only through the
//! request channel, which is drained between bounded server polls.
//!
//! ```text
//! Disconnected -> Connecting -> Ready
//!       any    -> Failed -> (backoff) -> Connecting
//!     Ready    -> Disconnected            (shutdown)
//! ```

use std::sync::mpsc as std_mpsc;
use std::time::{Duration, Instant};

use pulsectrl_core::{Notification, SessionState, VolumeAction};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::dispatch;
use crate::reactor::{Reaction, Reactor};
use crate::server::{AudioServer, Connector};

/// Session tuning.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Application name announced to the server
    pub client_name: String,
    /// Server address; the library default when `None`
    pub server: Option<String>,
    /// Fixed delay between a failure and the next connection attempt
    pub reconnect_delay: Duration,
    /// Longest the loop blocks in the server before draining requests
    pub poll_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            client_name: "pulsectrl".to_string(),
            server: None,
            reconnect_delay: Duration::from_secs(2),
            poll_interval: Duration::from_millis(50),
        }
    }
}

/// Requests handed to the session thread.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeRequest {
    /// Apply a command to the current default device
    Dispatch(VolumeAction),
    /// Stop for good; no reconnect follows
    Shutdown,
}

/// Events emitted by the session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The session moved to a new state
    StateChanged(SessionState),
    /// A line for the output stream
    Notification(Notification),
}

/// Why a connection's loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// Intentional quit: stop retrying
    Shutdown,
    /// Lost or failed connection: retry after the backoff delay
    ConnectionLost,
}

/// The reconnecting session loop.
pub struct Session<C: Connector> {
    connector: C,
    config: SessionConfig,
    state: SessionState,
    reactor: Reactor,
    requests: std_mpsc::Receiver<RuntimeRequest>,
    events: mpsc::Sender<SessionEvent>,
}

impl<C: Connector> Session<C> {
    #[must_use]
    pub fn new(
        connector: C,
        config: SessionConfig,
        requests: std_mpsc::Receiver<RuntimeRequest>,
        events: mpsc::Sender<SessionEvent>,
    ) -> Self {
        Self {
            connector,
            config,
            state: SessionState::Disconnected,
            reactor: Reactor::new(),
            requests,
            events,
        }
    }

    /// Connect, serve and reconnect until a shutdown is requested.
    ///
    /// There is no retry limit; connection failures are only logged.
    pub fn run(mut self) {
        info!("Session starting");

        loop {
            self.set_state(SessionState::Connecting);

            let exit = match self.connector.connect() {
                Ok(server) => self.serve(server),
                Err(e) => {
                    warn!(error = %e, "Failed to connect to audio server");
                    LoopExit::ConnectionLost
                }
            };

            if exit == LoopExit::Shutdown {
                break;
            }

            self.set_state(SessionState::Failed);
            if !self.wait_for_retry() {
                break;
            }
        }

        self.set_state(SessionState::Disconnected);
        info!("Session stopped");
    }

    /// Run one connection until it is lost or a shutdown arrives. The
    /// connection is closed when `server` drops.
    fn serve(&mut self, mut server: C::Server) -> LoopExit {
        loop {
            if let Some(exit) = self.drain_requests(&mut server) {
                return exit;
            }

            let events = match server.poll_events(self.config.poll_interval) {
                Ok(events) => events,
                Err(e) => {
                    warn!(error = %e, "Audio server loop failed");
                    return LoopExit::ConnectionLost;
                }
            };

            let mut lost = None;
            for event in events {
                // No queries on a dead context; completions already
                // delivered in this batch still report.
                if lost.is_some() {
                    self.reactor.record_completion(event);
                    continue;
                }
                match self.reactor.handle(event, &mut server) {
                    Reaction::Continue => {}
                    Reaction::Ready => self.set_state(SessionState::Ready),
                    Reaction::Lost(state) => lost = Some(state),
                }
            }

            self.flush_notifications();
            if let Some(state) = lost {
                warn!(?state, "Audio server connection lost");
                return LoopExit::ConnectionLost;
            }
        }
    }

    fn drain_requests(&mut self, server: &mut C::Server) -> Option<LoopExit> {
        loop {
            match self.requests.try_recv() {
                Ok(RuntimeRequest::Dispatch(action)) => self.dispatch(action, server),
                Ok(RuntimeRequest::Shutdown) => {
                    info!("Shutdown requested");
                    return Some(LoopExit::Shutdown);
                }
                Err(std_mpsc::TryRecvError::Empty) => return None,
                Err(std_mpsc::TryRecvError::Disconnected) => {
                    info!("Request channel closed");
                    return Some(LoopExit::Shutdown);
                }
            }
        }
    }

    fn dispatch(&self, action: VolumeAction, server: &mut C::Server) {
        if !self.state.accepts_commands() {
            debug!(state = %self.state, ?action, "Session not ready, dropping command");
            return;
        }
        dispatch::dispatch(action, self.reactor.registry(), server);
    }

    /// Sleep out the backoff delay. Returns `false` if a shutdown arrived
    /// meanwhile. Commands received while waiting are dropped.
    fn wait_for_retry(&self) -> bool {
        info!(delay = ?self.config.reconnect_delay, "Retrying connection after delay");
        let deadline = Instant::now() + self.config.reconnect_delay;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.requests.recv_timeout(remaining) {
                Ok(RuntimeRequest::Dispatch(action)) => {
                    debug!(?action, "Session not connected, dropping command");
                }
                Ok(RuntimeRequest::Shutdown) | Err(std_mpsc::RecvTimeoutError::Disconnected) => {
                    info!("Shutdown requested during backoff");
                    return false;
                }
                Err(std_mpsc::RecvTimeoutError::Timeout) => return true,
            }
        }
    }

    fn set_state(&mut self, state: SessionState) {
        if self.state == state {
            return;
        }
        debug!(from = %self.state, to = %state, "Session state changed");
        self.state = state;
        let _ = self.events.blocking_send(SessionEvent::StateChanged(state));
    }

    fn flush_notifications(&mut self) {
        for notification in self.reactor.take_notifications() {
            let _ = self.events.blocking_send(SessionEvent::Notification(notification));
        }
    }
}
