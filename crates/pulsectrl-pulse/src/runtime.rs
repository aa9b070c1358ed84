//! Session runtime handle for the async world.
//!
//! The libpulse mainloop and context are not thread-safe, so the session runs
//! on a dedicated thread. Other threads talk to it only through a
//! [`CommandSender`], and receive its output on a tokio channel.

use std::sync::mpsc as std_mpsc;
use std::thread::JoinHandle;

use pulsectrl_core::VolumeAction;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::error::{PulseError, PulseResult};
use crate::pulse::PulseConnector;
use crate::server::Connector;
use crate::session::{RuntimeRequest, Session, SessionConfig, SessionEvent};

/// Cloneable handle for sending requests to the session thread.
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: std_mpsc::Sender<RuntimeRequest>,
}

impl CommandSender {
    /// Queue a command for the session. Fails only if the session is gone.
    pub fn dispatch(&self, action: VolumeAction) -> PulseResult<()> {
        self.tx.send(RuntimeRequest::Dispatch(action)).map_err(|_| PulseError::ChannelClosed)
    }

    /// Ask the session to stop for good.
    pub fn shutdown(&self) {
        let _ = self.tx.send(RuntimeRequest::Shutdown);
    }
}

impl From<std_mpsc::Sender<RuntimeRequest>> for CommandSender {
    fn from(tx: std_mpsc::Sender<RuntimeRequest>) -> Self {
        Self { tx }
    }
}

/// Handle to the running session thread.
pub struct PulseRuntime {
    commands: CommandSender,
    thread: Option<JoinHandle<()>>,
}

impl PulseRuntime {
    /// Spawn a session against the real audio server.
    #[must_use]
    pub fn spawn(config: SessionConfig) -> (Self, mpsc::Receiver<SessionEvent>) {
        let connector = PulseConnector::new(&config);
        Self::spawn_with(connector, config)
    }

    /// Spawn a session using `connector` to open connections.
    ///
    /// # Panics
    ///
    /// Panics if the session thread cannot be spawned.
    #[must_use]
    pub fn spawn_with<C>(connector: C, config: SessionConfig) -> (Self, mpsc::Receiver<SessionEvent>)
    where
        C: Connector + Send + 'static,
    {
        let (event_tx, event_rx) = mpsc::channel(256);
        let (request_tx, request_rx) = std_mpsc::channel();

        let thread = std::thread::Builder::new()
            .name("pulse-session".to_string())
            .spawn(move || {
                Session::new(connector, config, request_rx, event_tx).run();
            })
            .expect("Failed to spawn pulse session thread");

        (Self { commands: request_tx.into(), thread: Some(thread) }, event_rx)
    }

    /// A sender for feeding commands from another thread.
    #[must_use]
    pub fn commands(&self) -> CommandSender {
        self.commands.clone()
    }

    /// Request shutdown of the session thread.
    pub fn shutdown(&self) {
        self.commands.shutdown();
    }

    /// Wait for the session thread to exit.
    pub fn join(mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("Pulse session thread panicked");
            } else {
                info!("Pulse session thread exited");
            }
        }
    }
}
