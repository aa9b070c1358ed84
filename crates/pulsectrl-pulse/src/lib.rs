//! pulsectrl audio server integration.
//!
//! This crate owns everything that touches the audio server:
//! - The connection session and its reconnect loop
//! - The event reactor that turns server notifications into output lines
//! - Command dispatch against the current default device
//! - The runtime handle that runs the session on its own thread

pub mod dispatch;
pub mod error;
pub mod pulse;
pub mod reactor;
pub mod runtime;
pub mod server;
pub mod session;

#[cfg(test)]
mod testing;

pub use error::{PulseError, PulseResult};
pub use pulse::PulseConnector;
pub use reactor::{Reaction, Reactor};
pub use runtime::{CommandSender, PulseRuntime};
pub use server::{
    AudioServer, ChangeFacility, ConnectionEvent, Connector, DeviceRef, InfoPurpose, ServerEvent,
};
pub use session::{LoopExit, RuntimeRequest, Session, SessionConfig, SessionEvent};
