//! The audio server as seen by the session: the calls it accepts and the
//! events it delivers back.
//!
//! Every call is asynchronous. Its result arrives later as a [`ServerEvent`]
//! from [`AudioServer::poll_events`], always on the thread that owns the
//! server handle.

use std::time::Duration;

use pulsectrl_core::{DeviceKind, DeviceSnapshot, VolumeAction, VolumeMask};

use crate::error::PulseResult;

/// How a device is addressed in an info query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceRef {
    Index(u32),
    Name(String),
}

/// Why an info query was issued; carried through to its completion.
#[derive(Debug, Clone, PartialEq)]
pub enum InfoPurpose {
    /// Report the device's state on the output stream
    Report,
    /// Resolve the server's default device
    Default,
    /// Apply a pending command to the device
    Action(VolumeAction),
}

/// Object class named by a change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeFacility {
    Sink,
    Source,
    Server,
    Card,
    /// Anything the session did not subscribe to
    Other,
}

/// Connection state reported by the server client library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// Still handshaking (connecting, authorizing, setting name)
    Connecting,
    /// Handshake complete
    Ready,
    /// The connection failed
    Failed,
    /// The connection was closed, usually because the server went away
    Terminated,
}

/// Everything the event loop can receive from the server.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    /// The connection changed state
    Connection(ConnectionEvent),
    /// A subscribed object changed
    Subscription { facility: ChangeFacility, index: u32 },
    /// A server-info query completed
    ServerInfo { default_sink: Option<String>, default_source: Option<String> },
    /// A device-info query completed with data
    DeviceInfo { purpose: InfoPurpose, device: DeviceSnapshot },
}

/// One live connection to the audio server.
pub trait AudioServer {
    /// Run the connection for at most `timeout` and return what completed.
    ///
    /// An error means the connection is unusable.
    fn poll_events(&mut self, timeout: Duration) -> PulseResult<Vec<ServerEvent>>;

    /// Ask for the server info, which names the default devices.
    fn request_server_info(&mut self);

    /// Ask for one device's info.
    fn request_device_info(&mut self, kind: DeviceKind, device: DeviceRef, purpose: InfoPurpose);

    /// Subscribe to sink, source, server and card change notifications.
    fn subscribe(&mut self);

    /// Set a device's mute flag. The outcome is not reported.
    fn set_mute(&mut self, kind: DeviceKind, index: u32, muted: bool);

    /// Set a device's per-channel volume. The outcome is not reported.
    fn set_volume(&mut self, kind: DeviceKind, index: u32, volume: &VolumeMask);
}

/// Opens connections to the audio server.
pub trait Connector {
    type Server: AudioServer;

    /// Open a new connection. The handshake completes asynchronously and is
    /// reported as [`ConnectionEvent::Ready`].
    fn connect(&mut self) -> PulseResult<Self::Server>;
}
