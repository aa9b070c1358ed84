//! Event reactor.
//!
//! All server events pass through [`Reactor::handle`], one at a time, on the
//! session thread. Handlers update the device registry, issue follow-up
//! queries, complete pending commands, and queue output lines.

use pulsectrl_core::{DeviceKind, DeviceRegistry, DeviceSnapshot, Notification};
use tracing::{debug, info};

use crate::dispatch;
use crate::server::{
    AudioServer, ChangeFacility, ConnectionEvent, DeviceRef, InfoPurpose, ServerEvent,
};

/// What the session should do after an event was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    /// Nothing changed for the session
    Continue,
    /// The handshake completed
    Ready,
    /// The connection is gone and must be re-established
    Lost(ConnectionEvent),
}

/// Routes server events to their handlers.
#[derive(Debug, Default)]
pub struct Reactor {
    registry: DeviceRegistry,
    pending: Vec<Notification>,
}

impl Reactor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The default-device registry.
    #[must_use]
    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    /// Handle one server event.
    pub fn handle<S: AudioServer>(&mut self, event: ServerEvent, server: &mut S) -> Reaction {
        match event {
            ServerEvent::Connection(state) => Self::on_connection(state, server),
            ServerEvent::Subscription { facility, index } => {
                Self::on_subscription(facility, index, server);
                Reaction::Continue
            }
            ServerEvent::ServerInfo { default_sink, default_source } => {
                Self::on_server_info(default_sink, default_source, server);
                Reaction::Continue
            }
            ServerEvent::DeviceInfo { purpose, device } => {
                self.on_device_info(purpose, &device, server);
                Reaction::Continue
            }
        }
    }

    /// Record an info completion without touching the server. Used once the
    /// connection is gone; anything needing a follow-up call is dropped.
    pub fn record_completion(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::DeviceInfo { purpose: InfoPurpose::Report, device } => {
                self.pending.push(self.registry.on_info_result(&device));
            }
            ServerEvent::DeviceInfo { purpose: InfoPurpose::Default, device } => {
                self.pending.extend(self.registry.on_default_query_result(&device));
            }
            other => debug!(event = ?other, "Dropping event after connection loss"),
        }
    }

    /// Take the output lines queued since the last call.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.pending)
    }

    fn on_connection<S: AudioServer>(state: ConnectionEvent, server: &mut S) -> Reaction {
        match state {
            ConnectionEvent::Connecting => Reaction::Continue,
            ConnectionEvent::Ready => {
                info!("Connected to audio server");
                server.request_server_info();
                server.subscribe();
                Reaction::Ready
            }
            ConnectionEvent::Failed | ConnectionEvent::Terminated => Reaction::Lost(state),
        }
    }

    fn on_subscription<S: AudioServer>(facility: ChangeFacility, index: u32, server: &mut S) {
        match facility {
            ChangeFacility::Sink => {
                server.request_device_info(DeviceKind::Sink, DeviceRef::Index(index), InfoPurpose::Report);
            }
            ChangeFacility::Source => {
                server.request_device_info(
                    DeviceKind::Source,
                    DeviceRef::Index(index),
                    InfoPurpose::Report,
                );
            }
            ChangeFacility::Server | ChangeFacility::Card => server.request_server_info(),
            ChangeFacility::Other => {}
        }
    }

    fn on_server_info<S: AudioServer>(
        default_sink: Option<String>,
        default_source: Option<String>,
        server: &mut S,
    ) {
        for (kind, name) in [(DeviceKind::Sink, default_sink), (DeviceKind::Source, default_source)] {
            match name {
                Some(name) => {
                    server.request_device_info(kind, DeviceRef::Name(name), InfoPurpose::Default);
                }
                None => debug!(%kind, "Server reports no default device"),
            }
        }
    }

    fn on_device_info<S: AudioServer>(
        &mut self,
        purpose: InfoPurpose,
        device: &DeviceSnapshot,
        server: &mut S,
    ) {
        match purpose {
            InfoPurpose::Report => self.pending.push(self.registry.on_info_result(device)),
            InfoPurpose::Default => {
                self.pending.extend(self.registry.on_default_query_result(device));
            }
            InfoPurpose::Action(action) => dispatch::apply(action, device, server),
        }
    }
}
