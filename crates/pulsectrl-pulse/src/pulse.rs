//! libpulse-backed audio server connection.
//!
//! The mainloop and context are not thread-safe, so a [`PulseServer`] must
//! stay on the thread that created it. Completion callbacks only push onto a
//! local queue; all handling happens after `dispatch` returns.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use libpulse_binding::callbacks::ListResult;
use libpulse_binding::context::introspect::{SinkInfo, SourceInfo};
use libpulse_binding::context::subscribe::{
    Facility, InterestMaskSet, Operation as SubscriptionOperation,
};
use libpulse_binding::context::{Context, FlagSet as ContextFlagSet, State as ContextState};
use libpulse_binding::mainloop::standard::Mainloop;
use libpulse_binding::time::MicroSeconds;
use libpulse_binding::volume::{ChannelVolumes, Volume};
use pulsectrl_core::{DeviceKind, DeviceSnapshot, VolumeMask};
use tracing::{debug, info, warn};

use crate::error::{PulseError, PulseResult};
use crate::server::{
    AudioServer, ChangeFacility, ConnectionEvent, Connector, DeviceRef, InfoPurpose, ServerEvent,
};
use crate::session::SessionConfig;

/// Most channels a volume vector can carry.
const MAX_CHANNELS: usize = 32;

type EventQueue = Rc<RefCell<VecDeque<ServerEvent>>>;

/// Opens libpulse connections using the session configuration.
#[derive(Debug, Clone)]
pub struct PulseConnector {
    client_name: String,
    server: Option<String>,
}

impl PulseConnector {
    #[must_use]
    pub fn new(config: &SessionConfig) -> Self {
        Self { client_name: config.client_name.clone(), server: config.server.clone() }
    }
}

impl Connector for PulseConnector {
    type Server = PulseServer;

    fn connect(&mut self) -> PulseResult<PulseServer> {
        PulseServer::connect(&self.client_name, self.server.as_deref())
    }
}

/// One libpulse connection with its own mainloop.
pub struct PulseServer {
    // Declared before the mainloop so it is released first.
    context: Context,
    mainloop: Mainloop,
    events: EventQueue,
    state_changed: Rc<Cell<bool>>,
}

impl PulseServer {
    fn connect(client_name: &str, server: Option<&str>) -> PulseResult<Self> {
        let mainloop = Mainloop::new()
            .ok_or_else(|| PulseError::MainLoopError("Failed to create main loop".to_string()))?;

        let mut context = Context::new(&mainloop, client_name)
            .ok_or_else(|| PulseError::ContextFailed("Failed to create context".to_string()))?;

        let state_changed = Rc::new(Cell::new(false));
        let flag = Rc::clone(&state_changed);
        context.set_state_callback(Some(Box::new(move || flag.set(true))));

        let events: EventQueue = Rc::new(RefCell::new(VecDeque::new()));
        let queue = Rc::clone(&events);
        let on_change = move |facility: Option<Facility>,
                              _operation: Option<SubscriptionOperation>,
                              index: u32| {
            queue.borrow_mut().push_back(ServerEvent::Subscription {
                facility: change_facility(facility),
                index,
            });
        };
        context.set_subscribe_callback(Some(Box::new(on_change)));

        // Never spawn a server of our own.
        context
            .connect(server, ContextFlagSet::NOAUTOSPAWN, None)
            .map_err(|e| PulseError::ConnectionFailed(format!("Failed to connect: {e}")))?;

        info!(server = server.unwrap_or("default"), "Connecting to audio server");

        Ok(Self { context, mainloop, events, state_changed })
    }
}

impl AudioServer for PulseServer {
    fn poll_events(&mut self, timeout: Duration) -> PulseResult<Vec<ServerEvent>> {
        let micros = u64::try_from(timeout.as_micros()).unwrap_or(u64::MAX);

        self.mainloop
            .prepare(Some(MicroSeconds(micros)))
            .map_err(|e| PulseError::MainLoopError(format!("prepare failed: {e}")))?;
        self.mainloop
            .poll()
            .map_err(|e| PulseError::MainLoopError(format!("poll failed: {e}")))?;
        self.mainloop
            .dispatch()
            .map_err(|e| PulseError::MainLoopError(format!("dispatch failed: {e}")))?;

        let mut events = Vec::new();
        if self.state_changed.replace(false) {
            events.push(ServerEvent::Connection(connection_event(self.context.get_state())));
        }
        events.extend(self.events.borrow_mut().drain(..));
        Ok(events)
    }

    fn request_server_info(&mut self) {
        let queue = Rc::clone(&self.events);
        // Dropping the operation handle releases it; the callback still fires.
        let _operation = self.context.introspect().get_server_info(move |info| {
            queue.borrow_mut().push_back(ServerEvent::ServerInfo {
                default_sink: info.default_sink_name.as_deref().map(str::to_owned),
                default_source: info.default_source_name.as_deref().map(str::to_owned),
            });
        });
    }

    fn request_device_info(&mut self, kind: DeviceKind, device: DeviceRef, purpose: InfoPurpose) {
        let introspect = self.context.introspect();
        match (kind, device) {
            (DeviceKind::Sink, DeviceRef::Index(index)) => {
                let _operation = introspect.get_sink_info_by_index(index, sink_callback(Rc::clone(&self.events), purpose));
            }
            (DeviceKind::Sink, DeviceRef::Name(name)) => {
                let _operation = introspect.get_sink_info_by_name(&name, sink_callback(Rc::clone(&self.events), purpose));
            }
            (DeviceKind::Source, DeviceRef::Index(index)) => {
                let _operation =
                    introspect.get_source_info_by_index(index, source_callback(Rc::clone(&self.events), purpose));
            }
            (DeviceKind::Source, DeviceRef::Name(name)) => {
                let _operation =
                    introspect.get_source_info_by_name(&name, source_callback(Rc::clone(&self.events), purpose));
            }
        }
    }

    fn subscribe(&mut self) {
        let mask = InterestMaskSet::SINK
            | InterestMaskSet::SOURCE
            | InterestMaskSet::SERVER
            | InterestMaskSet::CARD;
        let _operation = self.context.subscribe(mask, |success| {
            if !success {
                warn!("Subscription request rejected by server");
            }
        });
    }

    fn set_mute(&mut self, kind: DeviceKind, index: u32, muted: bool) {
        let mut introspect = self.context.introspect();
        let _operation = match kind {
            DeviceKind::Sink => introspect.set_sink_mute_by_index(index, muted, None),
            DeviceKind::Source => introspect.set_source_mute_by_index(index, muted, None),
        };
    }

    fn set_volume(&mut self, kind: DeviceKind, index: u32, volume: &VolumeMask) {
        let volumes = channel_volumes(volume);
        let mut introspect = self.context.introspect();
        let _operation = match kind {
            DeviceKind::Sink => introspect.set_sink_volume_by_index(index, &volumes, None),
            DeviceKind::Source => introspect.set_source_volume_by_index(index, &volumes, None),
        };
    }
}

impl Drop for PulseServer {
    fn drop(&mut self) {
        debug!("Disconnecting from audio server");
        self.context.disconnect();
    }
}

fn push_device(queue: &EventQueue, purpose: &InfoPurpose, device: DeviceSnapshot) {
    queue.borrow_mut().push_back(ServerEvent::DeviceInfo { purpose: purpose.clone(), device });
}

fn sink_callback(
    queue: EventQueue,
    purpose: InfoPurpose,
) -> impl FnMut(ListResult<&SinkInfo>) + 'static {
    move |result: ListResult<&SinkInfo>| match result {
        ListResult::Item(info) => push_device(
            &queue,
            &purpose,
            snapshot(DeviceKind::Sink, info.index, info.name.as_deref(), &info.volume, info.mute),
        ),
        ListResult::End => {}
        ListResult::Error => debug!("Sink info query failed"),
    }
}

fn source_callback(
    queue: EventQueue,
    purpose: InfoPurpose,
) -> impl FnMut(ListResult<&SourceInfo>) + 'static {
    move |result: ListResult<&SourceInfo>| match result {
        ListResult::Item(info) => push_device(
            &queue,
            &purpose,
            snapshot(DeviceKind::Source, info.index, info.name.as_deref(), &info.volume, info.mute),
        ),
        ListResult::End => {}
        ListResult::Error => debug!("Source info query failed"),
    }
}

fn connection_event(state: ContextState) -> ConnectionEvent {
    match state {
        ContextState::Ready => ConnectionEvent::Ready,
        ContextState::Failed => ConnectionEvent::Failed,
        ContextState::Terminated => ConnectionEvent::Terminated,
        // Unconnected, Connecting, Authorizing, SettingName
        _ => ConnectionEvent::Connecting,
    }
}

fn change_facility(facility: Option<Facility>) -> ChangeFacility {
    match facility {
        Some(Facility::Sink) => ChangeFacility::Sink,
        Some(Facility::Source) => ChangeFacility::Source,
        Some(Facility::Server) => ChangeFacility::Server,
        Some(Facility::Card) => ChangeFacility::Card,
        _ => ChangeFacility::Other,
    }
}

fn snapshot(
    kind: DeviceKind,
    index: u32,
    name: Option<&str>,
    volume: &ChannelVolumes,
    muted: bool,
) -> DeviceSnapshot {
    DeviceSnapshot {
        kind,
        index,
        name: name.unwrap_or_default().to_string(),
        volume: VolumeMask::new(volume.get().iter().map(|v| v.0).collect()),
        muted,
    }
}

fn channel_volumes(mask: &VolumeMask) -> ChannelVolumes {
    let mut volumes = ChannelVolumes::default();
    let len = u8::try_from(mask.channels().min(MAX_CHANNELS)).unwrap_or_default();
    volumes.set_len(len);
    for (slot, level) in volumes.get_mut().iter_mut().zip(mask.levels()) {
        *slot = Volume(*level);
    }
    volumes
}
