//! In-process stand-in for the audio server, used by the unit tests.
//!
//! [`FakeServer`] answers queries from a small device table, records every
//! call, and replays a script of server events and injected requests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::mpsc as std_mpsc;
use std::time::Duration;

use parking_lot::Mutex;
use pulsectrl_core::{DeviceKind, DeviceSnapshot, VolumeMask};
use tokio::sync::mpsc;

use crate::error::{PulseError, PulseResult};
use crate::server::{
    AudioServer, ChangeFacility, Connector, DeviceRef, InfoPurpose, ServerEvent,
};
use crate::session::{RuntimeRequest, Session, SessionConfig, SessionEvent};

/// A call made against the fake server.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ServerInfo,
    DeviceInfo { kind: DeviceKind, device: DeviceRef, purpose: InfoPurpose },
    Subscribe,
    SetMute { kind: DeviceKind, index: u32, muted: bool },
    SetVolume { kind: DeviceKind, index: u32, levels: Vec<u32> },
}

/// One scripted poll result.
#[derive(Debug, Clone)]
pub enum Step {
    /// Deliver these events
    Events(Vec<ServerEvent>),
    /// Fail the poll, as if the connection broke
    Fail,
    /// Push a request into the session's request channel
    Request(RuntimeRequest),
}

/// Server-side device table.
#[derive(Debug, Clone, Default)]
pub struct FakeAudio {
    pub devices: Vec<DeviceSnapshot>,
    pub default_sink: Option<String>,
    pub default_source: Option<String>,
}

impl FakeAudio {
    fn find_mut(&mut self, kind: DeviceKind, device: &DeviceRef) -> Option<&mut DeviceSnapshot> {
        self.devices.iter_mut().find(|d| {
            d.kind == kind
                && match device {
                    DeviceRef::Index(index) => d.index == *index,
                    DeviceRef::Name(name) => &d.name == name,
                }
        })
    }
}

pub fn sink(index: u32, name: &str, level: u32, muted: bool) -> DeviceSnapshot {
    device(DeviceKind::Sink, index, name, level, muted)
}

pub fn source(index: u32, name: &str, level: u32, muted: bool) -> DeviceSnapshot {
    device(DeviceKind::Source, index, name, level, muted)
}

fn device(kind: DeviceKind, index: u32, name: &str, level: u32, muted: bool) -> DeviceSnapshot {
    DeviceSnapshot {
        kind,
        index,
        name: name.to_string(),
        volume: VolumeMask::uniform(2, level),
        muted,
    }
}

pub struct FakeServer {
    audio: FakeAudio,
    script: VecDeque<Step>,
    responses: VecDeque<ServerEvent>,
    calls: Arc<Mutex<Vec<Call>>>,
    requests: Option<std_mpsc::Sender<RuntimeRequest>>,
}

impl FakeServer {
    /// A server with no script, driven directly by a test.
    pub fn standalone(audio: FakeAudio) -> Self {
        Self {
            audio,
            script: VecDeque::new(),
            responses: VecDeque::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
            requests: None,
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// Take the completions produced by calls so far.
    pub fn take_responses(&mut self) -> Vec<ServerEvent> {
        self.responses.drain(..).collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }

    fn changed(&mut self, kind: DeviceKind, index: u32) {
        let facility = match kind {
            DeviceKind::Sink => ChangeFacility::Sink,
            DeviceKind::Source => ChangeFacility::Source,
        };
        self.responses.push_back(ServerEvent::Subscription { facility, index });
    }
}

impl AudioServer for FakeServer {
    fn poll_events(&mut self, _timeout: Duration) -> PulseResult<Vec<ServerEvent>> {
        if !self.responses.is_empty() {
            return Ok(self.take_responses());
        }

        match self.script.pop_front() {
            Some(Step::Events(events)) => Ok(events),
            Some(Step::Fail) => Err(PulseError::MainLoopError("scripted failure".to_string())),
            Some(Step::Request(request)) => {
                if let Some(requests) = &self.requests {
                    let _ = requests.send(request);
                }
                Ok(Vec::new())
            }
            None => Err(PulseError::MainLoopError("script exhausted".to_string())),
        }
    }

    fn request_server_info(&mut self) {
        self.record(Call::ServerInfo);
        self.responses.push_back(ServerEvent::ServerInfo {
            default_sink: self.audio.default_sink.clone(),
            default_source: self.audio.default_source.clone(),
        });
    }

    fn request_device_info(&mut self, kind: DeviceKind, device: DeviceRef, purpose: InfoPurpose) {
        self.record(Call::DeviceInfo { kind, device: device.clone(), purpose: purpose.clone() });
        if let Some(found) = self.audio.find_mut(kind, &device) {
            let device = found.clone();
            self.responses.push_back(ServerEvent::DeviceInfo { purpose, device });
        }
    }

    fn subscribe(&mut self) {
        self.record(Call::Subscribe);
    }

    fn set_mute(&mut self, kind: DeviceKind, index: u32, muted: bool) {
        self.record(Call::SetMute { kind, index, muted });
        if let Some(found) = self.audio.find_mut(kind, &DeviceRef::Index(index)) {
            found.muted = muted;
            self.changed(kind, index);
        }
    }

    fn set_volume(&mut self, kind: DeviceKind, index: u32, volume: &VolumeMask) {
        self.record(Call::SetVolume { kind, index, levels: volume.levels().to_vec() });
        if let Some(found) = self.audio.find_mut(kind, &DeviceRef::Index(index)) {
            found.volume = volume.clone();
            self.changed(kind, index);
        }
    }
}

/// Hands out scripted servers. Refuses the first `refusals` attempts, and
/// requests a shutdown once it runs out of servers.
pub struct FakeConnector {
    refusals: usize,
    servers: VecDeque<FakeServer>,
    requests: std_mpsc::Sender<RuntimeRequest>,
}

impl Connector for FakeConnector {
    type Server = FakeServer;

    fn connect(&mut self) -> PulseResult<FakeServer> {
        if self.refusals > 0 {
            self.refusals -= 1;
            return Err(PulseError::ConnectionFailed("connection refused".to_string()));
        }
        match self.servers.pop_front() {
            Some(server) => Ok(server),
            None => {
                let _ = self.requests.send(RuntimeRequest::Shutdown);
                Err(PulseError::ConnectionFailed("no server running".to_string()))
            }
        }
    }
}

/// Build a connector over scripted servers sharing one call log.
pub fn connector(
    refusals: usize,
    servers: Vec<(FakeAudio, Vec<Step>)>,
    requests: &std_mpsc::Sender<RuntimeRequest>,
) -> (FakeConnector, Arc<Mutex<Vec<Call>>>) {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let servers = servers
        .into_iter()
        .map(|(audio, script)| FakeServer {
            audio,
            script: script.into(),
            responses: VecDeque::new(),
            calls: Arc::clone(&calls),
            requests: Some(requests.clone()),
        })
        .collect();
    (FakeConnector { refusals, servers, requests: requests.clone() }, calls)
}

/// Run a session to completion and return everything it emitted plus every
/// server call made.
pub fn run_session(
    refusals: usize,
    servers: Vec<(FakeAudio, Vec<Step>)>,
) -> (Vec<SessionEvent>, Vec<Call>) {
    run_session_with(refusals, servers, Vec::new(), Duration::ZERO)
}

/// Like [`run_session`], with `queued` already waiting on the request channel
/// when the session starts.
pub fn run_session_with(
    refusals: usize,
    servers: Vec<(FakeAudio, Vec<Step>)>,
    queued: Vec<RuntimeRequest>,
    reconnect_delay: Duration,
) -> (Vec<SessionEvent>, Vec<Call>) {
    let (request_tx, request_rx) = std_mpsc::channel();
    let (event_tx, mut event_rx) = mpsc::channel(1024);
    let (connector, calls) = connector(refusals, servers, &request_tx);
    for request in queued {
        let _ = request_tx.send(request);
    }

    let config = SessionConfig {
        reconnect_delay,
        poll_interval: Duration::ZERO,
        ..SessionConfig::default()
    };
    Session::new(connector, config, request_rx, event_tx).run();

    let mut events = Vec::new();
    while let Ok(event) = event_rx.try_recv() {
        events.push(event);
    }
    let calls = calls.lock().clone();
    (events, calls)
}
