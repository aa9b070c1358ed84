//! Default-device tracking and output-line rendering.

use std::fmt;

use tracing::debug;

use crate::device::{DeviceKind, DeviceSnapshot};

/// Status of one device, as reported on the output stream.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceStatus {
    pub kind: DeviceKind,
    pub name: String,
    /// Volume as a fraction of nominal
    pub volume: f32,
    pub is_default: bool,
    pub muted: bool,
}

impl DeviceStatus {
    /// The two-character flag field: default marker then mute marker.
    #[must_use]
    pub fn flags(&self) -> String {
        let default_flag = if self.is_default { '*' } else { ' ' };
        let mute_flag = if self.muted { 'M' } else { ' ' };
        [default_flag, mute_flag].iter().collect()
    }
}

/// A line emitted on the output stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// The server switched its default device
    DefaultChanged { kind: DeviceKind, name: String },
    /// Fresh volume/mute state for a device
    Status(DeviceStatus),
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DefaultChanged { kind, name } => write!(f, "default {kind}\t{name}"),
            Self::Status(status) => write!(
                f,
                "volume {}\t{}\t{:.5}\t{}",
                status.kind,
                status.flags(),
                status.volume,
                status.name
            ),
        }
    }
}

/// Tracks the server's current default sink and source.
///
/// The registry outlives individual connections, so a reconnect that finds the
/// same defaults reports nothing new.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    default_sink: Option<u32>,
    default_source: Option<u32>,
}

impl DeviceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the current default device of `kind`, if known.
    #[must_use]
    pub fn default_index(&self, kind: DeviceKind) -> Option<u32> {
        match kind {
            DeviceKind::Sink => self.default_sink,
            DeviceKind::Source => self.default_source,
        }
    }

    fn default_slot(&mut self, kind: DeviceKind) -> &mut Option<u32> {
        match kind {
            DeviceKind::Sink => &mut self.default_sink,
            DeviceKind::Source => &mut self.default_source,
        }
    }

    /// Record the result of resolving the server's default device.
    ///
    /// Returns nothing when the default is unchanged. Otherwise returns the
    /// default-changed line followed by the status of the new default.
    pub fn on_default_query_result(&mut self, device: &DeviceSnapshot) -> Vec<Notification> {
        let slot = self.default_slot(device.kind);
        if *slot == Some(device.index) {
            return Vec::new();
        }

        debug!(kind = %device.kind, index = device.index, name = %device.name, "Default device changed");
        *slot = Some(device.index);

        vec![
            Notification::DefaultChanged { kind: device.kind, name: device.name.clone() },
            self.on_info_result(device),
        ]
    }

    /// Render the status line for a device info completion.
    #[must_use]
    pub fn on_info_result(&self, device: &DeviceSnapshot) -> Notification {
        Notification::Status(DeviceStatus {
            kind: device.kind,
            name: device.name.clone(),
            volume: device.volume_fraction(),
            is_default: self.default_index(device.kind) == Some(device.index),
            muted: device.muted,
        })
    }
}
