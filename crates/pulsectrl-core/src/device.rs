//! Device identity and server-reported device snapshots.

use std::fmt;

use crate::volume::VolumeMask;

/// Kind of audio device a command or report refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    /// Audio output (speakers, headphones)
    Sink,
    /// Audio input (microphones)
    Source,
}

impl DeviceKind {
    /// The token used for this kind on the command and notification streams.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sink => "sink",
            Self::Source => "source",
        }
    }

    /// Parse a command-stream token. Matching is case-sensitive.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "sink" => Some(Self::Sink),
            "source" => Some(Self::Source),
            _ => None,
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A device as reported by one info-query completion.
///
/// Snapshots are never updated in place; every completion produces a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceSnapshot {
    /// Sink or source
    pub kind: DeviceKind,
    /// Server-assigned index
    pub index: u32,
    /// Server-side device name
    pub name: String,
    /// Per-channel volume in native units
    pub volume: VolumeMask,
    /// Whether the device is muted
    pub muted: bool,
}

impl DeviceSnapshot {
    /// Average volume as a fraction of nominal.
    #[must_use]
    pub fn volume_fraction(&self) -> f32 {
        self.volume.fraction()
    }
}
