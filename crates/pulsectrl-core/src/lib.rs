//! pulsectrl core - command grammar, volume math and device bookkeeping.
//!
//! This crate holds the pure domain logic shared by the session runtime and
//! the daemon binary. Nothing in here talks to the audio server.

pub mod command;
pub mod device;
pub mod error;
pub mod registry;
pub mod state;
pub mod volume;

pub use command::{VolumeAction, VolumeOp};
pub use device::{DeviceKind, DeviceSnapshot};
pub use error::{Error, Result};
pub use registry::{DeviceRegistry, DeviceStatus, Notification};
pub use state::SessionState;
pub use volume::VolumeMask;
