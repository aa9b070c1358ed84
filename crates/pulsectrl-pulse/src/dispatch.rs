//! Command dispatch.
//!
//! A command is applied in two steps: [`dispatch`] asks the server for the
//! current default device of the command's kind, and [`apply`] runs when
//! that query completes, computing the mutation from the fresh snapshot.
//! Mutations are fire-and-forget.

use pulsectrl_core::volume::{self, NATIVE_NORM};
use pulsectrl_core::{DeviceRegistry, DeviceSnapshot, VolumeAction, VolumeOp};
use tracing::debug;

use crate::server::{AudioServer, DeviceRef, InfoPurpose};

/// Start applying `action` to the current default device.
///
/// Returns `false` if no default device of the target kind is known yet, in
/// which case the action is dropped.
pub fn dispatch<S: AudioServer>(
    action: VolumeAction,
    registry: &DeviceRegistry,
    server: &mut S,
) -> bool {
    let Some(index) = registry.default_index(action.target) else {
        debug!(target = %action.target, "No default device known, dropping command");
        return false;
    };

    server.request_device_info(action.target, DeviceRef::Index(index), InfoPurpose::Action(action));
    true
}

/// Finish applying `action` against a freshly queried device.
pub fn apply<S: AudioServer>(action: VolumeAction, device: &DeviceSnapshot, server: &mut S) {
    match action.op {
        VolumeOp::ToggleMute => server.set_mute(device.kind, device.index, !device.muted),
        VolumeOp::SetMute(muted) => server.set_mute(device.kind, device.index, muted),
        VolumeOp::ChangeVolume(delta) => {
            let fraction = volume::apply_delta(device.volume_fraction(), delta);
            set_volume(device, fraction, server);
        }
        VolumeOp::SetVolume(level) => set_volume(device, volume::apply_set(level), server),
    }
}

fn set_volume<S: AudioServer>(device: &DeviceSnapshot, fraction: f32, server: &mut S) {
    // Start from the device's own channel layout.
    let mut mask = device.volume.clone();
    mask.broadcast(volume::to_native(fraction, NATIVE_NORM));

    debug!(
        kind = %device.kind,
        index = device.index,
        channels = mask.channels(),
        fraction,
        "Setting volume"
    );
    server.set_volume(device.kind, device.index, &mask);
}
