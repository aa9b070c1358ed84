//! Volume math: conversion between fractional levels and the server's
//! native integer scale.
//!
//! A fraction of `1.0` is nominal (0 dB) volume. Levels above nominal are
//! allowed up to [`MAX_FRACTION`] so users can deliberately boost quiet
//! devices.

/// Native level that represents nominal volume.
pub const NATIVE_NORM: u32 = 0x0001_0000;

/// Highest level the server accepts.
pub const NATIVE_MAX: u32 = u32::MAX / 2;

/// Lowest fraction a command may produce.
pub const MIN_FRACTION: f32 = 0.0;

/// Highest fraction a command may produce.
pub const MAX_FRACTION: f32 = 1.5;

/// Convert a raw native average into a fraction of `full_scale`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn normalize(raw_average: u32, full_scale: u32) -> f32 {
    if full_scale == 0 {
        return 0.0;
    }
    raw_average as f32 / full_scale as f32
}

/// Apply a relative change and clamp into the command range.
#[must_use]
pub fn apply_delta(current: f32, delta: f32) -> f32 {
    clamp_fraction(current + delta)
}

/// Clamp an absolute level into the command range.
///
/// The same ceiling as [`apply_delta`] applies.
#[must_use]
pub fn apply_set(level: f32) -> f32 {
    clamp_fraction(level)
}

/// Convert a fraction into a native level, rounding to the nearest step.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn to_native(fraction: f32, full_scale: u32) -> u32 {
    let native = (f64::from(fraction) * f64::from(full_scale)).round();
    // NaN saturates to 0 on the cast.
    native.clamp(0.0, f64::from(NATIVE_MAX)) as u32
}

fn clamp_fraction(value: f32) -> f32 {
    if value.is_nan() {
        return MIN_FRACTION;
    }
    value.clamp(MIN_FRACTION, MAX_FRACTION)
}

/// Per-channel volume vector in native units.
///
/// Built fresh from the latest device snapshot for every mutation, so the
/// channel count always matches what the server last reported.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VolumeMask {
    levels: Vec<u32>,
}

impl VolumeMask {
    /// Create a mask from explicit per-channel levels.
    #[must_use]
    pub fn new(levels: Vec<u32>) -> Self {
        Self { levels }
    }

    /// A mask with `channels` channels all at `level`.
    #[must_use]
    pub fn uniform(channels: usize, level: u32) -> Self {
        Self { levels: vec![level; channels] }
    }

    /// Number of channels.
    #[must_use]
    pub fn channels(&self) -> usize {
        self.levels.len()
    }

    /// Per-channel levels.
    #[must_use]
    pub fn levels(&self) -> &[u32] {
        &self.levels
    }

    /// Integer average of all channels; zero for an empty mask.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn average(&self) -> u32 {
        if self.levels.is_empty() {
            return 0;
        }
        let sum: u64 = self.levels.iter().map(|&v| u64::from(v)).sum();
        // The average of u32 values always fits in u32.
        (sum / self.levels.len() as u64) as u32
    }

    /// Average volume as a fraction of nominal.
    #[must_use]
    pub fn fraction(&self) -> f32 {
        normalize(self.average(), NATIVE_NORM)
    }

    /// Set every channel to `level`, keeping the channel count.
    pub fn broadcast(&mut self, level: u32) {
        self.levels.iter_mut().for_each(|v| *v = level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_nominal_is_one() {
        assert!((normalize(NATIVE_NORM, NATIVE_NORM) - 1.0).abs() < f32::EPSILON);
        assert!((normalize(NATIVE_NORM / 2, NATIVE_NORM) - 0.5).abs() < f32::EPSILON);
        assert!(normalize(0, NATIVE_NORM).abs() < f32::EPSILON);
    }

    #[test]
    fn test_normalize_zero_scale() {
        assert!(normalize(1234, 0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_apply_delta_zero_is_noop() {
        assert!((apply_delta(0.5, 0.0) - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_apply_delta_clamps_both_ends() {
        assert!((apply_delta(1.4, 0.5) - MAX_FRACTION).abs() < f32::EPSILON);
        assert!(apply_delta(0.1, -0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_apply_set_uses_same_ceiling() {
        assert!((apply_set(2.0) - 1.5).abs() < f32::EPSILON);
        assert!(apply_set(-1.0).abs() < f32::EPSILON);
        assert!((apply_set(0.75) - 0.75).abs() < f32::EPSILON);
    }

    #[test]
    fn test_nan_clamps_to_silence() {
        assert!(apply_set(f32::NAN).abs() < f32::EPSILON);
        assert_eq!(to_native(f32::NAN, NATIVE_NORM), 0);
    }

    #[test]
    fn test_to_native_rounds() {
        assert_eq!(to_native(1.0, NATIVE_NORM), NATIVE_NORM);
        assert_eq!(to_native(1.5, NATIVE_NORM), 98_304);
        assert_eq!(to_native(0.4, NATIVE_NORM), 26_214);
        assert_eq!(to_native(-0.2, NATIVE_NORM), 0);
    }

    #[test]
    fn test_mask_average_uses_integer_division() {
        let mask = VolumeMask::new(vec![100, 101]);
        assert_eq!(mask.average(), 100);
        assert_eq!(VolumeMask::default().average(), 0);
    }

    #[test]
    fn test_broadcast_keeps_channel_count() {
        let mut mask = VolumeMask::new(vec![10, 20, 30, 40, 50, 60]);
        mask.broadcast(NATIVE_NORM);
        assert_eq!(mask.channels(), 6);
        assert!(mask.levels().iter().all(|&v| v == NATIVE_NORM));
    }

    proptest! {
        #[test]
        fn prop_apply_delta_stays_in_range(current in -10.0f32..10.0, delta in -10.0f32..10.0) {
            let v = apply_delta(current, delta);
            prop_assert!((MIN_FRACTION..=MAX_FRACTION).contains(&v));
        }

        #[test]
        fn prop_native_round_trip(fraction in 0.0f32..=1.5) {
            let native = to_native(fraction, NATIVE_NORM);
            let back = normalize(native, NATIVE_NORM);
            // One native step, plus f32 slack.
            prop_assert!((back - fraction).abs() <= 1.0 / NATIVE_NORM as f32 + 1e-6);
        }

        #[test]
        fn prop_uniform_mask_fraction_matches(fraction in 0.0f32..=1.5, channels in 1usize..8) {
            let mask = VolumeMask::uniform(channels, to_native(fraction, NATIVE_NORM));
            prop_assert!((mask.fraction() - fraction).abs() <= 1.0 / NATIVE_NORM as f32 + 1e-6);
        }
    }
}
