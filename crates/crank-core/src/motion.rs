//! Saturating scalar motion shared by charging and decay.

use crate::constants::APPROX_EPSILON;

/// Step `current` toward `target` by at most `max_delta`, landing exactly on
/// `target` instead of overshooting it.
///
/// A zero, negative or NaN step leaves `current` untouched.
#[inline]
pub fn move_toward(current: f32, target: f32, max_delta: f32) -> f32 {
    if !(max_delta > 0.0) {
        return current;
    }
    let delta = target - current;
    if delta.abs() <= max_delta {
        target
    } else {
        current + delta.signum() * max_delta
    }
}

/// Tolerance comparison scaled to the magnitude of the operands.
#[inline]
pub fn approximately(a: f32, b: f32) -> bool {
    let scale = a.abs().max(b.abs()).max(1.0);
    (a - b).abs() <= APPROX_EPSILON * scale
}

/// Intensity after `dt` seconds of dimming at `decay_rate` units per second.
#[inline]
pub fn decay(current: f32, decay_rate: f32, dt: f32) -> f32 {
    move_toward(current, 0.0, decay_rate * dt).max(0.0)
}
