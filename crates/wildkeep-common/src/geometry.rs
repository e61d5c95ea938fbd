//! Planar geometry helpers.
//!
//! The world is Y-up. Ground locomotion happens in the XZ plane and an
//! actor's forward axis is local +Z.

use glam::{Quat, Vec3};

/// Lengths below this are treated as zero.
pub const EPSILON: f32 = 1e-4;

/// Projects a point onto the ground plane (y = 0).
#[must_use]
pub fn planar(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Distance between two points ignoring height.
#[must_use]
pub fn planar_distance(a: Vec3, b: Vec3) -> f32 {
    planar(b - a).length()
}

/// Normalized horizontal direction from `from` to `to`, if they are apart.
#[must_use]
pub fn planar_direction(from: Vec3, to: Vec3) -> Option<Vec3> {
    let delta = planar(to - from);
    let len = delta.length();
    if len < EPSILON {
        None
    } else {
        Some(delta / len)
    }
}

/// Rotation that faces along a horizontal direction.
#[must_use]
pub fn facing_rotation(direction: Vec3) -> Quat {
    Quat::from_rotation_y(direction.x.atan2(direction.z))
}

/// Horizontal forward vector of a rotation.
#[must_use]
pub fn forward(rotation: Quat) -> Vec3 {
    planar(rotation * Vec3::Z).normalize_or_zero()
}

/// Rotates a direction about the vertical axis.
#[must_use]
pub fn rotate_about_y(direction: Vec3, angle: f32) -> Vec3 {
    Quat::from_rotation_y(angle) * direction
}

/// Angle in radians between the facing of `rotation` and `direction`.
#[must_use]
pub fn facing_error(rotation: Quat, direction: Vec3) -> f32 {
    let fwd = forward(rotation);
    let dir = planar(direction).normalize_or_zero();
    if fwd == Vec3::ZERO || dir == Vec3::ZERO {
        return 0.0;
    }
    fwd.dot(dir).clamp(-1.0, 1.0).acos()
}

/// Spherically interpolates `current` toward facing `direction`.
///
/// `rate` is the fraction of the remaining turn covered per second, so a rate
/// of 8 over a 1/60 s tick covers roughly an eighth of the gap.
#[must_use]
pub fn turn_toward(current: Quat, direction: Vec3, rate: f32, dt: f32) -> Quat {
    if planar(direction).length() < EPSILON {
        return current;
    }
    let target = facing_rotation(direction);
    let t = (rate * dt).clamp(0.0, 1.0);
    current.slerp(target, t).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_planar_distance_ignores_height() {
        let a = Vec3::new(0.0, 5.0, 0.0);
        let b = Vec3::new(3.0, -2.0, 4.0);
        assert!((planar_distance(a, b) - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_planar_direction_degenerate() {
        let p = Vec3::new(1.0, 0.0, 1.0);
        assert!(planar_direction(p, p + Vec3::Y * 3.0).is_none());
    }

    #[test]
    fn test_facing_rotation_forward_roundtrip() {
        let dir = Vec3::new(1.0, 0.0, 0.0);
        let fwd = forward(facing_rotation(dir));
        assert!((fwd - dir).length() < 1e-4);
    }

    #[test]
    fn test_facing_error_right_angle() {
        let err = facing_error(Quat::IDENTITY, Vec3::X);
        assert!((err - FRAC_PI_2).abs() < 1e-4);
    }

    #[test]
    fn test_turn_toward_full_step_snaps() {
        let q = turn_toward(Quat::IDENTITY, Vec3::X, 1.0, 1.0);
        assert!(facing_error(q, Vec3::X) < 1e-3);
    }

    #[test]
    fn test_turn_toward_partial_step_reduces_error() {
        let before = facing_error(Quat::IDENTITY, Vec3::NEG_X);
        let q = turn_toward(Quat::IDENTITY, Vec3::new(-1.0, 0.0, 0.1), 4.0, 0.05);
        assert!(facing_error(q, Vec3::NEG_X) < before);
    }

    proptest! {
        #[test]
        fn prop_rotate_about_y_preserves_length(x in -10.0f32..10.0, z in -10.0f32..10.0, angle in -6.3f32..6.3) {
            let v = Vec3::new(x, 0.0, z);
            let r = rotate_about_y(v, angle);
            prop_assert!((r.length() - v.length()).abs() < 1e-3);
            prop_assert!(r.y.abs() < 1e-3);
        }
    }
}
