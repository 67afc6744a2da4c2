//! Small planar helpers used across the engine.

use glam::{Affine2, Vec2};

/// Scalar 2D cross product `a × b`.
#[inline]
pub fn cross(a: Vec2, b: Vec2) -> f32 {
    a.perp_dot(b)
}

/// Cross product of a scalar (out-of-plane) with a vector: `s × v`.
///
/// Used for the tangential velocity `ω × r` of a point on a spinning body.
#[inline]
pub fn cross_sv(s: f32, v: Vec2) -> Vec2 {
    Vec2::new(-s * v.y, s * v.x)
}

/// Rigid transform from a position and an angle.
#[inline]
pub fn pose(position: Vec2, angle: f32) -> Affine2 {
    Affine2::from_angle_translation(angle, position)
}
