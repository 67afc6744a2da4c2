//! Circle shape, centred on the body origin.

use kinema_math::{Affine2, Vec2};

use crate::aabb::Aabb;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub radius: f32,
}

impl Circle {
    pub fn new(radius: f32) -> Self {
        Self { radius }
    }

    pub fn aabb(&self, transform: &Affine2) -> Aabb {
        let c = transform.translation;
        Aabb::new(c - Vec2::splat(self.radius), c + Vec2::splat(self.radius))
    }

    pub fn support(&self, dir: Vec2) -> Vec2 {
        dir.normalize_or_zero() * self.radius
    }

    pub fn test_point(&self, local: Vec2) -> bool {
        local.length_squared() <= self.radius * self.radius
    }

    /// Moment of inertia of a solid disc about its centre.
    pub fn inertia(&self, mass: f32) -> f32 {
        0.5 * mass * self.radius * self.radius
    }
}
