//! World-space convex proxies consumed by the narrow phase and TOI.

use kinema_math::Vec2;

use crate::aabb::Aabb;
use crate::polygon::support_of;

/// Convex hull of `vertices` inflated by `radius`.
///
/// A circle is a single vertex with its radius; a polygon is its vertex
/// list with zero radius.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvexProxy {
    pub vertices: Vec<Vec2>,
    pub radius: f32,
}

impl ConvexProxy {
    pub fn new(vertices: Vec<Vec2>, radius: f32) -> Self {
        Self { vertices, radius }
    }

    /// Support point of the un-inflated core.
    pub fn support_core(&self, dir: Vec2) -> Vec2 {
        support_of(&self.vertices, dir)
    }

    /// Support point including the radius.
    pub fn support(&self, dir: Vec2) -> Vec2 {
        self.support_core(dir) + dir.normalize_or_zero() * self.radius
    }

    pub fn center(&self) -> Vec2 {
        self.vertices.iter().copied().sum::<Vec2>() / self.vertices.len().max(1) as f32
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_points(self.vertices.iter().copied()).expanded(self.radius)
    }

    pub fn is_circle(&self) -> bool {
        self.vertices.len() == 1
    }
}
