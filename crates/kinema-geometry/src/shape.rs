//! The closed set of collision shapes.

use kinema_math::{Affine2, Vec2};

use crate::aabb::Aabb;
use crate::circle::Circle;
use crate::mesh::MeshShape;
use crate::polygon::Polygon;
use crate::proxy::ConvexProxy;

#[derive(Debug, Clone)]
pub enum Shape {
    Circle(Circle),
    Polygon(Polygon),
    Mesh(MeshShape),
}

impl Shape {
    pub fn circle(radius: f32) -> Shape {
        Shape::Circle(Circle::new(radius))
    }

    pub fn rect(width: f32, height: f32) -> Shape {
        Shape::Polygon(Polygon::rect(width, height))
    }

    /// Bounds of the shape under `transform`. Encloses every transformed vertex.
    pub fn aabb(&self, transform: &Affine2) -> Aabb {
        match self {
            Shape::Circle(c) => c.aabb(transform),
            Shape::Polygon(p) => p.aabb(transform),
            Shape::Mesh(m) => m.aabb(transform),
        }
    }

    /// Furthest local point in direction `dir` (local space).
    pub fn support(&self, dir: Vec2) -> Vec2 {
        match self {
            Shape::Circle(c) => c.support(dir),
            Shape::Polygon(p) => p.support(dir),
            Shape::Mesh(m) => m.support(dir),
        }
    }

    pub fn test_point(&self, local: Vec2) -> bool {
        match self {
            Shape::Circle(c) => c.test_point(local),
            Shape::Polygon(p) => p.test_point(local),
            Shape::Mesh(m) => m.test_point(local),
        }
    }

    /// Bounding radius about the local origin.
    pub fn radius(&self) -> f32 {
        match self {
            Shape::Circle(c) => c.radius,
            Shape::Polygon(p) => p.radius(),
            Shape::Mesh(m) => m.radius(),
        }
    }

    /// Moment of inertia about the local origin for the given mass.
    pub fn inertia(&self, mass: f32) -> f32 {
        match self {
            Shape::Circle(c) => c.inertia(mass),
            Shape::Polygon(p) => p.inertia(mass),
            Shape::Mesh(m) => m.inertia(mass),
        }
    }

    /// Area centroid in local coordinates.
    pub fn centroid(&self) -> Vec2 {
        match self {
            Shape::Circle(_) => Vec2::ZERO,
            Shape::Polygon(p) => p.centroid(),
            Shape::Mesh(m) => m.centroid(),
        }
    }

    /// World-space convex proxy. Meshes have none; they are queried per triangle.
    pub fn proxy(&self, transform: &Affine2) -> Option<ConvexProxy> {
        match self {
            Shape::Circle(c) => Some(ConvexProxy::new(vec![transform.translation], c.radius)),
            Shape::Polygon(p) => Some(p.proxy(transform)),
            Shape::Mesh(_) => None,
        }
    }

    pub fn is_mesh(&self) -> bool {
        matches!(self, Shape::Mesh(_))
    }

    pub fn name(&self) -> &str {
        match self {
            Shape::Circle(_) => "circle",
            Shape::Polygon(_) => "polygon",
            Shape::Mesh(_) => "mesh",
        }
    }
}
