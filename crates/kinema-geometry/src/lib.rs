//! # kinema-geometry
//!
//! Immutable shape descriptions and the geometric queries the collision
//! pipeline runs on them.
//!
//! ## Key Types
//!
//! - [`Shape`]: Circle, convex Polygon, or triangle Mesh
//! - [`Aabb`]: Axis-aligned box, including the exact capsule overlap test
//! - [`ConvexProxy`]: World-space vertex cloud plus radius for GJK/SAT
//! - [`MeshShape`]: Triangle soup with convex hull and [`ObbTree`]

pub mod aabb;
pub mod circle;
pub mod hull;
pub mod mesh;
pub mod obb;
pub mod polygon;
pub mod proxy;
pub mod shape;

pub use aabb::Aabb;
pub use circle::Circle;
pub use hull::convex_hull;
pub use mesh::MeshShape;
pub use obb::{Obb, ObbChildren, ObbNode, ObbTree};
pub use polygon::Polygon;
pub use proxy::ConvexProxy;
pub use shape::Shape;
