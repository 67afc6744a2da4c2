//! Convex polygon shape.

use kinema_math::{cross, Affine2, Vec2};
use kinema_types::constants::DEGENERATE_AREA_THRESHOLD;
use kinema_types::{KinemaError, KinemaResult};

use crate::aabb::Aabb;
use crate::proxy::ConvexProxy;

/// Convex polygon in body-local coordinates, wound counter-clockwise.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    vertices: Vec<Vec2>,
    /// Outward unit normal of edge `i → i+1`.
    normals: Vec<Vec2>,
}

impl Polygon {
    /// Builds a polygon from a convex point sequence.
    ///
    /// Clockwise input is reversed. Fewer than three points, zero area,
    /// or a reflex corner is rejected.
    pub fn new(points: Vec<Vec2>) -> KinemaResult<Self> {
        if points.len() < 3 {
            return Err(KinemaError::InvalidShape(format!(
                "polygon needs at least 3 points, got {}",
                points.len()
            )));
        }

        let mut vertices = points;
        let area = signed_area(&vertices);
        if area.abs() < DEGENERATE_AREA_THRESHOLD {
            return Err(KinemaError::InvalidShape("polygon has zero area".into()));
        }
        if area < 0.0 {
            vertices.reverse();
        }

        let n = vertices.len();
        for i in 0..n {
            let a = vertices[i];
            let b = vertices[(i + 1) % n];
            let c = vertices[(i + 2) % n];
            if cross(b - a, c - b) < -1e-6 {
                return Err(KinemaError::InvalidShape(format!(
                    "polygon is not convex at vertex {}",
                    (i + 1) % n
                )));
            }
        }

        Ok(Self::from_ccw(vertices))
    }

    /// Axis-aligned box of the given size centred on the origin.
    pub fn rect(width: f32, height: f32) -> Self {
        let (hw, hh) = (0.5 * width.abs(), 0.5 * height.abs());
        Self::from_ccw(vec![
            Vec2::new(-hw, -hh),
            Vec2::new(hw, -hh),
            Vec2::new(hw, hh),
            Vec2::new(-hw, hh),
        ])
    }

    fn from_ccw(vertices: Vec<Vec2>) -> Self {
        let n = vertices.len();
        let normals = (0..n)
            .map(|i| {
                let e = vertices[(i + 1) % n] - vertices[i];
                Vec2::new(e.y, -e.x).normalize_or_zero()
            })
            .collect();
        Self { vertices, normals }
    }

    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    pub fn normals(&self) -> &[Vec2] {
        &self.normals
    }

    pub fn area(&self) -> f32 {
        signed_area(&self.vertices)
    }

    /// Area-weighted centroid.
    pub fn centroid(&self) -> Vec2 {
        polygon_centroid(&self.vertices)
    }

    pub fn aabb(&self, transform: &Affine2) -> Aabb {
        Aabb::from_points(self.vertices.iter().map(|&v| transform.transform_point2(v)))
    }

    pub fn support(&self, dir: Vec2) -> Vec2 {
        support_of(&self.vertices, dir)
    }

    pub fn test_point(&self, local: Vec2) -> bool {
        let n = self.vertices.len();
        (0..n).all(|i| cross(self.vertices[(i + 1) % n] - self.vertices[i], local - self.vertices[i]) >= 0.0)
    }

    /// Bounding radius about the local origin.
    pub fn radius(&self) -> f32 {
        self.vertices.iter().map(|v| v.length()).fold(0.0, f32::max)
    }

    /// Moment of inertia about the local origin for a uniform lamina of `mass`.
    pub fn inertia(&self, mass: f32) -> f32 {
        let (area, second_moment) = area_moments(&self.vertices);
        if area.abs() < DEGENERATE_AREA_THRESHOLD {
            return 0.0;
        }
        mass * second_moment / area
    }

    pub fn proxy(&self, transform: &Affine2) -> ConvexProxy {
        ConvexProxy::new(
            self.vertices.iter().map(|&v| transform.transform_point2(v)).collect(),
            0.0,
        )
    }
}

/// Shoelace signed area (positive for counter-clockwise winding).
pub fn signed_area(vertices: &[Vec2]) -> f32 {
    let n = vertices.len();
    0.5 * (0..n).map(|i| cross(vertices[i], vertices[(i + 1) % n])).sum::<f32>()
}

pub fn polygon_centroid(vertices: &[Vec2]) -> Vec2 {
    let n = vertices.len();
    let mut acc = Vec2::ZERO;
    let mut area2 = 0.0;
    for i in 0..n {
        let (a, b) = (vertices[i], vertices[(i + 1) % n]);
        let c = cross(a, b);
        acc += (a + b) * c;
        area2 += c;
    }
    if area2.abs() < DEGENERATE_AREA_THRESHOLD {
        return vertices.iter().copied().sum::<Vec2>() / n.max(1) as f32;
    }
    acc / (3.0 * area2)
}

/// Returns `(area, ∫ r² dA)` about the origin for a counter-clockwise polygon.
pub fn area_moments(vertices: &[Vec2]) -> (f32, f32) {
    let n = vertices.len();
    let mut area = 0.0;
    let mut moment = 0.0;
    for i in 0..n {
        let (a, b) = (vertices[i], vertices[(i + 1) % n]);
        let c = cross(a, b);
        area += 0.5 * c;
        moment += c * (a.dot(a) + a.dot(b) + b.dot(b)) / 12.0;
    }
    (area, moment)
}

pub(crate) fn support_of(vertices: &[Vec2], dir: Vec2) -> Vec2 {
    vertices
        .iter()
        .copied()
        .max_by(|a, b| a.dot(dir).total_cmp(&b.dot(dir)))
        .unwrap_or(Vec2::ZERO)
}
