//! Triangle-soup shapes.
//!
//! A mesh keeps its triangles as convex polygons for narrow-phase reuse,
//! a convex hull for support queries and bounds, and an [`ObbTree`] so
//! collision queries touch O(log n) triangles instead of all of them.

use kinema_math::{Affine2, Vec2};
use kinema_types::constants::DEGENERATE_AREA_THRESHOLD;
use kinema_types::{KinemaError, KinemaResult};
use tracing::debug;

use crate::aabb::Aabb;
use crate::hull::convex_hull;
use crate::obb::ObbTree;
use crate::polygon::{area_moments, polygon_centroid, signed_area, support_of, Polygon};

#[derive(Debug, Clone)]
pub struct MeshShape {
    triangles: Vec<Polygon>,
    hull: Vec<Vec2>,
    tree: ObbTree,
    radius: f32,
}

impl MeshShape {
    /// Builds a mesh from a triangle soup in body-local coordinates.
    pub fn new(triangles: Vec<[Vec2; 3]>) -> KinemaResult<Self> {
        if triangles.is_empty() {
            return Err(KinemaError::InvalidShape("mesh has no triangles".into()));
        }

        let mut polygons = Vec::with_capacity(triangles.len());
        for (i, t) in triangles.iter().enumerate() {
            if signed_area(t).abs() < DEGENERATE_AREA_THRESHOLD {
                return Err(KinemaError::InvalidShape(format!("mesh triangle {i} is degenerate")));
            }
            polygons.push(Polygon::new(t.to_vec())?);
        }

        let points: Vec<Vec2> = triangles.iter().flatten().copied().collect();
        let hull = convex_hull(&points);
        let radius = hull.iter().map(|v| v.length()).fold(0.0, f32::max);
        let tree = ObbTree::build(&triangles)?;

        debug!(triangles = triangles.len(), nodes = tree.nodes().len(), "built mesh obb tree");

        Ok(Self {
            triangles: polygons,
            hull,
            tree,
            radius,
        })
    }

    /// Like [`MeshShape::new`], but first moves the soup so its area centroid
    /// sits on the local origin (the body's centre of mass).
    pub fn centered(triangles: Vec<[Vec2; 3]>) -> KinemaResult<Self> {
        let centroid = soup_centroid(&triangles);
        let shifted = triangles
            .into_iter()
            .map(|t| [t[0] - centroid, t[1] - centroid, t[2] - centroid])
            .collect();
        Self::new(shifted)
    }

    pub fn triangles(&self) -> &[Polygon] {
        &self.triangles
    }

    pub fn triangle(&self, index: usize) -> Option<&Polygon> {
        self.triangles.get(index)
    }

    pub fn hull(&self) -> &[Vec2] {
        &self.hull
    }

    pub fn tree(&self) -> &ObbTree {
        &self.tree
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn aabb(&self, transform: &Affine2) -> Aabb {
        Aabb::from_points(self.hull.iter().map(|&v| transform.transform_point2(v)))
    }

    pub fn support(&self, dir: Vec2) -> Vec2 {
        support_of(&self.hull, dir)
    }

    pub fn test_point(&self, local: Vec2) -> bool {
        self.triangles.iter().any(|t| t.test_point(local))
    }

    /// Triangles whose bounds may overlap `world_aabb` with the mesh at `transform`.
    pub fn query(&self, world_aabb: &Aabb, transform: &Affine2) -> Vec<usize> {
        self.tree.query(world_aabb, transform)
    }

    pub fn area(&self) -> f32 {
        self.triangles.iter().map(|t| t.area()).sum()
    }

    pub fn centroid(&self) -> Vec2 {
        let area = self.area();
        if area.abs() < DEGENERATE_AREA_THRESHOLD {
            return Vec2::ZERO;
        }
        self.triangles
            .iter()
            .map(|t| t.centroid() * t.area())
            .sum::<Vec2>()
            / area
    }

    /// Moment of inertia about the local origin, mass spread by area.
    pub fn inertia(&self, mass: f32) -> f32 {
        let (area, moment) = self
            .triangles
            .iter()
            .map(|t| area_moments(t.vertices()))
            .fold((0.0, 0.0), |acc, m| (acc.0 + m.0, acc.1 + m.1));
        if area.abs() < DEGENERATE_AREA_THRESHOLD {
            return 0.0;
        }
        mass * moment / area
    }
}

fn soup_centroid(triangles: &[[Vec2; 3]]) -> Vec2 {
    let mut acc = Vec2::ZERO;
    let mut total = 0.0;
    for t in triangles {
        let a = signed_area(t).abs();
        acc += polygon_centroid(t) * a;
        total += a;
    }
    if total < DEGENERATE_AREA_THRESHOLD {
        return Vec2::ZERO;
    }
    acc / total
}
