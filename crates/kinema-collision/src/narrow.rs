//! Narrow phase collision detection trait.
//!
//! Refines broad phase candidates into exact contact data. Strategies
//! implement a single convex-vs-convex primitive; routing of mesh shapes
//! through their OBB trees is shared.

use kinema_geometry::{ConvexProxy, Shape};
use kinema_math::Vec2;

use crate::broad::CandidatePair;
use crate::collider::{Collider, ColliderSet};
use crate::contact::ContactInfo;

/// Result of a convex-vs-convex test, in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Manifold {
    /// Unit normal from the first proxy towards the second.
    pub normal: Vec2,
    pub depth: f32,
    /// Deepest point of the first proxy.
    pub point_a: Vec2,
    /// Deepest point of the second proxy.
    pub point_b: Vec2,
}

impl Manifold {
    pub fn flipped(self) -> Manifold {
        Manifold {
            normal: -self.normal,
            depth: self.depth,
            point_a: self.point_b,
            point_b: self.point_a,
        }
    }
}

/// Trait for narrow phase collision detection.
///
/// # Implementations
/// - [`SatNarrowPhase`](crate::sat::SatNarrowPhase): separating axes with face clipping
/// - [`GjkEpaNarrowPhase`](crate::gjk::GjkEpaNarrowPhase): GJK distance with EPA recovery
pub trait NarrowPhase: Send + Sync {
    /// Tests two convex proxies. Returns `None` when they do not touch.
    fn collide(&self, a: &ConvexProxy, b: &ConvexProxy) -> Option<Manifold>;

    /// Returns the narrow phase strategy name.
    fn name(&self) -> &str;

    /// Runs the pair test for every candidate. Yields at most one contact per pair.
    fn detect(&self, candidates: &[CandidatePair], colliders: &ColliderSet) -> Vec<ContactInfo> {
        candidates
            .iter()
            .filter_map(|c| {
                let a = colliders.get(&c.a)?;
                let b = colliders.get(&c.b)?;
                let m = collide_colliders(self, a, b)?;
                Some(contact_info(a, b, m))
            })
            .collect()
    }
}

/// Pair test with mesh routing. Meshes are narrowed to candidate leaf
/// triangles through their OBB tree; the deepest triangle contact wins.
pub fn collide_colliders<N: NarrowPhase + ?Sized>(narrow: &N, a: &Collider, b: &Collider) -> Option<Manifold> {
    match (&a.shape, &b.shape) {
        (Shape::Mesh(_), Shape::Mesh(_)) => mesh_vs_mesh(narrow, a, b),
        (Shape::Mesh(_), _) => mesh_vs_convex(narrow, a, &b.proxy()?),
        (_, Shape::Mesh(_)) => mesh_vs_convex(narrow, b, &a.proxy()?).map(Manifold::flipped),
        _ => narrow.collide(&a.proxy()?, &b.proxy()?),
    }
}

fn deepest(best: Option<Manifold>, next: Option<Manifold>) -> Option<Manifold> {
    match (best, next) {
        (Some(x), Some(y)) => Some(if y.depth > x.depth { y } else { x }),
        (x, None) => x,
        (None, y) => y,
    }
}

fn mesh_vs_convex<N: NarrowPhase + ?Sized>(narrow: &N, mesh: &Collider, other: &ConvexProxy) -> Option<Manifold> {
    let Shape::Mesh(shape) = &mesh.shape else {
        return None;
    };
    let transform = &mesh.pose().transform;
    shape
        .query(&other.aabb(), transform)
        .into_iter()
        .filter_map(|i| shape.triangle(i))
        .map(|tri| narrow.collide(&tri.proxy(transform), other))
        .fold(None, deepest)
}

fn mesh_vs_mesh<N: NarrowPhase + ?Sized>(narrow: &N, a: &Collider, b: &Collider) -> Option<Manifold> {
    let (Shape::Mesh(ma), Shape::Mesh(mb)) = (&a.shape, &b.shape) else {
        return None;
    };
    let (ta, tb) = (&a.pose().transform, &b.pose().transform);
    let mut best = None;
    for i in ma.query(b.aabb(), ta) {
        let Some(tri_a) = ma.triangle(i) else { continue };
        let proxy_a = tri_a.proxy(ta);
        for j in mb.query(&proxy_a.aabb(), tb) {
            if let Some(tri_b) = mb.triangle(j) {
                best = deepest(best, narrow.collide(&proxy_a, &tri_b.proxy(tb)));
            }
        }
    }
    best
}

/// Builds the registry-facing contact from a manifold between `a` and `b`.
pub fn contact_info(a: &Collider, b: &Collider, m: Manifold) -> ContactInfo {
    ContactInfo {
        collider_a: a.id(),
        collider_b: b.id(),
        body_a: a.body(),
        body_b: b.body(),
        point_a: m.point_a,
        point_b: m.point_b,
        local_a: a.pose().transform.inverse().transform_point2(m.point_a),
        local_b: b.pose().transform.inverse().transform_point2(m.point_b),
        normal: m.normal,
        depth: m.depth.max(0.0),
    }
}
