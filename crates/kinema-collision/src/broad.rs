//! Broad phase collision detection trait.
//!
//! Quickly identifies *candidate* collider pairs by bounding-box overlap.
//! The narrow phase then refines these candidates into actual contacts.

use std::collections::BTreeSet;

use kinema_math::Vec2;
use kinema_types::{pair_id, ColliderId, PairId};

use crate::collider::{Collider, ColliderSet};

/// Candidate pair from broad phase. `a < b` always.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CandidatePair {
    pub a: ColliderId,
    pub b: ColliderId,
    pub pair: PairId,
}

impl CandidatePair {
    pub fn new(a: ColliderId, b: ColliderId) -> Self {
        let (a, b) = if a <= b { (a, b) } else { (b, a) };
        Self { a, b, pair: pair_id(a, b) }
    }
}

/// Trait for broad phase collision detection.
///
/// # Implementations
/// - [`NaiveBroadPhase`]: all-pairs bounding box test
/// - [`SweepAndPrune`](crate::sap::SweepAndPrune): sorted interval sweep on both axes
pub trait BroadPhase: Send + Sync {
    /// Start tracking a collider.
    fn register(&mut self, collider: &Collider);

    /// Stop tracking a collider. Unknown ids are ignored.
    fn unregister(&mut self, id: ColliderId);

    /// Refresh the acceleration structure from the colliders' cached boxes.
    fn update(&mut self, colliders: &ColliderSet);

    /// Pairs whose boxes overlap and whose masks intersect, ordered by pair id.
    fn query_pairs(&self, colliders: &ColliderSet) -> Vec<CandidatePair>;

    /// Colliders whose boxes touch the capsule swept by a disc of `radius`
    /// from `a` to `b`, ordered by id.
    fn query_capsule(&self, colliders: &ColliderSet, a: Vec2, b: Vec2, radius: f32) -> Vec<ColliderId>;

    /// Drop every tracked collider.
    fn clear(&mut self);

    /// Returns the broad phase strategy name.
    fn name(&self) -> &str;
}

/// Tests every tracked pair. Quadratic, but exact and allocation-light for small scenes.
#[derive(Debug, Default)]
pub struct NaiveBroadPhase {
    tracked: BTreeSet<ColliderId>,
}

impl NaiveBroadPhase {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BroadPhase for NaiveBroadPhase {
    fn register(&mut self, collider: &Collider) {
        self.tracked.insert(collider.id());
    }

    fn unregister(&mut self, id: ColliderId) {
        self.tracked.remove(&id);
    }

    fn update(&mut self, _colliders: &ColliderSet) {}

    fn query_pairs(&self, colliders: &ColliderSet) -> Vec<CandidatePair> {
        let live: Vec<&Collider> = self.tracked.iter().filter_map(|id| colliders.get(id)).collect();
        let mut pairs = Vec::new();
        for (i, a) in live.iter().enumerate() {
            for b in &live[i + 1..] {
                if a.accepts(b) && a.aabb().overlaps(b.aabb()) {
                    pairs.push(CandidatePair::new(a.id(), b.id()));
                }
            }
        }
        pairs.sort_by_key(|p| p.pair);
        pairs
    }

    fn query_capsule(&self, colliders: &ColliderSet, a: Vec2, b: Vec2, radius: f32) -> Vec<ColliderId> {
        capsule_filter(self.tracked.iter().copied(), colliders, a, b, radius)
    }

    fn clear(&mut self) {
        self.tracked.clear();
    }

    fn name(&self) -> &str {
        "naive"
    }
}

/// Box prefilter followed by the exact capsule-vs-box test.
pub(crate) fn capsule_filter(
    ids: impl Iterator<Item = ColliderId>,
    colliders: &ColliderSet,
    a: Vec2,
    b: Vec2,
    radius: f32,
) -> Vec<ColliderId> {
    let sweep = kinema_geometry::Aabb::of_capsule(a, b, radius);
    ids.filter(|id| {
        colliders.get(id).is_some_and(|c| {
            let aabb = c.aabb();
            aabb.overlaps(&sweep) && aabb.test_capsule(a, b, radius)
        })
    })
    .collect()
}
