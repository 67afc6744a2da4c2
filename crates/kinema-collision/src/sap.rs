//! Sweep-and-prune broad phase.
//!
//! Each axis keeps a list of interval endpoints. Positions change little
//! between steps, so the lists are re-sorted with an insertion sort that
//! runs in near-linear time on almost-sorted input. A left-to-right sweep
//! with an active set yields per-axis overlaps; candidates are the pairs
//! overlapping on both axes whose masks intersect.

use std::collections::BTreeSet;

use kinema_math::Vec2;
use kinema_types::{ColliderId, PairId};

use crate::broad::{capsule_filter, BroadPhase, CandidatePair};
use crate::collider::{Collider, ColliderSet};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Endpoint {
    id: ColliderId,
    value: f32,
    is_start: bool,
}

impl Endpoint {
    /// Starts sort before ends at equal values so touching intervals overlap.
    fn precedes(&self, other: &Endpoint) -> bool {
        self.value < other.value || (self.value == other.value && self.is_start && !other.is_start)
    }
}

#[derive(Debug, Default)]
struct Axis {
    endpoints: Vec<Endpoint>,
}

impl Axis {
    fn insert(&mut self, id: ColliderId, lo: f32, hi: f32) {
        self.endpoints.push(Endpoint { id, value: lo, is_start: true });
        self.endpoints.push(Endpoint { id, value: hi, is_start: false });
        self.resort();
    }

    fn remove(&mut self, id: ColliderId) {
        self.endpoints.retain(|e| e.id != id);
    }

    fn refresh(&mut self, colliders: &ColliderSet, axis: usize) {
        for e in &mut self.endpoints {
            if let Some(c) = colliders.get(&e.id) {
                let aabb = c.aabb();
                e.value = if e.is_start { aabb.min[axis] } else { aabb.max[axis] };
            }
        }
        self.resort();
    }

    fn resort(&mut self) {
        let list = &mut self.endpoints;
        for j in 1..list.len() {
            let mut k = j;
            while k > 0 && list[k].precedes(&list[k - 1]) {
                list.swap(k - 1, k);
                k -= 1;
            }
        }
    }

    fn overlaps(&self) -> BTreeSet<PairId> {
        let mut active: Vec<ColliderId> = Vec::new();
        let mut found = BTreeSet::new();
        for e in &self.endpoints {
            if e.is_start {
                for &other in &active {
                    found.insert(CandidatePair::new(e.id, other).pair);
                }
                active.push(e.id);
            } else if let Some(pos) = active.iter().position(|&id| id == e.id) {
                active.swap_remove(pos);
            }
        }
        found
    }
}

/// Sweep-and-prune over the X and Y axes.
#[derive(Debug, Default)]
pub struct SweepAndPrune {
    axes: [Axis; 2],
    tracked: BTreeSet<ColliderId>,
}

impl SweepAndPrune {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tracked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracked.is_empty()
    }
}

impl BroadPhase for SweepAndPrune {
    fn register(&mut self, collider: &Collider) {
        let id = collider.id();
        if !self.tracked.insert(id) {
            return;
        }
        let aabb = collider.aabb();
        for (axis, list) in self.axes.iter_mut().enumerate() {
            list.insert(id, aabb.min[axis], aabb.max[axis]);
        }
    }

    fn unregister(&mut self, id: ColliderId) {
        if !self.tracked.remove(&id) {
            return;
        }
        for list in &mut self.axes {
            list.remove(id);
        }
    }

    fn update(&mut self, colliders: &ColliderSet) {
        for (axis, list) in self.axes.iter_mut().enumerate() {
            list.refresh(colliders, axis);
        }
    }

    fn query_pairs(&self, colliders: &ColliderSet) -> Vec<CandidatePair> {
        let x = self.axes[0].overlaps();
        let y = self.axes[1].overlaps();

        x.intersection(&y)
            .filter_map(|&pair| {
                let (a, b) = pair.colliders();
                let (ca, cb) = (colliders.get(&a)?, colliders.get(&b)?);
                ca.accepts(cb).then(|| CandidatePair::new(a, b))
            })
            .collect()
    }

    fn query_capsule(&self, colliders: &ColliderSet, a: Vec2, b: Vec2, radius: f32) -> Vec<ColliderId> {
        capsule_filter(self.tracked.iter().copied(), colliders, a, b, radius)
    }

    fn clear(&mut self) {
        self.tracked.clear();
        for list in &mut self.axes {
            list.endpoints.clear();
        }
    }

    fn name(&self) -> &str {
        "sweep-and-prune"
    }
}
