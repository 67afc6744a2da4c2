//! Continuous collision detection: time of first impact.
//!
//! Each continuous body is swept as a capsule from its current position to
//! where it would be after the remaining span. Surviving pairs are advanced
//! conservatively along their GJK distance until they overlap by at most
//! the target depth. The step loop then sub-steps to the earliest impact.

use kinema_geometry::aabb::segment_segment_distance_squared;
use kinema_geometry::ConvexProxy;
use kinema_math::pose;
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::broad::BroadPhase;
use crate::collider::{Collider, ColliderSet};
use crate::gjk;
use crate::registry::PairsRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToiSettings {
    /// Fractions below this are treated as "no impact".
    pub epsilon: f32,
    pub max_iterations: u32,
    /// Overlap the search aims for, so discrete detection sees the contact.
    pub target_depth: f32,
}

impl Default for ToiSettings {
    fn default() -> Self {
        Self {
            epsilon: 1e-3,
            max_iterations: 32,
            target_depth: 0.01,
        }
    }
}

/// Earliest impact fraction in `[0, 1]` of the remaining `span` over every
/// pair with a continuous member. Returns `1.0` when nothing hits.
pub fn time_of_first_impact(
    colliders: &ColliderSet,
    broad: &dyn BroadPhase,
    registry: &PairsRegistry,
    span: f32,
    settings: &ToiSettings,
) -> f32 {
    let continuous: Vec<&Collider> = colliders
        .values()
        .filter(|c| c.pose().continuous && !c.pose().is_static && !c.is_virtual)
        .collect();
    if continuous.is_empty() || span <= 0.0 {
        return 1.0;
    }

    let eligible = |a: &Collider, b: &Collider| {
        a.accepts(b)
            && !b.is_virtual
            && !a.shape.is_mesh()
            && !b.shape.is_mesh()
            && registry
                .pair(kinema_types::pair_id(a.id(), b.id()))
                .is_some_and(|e| e.intercontact)
    };

    let mut toi = 1.0f32;

    for (i, a) in continuous.iter().enumerate() {
        let (a0, a1) = sweep(a, span);
        let ra = a.radius();

        for b in &continuous[i + 1..] {
            let (b0, b1) = sweep(b, span);
            let reach = ra + b.radius();
            if segment_segment_distance_squared(a0, a1, b0, b1) <= reach * reach && eligible(a, b) {
                toi = toi.min(pair_toi(a, b, span, settings));
            }
        }

        for id in broad.query_capsule(colliders, a0, a1, ra) {
            let Some(b) = colliders.get(&id) else { continue };
            if b.id() == a.id() || b.pose().continuous {
                continue;
            }
            if (a.shape.is_mesh() || b.shape.is_mesh()) && a.accepts(b) {
                warn!(a = %a.id(), b = %b.id(), "mesh pair skipped by time of impact");
                continue;
            }
            if eligible(a, b) {
                toi = toi.min(pair_toi(a, b, span, settings));
            }
        }
    }

    if toi < settings.epsilon {
        1.0
    } else {
        toi
    }
}

fn sweep(c: &Collider, span: f32) -> (kinema_math::Vec2, kinema_math::Vec2) {
    let p = c.pose();
    (p.position, p.position + p.velocity * span)
}

fn proxy_at(c: &Collider, span: f32, t: f32) -> Option<ConvexProxy> {
    let p = c.pose();
    let dt = span * t;
    c.shape.proxy(&pose(p.position + p.velocity * dt, p.angle + p.omega * dt))
}

/// Conservative advancement for one pair.
///
/// Each iteration moves the shapes forward by the time they need to close
/// their current gap plus the target depth at the fastest possible approach
/// speed, so the overlap at the returned fraction never exceeds the target.
fn pair_toi(a: &Collider, b: &Collider, span: f32, settings: &ToiSettings) -> f32 {
    let (pa, pb) = (a.pose(), b.pose());
    let angular = (pa.omega.abs() * a.radius() + pb.omega.abs() * b.radius()) * span;
    let mut t = 0.0f32;

    for iteration in 0..settings.max_iterations {
        let (Some(xa), Some(xb)) = (proxy_at(a, span, t), proxy_at(b, span, t)) else {
            return 1.0;
        };
        let out = gjk::distance(&xa, &xb);
        let gap = out.gap(&xa, &xb);

        if out.overlap || gap <= 0.0 {
            // Already touching at the start: discrete detection owns this pair.
            let hit = if iteration == 0 { 1.0 } else { t };
            trace!(a = %a.id(), b = %b.id(), toi = hit, "time of impact");
            return hit;
        }

        let approach = out
            .normal()
            .map_or(0.0, |n| (pa.velocity - pb.velocity).dot(n).max(0.0) * span);
        let bound = approach + angular;
        if bound <= f32::EPSILON {
            return 1.0;
        }

        t += (gap + settings.target_depth) / bound;
        if t >= 1.0 {
            return 1.0;
        }
    }

    t
}
