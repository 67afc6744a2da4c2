//! Collision detector that orchestrates broad → mid → narrow → registry.
//!
//! The world syncs collider poses, then calls [`CollisionDetector::refresh`]
//! once per sub-step before running time of impact and detection.

use kinema_math::Vec2;
use kinema_types::ColliderId;
use tracing::debug;

use crate::broad::BroadPhase;
use crate::collider::{Collider, ColliderPose, ColliderSet};
use crate::contact::ContactInfo;
use crate::mid::MidPhase;
use crate::narrow::NarrowPhase;
use crate::registry::{ContactEvent, PairMaterial, PairsRegistry};
use crate::toi::{time_of_first_impact, ToiSettings};

/// Counters and events from one detection round.
#[derive(Debug, Clone, Default)]
pub struct DetectionResult {
    pub candidate_pairs: u32,
    pub contacts_detected: u32,
    pub events: Vec<ContactEvent>,
}

pub struct CollisionDetector {
    colliders: ColliderSet,
    /// Broad phase acceleration structure.
    broad: Box<dyn BroadPhase>,
    mid: MidPhase,
    /// Narrow phase exact testing.
    narrow: Box<dyn NarrowPhase>,
    registry: PairsRegistry,
    toi: ToiSettings,
}

impl CollisionDetector {
    pub fn new(broad: Box<dyn BroadPhase>, narrow: Box<dyn NarrowPhase>) -> Self {
        Self {
            colliders: ColliderSet::new(),
            broad,
            mid: MidPhase::new(),
            narrow,
            registry: PairsRegistry::new(),
            toi: ToiSettings::default(),
        }
    }

    pub fn with_toi(mut self, toi: ToiSettings) -> Self {
        self.toi = toi;
        self
    }

    pub fn broad_phase(&self) -> &dyn BroadPhase {
        self.broad.as_ref()
    }

    pub fn narrow_phase(&self) -> &dyn NarrowPhase {
        self.narrow.as_ref()
    }

    /// Adds a collider and registers a pair with every other collider,
    /// except pairs of two static colliders. Replaces an existing collider
    /// with the same id.
    pub fn add_collider(&mut self, collider: Collider) -> ColliderId {
        let id = collider.id();
        self.remove_collider(id);

        for other in self.colliders.values() {
            if collider.pose().is_static && other.pose().is_static {
                continue;
            }
            self.registry.register_pair(id, other.id());
        }
        self.broad.register(&collider);
        self.colliders.insert(id, collider);
        id
    }

    /// Removes a collider and all its pairs. Live contacts end; their events
    /// are available from [`take_events`](Self::take_events).
    pub fn remove_collider(&mut self, id: ColliderId) -> Option<Collider> {
        let collider = self.colliders.remove(&id)?;
        for pair in self.registry.pairs_of(id) {
            self.registry.unregister_pair(pair);
        }
        self.broad.unregister(id);
        Some(collider)
    }

    pub fn collider(&self, id: ColliderId) -> Option<&Collider> {
        self.colliders.get(&id)
    }

    pub fn collider_mut(&mut self, id: ColliderId) -> Option<&mut Collider> {
        self.colliders.get_mut(&id)
    }

    pub fn colliders(&self) -> &ColliderSet {
        &self.colliders
    }

    pub fn set_pose(&mut self, id: ColliderId, pose: ColliderPose) {
        if let Some(c) = self.colliders.get_mut(&id) {
            c.set_pose(pose);
        }
    }

    /// Re-sorts the broad phase after poses changed.
    pub fn refresh(&mut self) {
        self.broad.update(&self.colliders);
    }

    pub fn registry(&self) -> &PairsRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut PairsRegistry {
        &mut self.registry
    }

    /// Full discrete detection round.
    pub fn detect(&mut self) -> DetectionResult {
        self.registry.validate_pairs();

        let candidates = self.broad.query_pairs(&self.colliders);
        let candidate_pairs = candidates.len() as u32;
        let candidates = self.mid.filter(candidates, &self.registry);
        let infos: Vec<ContactInfo> = self.narrow.detect(&candidates, &self.colliders);
        let contacts_detected = infos.len() as u32;

        for info in infos {
            let material = match (self.colliders.get(&info.collider_a), self.colliders.get(&info.collider_b)) {
                (Some(a), Some(b)) => PairMaterial {
                    friction: 0.5 * (a.material.friction + b.material.friction),
                    restitution: a.material.restitution.max(b.material.restitution),
                    is_virtual: a.is_virtual || b.is_virtual,
                },
                _ => continue,
            };
            self.registry.add_contact(info, material);
        }

        let events = self.registry.emit_events();
        debug!(
            broad = self.broad.name(),
            narrow = self.narrow.name(),
            candidate_pairs,
            contacts_detected,
            events = events.len(),
            "collision detection"
        );

        DetectionResult {
            candidate_pairs,
            contacts_detected,
            events,
        }
    }

    /// Earliest impact fraction of the remaining `span` (1.0 = none).
    pub fn time_of_first_impact(&self, span: f32) -> f32 {
        time_of_first_impact(&self.colliders, self.broad.as_ref(), &self.registry, span, &self.toi)
    }

    /// Events queued by removals and inter-contact changes.
    pub fn take_events(&mut self) -> Vec<ContactEvent> {
        self.registry.take_pending()
    }

    /// Colliders whose bounds touch a swept capsule.
    pub fn query_capsule(&self, a: Vec2, b: Vec2, radius: f32) -> Vec<ColliderId> {
        self.broad.query_capsule(&self.colliders, a, b, radius)
    }

    /// Forgets every collider and pair without emitting events.
    pub fn clear(&mut self) {
        self.colliders.clear();
        self.broad.clear();
        self.registry.clear();
    }
}
