//! World event types.
//!
//! Lightweight value types carrying ids only; handlers look entities up
//! through the world between steps.

use kinema_types::{BodyId, ColliderId, IslandId, JointId, PairId};
use serde::{Deserialize, Serialize};

/// Contact participants, shared by begin/end notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRef {
    pub pair: PairId,
    pub collider_a: ColliderId,
    pub collider_b: ColliderId,
    pub body_a: BodyId,
    pub body_b: BodyId,
}

/// An event emitted by the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorldEvent {
    BodyCreated { body: BodyId },
    BodyDestroyed { body: BodyId },
    ColliderAdded { collider: ColliderId, body: BodyId },
    ColliderRemoved { collider: ColliderId, body: BodyId },
    JointAdded { joint: JointId },
    JointRemoved { joint: JointId },
    Awake { body: BodyId },
    FallAsleep { body: BodyId },
    /// Step started. `time` is the simulated time after this step.
    PreStep { frame: u64, time: f64 },
    PostStep { frame: u64, time: f64 },
    IslandPreStep { island: IslandId, bodies: usize },
    IslandPostStep { island: IslandId, bodies: usize },
    ContactBegin(ContactRef),
    ContactEnd(ContactRef),
}

/// Payload-free discriminant used as the subscription key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventKind {
    BodyCreated,
    BodyDestroyed,
    ColliderAdded,
    ColliderRemoved,
    JointAdded,
    JointRemoved,
    Awake,
    FallAsleep,
    PreStep,
    PostStep,
    IslandPreStep,
    IslandPostStep,
    ContactBegin,
    ContactEnd,
}

impl WorldEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            WorldEvent::BodyCreated { .. } => EventKind::BodyCreated,
            WorldEvent::BodyDestroyed { .. } => EventKind::BodyDestroyed,
            WorldEvent::ColliderAdded { .. } => EventKind::ColliderAdded,
            WorldEvent::ColliderRemoved { .. } => EventKind::ColliderRemoved,
            WorldEvent::JointAdded { .. } => EventKind::JointAdded,
            WorldEvent::JointRemoved { .. } => EventKind::JointRemoved,
            WorldEvent::Awake { .. } => EventKind::Awake,
            WorldEvent::FallAsleep { .. } => EventKind::FallAsleep,
            WorldEvent::PreStep { .. } => EventKind::PreStep,
            WorldEvent::PostStep { .. } => EventKind::PostStep,
            WorldEvent::IslandPreStep { .. } => EventKind::IslandPreStep,
            WorldEvent::IslandPostStep { .. } => EventKind::IslandPostStep,
            WorldEvent::ContactBegin(_) => EventKind::ContactBegin,
            WorldEvent::ContactEnd(_) => EventKind::ContactEnd,
        }
    }
}
