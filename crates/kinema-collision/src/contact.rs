//! Contact data produced by the narrow phase and kept by the registry.

use kinema_math::Vec2;
use kinema_types::{BodyId, ColliderId, PairId, pair_id};
use serde::{Deserialize, Serialize};

/// Ephemeral narrow-phase output for one collider pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub collider_a: ColliderId,
    pub collider_b: ColliderId,
    pub body_a: BodyId,
    pub body_b: BodyId,
    /// Deepest point of A inside B, in world space.
    pub point_a: Vec2,
    /// Deepest point of B inside A, in world space.
    pub point_b: Vec2,
    /// `point_a` in A's local frame.
    pub local_a: Vec2,
    /// `point_b` in B's local frame.
    pub local_b: Vec2,
    /// Unit normal pointing from A towards B.
    pub normal: Vec2,
    /// Penetration depth, non-negative.
    pub depth: f32,
}

impl ContactInfo {
    pub fn pair(&self) -> PairId {
        pair_id(self.collider_a, self.collider_b)
    }

    /// The same contact seen from B's side.
    pub fn flipped(&self) -> ContactInfo {
        ContactInfo {
            collider_a: self.collider_b,
            collider_b: self.collider_a,
            body_a: self.body_b,
            body_b: self.body_a,
            point_a: self.point_b,
            point_b: self.point_a,
            local_a: self.local_b,
            local_b: self.local_a,
            normal: -self.normal,
            depth: self.depth,
        }
    }
}

/// Persistent contact joint for one collider pair.
///
/// Carries the warm-start impulse caches of its normal and friction rows
/// across frames; [`Contact::patch`] refreshes geometry without touching them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub info: ContactInfo,
    /// Mean of both colliders' friction. No friction row when zero.
    pub friction: f32,
    /// Larger of both colliders' restitution.
    pub restitution: f32,
    /// Either collider is virtual: events only, no constraint rows.
    pub is_virtual: bool,
    pub normal_cache: [f32; 2],
    pub friction_cache: [f32; 2],
    /// Frames this contact has persisted.
    pub age: u32,
}

impl Contact {
    pub fn new(info: ContactInfo, friction: f32, restitution: f32, is_virtual: bool) -> Self {
        Self {
            info,
            friction,
            restitution,
            is_virtual,
            normal_cache: [0.0; 2],
            friction_cache: [0.0; 2],
            age: 0,
        }
    }

    /// Refreshes the contact geometry, keeping accumulated impulses.
    ///
    /// Collider order in `info` may differ from the stored order.
    pub fn patch(&mut self, info: ContactInfo) {
        self.info = if info.collider_a == self.info.collider_a {
            info
        } else {
            info.flipped()
        };
        self.age = self.age.saturating_add(1);
    }

    pub fn has_friction(&self) -> bool {
        self.friction > 0.0
    }

    pub fn pair(&self) -> PairId {
        self.info.pair()
    }
}
