//! Colliders bind a shape to a body with a mask and material.

use std::collections::BTreeMap;

use kinema_geometry::{Aabb, ConvexProxy, Shape};
use kinema_math::{pose, Affine2, Vec2};
use kinema_types::constants::MASK_ALL;
use kinema_types::{BodyId, ColliderId};
use serde::{Deserialize, Serialize};

/// Surface and damping coefficients of a collider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    pub friction: f32,
    pub restitution: f32,
    /// Linear damping applied as `-damping * velocity`.
    pub damping: f32,
    /// Angular damping applied as `-angular_damping * omega`.
    pub angular_damping: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            friction: 0.5,
            restitution: 0.5,
            damping: 0.1,
            angular_damping: 0.1,
        }
    }
}

/// Snapshot of the owning body's kinematic state, synced before detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColliderPose {
    pub transform: Affine2,
    pub position: Vec2,
    pub angle: f32,
    pub velocity: Vec2,
    pub omega: f32,
    pub is_static: bool,
    pub continuous: bool,
}

impl Default for ColliderPose {
    fn default() -> Self {
        Self {
            transform: Affine2::IDENTITY,
            position: Vec2::ZERO,
            angle: 0.0,
            velocity: Vec2::ZERO,
            omega: 0.0,
            is_static: false,
            continuous: false,
        }
    }
}

impl ColliderPose {
    /// Pose reached after moving for `dt` at the current velocities.
    pub fn advanced(&self, dt: f32) -> Affine2 {
        pose(self.position + self.velocity * dt, self.angle + self.omega * dt)
    }
}

#[derive(Debug, Clone)]
pub struct Collider {
    id: ColliderId,
    pub shape: Shape,
    /// Two colliders may touch only if their masks share a bit.
    pub mask: u32,
    pub material: Material,
    /// Virtual colliders report contact events but never push back.
    pub is_virtual: bool,
    pose: ColliderPose,
    aabb: Aabb,
}

impl Collider {
    pub fn new(body: BodyId, shape: Shape) -> Self {
        let pose = ColliderPose::default();
        let aabb = shape.aabb(&pose.transform);
        Self {
            id: ColliderId::from(body),
            shape,
            mask: MASK_ALL,
            material: Material::default(),
            is_virtual: false,
            pose,
            aabb,
        }
    }

    pub fn with_mask(mut self, mask: u32) -> Self {
        self.mask = mask;
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    pub fn with_virtual(mut self, is_virtual: bool) -> Self {
        self.is_virtual = is_virtual;
        self
    }

    pub fn id(&self) -> ColliderId {
        self.id
    }

    pub fn body(&self) -> BodyId {
        self.id.body()
    }

    pub fn pose(&self) -> &ColliderPose {
        &self.pose
    }

    /// Replaces the cached pose and recomputes the bounding box.
    pub fn set_pose(&mut self, pose: ColliderPose) {
        self.pose = pose;
        self.aabb = self.shape.aabb(&pose.transform);
    }

    pub fn aabb(&self) -> &Aabb {
        &self.aabb
    }

    pub fn radius(&self) -> f32 {
        self.shape.radius()
    }

    pub fn proxy(&self) -> Option<ConvexProxy> {
        self.shape.proxy(&self.pose.transform)
    }

    pub fn accepts(&self, other: &Collider) -> bool {
        self.mask & other.mask != 0
    }
}

/// Colliders keyed by id, ordered for deterministic iteration.
pub type ColliderSet = BTreeMap<ColliderId, Collider>;
