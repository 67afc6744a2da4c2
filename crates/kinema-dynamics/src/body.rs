//! Rigid bodies.
//!
//! A body with infinite mass and infinite inertia is static: it never moves
//! under forces, never sleeps and never joins an island.

use std::collections::BTreeSet;

use kinema_math::{cross, pose, Affine2, Vec2};
use kinema_types::{BodyId, ColliderId, IslandId, JointId, KinemaError, KinemaResult, PairId};
use serde::{Deserialize, Serialize};

use crate::config::WorldSettings;

/// Initial state of a new body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyDef {
    pub mass: f32,
    pub inertia: f32,
    pub position: Vec2,
    pub angle: f32,
    pub velocity: Vec2,
    pub omega: f32,
    /// Sweep the body for time of impact every step.
    pub continuous: bool,
}

impl Default for BodyDef {
    fn default() -> Self {
        Self {
            mass: 1.0,
            inertia: 1.0,
            position: Vec2::ZERO,
            angle: 0.0,
            velocity: Vec2::ZERO,
            omega: 0.0,
            continuous: false,
        }
    }
}

impl BodyDef {
    pub fn dynamic(mass: f32, inertia: f32) -> Self {
        Self {
            mass,
            inertia,
            ..Default::default()
        }
    }

    /// A static body: infinite mass and inertia.
    pub fn fixed() -> Self {
        Self::dynamic(f32::INFINITY, f32::INFINITY)
    }

    pub fn at(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_omega(mut self, omega: f32) -> Self {
        self.omega = omega;
        self
    }

    pub fn continuous(mut self) -> Self {
        self.continuous = true;
        self
    }

    /// Mass and inertia must be positive, infinity included.
    pub fn validate(&self) -> KinemaResult<()> {
        check_positive("mass", self.mass)?;
        check_positive("inertia", self.inertia)
    }
}

fn check_positive(name: &str, value: f32) -> KinemaResult<()> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(KinemaError::InvalidConfig(format!("body {name} must be positive, got {value}")))
    }
}

/// Sleep state change reported by [`Body::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepChange {
    Awake,
    FallAsleep,
}

#[derive(Debug, Clone)]
pub struct Body {
    id: BodyId,
    mass: f32,
    inv_mass: f32,
    inertia: f32,
    inv_inertia: f32,
    pub position: Vec2,
    pub velocity: Vec2,
    pub angle: f32,
    pub omega: f32,
    force: Vec2,
    torque: f32,
    transform: Affine2,
    inv_transform: Affine2,
    is_sleeping: bool,
    sleep_timer: f32,
    fall_asleep_timer: f32,
    continuous: bool,
    pub(crate) joints: BTreeSet<JointId>,
    pub(crate) contacts: BTreeSet<PairId>,
    pub(crate) collider: Option<ColliderId>,
    pub(crate) island: Option<IslandId>,
    pub(crate) island_index: Option<usize>,
}

impl Body {
    pub(crate) fn new(id: BodyId, def: &BodyDef, fall_asleep_timer: f32) -> Self {
        let mut body = Self {
            id,
            mass: 0.0,
            inv_mass: 0.0,
            inertia: 0.0,
            inv_inertia: 0.0,
            position: def.position,
            velocity: def.velocity,
            angle: def.angle,
            omega: def.omega,
            force: Vec2::ZERO,
            torque: 0.0,
            transform: Affine2::IDENTITY,
            inv_transform: Affine2::IDENTITY,
            is_sleeping: false,
            sleep_timer: fall_asleep_timer,
            fall_asleep_timer,
            continuous: def.continuous,
            joints: BTreeSet::new(),
            contacts: BTreeSet::new(),
            collider: None,
            island: None,
            island_index: None,
        };
        body.mass = def.mass;
        body.inv_mass = 1.0 / def.mass;
        body.inertia = def.inertia;
        body.inv_inertia = 1.0 / def.inertia;
        body.update_transform();
        body
    }

    pub fn id(&self) -> BodyId {
        self.id
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn inv_mass(&self) -> f32 {
        self.inv_mass
    }

    /// Fails on zero, negative or NaN mass.
    pub fn set_mass(&mut self, mass: f32) -> KinemaResult<()> {
        check_positive("mass", mass)?;
        self.mass = mass;
        self.inv_mass = 1.0 / mass;
        Ok(())
    }

    pub fn inertia(&self) -> f32 {
        self.inertia
    }

    pub fn inv_inertia(&self) -> f32 {
        self.inv_inertia
    }

    pub fn set_inertia(&mut self, inertia: f32) -> KinemaResult<()> {
        check_positive("inertia", inertia)?;
        self.inertia = inertia;
        self.inv_inertia = 1.0 / inertia;
        Ok(())
    }

    pub fn is_static(&self) -> bool {
        !self.mass.is_finite() && !self.inertia.is_finite()
    }

    pub fn is_sleeping(&self) -> bool {
        self.is_sleeping
    }

    pub fn is_continuous(&self) -> bool {
        self.continuous
    }

    pub fn set_continuous(&mut self, continuous: bool) {
        self.continuous = continuous;
    }

    pub fn force(&self) -> Vec2 {
        self.force
    }

    pub fn torque(&self) -> f32 {
        self.torque
    }

    pub fn transform(&self) -> &Affine2 {
        &self.transform
    }

    pub fn inv_transform(&self) -> &Affine2 {
        &self.inv_transform
    }

    pub fn collider(&self) -> Option<ColliderId> {
        self.collider
    }

    pub fn joints(&self) -> impl Iterator<Item = JointId> + '_ {
        self.joints.iter().copied()
    }

    /// Pairs with a live contact involving this body.
    pub fn contacts(&self) -> impl Iterator<Item = PairId> + '_ {
        self.contacts.iter().copied()
    }

    /// Island of the last advance, if the body was part of one.
    pub fn island(&self) -> Option<IslandId> {
        self.island
    }

    /// Row of this body within its island.
    pub fn island_index(&self) -> Option<usize> {
        self.island_index
    }

    /// Recomputes the cached transforms from position and angle.
    pub fn update_transform(&mut self) {
        self.transform = pose(self.position, self.angle);
        self.inv_transform = self.transform.inverse();
    }

    /// Accumulates a force until the end of the step. With a body-local
    /// `point` the force also produces torque. Wakes the body.
    pub fn apply_force(&mut self, force: Vec2, point: Option<Vec2>) {
        self.force += force;
        if let Some(local) = point {
            let r = self.transform.transform_point2(local) - self.position;
            self.torque += cross(r, force);
        }
        self.awake();
    }

    pub fn apply_torque(&mut self, torque: f32) {
        self.torque += torque;
        self.awake();
    }

    /// Accumulates world forces without waking the body.
    pub(crate) fn add_force(&mut self, force: Vec2, torque: f32) {
        self.force += force;
        self.torque += torque;
    }

    pub fn clear_forces(&mut self) {
        self.force = Vec2::ZERO;
        self.torque = 0.0;
    }

    pub fn to_local_point(&self, global: Vec2) -> Vec2 {
        self.inv_transform.transform_point2(global)
    }

    pub fn to_global_point(&self, local: Vec2) -> Vec2 {
        self.transform.transform_point2(local)
    }

    /// Wakes the body and restarts its sleep countdown. Returns whether it
    /// was sleeping.
    pub fn awake(&mut self) -> bool {
        let was_sleeping = self.is_sleeping;
        self.is_sleeping = false;
        self.sleep_timer = self.fall_asleep_timer;
        was_sleeping
    }

    pub(crate) fn fall_asleep(&mut self) {
        self.is_sleeping = true;
        self.velocity = Vec2::ZERO;
        self.omega = 0.0;
    }

    /// Sleep bookkeeping at the end of a step. A body below both velocity
    /// thresholds for `fall_asleep_timer` seconds falls asleep; any faster
    /// body is awake with a fresh countdown.
    pub(crate) fn tick(&mut self, dt: f32, settings: &WorldSettings) -> Option<SleepChange> {
        if self.is_static() {
            return None;
        }

        let resting = self.velocity.length() <= settings.sleeping_velocity_threshold
            && self.omega.abs() <= settings.sleeping_angular_velocity_threshold;

        if resting {
            if self.is_sleeping {
                return None;
            }
            self.sleep_timer -= dt;
            if self.sleep_timer <= 0.0 {
                self.fall_asleep();
                return Some(SleepChange::FallAsleep);
            }
            None
        } else if self.awake() {
            Some(SleepChange::Awake)
        } else {
            None
        }
    }
}
