//! The simulation world.
//!
//! Owns bodies, joints, the collision detector and the event bus. Every
//! public mutation queues its events and flushes them before returning, so
//! handlers always observe a consistent world.
//!
//! ```text
//! step(dt):
//!   PreStep → global forces
//!   repeat (at most toi_substeps times):
//!     sync poses → time of impact → detection → advance(span · toi)
//!   clear forces → sleep ticks → PostStep
//! ```

use std::collections::BTreeMap;

use kinema_collision::{
    BroadPhase, Collider, ColliderPose, CollisionDetector, Contact, ContactEvent, GjkEpaNarrowPhase, Material,
    NaiveBroadPhase, NarrowPhase, SatNarrowPhase, SweepAndPrune,
};
use kinema_geometry::Shape;
use kinema_math::{LinearSolver, ProjectedGaussSeidel, Vec2};
use kinema_telemetry::events::ContactRef;
use kinema_telemetry::{EventBus, EventKind, EventSink, WorldEvent};
use kinema_types::{pair_id, BodyId, ColliderId, IdAllocator, JointId, KinemaError, KinemaResult, PairId, SubscriptionId};
use tracing::{debug, warn};

use crate::body::{Body, BodyDef, SleepChange};
use crate::config::{BroadPhaseKind, IslandGeneratorKind, NarrowPhaseKind, WorldSettings};
use crate::constraint::StepContext;
use crate::island::{Island, IslandGenerator, PerConnectedComponent, SingleIsland};
use crate::joint::{
    AngleJointDef, DistanceJointDef, Joint, JointBasis, JointDef, LineJointDef, MotorDef, MouseJointDef,
    PrismaticJointDef, RevoluteJointDef, SpringDef, WeldJointDef, WheelJointDef,
};
use crate::solver::ConstraintSolver;

/// Attaches a shape to a body.
#[derive(Debug, Clone)]
pub struct ColliderDef {
    pub body: BodyId,
    pub shape: Shape,
    pub mask: u32,
    /// `None` takes the world's default material.
    pub material: Option<Material>,
    pub is_virtual: bool,
}

impl ColliderDef {
    pub fn new(body: BodyId, shape: Shape) -> Self {
        Self {
            body,
            shape,
            mask: kinema_types::constants::MASK_ALL,
            material: None,
            is_virtual: false,
        }
    }

    pub fn with_mask(mut self, mask: u32) -> Self {
        self.mask = mask;
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = Some(material);
        self
    }

    pub fn with_virtual(mut self, is_virtual: bool) -> Self {
        self.is_virtual = is_virtual;
        self
    }
}

pub struct World {
    settings: WorldSettings,
    bodies: BTreeMap<BodyId, Body>,
    joints: BTreeMap<JointId, Joint>,
    detector: CollisionDetector,
    island_generator: Box<dyn IslandGenerator>,
    solver: ConstraintSolver,
    bus: EventBus,
    body_ids: IdAllocator,
    joint_ids: IdAllocator,
    frame: u64,
    time: f64,
    islands: Vec<Island>,
}

impl World {
    /// Builds a world from validated settings.
    pub fn new(settings: WorldSettings) -> KinemaResult<Self> {
        settings.validate()?;

        let broad: Box<dyn BroadPhase> = match settings.broad_phase {
            BroadPhaseKind::Naive => Box::new(NaiveBroadPhase::new()),
            BroadPhaseKind::SweepAndPrune => Box::new(SweepAndPrune::new()),
        };
        let narrow: Box<dyn NarrowPhase> = match settings.narrow_phase {
            NarrowPhaseKind::Sat => Box::new(SatNarrowPhase::new()),
            NarrowPhaseKind::GjkEpa => Box::new(GjkEpaNarrowPhase::new()),
        };
        let island_generator: Box<dyn IslandGenerator> = match settings.island_generator {
            IslandGeneratorKind::PerConnectedComponent => Box::new(PerConnectedComponent::new()),
            IslandGeneratorKind::SingleIsland => Box::new(SingleIsland::new()),
        };

        debug!(
            broad = broad.name(),
            narrow = narrow.name(),
            islands = island_generator.name(),
            "world created"
        );

        Ok(Self {
            detector: CollisionDetector::new(broad, narrow).with_toi(settings.toi()),
            island_generator,
            solver: ConstraintSolver::new(Box::new(ProjectedGaussSeidel::new(settings.solver_iterations))),
            settings,
            bodies: BTreeMap::new(),
            joints: BTreeMap::new(),
            bus: EventBus::new(),
            body_ids: IdAllocator::new(),
            joint_ids: IdAllocator::new(),
            frame: 0,
            time: 0.0,
            islands: Vec::new(),
        })
    }

    /// Replaces the linear solver used for island systems.
    pub fn with_linear_solver(mut self, linear: Box<dyn LinearSolver>) -> Self {
        self.solver = ConstraintSolver::new(linear);
        self
    }

    pub fn settings(&self) -> &WorldSettings {
        &self.settings
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// Islands built by the most recent advance.
    pub fn islands(&self) -> &[Island] {
        &self.islands
    }

    // ─── Bodies ──────────────────────────────────────────────

    pub fn create_body(&mut self, def: BodyDef) -> KinemaResult<BodyId> {
        if self.bodies.len() >= self.settings.max_bodies {
            return Err(KinemaError::CapacityExceeded {
                limit: self.settings.max_bodies,
            });
        }
        def.validate()?;

        let id = BodyId(self.body_ids.next_id());
        self.bodies.insert(id, Body::new(id, &def, self.settings.fall_asleep_timer));
        self.bus.emit(WorldEvent::BodyCreated { body: id });
        self.bus.flush();
        Ok(id)
    }

    /// Removes a body with its collider and joints. Unknown ids are ignored.
    pub fn destroy_body(&mut self, id: BodyId) {
        let Some(body) = self.bodies.get(&id) else { return };
        let joints: Vec<JointId> = body.joints().collect();
        let collider = body.collider();

        for joint in joints {
            self.detach_joint(joint);
        }
        if let Some(collider) = collider {
            self.detach_collider(collider);
        }
        self.bodies.remove(&id);
        self.bus.emit(WorldEvent::BodyDestroyed { body: id });
        self.bus.flush();
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(&id)
    }

    /// Direct access for setting position, velocity or forces. Changes to
    /// position and angle take effect at the next step.
    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.get_mut(&id)
    }

    pub fn bodies(&self) -> impl Iterator<Item = &Body> {
        self.bodies.values()
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Applies a force (at a body-local point) and wakes the body.
    pub fn apply_force(&mut self, id: BodyId, force: Vec2, point: Option<Vec2>) -> KinemaResult<()> {
        let body = self.bodies.get_mut(&id).ok_or(KinemaError::UnknownBody(id))?;
        let was_sleeping = body.is_sleeping();
        body.apply_force(force, point);
        if was_sleeping {
            self.bus.emit(WorldEvent::Awake { body: id });
        }
        self.bus.flush();
        Ok(())
    }

    // ─── Joints ──────────────────────────────────────────────

    /// Adds any joint. Fails if a connected body does not exist.
    pub fn add_joint(&mut self, def: JointDef) -> KinemaResult<JointId> {
        let (a, b) = def.bodies();
        let body_a = self.bodies.get(&a).ok_or(KinemaError::UnknownBody(a))?;
        let body_b = match b {
            Some(b) => Some(self.bodies.get(&b).ok_or(KinemaError::UnknownBody(b))?),
            None => None,
        };

        let separation = match (&def, body_b) {
            (JointDef::Distance(d) | JointDef::MinDistance(d) | JointDef::MaxDistance(d), Some(body_b)) => {
                (body_b.to_global_point(d.anchor_b) - body_a.to_global_point(d.anchor_a)).length()
            }
            _ => 0.0,
        };
        let basis = JointBasis {
            separation,
            relative_angle: body_b.map_or(0.0, |b| b.angle) - body_a.angle,
        };

        let id = JointId(self.joint_ids.next_id());
        let joint = Joint::build(id, &def, basis);

        for body_id in joint.bodies().collect::<Vec<_>>() {
            if let Some(body) = self.bodies.get_mut(&body_id) {
                body.joints.insert(id);
                if body.awake() {
                    self.bus.emit(WorldEvent::Awake { body: body_id });
                }
            }
        }
        let contacts_enabled = joint.contacts_enabled();
        self.joints.insert(id, joint);

        if let (false, Some(b)) = (contacts_enabled, b) {
            self.set_intercontact(a, b, false);
        }

        self.bus.emit(WorldEvent::JointAdded { joint: id });
        self.bus.flush();
        Ok(id)
    }

    pub fn add_distance_joint(&mut self, def: DistanceJointDef) -> KinemaResult<JointId> {
        self.add_joint(JointDef::Distance(def))
    }

    pub fn add_min_distance_joint(&mut self, def: DistanceJointDef) -> KinemaResult<JointId> {
        self.add_joint(JointDef::MinDistance(def))
    }

    pub fn add_max_distance_joint(&mut self, def: DistanceJointDef) -> KinemaResult<JointId> {
        self.add_joint(JointDef::MaxDistance(def))
    }

    pub fn add_line_joint(&mut self, def: LineJointDef) -> KinemaResult<JointId> {
        self.add_joint(JointDef::Line(def))
    }

    pub fn add_angle_joint(&mut self, def: AngleJointDef) -> KinemaResult<JointId> {
        self.add_joint(JointDef::Angle(def))
    }

    pub fn add_prismatic_joint(&mut self, def: PrismaticJointDef) -> KinemaResult<JointId> {
        self.add_joint(JointDef::Prismatic(def))
    }

    pub fn add_revolute_joint(&mut self, def: RevoluteJointDef) -> KinemaResult<JointId> {
        self.add_joint(JointDef::Revolute(def))
    }

    /// Welded bodies never collide with each other.
    pub fn add_weld_joint(&mut self, def: WeldJointDef) -> KinemaResult<JointId> {
        self.add_joint(JointDef::Weld(def))
    }

    pub fn add_wheel_joint(&mut self, def: WheelJointDef) -> KinemaResult<JointId> {
        self.add_joint(JointDef::Wheel(def))
    }

    pub fn add_spring(&mut self, def: SpringDef) -> KinemaResult<JointId> {
        self.add_joint(JointDef::Spring(def))
    }

    pub fn add_mouse_joint(&mut self, def: MouseJointDef) -> KinemaResult<JointId> {
        self.add_joint(JointDef::Mouse(def))
    }

    pub fn add_motor(&mut self, def: MotorDef) -> KinemaResult<JointId> {
        self.add_joint(JointDef::Motor(def))
    }

    /// Moves a mouse joint's target and wakes its body. Returns false if
    /// the joint is unknown or not a mouse joint.
    pub fn set_mouse_target(&mut self, id: JointId, target: Vec2) -> bool {
        let Some(joint) = self.joints.get_mut(&id) else { return false };
        if !joint.set_target(target) {
            return false;
        }
        let body_id = joint.body_a();
        if let Some(body) = self.bodies.get_mut(&body_id) {
            if body.awake() {
                self.bus.emit(WorldEvent::Awake { body: body_id });
            }
        }
        self.bus.flush();
        true
    }

    pub fn joint(&self, id: JointId) -> Option<&Joint> {
        self.joints.get(&id)
    }

    pub fn joints(&self) -> impl Iterator<Item = &Joint> {
        self.joints.values()
    }

    /// Removes a joint and wakes its bodies. Unknown ids are ignored.
    pub fn remove_joint(&mut self, id: JointId) {
        if self.detach_joint(id) {
            self.bus.flush();
        }
    }

    fn detach_joint(&mut self, id: JointId) -> bool {
        let Some(joint) = self.joints.remove(&id) else { return false };

        for body_id in joint.bodies() {
            if let Some(body) = self.bodies.get_mut(&body_id) {
                body.joints.remove(&id);
                if body.awake() {
                    self.bus.emit(WorldEvent::Awake { body: body_id });
                }
            }
        }
        if let (false, Some(b)) = (joint.contacts_enabled(), joint.body_b()) {
            if !self.contacts_blocked(joint.body_a(), b) {
                self.set_intercontact(joint.body_a(), b, true);
            }
        }

        self.bus.emit(WorldEvent::JointRemoved { joint: id });
        true
    }

    /// Whether a remaining joint disables contacts between the two bodies.
    fn contacts_blocked(&self, a: BodyId, b: BodyId) -> bool {
        self.bodies.get(&a).is_some_and(|body| {
            body.joints().any(|j| {
                self.joints
                    .get(&j)
                    .is_some_and(|joint| !joint.contacts_enabled() && joint.other(a) == Some(b))
            })
        })
    }

    fn set_intercontact(&mut self, a: BodyId, b: BodyId, enabled: bool) {
        let colliders = (
            self.bodies.get(&a).and_then(Body::collider),
            self.bodies.get(&b).and_then(Body::collider),
        );
        if let (Some(ca), Some(cb)) = colliders {
            self.detector.registry_mut().set_intercontact(pair_id(ca, cb), enabled);
            let events = self.detector.take_events();
            self.apply_contact_events(events);
        }
    }

    // ─── Colliders ───────────────────────────────────────────

    /// Attaches a collider, replacing the body's previous one.
    pub fn add_collider(&mut self, def: ColliderDef) -> KinemaResult<ColliderId> {
        let body = self.bodies.get(&def.body).ok_or(KinemaError::UnknownBody(def.body))?;
        if let Some(previous) = body.collider() {
            self.detach_collider(previous);
        }

        let Some(body) = self.bodies.get_mut(&def.body) else {
            return Err(KinemaError::UnknownBody(def.body));
        };
        body.update_transform();
        let mut collider = Collider::new(def.body, def.shape)
            .with_mask(def.mask)
            .with_material(def.material.unwrap_or(self.settings.default_material))
            .with_virtual(def.is_virtual);
        collider.set_pose(pose_of(body));
        let id = self.detector.add_collider(collider);
        body.collider = Some(id);
        if body.awake() {
            self.bus.emit(WorldEvent::Awake { body: def.body });
        }

        let blocked: Vec<BodyId> = self
            .bodies
            .get(&def.body)
            .map(|body| {
                body.joints()
                    .filter_map(|j| self.joints.get(&j))
                    .filter(|joint| !joint.contacts_enabled())
                    .filter_map(|joint| joint.other(def.body))
                    .collect()
            })
            .unwrap_or_default();
        for other in blocked {
            self.set_intercontact(def.body, other, false);
        }

        self.bus.emit(WorldEvent::ColliderAdded {
            collider: id,
            body: def.body,
        });
        self.bus.flush();
        Ok(id)
    }

    /// Detaches a collider. Live contacts end. Unknown ids are ignored.
    pub fn remove_collider(&mut self, id: ColliderId) {
        if self.detach_collider(id) {
            self.bus.flush();
        }
    }

    fn detach_collider(&mut self, id: ColliderId) -> bool {
        let Some(collider) = self.detector.remove_collider(id) else { return false };
        let events = self.detector.take_events();
        self.apply_contact_events(events);

        if let Some(body) = self.bodies.get_mut(&collider.body()) {
            body.collider = None;
        }
        self.bus.emit(WorldEvent::ColliderRemoved {
            collider: id,
            body: collider.body(),
        });
        true
    }

    pub fn collider(&self, id: ColliderId) -> Option<&Collider> {
        self.detector.collider(id)
    }

    /// Live contacts keyed by pair.
    pub fn contacts(&self) -> impl Iterator<Item = (PairId, &Contact)> {
        self.detector.registry().contacts()
    }

    pub fn detector(&self) -> &CollisionDetector {
        &self.detector
    }

    /// Removes every body, joint and collider. Ids restart from zero.
    pub fn clear(&mut self) {
        for &id in self.bodies.keys() {
            self.bus.emit(WorldEvent::BodyDestroyed { body: id });
        }
        self.detector.clear();
        self.bodies.clear();
        self.joints.clear();
        self.islands.clear();
        self.body_ids.reset();
        self.joint_ids.reset();
        self.bus.flush();
    }

    // ─── Events ──────────────────────────────────────────────

    pub fn on(&mut self, kind: EventKind, handler: impl FnMut(&WorldEvent) + Send + 'static) -> SubscriptionId {
        self.bus.on(kind, Box::new(handler))
    }

    pub fn off(&mut self, id: SubscriptionId) -> bool {
        self.bus.off(id)
    }

    pub fn add_sink(&mut self, sink: Box<dyn EventSink>) {
        self.bus.add_sink(sink);
    }

    /// Delivers pending events and finalizes every sink. Call once the
    /// simulation is done.
    pub fn finalize(&mut self) {
        self.bus.finalize();
    }

    // ─── Stepping ────────────────────────────────────────────

    /// Advances the simulation by `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        self.frame += 1;
        self.time += f64::from(dt);
        self.bus.emit(WorldEvent::PreStep {
            frame: self.frame,
            time: self.time,
        });

        self.apply_global_forces();

        let mut span = dt;
        let mut substeps = self.settings.toi_substeps.max(1);
        loop {
            self.sync_colliders();
            let toi = self.detector.time_of_first_impact(span);
            let t = span * toi;
            self.detect_collisions();
            self.advance(t);
            span -= t;
            substeps -= 1;

            if toi >= 1.0 || span <= 0.0 {
                break;
            }
            if substeps == 0 {
                warn!(frame = self.frame, remaining = span, "time of impact sub-step budget exhausted");
                break;
            }
        }

        for body in self.bodies.values_mut() {
            body.clear_forces();
        }
        for body in self.bodies.values_mut() {
            match body.tick(dt, &self.settings) {
                Some(SleepChange::Awake) => self.bus.emit(WorldEvent::Awake { body: body.id() }),
                Some(SleepChange::FallAsleep) => self.bus.emit(WorldEvent::FallAsleep { body: body.id() }),
                None => {}
            }
        }

        self.bus.emit(WorldEvent::PostStep {
            frame: self.frame,
            time: self.time,
        });
        debug!(
            frame = self.frame,
            bodies = self.bodies.len(),
            islands = self.islands.len(),
            contacts = self.detector.registry().contacts().count(),
            "step"
        );
        self.bus.flush();
    }

    fn apply_global_forces(&mut self) {
        for body in self.bodies.values_mut() {
            if body.is_static() {
                continue;
            }
            let mut force = Vec2::ZERO;
            if body.inv_mass() > 0.0 {
                force += self.settings.gravity * body.mass();
            }
            let material = body
                .collider()
                .and_then(|id| self.detector.collider(id))
                .map(|c| c.material);
            let mut torque = 0.0;
            if let Some(m) = material {
                force -= body.velocity * m.damping;
                torque -= body.omega * m.angular_damping;
            }
            body.add_force(force, torque);
        }
    }

    fn sync_colliders(&mut self) {
        for body in self.bodies.values_mut() {
            body.update_transform();
            if let Some(id) = body.collider() {
                self.detector.set_pose(id, pose_of(body));
            }
        }
        self.detector.refresh();
    }

    fn detect_collisions(&mut self) {
        let result = self.detector.detect();
        self.apply_contact_events(result.events);
    }

    fn apply_contact_events(&mut self, events: Vec<ContactEvent>) {
        for event in events {
            let (pair, a, b, begin) = match event {
                ContactEvent::Begin { pair, a, b } => (pair, a, b, true),
                ContactEvent::End { pair, a, b } => (pair, a, b, false),
            };
            for collider in [a, b] {
                let body_id = collider.body();
                let Some(body) = self.bodies.get_mut(&body_id) else { continue };
                if begin {
                    body.contacts.insert(pair);
                } else {
                    body.contacts.remove(&pair);
                }
                if body.awake() {
                    self.bus.emit(WorldEvent::Awake { body: body_id });
                }
            }

            let contact = ContactRef {
                pair,
                collider_a: a,
                collider_b: b,
                body_a: a.body(),
                body_b: b.body(),
            };
            debug!(pair = pair.0, begin, "contact");
            self.bus.emit(if begin {
                WorldEvent::ContactBegin(contact)
            } else {
                WorldEvent::ContactEnd(contact)
            });
        }
    }

    fn advance(&mut self, dt: f32) {
        let islands = self
            .island_generator
            .generate(&self.bodies, &self.joints, self.detector.registry());
        let ctx = StepContext {
            dt,
            push_factor: self.settings.constraint_push_factor,
            contact_push_factor: self.settings.contact_push_factor,
            max_force: self.settings.constraint_max_force,
            slop: self.settings.contact_slop,
            restitution_threshold: self.settings.restitution_threshold,
        };

        for body in self.bodies.values_mut() {
            body.island = None;
            body.island_index = None;
        }

        for island in &islands {
            for (index, id) in island.bodies.iter().enumerate() {
                if let Some(body) = self.bodies.get_mut(id) {
                    body.island = Some(island.id);
                    body.island_index = Some(index);
                    if !island.sleeping && body.is_sleeping() && body.awake() {
                        self.bus.emit(WorldEvent::Awake { body: *id });
                    }
                }
            }
            if island.sleeping || dt <= 0.0 {
                continue;
            }

            self.bus.emit(WorldEvent::IslandPreStep {
                island: island.id,
                bodies: island.bodies.len(),
            });
            self.solver.solve(
                island,
                &mut self.bodies,
                &mut self.joints,
                self.detector.registry_mut(),
                &ctx,
                self.settings.warm_starting,
            );
            self.bus.emit(WorldEvent::IslandPostStep {
                island: island.id,
                bodies: island.bodies.len(),
            });
        }

        self.islands = islands;
    }
}

fn pose_of(body: &Body) -> ColliderPose {
    ColliderPose {
        transform: *body.transform(),
        position: body.position,
        angle: body.angle,
        velocity: body.velocity,
        omega: body.omega,
        is_static: body.is_static(),
        continuous: body.is_continuous(),
    }
}
