//! Constraint rows.
//!
//! Every constraint is one scalar row of the island system. It supplies
//! three things to the solver:
//!
//! - a Jacobian: three entries `[vx, vy, omega]` per body,
//! - a push factor: the velocity `J·v` should reach after the step,
//!   which drives stabilization, restitution and motors,
//! - clamping: the force bounds `[min, max]`, always with `min <= max`.
//!
//! A missing second body is treated as the fixed world frame.

use kinema_math::{cross, cross_sv, Affine2, Vec2};
use kinema_types::BodyId;
use serde::{Deserialize, Serialize};

use crate::body::Body;

/// Kinematic snapshot of one side of a constraint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub position: Vec2,
    pub angle: f32,
    pub velocity: Vec2,
    pub omega: f32,
    pub transform: Affine2,
}

impl Frame {
    /// The fixed world frame.
    pub const WORLD: Frame = Frame {
        position: Vec2::ZERO,
        angle: 0.0,
        velocity: Vec2::ZERO,
        omega: 0.0,
        transform: Affine2::IDENTITY,
    };

    pub fn of(body: &Body) -> Self {
        Self {
            position: body.position,
            angle: body.angle,
            velocity: body.velocity,
            omega: body.omega,
            transform: *body.transform(),
        }
    }

    /// Lever arm of a body-local anchor, in world orientation.
    fn arm(&self, local: Vec2) -> Vec2 {
        self.transform.transform_point2(local) - self.position
    }

    fn point_velocity(&self, r: Vec2) -> Vec2 {
        self.velocity + cross_sv(self.omega, r)
    }
}

/// Jacobian row split per body: `[vx, vy, omega]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Jacobian {
    pub a: [f32; 3],
    pub b: [f32; 3],
}

impl Jacobian {
    /// Row for the separation `(pb - pa) · dir` of two points with arms
    /// `ra` and `rb`.
    fn linear(dir: Vec2, ra: Vec2, rb: Vec2) -> Self {
        Self {
            a: [-dir.x, -dir.y, -cross(ra, dir)],
            b: [dir.x, dir.y, cross(rb, dir)],
        }
    }

    /// Row for the relative angle `theta_b - theta_a`.
    fn angular() -> Self {
        Self {
            a: [0.0, 0.0, -1.0],
            b: [0.0, 0.0, 1.0],
        }
    }

    /// Row for one body point moving along `dir`.
    fn single(dir: Vec2, r: Vec2) -> Self {
        Self {
            a: [dir.x, dir.y, cross(r, dir)],
            b: [0.0; 3],
        }
    }

    /// `J · v` for the given frames.
    pub fn velocity(&self, a: &Frame, b: &Frame) -> f32 {
        dot3(&self.a, [a.velocity.x, a.velocity.y, a.omega])
            + dot3(&self.b, [b.velocity.x, b.velocity.y, b.omega])
    }
}

pub(crate) fn dot3(j: &[f32; 3], v: [f32; 3]) -> f32 {
    j[0] * v[0] + j[1] * v[1] + j[2] * v[2]
}

/// Step-wide parameters the rows read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepContext {
    pub dt: f32,
    pub push_factor: f32,
    pub contact_push_factor: f32,
    pub max_force: f32,
    pub slop: f32,
    pub restitution_threshold: f32,
}

/// The closed set of constraint rows.
///
/// Anchors are body-local. Axes of line constraints are local to body A.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConstraintKind {
    /// Keeps the anchors at `length`.
    Distance { anchor_a: Vec2, anchor_b: Vec2, length: f32 },
    /// Keeps the anchors at least `distance` apart.
    MinDistance { anchor_a: Vec2, anchor_b: Vec2, distance: f32 },
    /// Keeps the anchors at most `distance` apart.
    MaxDistance { anchor_a: Vec2, anchor_b: Vec2, distance: f32 },
    /// Keeps anchor B on the line through anchor A along `axis`.
    Line { anchor_a: Vec2, anchor_b: Vec2, axis: Vec2 },
    /// Keeps the relative angle at `reference`.
    Angle { reference: f32 },
    MinAngle { angle: f32 },
    MaxAngle { angle: f32 },
    /// Coincident anchors along world X.
    RevoluteX { anchor_a: Vec2, anchor_b: Vec2 },
    /// Coincident anchors along world Y.
    RevoluteY { anchor_a: Vec2, anchor_b: Vec2 },
    /// Torsional spring toward `reference`; exact force, no push.
    SpiralSpring { reference: f32, stiffness: f32, extinction: f32 },
    /// Linear spring between the anchors; exact force, no push.
    Spring { anchor_a: Vec2, anchor_b: Vec2, length: f32, stiffness: f32, extinction: f32 },
    /// Drags an anchor toward a world `target` along X.
    MouseX { anchor: Vec2, target: Vec2, stiffness: f32, max_force: f32 },
    MouseY { anchor: Vec2, target: Vec2, stiffness: f32, max_force: f32 },
    /// Drives the angular speed (relative speed with two bodies).
    AngularMotor { speed: f32, torque: f32 },
    /// Non-penetration along `normal` (from A to B) at world `point`.
    Contact { point: Vec2, normal: Vec2, depth: f32, restitution: f32 },
    /// Coulomb friction along the contact tangent; bounds come from the
    /// paired contact row.
    Friction { point: Vec2, normal: Vec2, coefficient: f32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub body_a: BodyId,
    pub body_b: Option<BodyId>,
    pub kind: ConstraintKind,
    /// Multipliers of the two solver passes of the previous step.
    pub cache: [f32; 2],
}

struct Anchored {
    ra: Vec2,
    rb: Vec2,
    /// World vector from anchor A to anchor B.
    d: Vec2,
}

fn anchored(a: &Frame, b: &Frame, anchor_a: Vec2, anchor_b: Vec2) -> Anchored {
    let ra = a.arm(anchor_a);
    let rb = b.arm(anchor_b);
    Anchored {
        ra,
        rb,
        d: (b.position + rb) - (a.position + ra),
    }
}

fn direction(d: Vec2) -> Vec2 {
    d.try_normalize().unwrap_or(Vec2::X)
}

/// Target for a one-sided row: push out when violated, otherwise allow the
/// gap to close within the step.
fn one_sided(c: f32, violated: bool, ctx: &StepContext) -> f32 {
    if violated {
        -ctx.push_factor * c / ctx.dt
    } else {
        -c / ctx.dt
    }
}

impl Constraint {
    pub fn new(body_a: BodyId, body_b: Option<BodyId>, kind: ConstraintKind) -> Self {
        Self {
            body_a,
            body_b,
            kind,
            cache: [0.0; 2],
        }
    }

    pub fn is_friction(&self) -> bool {
        matches!(self.kind, ConstraintKind::Friction { .. })
    }

    pub fn jacobian(&self, a: &Frame, b: &Frame) -> Jacobian {
        use ConstraintKind::*;

        match self.kind {
            Distance { anchor_a, anchor_b, .. }
            | MinDistance { anchor_a, anchor_b, .. }
            | MaxDistance { anchor_a, anchor_b, .. }
            | Spring { anchor_a, anchor_b, .. } => {
                let g = anchored(a, b, anchor_a, anchor_b);
                Jacobian::linear(direction(g.d), g.ra, g.rb)
            }
            Line { anchor_a, anchor_b, axis } => {
                let g = anchored(a, b, anchor_a, anchor_b);
                let n = a.transform.transform_vector2(axis.perp()).normalize_or_zero();
                Jacobian::linear(n, g.ra + g.d, g.rb)
            }
            RevoluteX { anchor_a, anchor_b } => {
                let g = anchored(a, b, anchor_a, anchor_b);
                Jacobian::linear(Vec2::X, g.ra, g.rb)
            }
            RevoluteY { anchor_a, anchor_b } => {
                let g = anchored(a, b, anchor_a, anchor_b);
                Jacobian::linear(Vec2::Y, g.ra, g.rb)
            }
            Angle { .. } | MinAngle { .. } | MaxAngle { .. } | SpiralSpring { .. } => Jacobian::angular(),
            AngularMotor { .. } => {
                if self.body_b.is_some() {
                    Jacobian::angular()
                } else {
                    Jacobian {
                        a: [0.0, 0.0, 1.0],
                        b: [0.0; 3],
                    }
                }
            }
            MouseX { anchor, .. } => Jacobian::single(Vec2::X, a.arm(anchor)),
            MouseY { anchor, .. } => Jacobian::single(Vec2::Y, a.arm(anchor)),
            Contact { point, normal, .. } => Jacobian::linear(normal, point - a.position, point - b.position),
            Friction { point, normal, .. } => Jacobian::linear(normal.perp(), point - a.position, point - b.position),
        }
    }

    /// Velocity `J·v` should reach at the end of the step.
    pub fn push_factor(&self, a: &Frame, b: &Frame, ctx: &StepContext) -> f32 {
        use ConstraintKind::*;

        match self.kind {
            Distance { anchor_a, anchor_b, length } => {
                let c = anchored(a, b, anchor_a, anchor_b).d.length() - length;
                -ctx.push_factor * c / ctx.dt
            }
            MinDistance { anchor_a, anchor_b, distance } => {
                let c = anchored(a, b, anchor_a, anchor_b).d.length() - distance;
                one_sided(c, c < 0.0, ctx)
            }
            MaxDistance { anchor_a, anchor_b, distance } => {
                let c = anchored(a, b, anchor_a, anchor_b).d.length() - distance;
                one_sided(c, c > 0.0, ctx)
            }
            Line { anchor_a, anchor_b, axis } => {
                let g = anchored(a, b, anchor_a, anchor_b);
                let n = a.transform.transform_vector2(axis.perp()).normalize_or_zero();
                -ctx.push_factor * n.dot(g.d) / ctx.dt
            }
            Angle { reference } => {
                let c = (b.angle - a.angle) - reference;
                -ctx.push_factor * c / ctx.dt
            }
            MinAngle { angle } => {
                let c = (b.angle - a.angle) - angle;
                one_sided(c, c < 0.0, ctx)
            }
            MaxAngle { angle } => {
                let c = (b.angle - a.angle) - angle;
                one_sided(c, c > 0.0, ctx)
            }
            RevoluteX { anchor_a, anchor_b } => {
                -ctx.push_factor * anchored(a, b, anchor_a, anchor_b).d.x / ctx.dt
            }
            RevoluteY { anchor_a, anchor_b } => {
                -ctx.push_factor * anchored(a, b, anchor_a, anchor_b).d.y / ctx.dt
            }
            MouseX { anchor, target, stiffness, .. } => {
                let p = a.transform.transform_point2(anchor);
                -stiffness * (p.x - target.x) / ctx.dt
            }
            MouseY { anchor, target, stiffness, .. } => {
                let p = a.transform.transform_point2(anchor);
                -stiffness * (p.y - target.y) / ctx.dt
            }
            AngularMotor { speed, .. } => speed,
            Contact { normal, depth, restitution, point } => {
                let vn = Jacobian::linear(normal, point - a.position, point - b.position).velocity(a, b);
                let correction = ctx.contact_push_factor * (depth - ctx.slop).max(0.0) / ctx.dt;
                let bounce = if vn < -ctx.restitution_threshold {
                    -restitution * vn
                } else {
                    0.0
                };
                correction.max(bounce)
            }
            SpiralSpring { .. } | Spring { .. } | Friction { .. } => 0.0,
        }
    }

    /// Force bounds of the row. Friction rows return an unbounded range;
    /// the solver narrows it with [`friction_bounds`](Self::friction_bounds).
    pub fn clamping(&self, a: &Frame, b: &Frame, ctx: &StepContext) -> (f32, f32) {
        use ConstraintKind::*;

        match self.kind {
            Distance { .. } | Line { .. } | Angle { .. } | RevoluteX { .. } | RevoluteY { .. } => {
                (-ctx.max_force, ctx.max_force)
            }
            MinDistance { .. } | MinAngle { .. } => (0.0, ctx.max_force),
            MaxDistance { .. } | MaxAngle { .. } => (-ctx.max_force, 0.0),
            SpiralSpring { reference, stiffness, extinction } => {
                let f = stiffness * (reference - (b.angle - a.angle)) - extinction * (b.omega - a.omega);
                (f, f)
            }
            Spring { anchor_a, anchor_b, length, stiffness, extinction } => {
                let g = anchored(a, b, anchor_a, anchor_b);
                let u = direction(g.d);
                let stretch = g.d.length() - length;
                let speed = (b.point_velocity(g.rb) - a.point_velocity(g.ra)).dot(u);
                let f = -stiffness * stretch - extinction * speed;
                (f, f)
            }
            MouseX { max_force, .. } | MouseY { max_force, .. } => (-max_force.abs(), max_force.abs()),
            AngularMotor { torque, .. } => (-torque.abs(), torque.abs()),
            Contact { .. } => (0.0, f32::INFINITY),
            Friction { .. } => (f32::NEG_INFINITY, f32::INFINITY),
        }
    }

    /// `[-mu N, mu N]` for a friction row given its contact's normal force.
    pub fn friction_bounds(&self, normal_force: f32) -> (f32, f32) {
        match self.kind {
            ConstraintKind::Friction { coefficient, .. } => {
                let limit = coefficient * normal_force.max(0.0);
                (-limit, limit)
            }
            _ => (f32::NEG_INFINITY, f32::INFINITY),
        }
    }
}
