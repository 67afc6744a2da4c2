//! Joints: named compositions of constraint rows.
//!
//! | Joint     | Rows                                                  |
//! |-----------|-------------------------------------------------------|
//! | distance  | distance                                              |
//! | prismatic | line + angle (+ min/max distance when finite)         |
//! | revolute  | revolute x + revolute y (+ angle limits, spiral spring)|
//! | weld      | revolute x + revolute y + angle                       |
//! | wheel     | line (+ min/max distance when finite)                 |
//! | spring    | spring                                                |
//! | mouse     | mouse x + mouse y                                     |
//! | motor     | angular motor                                         |

use kinema_math::Vec2;
use kinema_types::{BodyId, JointId};
use serde::{Deserialize, Serialize};

use crate::constraint::{Constraint, ConstraintKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JointKind {
    Distance,
    MinDistance,
    MaxDistance,
    Line,
    Angle,
    Prismatic,
    Revolute,
    Weld,
    Wheel,
    Spring,
    Mouse,
    Motor,
}

fn x_axis() -> Vec2 {
    Vec2::X
}

fn infinity() -> f32 {
    f32::INFINITY
}

fn neg_infinity() -> f32 {
    f32::NEG_INFINITY
}

fn one() -> f32 {
    1.0
}

fn yes() -> bool {
    true
}

/// Distance family. `distance: None` keeps the current anchor separation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceJointDef {
    pub body_a: BodyId,
    #[serde(default)]
    pub anchor_a: Vec2,
    pub body_b: BodyId,
    #[serde(default)]
    pub anchor_b: Vec2,
    #[serde(default)]
    pub distance: Option<f32>,
}

impl DistanceJointDef {
    pub fn new(body_a: BodyId, body_b: BodyId) -> Self {
        Self {
            body_a,
            anchor_a: Vec2::ZERO,
            body_b,
            anchor_b: Vec2::ZERO,
            distance: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineJointDef {
    pub body_a: BodyId,
    #[serde(default)]
    pub anchor_a: Vec2,
    pub body_b: BodyId,
    #[serde(default)]
    pub anchor_b: Vec2,
    /// Sliding axis, local to body A.
    #[serde(default = "x_axis")]
    pub axis: Vec2,
}

impl LineJointDef {
    pub fn new(body_a: BodyId, body_b: BodyId) -> Self {
        Self {
            body_a,
            anchor_a: Vec2::ZERO,
            body_b,
            anchor_b: Vec2::ZERO,
            axis: Vec2::X,
        }
    }
}

/// Relative-angle lock. `reference: None` keeps the current relative angle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AngleJointDef {
    pub body_a: BodyId,
    pub body_b: BodyId,
    #[serde(default)]
    pub reference: Option<f32>,
}

impl AngleJointDef {
    pub fn new(body_a: BodyId, body_b: BodyId) -> Self {
        Self {
            body_a,
            body_b,
            reference: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrismaticJointDef {
    pub body_a: BodyId,
    #[serde(default)]
    pub anchor_a: Vec2,
    pub body_b: BodyId,
    #[serde(default)]
    pub anchor_b: Vec2,
    #[serde(default = "x_axis")]
    pub axis: Vec2,
    #[serde(default)]
    pub reference_angle: f32,
    #[serde(default)]
    pub min_distance: f32,
    #[serde(default = "infinity")]
    pub max_distance: f32,
}

impl PrismaticJointDef {
    pub fn new(body_a: BodyId, body_b: BodyId) -> Self {
        Self {
            body_a,
            anchor_a: Vec2::ZERO,
            body_b,
            anchor_b: Vec2::ZERO,
            axis: Vec2::X,
            reference_angle: 0.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevoluteJointDef {
    pub body_a: BodyId,
    #[serde(default)]
    pub anchor_a: Vec2,
    pub body_b: BodyId,
    #[serde(default)]
    pub anchor_b: Vec2,
    #[serde(default = "neg_infinity")]
    pub min_angle: f32,
    #[serde(default = "infinity")]
    pub max_angle: f32,
    /// Spiral spring stiffness; zero disables the spring.
    #[serde(default)]
    pub stiffness: f32,
    #[serde(default)]
    pub damping: f32,
    /// Whether the two bodies keep colliding with each other.
    #[serde(default = "yes")]
    pub contacts: bool,
}

impl RevoluteJointDef {
    pub fn new(body_a: BodyId, body_b: BodyId) -> Self {
        Self {
            body_a,
            anchor_a: Vec2::ZERO,
            body_b,
            anchor_b: Vec2::ZERO,
            min_angle: f32::NEG_INFINITY,
            max_angle: f32::INFINITY,
            stiffness: 0.0,
            damping: 0.0,
            contacts: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeldJointDef {
    pub body_a: BodyId,
    #[serde(default)]
    pub anchor_a: Vec2,
    pub body_b: BodyId,
    #[serde(default)]
    pub anchor_b: Vec2,
    #[serde(default)]
    pub reference_angle: f32,
}

impl WeldJointDef {
    pub fn new(body_a: BodyId, body_b: BodyId) -> Self {
        Self {
            body_a,
            anchor_a: Vec2::ZERO,
            body_b,
            anchor_b: Vec2::ZERO,
            reference_angle: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WheelJointDef {
    pub body_a: BodyId,
    #[serde(default)]
    pub anchor_a: Vec2,
    pub body_b: BodyId,
    #[serde(default)]
    pub anchor_b: Vec2,
    #[serde(default = "x_axis")]
    pub axis: Vec2,
    #[serde(default)]
    pub min_distance: f32,
    #[serde(default = "infinity")]
    pub max_distance: f32,
}

impl WheelJointDef {
    pub fn new(body_a: BodyId, body_b: BodyId) -> Self {
        Self {
            body_a,
            anchor_a: Vec2::ZERO,
            body_b,
            anchor_b: Vec2::ZERO,
            axis: Vec2::X,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpringDef {
    pub body_a: BodyId,
    #[serde(default)]
    pub anchor_a: Vec2,
    pub body_b: BodyId,
    #[serde(default)]
    pub anchor_b: Vec2,
    #[serde(default = "SpringDef::default_length")]
    pub length: f32,
    #[serde(default = "one")]
    pub stiffness: f32,
    #[serde(default = "one")]
    pub extinction: f32,
}

impl SpringDef {
    fn default_length() -> f32 {
        0.5
    }

    pub fn new(body_a: BodyId, body_b: BodyId) -> Self {
        Self {
            body_a,
            anchor_a: Vec2::ZERO,
            body_b,
            anchor_b: Vec2::ZERO,
            length: Self::default_length(),
            stiffness: 1.0,
            extinction: 1.0,
        }
    }
}

/// Drags a body anchor toward a movable world target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MouseJointDef {
    pub body: BodyId,
    #[serde(default)]
    pub anchor: Vec2,
    pub target: Vec2,
    #[serde(default = "one")]
    pub stiffness: f32,
    #[serde(default = "MouseJointDef::default_max_force")]
    pub max_force: f32,
}

impl MouseJointDef {
    fn default_max_force() -> f32 {
        1.0e4
    }

    pub fn new(body: BodyId, target: Vec2) -> Self {
        Self {
            body,
            anchor: Vec2::ZERO,
            target,
            stiffness: 1.0,
            max_force: Self::default_max_force(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotorDef {
    pub body: BodyId,
    pub speed: f32,
    pub torque: f32,
}

/// Any joint description, tagged by `type` in serialized form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum JointDef {
    Distance(DistanceJointDef),
    MinDistance(DistanceJointDef),
    MaxDistance(DistanceJointDef),
    Line(LineJointDef),
    Angle(AngleJointDef),
    Prismatic(PrismaticJointDef),
    Revolute(RevoluteJointDef),
    Weld(WeldJointDef),
    Wheel(WheelJointDef),
    Spring(SpringDef),
    Mouse(MouseJointDef),
    Motor(MotorDef),
}

impl JointDef {
    pub fn kind(&self) -> JointKind {
        match self {
            JointDef::Distance(_) => JointKind::Distance,
            JointDef::MinDistance(_) => JointKind::MinDistance,
            JointDef::MaxDistance(_) => JointKind::MaxDistance,
            JointDef::Line(_) => JointKind::Line,
            JointDef::Angle(_) => JointKind::Angle,
            JointDef::Prismatic(_) => JointKind::Prismatic,
            JointDef::Revolute(_) => JointKind::Revolute,
            JointDef::Weld(_) => JointKind::Weld,
            JointDef::Wheel(_) => JointKind::Wheel,
            JointDef::Spring(_) => JointKind::Spring,
            JointDef::Mouse(_) => JointKind::Mouse,
            JointDef::Motor(_) => JointKind::Motor,
        }
    }

    /// The bodies the joint connects.
    pub fn bodies(&self) -> (BodyId, Option<BodyId>) {
        match self {
            JointDef::Distance(d) | JointDef::MinDistance(d) | JointDef::MaxDistance(d) => (d.body_a, Some(d.body_b)),
            JointDef::Line(d) => (d.body_a, Some(d.body_b)),
            JointDef::Angle(d) => (d.body_a, Some(d.body_b)),
            JointDef::Prismatic(d) => (d.body_a, Some(d.body_b)),
            JointDef::Revolute(d) => (d.body_a, Some(d.body_b)),
            JointDef::Weld(d) => (d.body_a, Some(d.body_b)),
            JointDef::Wheel(d) => (d.body_a, Some(d.body_b)),
            JointDef::Spring(d) => (d.body_a, Some(d.body_b)),
            JointDef::Mouse(d) => (d.body, None),
            JointDef::Motor(d) => (d.body, None),
        }
    }

    /// Whether the connected bodies keep colliding with each other.
    pub fn contacts_enabled(&self) -> bool {
        match self {
            JointDef::Revolute(d) => d.contacts,
            JointDef::Weld(_) => false,
            _ => true,
        }
    }
}

/// Current state of the bodies a joint is built against.
#[derive(Debug, Clone, Copy)]
pub(crate) struct JointBasis {
    /// World distance between the anchors.
    pub separation: f32,
    /// `angle_b - angle_a`.
    pub relative_angle: f32,
}

/// A joint and its constraint rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Joint {
    id: JointId,
    kind: JointKind,
    body_a: BodyId,
    body_b: Option<BodyId>,
    pub(crate) constraints: Vec<Constraint>,
    contacts_enabled: bool,
}

impl Joint {
    pub(crate) fn build(id: JointId, def: &JointDef, basis: JointBasis) -> Self {
        let (body_a, body_b) = def.bodies();
        let row = |kind| Constraint::new(body_a, body_b, kind);
        let mut constraints = Vec::new();

        match def {
            JointDef::Distance(d) => constraints.push(row(ConstraintKind::Distance {
                anchor_a: d.anchor_a,
                anchor_b: d.anchor_b,
                length: d.distance.unwrap_or(basis.separation),
            })),
            JointDef::MinDistance(d) => constraints.push(row(ConstraintKind::MinDistance {
                anchor_a: d.anchor_a,
                anchor_b: d.anchor_b,
                distance: d.distance.unwrap_or(basis.separation),
            })),
            JointDef::MaxDistance(d) => constraints.push(row(ConstraintKind::MaxDistance {
                anchor_a: d.anchor_a,
                anchor_b: d.anchor_b,
                distance: d.distance.unwrap_or(basis.separation),
            })),
            JointDef::Line(d) => constraints.push(row(ConstraintKind::Line {
                anchor_a: d.anchor_a,
                anchor_b: d.anchor_b,
                axis: d.axis.normalize_or_zero(),
            })),
            JointDef::Angle(d) => constraints.push(row(ConstraintKind::Angle {
                reference: d.reference.unwrap_or(basis.relative_angle),
            })),
            JointDef::Prismatic(d) => {
                constraints.push(row(ConstraintKind::Line {
                    anchor_a: d.anchor_a,
                    anchor_b: d.anchor_b,
                    axis: d.axis.normalize_or_zero(),
                }));
                constraints.push(row(ConstraintKind::Angle {
                    reference: d.reference_angle,
                }));
                constraints.extend(
                    distance_limits(d.anchor_a, d.anchor_b, d.min_distance, d.max_distance)
                        .into_iter()
                        .map(row),
                );
            }
            JointDef::Revolute(d) => {
                constraints.push(row(ConstraintKind::RevoluteX {
                    anchor_a: d.anchor_a,
                    anchor_b: d.anchor_b,
                }));
                constraints.push(row(ConstraintKind::RevoluteY {
                    anchor_a: d.anchor_a,
                    anchor_b: d.anchor_b,
                }));
                if d.min_angle.is_finite() {
                    constraints.push(row(ConstraintKind::MinAngle { angle: d.min_angle }));
                }
                if d.max_angle.is_finite() {
                    constraints.push(row(ConstraintKind::MaxAngle { angle: d.max_angle }));
                }
                if d.stiffness != 0.0 || d.damping != 0.0 {
                    constraints.push(row(ConstraintKind::SpiralSpring {
                        reference: basis.relative_angle,
                        stiffness: d.stiffness,
                        extinction: d.damping,
                    }));
                }
            }
            JointDef::Weld(d) => {
                constraints.push(row(ConstraintKind::RevoluteX {
                    anchor_a: d.anchor_a,
                    anchor_b: d.anchor_b,
                }));
                constraints.push(row(ConstraintKind::RevoluteY {
                    anchor_a: d.anchor_a,
                    anchor_b: d.anchor_b,
                }));
                constraints.push(row(ConstraintKind::Angle {
                    reference: d.reference_angle,
                }));
            }
            JointDef::Wheel(d) => {
                constraints.push(row(ConstraintKind::Line {
                    anchor_a: d.anchor_a,
                    anchor_b: d.anchor_b,
                    axis: d.axis.normalize_or_zero(),
                }));
                constraints.extend(
                    distance_limits(d.anchor_a, d.anchor_b, d.min_distance, d.max_distance)
                        .into_iter()
                        .map(row),
                );
            }
            JointDef::Spring(d) => constraints.push(row(ConstraintKind::Spring {
                anchor_a: d.anchor_a,
                anchor_b: d.anchor_b,
                length: d.length,
                stiffness: d.stiffness,
                extinction: d.extinction,
            })),
            JointDef::Mouse(d) => {
                constraints.push(row(ConstraintKind::MouseX {
                    anchor: d.anchor,
                    target: d.target,
                    stiffness: d.stiffness,
                    max_force: d.max_force,
                }));
                constraints.push(row(ConstraintKind::MouseY {
                    anchor: d.anchor,
                    target: d.target,
                    stiffness: d.stiffness,
                    max_force: d.max_force,
                }));
            }
            JointDef::Motor(d) => constraints.push(row(ConstraintKind::AngularMotor {
                speed: d.speed,
                torque: d.torque,
            })),
        }

        Self {
            id,
            kind: def.kind(),
            body_a,
            body_b,
            constraints,
            contacts_enabled: def.contacts_enabled(),
        }
    }

    pub fn id(&self) -> JointId {
        self.id
    }

    pub fn kind(&self) -> JointKind {
        self.kind
    }

    pub fn body_a(&self) -> BodyId {
        self.body_a
    }

    pub fn body_b(&self) -> Option<BodyId> {
        self.body_b
    }

    pub fn bodies(&self) -> impl Iterator<Item = BodyId> {
        std::iter::once(self.body_a).chain(self.body_b)
    }

    /// The body across the joint from `body`.
    pub fn other(&self, body: BodyId) -> Option<BodyId> {
        if body == self.body_a {
            self.body_b
        } else if Some(body) == self.body_b {
            Some(self.body_a)
        } else {
            None
        }
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn contacts_enabled(&self) -> bool {
        self.contacts_enabled
    }

    /// Moves the target of a mouse joint. Returns false for other joints.
    pub(crate) fn set_target(&mut self, point: Vec2) -> bool {
        let mut moved = false;
        for c in &mut self.constraints {
            if let ConstraintKind::MouseX { target, .. } | ConstraintKind::MouseY { target, .. } = &mut c.kind {
                *target = point;
                moved = true;
            }
        }
        moved
    }
}

fn distance_limits(anchor_a: Vec2, anchor_b: Vec2, min: f32, max: f32) -> Vec<ConstraintKind> {
    let mut kinds = Vec::new();
    if min.is_finite() && min > 0.0 {
        kinds.push(ConstraintKind::MinDistance {
            anchor_a,
            anchor_b,
            distance: min,
        });
    }
    if max.is_finite() {
        kinds.push(ConstraintKind::MaxDistance {
            anchor_a,
            anchor_b,
            distance: max,
        });
    }
    kinds
}
