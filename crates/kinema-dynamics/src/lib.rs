//! # kinema-dynamics
//!
//! Rigid bodies, joints, islands, constraint solving and the stepping world.
//!
//! ## Key Types
//!
//! - [`World`]: owns everything and runs the step loop
//! - [`Body`] / [`BodyDef`]: rigid bodies (static when mass and inertia are infinite)
//! - [`Joint`] / [`JointDef`]: joints as compositions of [`Constraint`] rows
//! - [`IslandGenerator`]: partitions bodies into independently solved islands
//! - [`ConstraintSolver`]: assembles and solves the island system
//! - [`WorldSettings`]: configuration with TOML loading and presets

pub mod body;
pub mod config;
pub mod constraint;
pub mod island;
pub mod joint;
pub mod solver;
pub mod world;

pub use body::{Body, BodyDef, SleepChange};
pub use config::{BroadPhaseKind, IslandGeneratorKind, NarrowPhaseKind, WorldSettings};
pub use constraint::{Constraint, ConstraintKind, Frame, Jacobian, StepContext};
pub use island::{Island, IslandGenerator, PerConnectedComponent, SingleIsland};
pub use joint::{
    AngleJointDef, DistanceJointDef, Joint, JointDef, JointKind, LineJointDef, MotorDef, MouseJointDef,
    PrismaticJointDef, RevoluteJointDef, SpringDef, WeldJointDef, WheelJointDef,
};
pub use solver::{ConstraintSolver, SolveStats};
pub use world::{ColliderDef, World};
