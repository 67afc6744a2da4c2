//! # kinema-types
//!
//! Shared identifiers, error types, and simulation constants
//! for the Kinema 2D rigid-body engine.
//!
//! This crate has zero domain logic; it defines the vocabulary
//! that all other Kinema crates share.

pub mod constants;
pub mod error;
pub mod ids;

pub use error::{KinemaError, KinemaResult};
pub use ids::{pair_id, BodyId, ColliderId, IdAllocator, IslandId, JointId, PairId, SubscriptionId};
