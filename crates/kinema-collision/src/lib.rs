//! # kinema-collision
//!
//! Collision detection for 2D rigid bodies.
//!
//! The pipeline is split into phases:
//! 1. **Broad phase**: bounding-box pruning (naive or sweep-and-prune)
//! 2. **Mid phase**: deduplication against tracked pairs
//! 3. **Narrow phase**: exact contacts (SAT or GJK+EPA), meshes via OBB trees
//! 4. **Pairs registry**: persistent contacts with warm-start caches
//!
//! plus continuous time of impact for fast bodies. Each phase behind a
//! trait is pluggable.

pub mod broad;
pub mod collider;
pub mod contact;
pub mod detector;
pub mod gjk;
pub mod mid;
pub mod narrow;
pub mod registry;
pub mod sap;
pub mod sat;
pub mod toi;

pub use broad::{BroadPhase, CandidatePair, NaiveBroadPhase};
pub use collider::{Collider, ColliderPose, ColliderSet, Material};
pub use contact::{Contact, ContactInfo};
pub use detector::{CollisionDetector, DetectionResult};
pub use gjk::GjkEpaNarrowPhase;
pub use mid::MidPhase;
pub use narrow::{Manifold, NarrowPhase};
pub use registry::{ContactEvent, ContactUpdate, PairEntry, PairMaterial, PairsRegistry};
pub use sap::SweepAndPrune;
pub use sat::SatNarrowPhase;
pub use toi::ToiSettings;
