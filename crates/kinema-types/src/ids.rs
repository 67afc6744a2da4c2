//! Strongly-typed identifiers for simulation entities.
//!
//! Every entity lives in an arena owned by the world and is addressed
//! by one of these newtypes. A collider shares the id of its body.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a rigid body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BodyId(pub u32);

/// Identifier of a collider. Equal to the owning body's id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ColliderId(pub u32);

/// Identifier of a joint (user joints and persistent contacts alike).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JointId(pub u32);

/// Identifier of an island. Only meaningful within the step that built it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IslandId(pub u32);

/// Handle returned by event subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub u32);

/// Symmetric key for an unordered collider pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PairId(pub u64);

impl BodyId {
    /// Returns the raw index as `usize` for array indexing.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl ColliderId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// The body this collider is attached to.
    #[inline]
    pub fn body(self) -> BodyId {
        BodyId(self.0)
    }
}

impl JointId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl IslandId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl PairId {
    /// Splits the key back into its `(low, high)` collider ids.
    pub fn colliders(self) -> (ColliderId, ColliderId) {
        let hi = (self.0 >> 32) as u32;
        let lo = (self.0 & 0xffff_ffff) as u32;
        (ColliderId(lo), ColliderId(hi))
    }
}

impl From<u32> for BodyId {
    fn from(val: u32) -> Self {
        Self(val)
    }
}

impl From<u32> for ColliderId {
    fn from(val: u32) -> Self {
        Self(val)
    }
}

impl From<BodyId> for ColliderId {
    fn from(val: BodyId) -> Self {
        Self(val.0)
    }
}

impl From<u32> for JointId {
    fn from(val: u32) -> Self {
        Self(val)
    }
}

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "body#{}", self.0)
    }
}

impl fmt::Display for ColliderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "collider#{}", self.0)
    }
}

impl fmt::Display for JointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "joint#{}", self.0)
    }
}

/// Combines two collider ids into a symmetric, collision-free pair key.
///
/// The larger id occupies the high 32 bits, so `pair_id(a, b) == pair_id(b, a)`
/// and distinct unordered pairs never share a key.
#[inline]
pub fn pair_id(a: ColliderId, b: ColliderId) -> PairId {
    let (lo, hi) = if a.0 <= b.0 { (a.0, b.0) } else { (b.0, a.0) };
    PairId(((hi as u64) << 32) | lo as u64)
}

/// Monotonically increasing id source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next unused raw id.
    pub fn next_id(&mut self) -> u32 {
        let id = self.next;
        self.next = self.next.wrapping_add(1);
        id
    }

    /// Forgets all handed-out ids.
    pub fn reset(&mut self) {
        self.next = 0;
    }
}
