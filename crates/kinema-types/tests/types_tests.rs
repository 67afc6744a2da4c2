//! Integration tests for kinema-types.

use kinema_types::{pair_id, BodyId, ColliderId, IdAllocator, JointId, KinemaError};

// ─── ID Tests ──────────────────────────────────────────────────

#[test]
fn body_id_index() {
    let id = BodyId(42);
    assert_eq!(id.index(), 42);
}

#[test]
fn collider_shares_body_id() {
    let c = ColliderId::from(BodyId(7));
    assert_eq!(c.body(), BodyId(7));
}

#[test]
fn ids_are_serializable() {
    let id = JointId(100);
    let json = serde_json::to_string(&id).unwrap();
    let deserialized: JointId = serde_json::from_str(&json).unwrap();
    assert_eq!(id, deserialized);
}

#[test]
fn allocator_is_monotonic() {
    let mut ids = IdAllocator::new();
    assert_eq!(ids.next_id(), 0);
    assert_eq!(ids.next_id(), 1);
    assert_eq!(ids.next_id(), 2);
    ids.reset();
    assert_eq!(ids.next_id(), 0);
}

// ─── Pair Id Tests ────────────────────────────────────────────

#[test]
fn pair_id_is_symmetric() {
    for a in 0..20u32 {
        for b in 0..20u32 {
            assert_eq!(
                pair_id(ColliderId(a), ColliderId(b)),
                pair_id(ColliderId(b), ColliderId(a))
            );
        }
    }
}

#[test]
fn pair_id_is_collision_free() {
    let mut seen = std::collections::HashSet::new();
    for a in 0..40u32 {
        for b in a..40u32 {
            assert!(seen.insert(pair_id(ColliderId(a), ColliderId(b))));
        }
    }
}

#[test]
fn pair_id_survives_large_ids() {
    let p = pair_id(ColliderId(u32::MAX), ColliderId(3));
    assert_eq!(p.colliders(), (ColliderId(3), ColliderId(u32::MAX)));
}

// ─── Error Tests ──────────────────────────────────────────────

#[test]
fn error_display() {
    let err = KinemaError::InvalidShape("polygon needs at least 3 points".into());
    assert!(err.to_string().contains("at least 3 points"));
}

#[test]
fn capacity_display() {
    let err = KinemaError::CapacityExceeded { limit: 1000 };
    assert!(err.to_string().contains("1000"));
}

#[test]
fn unknown_body_display() {
    let err = KinemaError::UnknownBody(BodyId(5));
    assert!(err.to_string().contains("body#5"));
}
