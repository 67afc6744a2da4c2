//! Integration tests for kinema-collision.

use kinema_collision::broad::{BroadPhase, CandidatePair, NaiveBroadPhase};
use kinema_collision::collider::{Collider, ColliderPose, ColliderSet};
use kinema_collision::narrow::{collide_colliders, NarrowPhase};
use kinema_collision::registry::{ContactEvent, ContactUpdate, PairMaterial, PairsRegistry};
use kinema_collision::{CollisionDetector, GjkEpaNarrowPhase, SatNarrowPhase, SweepAndPrune, ToiSettings};
use kinema_geometry::{MeshShape, Shape};
use kinema_math::{pose, Vec2};
use kinema_types::{pair_id, BodyId, ColliderId};

fn placed(id: u32, shape: Shape, position: Vec2, angle: f32) -> Collider {
    let mut c = Collider::new(BodyId(id), shape);
    c.set_pose(ColliderPose {
        transform: pose(position, angle),
        position,
        angle,
        ..Default::default()
    });
    c
}

fn moving(id: u32, shape: Shape, position: Vec2, velocity: Vec2, continuous: bool) -> Collider {
    let mut c = Collider::new(BodyId(id), shape);
    c.set_pose(ColliderPose {
        transform: pose(position, 0.0),
        position,
        velocity,
        continuous,
        ..Default::default()
    });
    c
}

fn fixed(id: u32, shape: Shape, position: Vec2) -> Collider {
    let mut c = Collider::new(BodyId(id), shape);
    c.set_pose(ColliderPose {
        transform: pose(position, 0.0),
        position,
        is_static: true,
        ..Default::default()
    });
    c
}

fn scatter() -> ColliderSet {
    let mut set = ColliderSet::new();
    for i in 0..24u32 {
        let x = (i % 6) as f32 * 1.3 + (i as f32 * 0.37).sin();
        let y = (i / 6) as f32 * 1.1 + (i as f32 * 0.91).cos() * 0.5;
        let shape = if i % 2 == 0 { Shape::circle(0.6) } else { Shape::rect(1.0, 0.7) };
        let mut c = placed(i, shape, Vec2::new(x, y), i as f32 * 0.3);
        if i % 7 == 3 {
            c.mask = 0b10;
        } else if i % 7 == 5 {
            c.mask = 0b01;
        }
        set.insert(c.id(), c);
    }
    set
}

fn manifold_of(narrow: &dyn NarrowPhase, a: &Collider, b: &Collider) -> Option<kinema_collision::Manifold> {
    narrow.collide(&a.proxy()?, &b.proxy()?)
}

// ─── Broad Phase Tests ────────────────────────────────────────

#[test]
fn sap_matches_naive() {
    let set = scatter();
    let mut naive = NaiveBroadPhase::new();
    let mut sap = SweepAndPrune::new();
    for c in set.values() {
        naive.register(c);
        sap.register(c);
    }
    naive.update(&set);
    sap.update(&set);
    let expected = naive.query_pairs(&set);
    assert!(!expected.is_empty());
    assert_eq!(sap.query_pairs(&set), expected);
}

#[test]
fn sap_tracks_motion_after_resort() {
    let mut set = ColliderSet::new();
    for i in 0..3u32 {
        let c = placed(i, Shape::circle(0.5), Vec2::new(i as f32 * 3.0, 0.0), 0.0);
        set.insert(c.id(), c);
    }
    let mut sap = SweepAndPrune::new();
    for c in set.values() {
        sap.register(c);
    }
    sap.update(&set);
    assert!(sap.query_pairs(&set).is_empty());

    // Move the last circle onto the first.
    let moved = placed(2, Shape::circle(0.5), Vec2::new(0.4, 0.2), 0.0);
    set.insert(moved.id(), moved);
    sap.update(&set);
    let pairs = sap.query_pairs(&set);
    assert_eq!(pairs, vec![CandidatePair::new(ColliderId(0), ColliderId(2))]);
}

#[test]
fn masks_filter_candidates() {
    let mut set = ColliderSet::new();
    let a = placed(0, Shape::circle(1.0), Vec2::ZERO, 0.0).with_mask(0b01);
    let b = placed(1, Shape::circle(1.0), Vec2::new(0.5, 0.0), 0.0).with_mask(0b10);
    set.insert(a.id(), a);
    set.insert(b.id(), b);
    let mut sap = SweepAndPrune::new();
    for c in set.values() {
        sap.register(c);
    }
    assert!(sap.query_pairs(&set).is_empty());
}

#[test]
fn unregister_removes_endpoints() {
    let set = scatter();
    let mut sap = SweepAndPrune::new();
    for c in set.values() {
        sap.register(c);
    }
    for id in set.keys() {
        sap.unregister(*id);
    }
    sap.unregister(ColliderId(999));
    assert!(sap.is_empty());
    assert!(sap.query_pairs(&set).is_empty());
}

#[test]
fn capsule_query() {
    let mut set = ColliderSet::new();
    let wall = fixed(0, Shape::rect(0.1, 4.0), Vec2::new(5.0, 0.0));
    let off = fixed(1, Shape::rect(0.1, 4.0), Vec2::new(5.0, 10.0));
    set.insert(wall.id(), wall);
    set.insert(off.id(), off);
    let mut naive = NaiveBroadPhase::new();
    let mut sap = SweepAndPrune::new();
    for c in set.values() {
        naive.register(c);
        sap.register(c);
    }
    let hits = sap.query_capsule(&set, Vec2::ZERO, Vec2::new(10.0, 0.0), 0.25);
    assert_eq!(hits, vec![ColliderId(0)]);
    assert_eq!(naive.query_capsule(&set, Vec2::ZERO, Vec2::new(10.0, 0.0), 0.25), hits);
}

// ─── Narrow Phase Tests ───────────────────────────────────────

#[test]
fn circle_circle_contact() {
    let a = placed(0, Shape::circle(1.0), Vec2::ZERO, 0.0);
    let b = placed(1, Shape::circle(1.0), Vec2::new(1.5, 0.0), 0.0);
    for narrow in [&SatNarrowPhase as &dyn NarrowPhase, &GjkEpaNarrowPhase] {
        let m = manifold_of(narrow, &a, &b).unwrap();
        assert!((m.normal - Vec2::X).length() < 1e-4, "{}", narrow.name());
        assert!((m.depth - 0.5).abs() < 1e-4, "{}", narrow.name());
        assert!((m.point_a - Vec2::new(1.0, 0.0)).length() < 1e-4);
        assert!((m.point_b - Vec2::new(0.5, 0.0)).length() < 1e-4);
    }
}

#[test]
fn separated_shapes_do_not_collide() {
    let a = placed(0, Shape::rect(1.0, 1.0), Vec2::ZERO, 0.3);
    let b = placed(1, Shape::circle(0.5), Vec2::new(3.0, 0.0), 0.0);
    let c = placed(2, Shape::rect(1.0, 1.0), Vec2::new(0.0, 3.0), 0.0);
    for narrow in [&SatNarrowPhase as &dyn NarrowPhase, &GjkEpaNarrowPhase] {
        assert!(manifold_of(narrow, &a, &b).is_none());
        assert!(manifold_of(narrow, &a, &c).is_none());
    }
}

#[test]
fn box_on_box_contact() {
    let ground = placed(0, Shape::rect(10.0, 1.0), Vec2::ZERO, 0.0);
    let crate_ = placed(1, Shape::rect(1.0, 1.0), Vec2::new(0.3, 0.9), 0.0);
    for narrow in [&SatNarrowPhase as &dyn NarrowPhase, &GjkEpaNarrowPhase] {
        let m = manifold_of(narrow, &ground, &crate_).unwrap();
        assert!((m.normal - Vec2::Y).length() < 1e-3, "{}: {:?}", narrow.name(), m.normal);
        assert!((m.depth - 0.1).abs() < 1e-3, "{}: {}", narrow.name(), m.depth);
    }
}

#[test]
fn box_circle_contact_both_orders() {
    let b = placed(0, Shape::rect(2.0, 2.0), Vec2::ZERO, 0.0);
    let c = placed(1, Shape::circle(0.5), Vec2::new(1.3, 0.0), 0.0);
    for narrow in [&SatNarrowPhase as &dyn NarrowPhase, &GjkEpaNarrowPhase] {
        let m = manifold_of(narrow, &b, &c).unwrap();
        assert!((m.normal - Vec2::X).length() < 1e-3, "{}", narrow.name());
        assert!((m.depth - 0.2).abs() < 1e-3, "{}", narrow.name());

        let flipped = manifold_of(narrow, &c, &b).unwrap();
        assert!((flipped.normal + Vec2::X).length() < 1e-3, "{}", narrow.name());
    }
}

#[test]
fn circle_center_inside_box() {
    let b = placed(0, Shape::rect(2.0, 2.0), Vec2::ZERO, 0.0);
    let c = placed(1, Shape::circle(0.5), Vec2::new(0.0, 0.8), 0.0);
    for narrow in [&SatNarrowPhase as &dyn NarrowPhase, &GjkEpaNarrowPhase] {
        let m = manifold_of(narrow, &b, &c).unwrap();
        assert!((m.normal - Vec2::Y).length() < 1e-3, "{}", narrow.name());
        assert!((m.depth - 0.7).abs() < 1e-3, "{}", narrow.name());
    }
}

#[test]
fn mesh_contact_uses_deepest_triangle() {
    let soup: Vec<[Vec2; 3]> = (0..10)
        .map(|i| {
            let x = i as f32 - 5.0;
            [Vec2::new(x, -1.0), Vec2::new(x + 1.0, -1.0), Vec2::new(x + 0.5, 0.0)]
        })
        .collect();
    let mesh = fixed(0, Shape::Mesh(MeshShape::new(soup).unwrap()), Vec2::ZERO);
    let ball = placed(1, Shape::circle(0.5), Vec2::new(0.5, 0.3), 0.0);
    for narrow in [&SatNarrowPhase as &dyn NarrowPhase, &GjkEpaNarrowPhase] {
        let m = collide_colliders(narrow, &mesh, &ball).unwrap();
        assert!(m.normal.y > 0.9, "{}", narrow.name());
        assert!((m.depth - 0.2).abs() < 1e-3, "{}: {}", narrow.name(), m.depth);

        let flipped = collide_colliders(narrow, &ball, &mesh).unwrap();
        assert!(flipped.normal.y < -0.9);
    }
}

#[test]
fn detect_yields_one_contact_per_touching_pair() {
    let mut set = ColliderSet::new();
    for c in [
        placed(0, Shape::circle(1.0), Vec2::ZERO, 0.0),
        placed(1, Shape::circle(1.0), Vec2::new(1.5, 0.0), 0.0),
        placed(2, Shape::circle(1.0), Vec2::new(9.0, 0.0), 0.0),
    ] {
        set.insert(c.id(), c);
    }
    let pairs = [
        CandidatePair::new(ColliderId(0), ColliderId(1)),
        CandidatePair::new(ColliderId(0), ColliderId(2)),
    ];

    let contacts = SatNarrowPhase.detect(&pairs, &set);
    assert_eq!(contacts.len(), 1);
    assert_eq!((contacts[0].collider_a, contacts[0].collider_b), (ColliderId(0), ColliderId(1)));
    assert!((contacts[0].depth - 0.5).abs() < 1e-4);
}

// ─── Registry Tests ───────────────────────────────────────────

fn material() -> PairMaterial {
    PairMaterial {
        friction: 0.5,
        restitution: 0.2,
        is_virtual: false,
    }
}

fn touching() -> (Collider, Collider) {
    (
        placed(0, Shape::circle(1.0), Vec2::ZERO, 0.0),
        placed(1, Shape::circle(1.0), Vec2::new(1.8, 0.0), 0.0),
    )
}

#[test]
fn registry_lifecycle() {
    let (a, b) = touching();
    let info = kinema_collision::narrow::contact_info(&a, &b, manifold_of(&SatNarrowPhase, &a, &b).unwrap());
    let mut registry = PairsRegistry::new();
    let pair = registry.register_pair(a.id(), b.id());

    registry.validate_pairs();
    assert_eq!(registry.add_contact(info, material()), ContactUpdate::Created);
    let events = registry.emit_events();
    assert!(matches!(events.as_slice(), [ContactEvent::Begin { .. }]));

    // Warm-start cache survives a patch.
    registry.contact_mut(pair).unwrap().normal_cache = [3.0, 4.0];
    registry.validate_pairs();
    assert_eq!(registry.add_contact(info.flipped(), material()), ContactUpdate::Patched);
    assert!(registry.emit_events().is_empty());
    let contact = registry.contact(pair).unwrap();
    assert_eq!(contact.normal_cache, [3.0, 4.0]);
    assert_eq!(contact.info.collider_a, ColliderId(0));
    assert_eq!(contact.age, 1);

    // Not refreshed: ends.
    registry.validate_pairs();
    let events = registry.emit_events();
    assert!(matches!(events.as_slice(), [ContactEvent::End { .. }]));
    assert!(registry.contact(pair).is_none());
}

#[test]
fn intercontact_disabled_suppresses_contacts() {
    let (a, b) = touching();
    let info = kinema_collision::narrow::contact_info(&a, &b, manifold_of(&SatNarrowPhase, &a, &b).unwrap());
    let mut registry = PairsRegistry::new();
    let pair = registry.register_pair(a.id(), b.id());
    registry.set_intercontact(pair, false);
    registry.validate_pairs();
    assert_eq!(registry.add_contact(info, material()), ContactUpdate::Suppressed);
    assert!(registry.emit_events().is_empty());
}

#[test]
fn untracked_pairs_are_ignored() {
    let (a, b) = touching();
    let info = kinema_collision::narrow::contact_info(&a, &b, manifold_of(&SatNarrowPhase, &a, &b).unwrap());
    let mut registry = PairsRegistry::new();
    assert_eq!(registry.add_contact(info, material()), ContactUpdate::Untracked);
    assert!(registry.unregister_pair(pair_id(ColliderId(0), ColliderId(1))).is_none());
}

#[test]
fn registry_state_roundtrips_through_json() {
    let (a, b) = touching();
    let info = kinema_collision::narrow::contact_info(&a, &b, manifold_of(&SatNarrowPhase, &a, &b).unwrap());
    let mut registry = PairsRegistry::new();
    let pair = registry.register_pair(a.id(), b.id());
    registry.validate_pairs();
    registry.add_contact(info, material());
    let events = registry.emit_events();
    registry.contact_mut(pair).unwrap().normal_cache = [3.5, 0.0];

    let entry = registry.pair(pair).unwrap();
    let json = serde_json::to_string(entry).unwrap();
    let parsed: kinema_collision::registry::PairEntry = serde_json::from_str(&json).unwrap();
    assert_eq!(&parsed, entry);
    assert_eq!(parsed.contact.as_ref().map(|c| c.normal_cache), Some([3.5, 0.0]));

    let json = serde_json::to_string(&events).unwrap();
    let parsed: Vec<ContactEvent> = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, events);
    assert!(matches!(parsed.as_slice(), [ContactEvent::Begin { .. }]));
}

// ─── Detector Tests ───────────────────────────────────────────

#[test]
fn static_pairs_are_never_tracked() {
    let mut detector = CollisionDetector::new(Box::new(SweepAndPrune::new()), Box::new(SatNarrowPhase));
    detector.add_collider(fixed(0, Shape::rect(2.0, 2.0), Vec2::ZERO));
    detector.add_collider(fixed(1, Shape::rect(2.0, 2.0), Vec2::new(0.5, 0.0)));
    detector.refresh();
    let result = detector.detect();
    assert_eq!(result.candidate_pairs, 1);
    assert_eq!(result.contacts_detected, 0);
    assert!(detector.registry().is_empty());
}

#[test]
fn detector_begins_and_ends_contacts() {
    let mut detector = CollisionDetector::new(Box::new(SweepAndPrune::new()), Box::new(GjkEpaNarrowPhase));
    let (a, b) = touching();
    detector.add_collider(a);
    detector.add_collider(b);
    detector.refresh();
    let first = detector.detect();
    assert_eq!(first.contacts_detected, 1);
    assert!(matches!(first.events.as_slice(), [ContactEvent::Begin { .. }]));

    detector.remove_collider(ColliderId(1));
    let events = detector.take_events();
    assert!(matches!(events.as_slice(), [ContactEvent::End { .. }]));
    assert!(detector.remove_collider(ColliderId(1)).is_none());
}

// ─── Time of Impact Tests ─────────────────────────────────────

fn toi_detector(bullet: Collider) -> CollisionDetector {
    let mut detector = CollisionDetector::new(Box::new(SweepAndPrune::new()), Box::new(SatNarrowPhase))
        .with_toi(ToiSettings::default());
    detector.add_collider(fixed(0, Shape::rect(0.1, 4.0), Vec2::new(5.0, 0.0)));
    detector.add_collider(bullet);
    detector.refresh();
    detector
}

#[test]
fn toi_finds_wall_before_tunneling() {
    let bullet = moving(1, Shape::circle(0.25), Vec2::ZERO, Vec2::new(600.0, 0.0), true);
    let detector = toi_detector(bullet);
    let toi = detector.time_of_first_impact(1.0 / 60.0);
    // Surface contact at x = 4.95 - 0.25 = 4.7 of a 10 unit sweep.
    assert!(toi > 0.46 && toi < 0.48, "toi = {toi}");
}

#[test]
fn toi_between_two_continuous_bodies() {
    let mut detector = CollisionDetector::new(Box::new(SweepAndPrune::new()), Box::new(SatNarrowPhase))
        .with_toi(ToiSettings::default());
    detector.add_collider(moving(0, Shape::circle(0.25), Vec2::new(-3.0, 0.0), Vec2::new(300.0, 0.0), true));
    detector.add_collider(moving(1, Shape::circle(0.25), Vec2::new(3.0, 0.0), Vec2::new(-300.0, 0.0), true));
    detector.refresh();
    let toi = detector.time_of_first_impact(1.0 / 60.0);
    // Gap of 5.5 closed at 600 per second over a 1/60 s span.
    assert!(toi > 0.53 && toi < 0.56, "toi = {toi}");
}

#[test]
fn toi_ignores_non_continuous_bodies() {
    let bullet = moving(1, Shape::circle(0.25), Vec2::ZERO, Vec2::new(600.0, 0.0), false);
    let detector = toi_detector(bullet);
    assert_eq!(detector.time_of_first_impact(1.0 / 60.0), 1.0);
}

#[test]
fn toi_already_touching_is_no_impact() {
    let bullet = moving(1, Shape::circle(0.25), Vec2::new(4.8, 0.0), Vec2::new(600.0, 0.0), true);
    let detector = toi_detector(bullet);
    assert_eq!(detector.time_of_first_impact(1.0 / 60.0), 1.0);
}

#[test]
fn toi_misses_when_moving_away() {
    let bullet = moving(1, Shape::circle(0.25), Vec2::ZERO, Vec2::new(-600.0, 0.0), true);
    let detector = toi_detector(bullet);
    assert_eq!(detector.time_of_first_impact(1.0 / 60.0), 1.0);
}
