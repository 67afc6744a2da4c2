//! Integration tests for kinema-telemetry.

use std::sync::{Arc, Mutex};

use kinema_telemetry::bus::EventBus;
use kinema_telemetry::events::{ContactRef, EventKind, WorldEvent};
use kinema_telemetry::sinks::{EventSink, TracingSink, VecSink};
use kinema_types::{pair_id, BodyId, ColliderId};

#[test]
fn emit_and_flush() {
    let mut bus = EventBus::new();
    let sink = VecSink::new();
    bus.add_sink(Box::new(sink.clone()));

    bus.emit(WorldEvent::PreStep { frame: 1, time: 0.016 });
    bus.emit(WorldEvent::PostStep { frame: 1, time: 0.016 });
    assert!(sink.events().is_empty());

    bus.flush();
    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].kind(), EventKind::PreStep);
    assert_eq!(events[1].kind(), EventKind::PostStep);
}

/// Counts finalize calls and remembers how many events arrived before.
#[derive(Clone, Default)]
struct FinalizeRecorder {
    state: Arc<Mutex<(usize, Vec<usize>)>>,
}

impl EventSink for FinalizeRecorder {
    fn handle(&mut self, _event: &WorldEvent) {
        self.state.lock().unwrap().0 += 1;
    }

    fn finalize(&mut self) {
        let mut state = self.state.lock().unwrap();
        let seen = state.0;
        state.1.push(seen);
    }

    fn name(&self) -> &str {
        "finalize_recorder"
    }
}

#[test]
fn finalize_delivers_queue_first() {
    let mut bus = EventBus::new();
    let sink = FinalizeRecorder::default();
    bus.add_sink(Box::new(sink.clone()));

    bus.emit(WorldEvent::BodyCreated { body: BodyId(0) });
    bus.emit(WorldEvent::BodyDestroyed { body: BodyId(0) });
    bus.finalize();

    assert_eq!(sink.state.lock().unwrap().1, vec![2]);
}

#[test]
fn multiple_sinks() {
    let mut bus = EventBus::new();
    bus.add_sink(Box::new(VecSink::new()));
    bus.add_sink(Box::new(TracingSink::default()));
    assert_eq!(bus.sink_count(), 2);
    bus.emit(WorldEvent::Awake { body: BodyId(3) });
    bus.flush();
}

#[test]
fn tracing_sink_defaults_to_info() {
    assert_eq!(TracingSink::default().level(), tracing::Level::INFO);
    assert_eq!(TracingSink::new(tracing::Level::TRACE).level(), tracing::Level::TRACE);
}

// ─── Subscription Tests ───────────────────────────────────────

#[test]
fn handlers_receive_only_their_kind() {
    let mut bus = EventBus::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let captured = seen.clone();
    bus.on(
        EventKind::FallAsleep,
        Box::new(move |e| captured.lock().unwrap().push(e.clone())),
    );

    bus.emit(WorldEvent::Awake { body: BodyId(1) });
    bus.emit(WorldEvent::FallAsleep { body: BodyId(2) });
    bus.flush();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.as_slice(), &[WorldEvent::FallAsleep { body: BodyId(2) }]);
}

#[test]
fn off_unsubscribes() {
    let mut bus = EventBus::new();
    let count = Arc::new(Mutex::new(0));
    let c = count.clone();
    let id = bus.on(EventKind::BodyCreated, Box::new(move |_| *c.lock().unwrap() += 1));

    bus.emit(WorldEvent::BodyCreated { body: BodyId(0) });
    bus.flush();
    assert!(bus.off(id));
    assert!(!bus.off(id));
    bus.emit(WorldEvent::BodyCreated { body: BodyId(1) });
    bus.flush();

    assert_eq!(*count.lock().unwrap(), 1);
    assert_eq!(bus.subscription_count(), 0);
}

// ─── Serialization Tests ──────────────────────────────────────

#[test]
fn event_serialization() {
    let event = WorldEvent::ContactBegin(ContactRef {
        pair: pair_id(ColliderId(1), ColliderId(4)),
        collider_a: ColliderId(1),
        collider_b: ColliderId(4),
        body_a: BodyId(1),
        body_b: BodyId(4),
    });
    let json = serde_json::to_string(&event).unwrap();
    let recovered: WorldEvent = serde_json::from_str(&json).unwrap();
    assert_eq!(recovered, event);
}

#[test]
fn step_event_serialization() {
    let event = WorldEvent::PostStep { frame: 10, time: 0.5 };
    let json = serde_json::to_string(&event).unwrap();
    assert!(json.contains("frame"));
}
