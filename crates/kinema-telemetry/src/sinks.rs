//! Pluggable event sinks.
//!
//! Sinks see every event regardless of kind, after kind-filtered handlers.

use std::sync::{Arc, Mutex};

use crate::events::WorldEvent;

/// Trait for event consumers.
///
/// Implement this to create custom telemetry outputs.
pub trait EventSink: Send {
    /// Process a single event.
    fn handle(&mut self, event: &WorldEvent);

    /// Called when the world is torn down. Flush buffers, close files, etc.
    fn finalize(&mut self) {}

    /// Returns a human-readable name for this sink.
    fn name(&self) -> &str;
}

/// Collects events into a shared `Vec` for testing and inspection.
///
/// Clones share the same buffer, so a test keeps one clone and hands
/// the other to the bus.
#[derive(Clone, Default)]
pub struct VecSink {
    events: Arc<Mutex<Vec<WorldEvent>>>,
}

impl VecSink {
    /// Creates an empty vec sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything received so far.
    pub fn events(&self) -> Vec<WorldEvent> {
        match self.events.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn clear(&self) {
        if let Ok(mut guard) = self.events.lock() {
            guard.clear();
        }
    }
}

impl EventSink for VecSink {
    fn handle(&mut self, event: &WorldEvent) {
        if let Ok(mut guard) = self.events.lock() {
            guard.push(event.clone());
        }
    }

    fn name(&self) -> &str {
        "vec_sink"
    }
}

/// A sink that logs events using the `tracing` crate.
pub struct TracingSink {
    /// Minimum log level for events.
    level: tracing::Level,
}

impl TracingSink {
    /// Creates a new tracing sink at the given log level.
    pub fn new(level: tracing::Level) -> Self {
        Self { level }
    }

    pub fn level(&self) -> tracing::Level {
        self.level
    }
}

/// Logs at `INFO`.
impl Default for TracingSink {
    fn default() -> Self {
        Self::new(tracing::Level::INFO)
    }
}

impl EventSink for TracingSink {
    fn handle(&mut self, event: &WorldEvent) {
        if self.level == tracing::Level::TRACE {
            tracing::trace!(kind = ?event.kind(), event = ?event, "world_event");
        } else if self.level == tracing::Level::DEBUG {
            tracing::debug!(kind = ?event.kind(), event = ?event, "world_event");
        } else {
            tracing::info!(kind = ?event.kind(), event = ?event, "world_event");
        }
    }

    fn name(&self) -> &str {
        "tracing_sink"
    }
}
