//! # kinema-telemetry
//!
//! Event bus for world notifications. The world emits typed events
//! (body lifecycle, sleep transitions, step boundaries, contacts) that are
//! delivered to handlers subscribed by event kind and to pluggable sinks
//! (tracing logs, in-memory capture).

pub mod bus;
pub mod events;
pub mod sinks;

pub use bus::EventBus;
pub use events::{EventKind, WorldEvent};
pub use sinks::{EventSink, TracingSink, VecSink};
