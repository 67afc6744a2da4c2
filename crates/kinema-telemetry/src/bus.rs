//! Event bus: queued dispatch to typed handlers and pluggable sinks.
//!
//! Producers `emit` into an `mpsc` channel while the world is mid-operation;
//! nothing runs until `flush`, so handlers never observe a half-updated world.

use std::collections::BTreeMap;
use std::sync::mpsc;

use kinema_types::{IdAllocator, SubscriptionId};

use crate::events::{EventKind, WorldEvent};
use crate::sinks::EventSink;

/// Handler invoked for every flushed event of its subscribed kind.
pub type EventHandler = Box<dyn FnMut(&WorldEvent) + Send>;

struct Subscription {
    kind: EventKind,
    handler: EventHandler,
}

/// Event bus owned by a world.
///
/// Handlers are invoked in subscription order, then sinks in registration order.
pub struct EventBus {
    /// Channel sender.
    sender: mpsc::Sender<WorldEvent>,
    /// Channel receiver, drained on flush.
    receiver: mpsc::Receiver<WorldEvent>,
    /// Registered sinks.
    sinks: Vec<Box<dyn EventSink>>,
    subscriptions: BTreeMap<SubscriptionId, Subscription>,
    ids: IdAllocator,
}

impl EventBus {
    /// Creates a new event bus with no sinks or handlers.
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver,
            sinks: Vec::new(),
            subscriptions: BTreeMap::new(),
            ids: IdAllocator::new(),
        }
    }

    /// Registers a sink to receive every event.
    pub fn add_sink(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }

    /// Subscribes `handler` to events of `kind`.
    pub fn on(&mut self, kind: EventKind, handler: EventHandler) -> SubscriptionId {
        let id = SubscriptionId(self.ids.next_id());
        self.subscriptions.insert(id, Subscription { kind, handler });
        id
    }

    /// Removes a subscription. Returns false if it was not registered.
    pub fn off(&mut self, id: SubscriptionId) -> bool {
        self.subscriptions.remove(&id).is_some()
    }

    /// Queue an event for the next flush.
    pub fn emit(&self, event: WorldEvent) {
        // The receiver lives in `self`, so sending cannot fail.
        let _ = self.sender.send(event);
    }

    /// Deliver all queued events in emission order.
    pub fn flush(&mut self) {
        while let Ok(event) = self.receiver.try_recv() {
            let kind = event.kind();
            for sub in self.subscriptions.values_mut() {
                if sub.kind == kind {
                    (sub.handler)(&event);
                }
            }
            for sink in &mut self.sinks {
                sink.handle(&event);
            }
        }
    }

    /// Delivers anything still queued, then calls `finalize` on every sink.
    pub fn finalize(&mut self) {
        self.flush();
        for sink in &mut self.sinks {
            sink.finalize();
        }
    }

    /// Returns the number of registered sinks.
    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Returns the number of live subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
