//! Pairs registry: persistent contacts keyed by pair id.
//!
//! Lifecycle per detection round:
//!
//! ```text
//! registry.validate_pairs();          // every live contact becomes stale
//! for info in narrow_phase_output {
//!     registry.add_contact(info, ..); // create (begin) or patch (refresh)
//! }
//! let events = registry.emit_events(); // stale contacts end; drain events
//! ```

use std::collections::BTreeMap;

use kinema_types::{pair_id, ColliderId, PairId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::contact::{Contact, ContactInfo};

/// Contact lifecycle notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactEvent {
    Begin { pair: PairId, a: ColliderId, b: ColliderId },
    End { pair: PairId, a: ColliderId, b: ColliderId },
}

impl ContactEvent {
    pub fn pair(&self) -> PairId {
        match *self {
            ContactEvent::Begin { pair, .. } | ContactEvent::End { pair, .. } => pair,
        }
    }
}

/// What [`PairsRegistry::add_contact`] did with a contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactUpdate {
    Created,
    Patched,
    /// The pair has inter-contact disabled.
    Suppressed,
    /// The pair is not tracked.
    Untracked,
}

/// Coefficients combined from both colliders of a pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairMaterial {
    pub friction: f32,
    pub restitution: f32,
    pub is_virtual: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairEntry {
    pub a: ColliderId,
    pub b: ColliderId,
    /// When false no contact is ever created for this pair.
    pub intercontact: bool,
    pub contact: Option<Contact>,
    refreshed: bool,
}

#[derive(Debug, Default)]
pub struct PairsRegistry {
    pairs: BTreeMap<PairId, PairEntry>,
    pending: Vec<ContactEvent>,
}

impl PairsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking a pair. Re-registering keeps the existing entry.
    pub fn register_pair(&mut self, a: ColliderId, b: ColliderId) -> PairId {
        let pair = pair_id(a, b);
        let (a, b) = if a <= b { (a, b) } else { (b, a) };
        self.pairs.entry(pair).or_insert(PairEntry {
            a,
            b,
            intercontact: true,
            contact: None,
            refreshed: false,
        });
        pair
    }

    /// Stops tracking a pair, ending its contact if one is live.
    pub fn unregister_pair(&mut self, pair: PairId) -> Option<PairEntry> {
        let entry = self.pairs.remove(&pair)?;
        if entry.contact.is_some() {
            self.pending.push(ContactEvent::End { pair, a: entry.a, b: entry.b });
        }
        Some(entry)
    }

    /// Pairs involving `collider`.
    pub fn pairs_of(&self, collider: ColliderId) -> Vec<PairId> {
        self.pairs
            .iter()
            .filter(|(_, e)| e.a == collider || e.b == collider)
            .map(|(&p, _)| p)
            .collect()
    }

    pub fn pair(&self, pair: PairId) -> Option<&PairEntry> {
        self.pairs.get(&pair)
    }

    pub fn pair_mut(&mut self, pair: PairId) -> Option<&mut PairEntry> {
        self.pairs.get_mut(&pair)
    }

    /// Enables or disables contact generation for a pair. Disabling ends a
    /// live contact immediately.
    pub fn set_intercontact(&mut self, pair: PairId, enabled: bool) {
        let Some(entry) = self.pairs.get_mut(&pair) else {
            return;
        };
        entry.intercontact = enabled;
        if !enabled && entry.contact.take().is_some() {
            self.pending.push(ContactEvent::End { pair, a: entry.a, b: entry.b });
        }
    }

    /// Marks every live contact stale ahead of a detection round.
    pub fn validate_pairs(&mut self) {
        for entry in self.pairs.values_mut() {
            entry.refreshed = false;
        }
    }

    /// Creates or patches the contact for `info`'s pair.
    ///
    /// Patching keeps the warm-start caches of the existing contact.
    pub fn add_contact(&mut self, info: ContactInfo, material: PairMaterial) -> ContactUpdate {
        let pair = info.pair();
        let Some(entry) = self.pairs.get_mut(&pair) else {
            return ContactUpdate::Untracked;
        };
        if !entry.intercontact {
            return ContactUpdate::Suppressed;
        }

        entry.refreshed = true;
        if let Some(contact) = entry.contact.as_mut() {
            contact.patch(info);
            return ContactUpdate::Patched;
        }

        let info = if info.collider_a == entry.a { info } else { info.flipped() };
        entry.contact = Some(Contact::new(info, material.friction, material.restitution, material.is_virtual));
        self.pending.push(ContactEvent::Begin { pair, a: entry.a, b: entry.b });
        debug!(?pair, depth = info.depth, "contact begin");
        ContactUpdate::Created
    }

    /// Destroys contacts not refreshed since [`validate_pairs`](Self::validate_pairs)
    /// and returns every event collected since the last call, in order.
    pub fn emit_events(&mut self) -> Vec<ContactEvent> {
        for (&pair, entry) in self.pairs.iter_mut() {
            if entry.contact.is_some() && !entry.refreshed {
                entry.contact = None;
                self.pending.push(ContactEvent::End { pair, a: entry.a, b: entry.b });
                debug!(?pair, "contact end");
            }
        }
        std::mem::take(&mut self.pending)
    }

    /// Events queued outside a detection round (pair removal, intercontact changes).
    pub fn take_pending(&mut self) -> Vec<ContactEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn contact(&self, pair: PairId) -> Option<&Contact> {
        self.pairs.get(&pair)?.contact.as_ref()
    }

    pub fn contact_mut(&mut self, pair: PairId) -> Option<&mut Contact> {
        self.pairs.get_mut(&pair)?.contact.as_mut()
    }

    /// Live contacts ordered by pair id.
    pub fn contacts(&self) -> impl Iterator<Item = (PairId, &Contact)> {
        self.pairs
            .iter()
            .filter_map(|(&p, e)| e.contact.as_ref().map(|c| (p, c)))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Forgets all pairs without emitting events.
    pub fn clear(&mut self) {
        self.pairs.clear();
        self.pending.clear();
    }
}
