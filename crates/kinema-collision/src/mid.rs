//! Mid phase: deduplicates broad-phase candidates and drops the ones the
//! pairs registry does not track (static–static pairs, removed colliders).

use std::collections::BTreeSet;

use crate::broad::CandidatePair;
use crate::registry::PairsRegistry;

#[derive(Debug, Default, Clone)]
pub struct MidPhase;

impl MidPhase {
    pub fn new() -> Self {
        Self
    }

    pub fn filter(&self, candidates: Vec<CandidatePair>, registry: &PairsRegistry) -> Vec<CandidatePair> {
        let mut seen = BTreeSet::new();
        candidates
            .into_iter()
            .filter(|c| c.a != c.b && seen.insert(c.pair) && registry.pair(c.pair).is_some())
            .collect()
    }
}
