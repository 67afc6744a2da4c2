//! Islands: groups of interacting bodies solved independently.
//!
//! Static bodies never belong to an island and never connect two islands;
//! joints and contacts touching them are solved with the island of their
//! other body. Virtual contacts carry no rows and do not connect bodies.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use kinema_collision::PairsRegistry;
use kinema_types::{BodyId, IslandId, JointId, PairId};

use crate::body::Body;
use crate::joint::Joint;

#[derive(Debug, Clone, PartialEq)]
pub struct Island {
    pub id: IslandId,
    pub bodies: Vec<BodyId>,
    pub joints: Vec<JointId>,
    pub contacts: Vec<PairId>,
    /// Every body of the island is asleep.
    pub sleeping: bool,
}

impl Island {
    fn new(id: u32) -> Self {
        Self {
            id: IslandId(id),
            bodies: Vec::new(),
            joints: Vec::new(),
            contacts: Vec::new(),
            sleeping: false,
        }
    }
}

/// Partitions the non-static bodies into islands.
pub trait IslandGenerator: Send + Sync {
    fn generate(
        &self,
        bodies: &BTreeMap<BodyId, Body>,
        joints: &BTreeMap<JointId, Joint>,
        registry: &PairsRegistry,
    ) -> Vec<Island>;

    fn name(&self) -> &str;
}

/// Body across a live, solid contact.
fn contact_partner(registry: &PairsRegistry, pair: PairId, body: BodyId) -> Option<BodyId> {
    let contact = registry.contact(pair)?;
    if contact.is_virtual {
        return None;
    }
    let (a, b) = (contact.info.body_a, contact.info.body_b);
    if a == body {
        Some(b)
    } else if b == body {
        Some(a)
    } else {
        None
    }
}

fn is_dynamic(bodies: &BTreeMap<BodyId, Body>, id: BodyId) -> bool {
    bodies.get(&id).is_some_and(|b| !b.is_static())
}

/// One island per connected component of the joint/contact graph.
#[derive(Debug, Clone, Default)]
pub struct PerConnectedComponent;

impl PerConnectedComponent {
    pub fn new() -> Self {
        Self
    }
}

impl IslandGenerator for PerConnectedComponent {
    fn generate(
        &self,
        bodies: &BTreeMap<BodyId, Body>,
        joints: &BTreeMap<JointId, Joint>,
        registry: &PairsRegistry,
    ) -> Vec<Island> {
        let mut islands = Vec::new();
        let mut visited = BTreeSet::new();
        let mut seen_joints = BTreeSet::new();
        let mut seen_contacts = BTreeSet::new();
        let mut queue = VecDeque::new();

        for (&seed, body) in bodies {
            if body.is_static() || !visited.insert(seed) {
                continue;
            }

            let mut island = Island::new(islands.len() as u32);
            let mut sleeping = true;
            queue.push_back(seed);

            while let Some(id) = queue.pop_front() {
                let Some(body) = bodies.get(&id) else { continue };
                island.bodies.push(id);
                sleeping &= body.is_sleeping();

                for joint_id in body.joints() {
                    let Some(joint) = joints.get(&joint_id) else { continue };
                    if seen_joints.insert(joint_id) {
                        island.joints.push(joint_id);
                    }
                    if let Some(other) = joint.other(id) {
                        if is_dynamic(bodies, other) && visited.insert(other) {
                            queue.push_back(other);
                        }
                    }
                }

                for pair in body.contacts() {
                    let Some(other) = contact_partner(registry, pair, id) else { continue };
                    if seen_contacts.insert(pair) {
                        island.contacts.push(pair);
                    }
                    if is_dynamic(bodies, other) && visited.insert(other) {
                        queue.push_back(other);
                    }
                }
            }

            island.sleeping = sleeping;
            islands.push(island);
        }

        islands
    }

    fn name(&self) -> &str {
        "per-connected-component"
    }
}

/// Every non-static body in one island.
#[derive(Debug, Clone, Default)]
pub struct SingleIsland;

impl SingleIsland {
    pub fn new() -> Self {
        Self
    }
}

impl IslandGenerator for SingleIsland {
    fn generate(
        &self,
        bodies: &BTreeMap<BodyId, Body>,
        joints: &BTreeMap<JointId, Joint>,
        registry: &PairsRegistry,
    ) -> Vec<Island> {
        let mut island = Island::new(0);
        let mut sleeping = true;
        let mut seen_joints = BTreeSet::new();
        let mut seen_contacts = BTreeSet::new();

        for (&id, body) in bodies.iter().filter(|(_, b)| !b.is_static()) {
            island.bodies.push(id);
            sleeping &= body.is_sleeping();

            for joint_id in body.joints() {
                if joints.contains_key(&joint_id) && seen_joints.insert(joint_id) {
                    island.joints.push(joint_id);
                }
            }
            for pair in body.contacts() {
                if contact_partner(registry, pair, id).is_some() && seen_contacts.insert(pair) {
                    island.contacts.push(pair);
                }
            }
        }

        if island.bodies.is_empty() {
            return Vec::new();
        }
        island.sleeping = sleeping;
        vec![island]
    }

    fn name(&self) -> &str {
        "single-island"
    }
}
