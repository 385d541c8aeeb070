use std::collections::{BTreeSet, HashSet};

use ulid::Ulid;

use crate::layout::Layout;
use crate::model::{Resource, ResourceKind};

use super::capacity::effective_capacity;

/// Round tables seat at most this many as a single party.
pub const CIRCULAR_MAX_PARTY: u32 = 7;

/// A member set that fits the party, before scoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCandidate {
    /// Sorted resource ids.
    pub members: Vec<Ulid>,
    pub capacity: u32,
}

fn eligible(r: &Resource, party_size: u32) -> bool {
    r.min_occupancy <= party_size
        && (r.kind != ResourceKind::Circular || party_size <= CIRCULAR_MAX_PARTY)
}

/// Enumerate every feasible single resource and connected combination.
///
/// Singles: any eligible resource whose `max_occupancy` covers the party.
/// Combinations: bounded traversal of the adjacency graph, extending a path
/// only to unvisited eligible neighbors of its tail; a path becomes a
/// candidate as soon as its effective capacity reaches the party size and is
/// not extended past that. Circular resources never enter a combination.
///
/// The traversal is an explicit worklist, not recursion, so long adjacency
/// chains can't blow the stack. Starts and neighbor expansion run in sorted
/// id order: identical inputs always produce identical output.
///
/// Callers must have validated `available` against the layout.
pub fn generate(
    party_size: u32,
    available: &BTreeSet<Ulid>,
    layout: &Layout,
    max_depth: usize,
) -> Vec<RawCandidate> {
    let mut out = Vec::new();
    let mut seen: HashSet<Vec<Ulid>> = HashSet::new();

    let eligible_ids: BTreeSet<Ulid> = available
        .iter()
        .filter(|id| layout.resource(id).is_some_and(|r| eligible(r, party_size)))
        .copied()
        .collect();

    // Single-resource candidates.
    for id in &eligible_ids {
        let r = layout.resource(id).expect("eligible id resolves");
        if r.max_occupancy >= party_size {
            out.push(RawCandidate {
                members: vec![*id],
                capacity: r.max_occupancy,
            });
            seen.insert(vec![*id]);
        }
    }

    // Combination candidates: worklist of partial paths.
    struct Path {
        members: Vec<Ulid>,
        visited: BTreeSet<Ulid>,
    }

    let joinable = |id: &Ulid| -> bool {
        layout
            .resource(id)
            .is_some_and(|r| r.kind != ResourceKind::Circular)
    };

    for start in &eligible_ids {
        if !joinable(start) {
            continue;
        }
        let mut worklist = vec![Path {
            members: vec![*start],
            visited: BTreeSet::from([*start]),
        }];

        while let Some(path) = worklist.pop() {
            if path.members.len() > 1 {
                let refs: Vec<&Resource> = path
                    .members
                    .iter()
                    .map(|id| layout.resource(id).expect("path member resolves"))
                    .collect();
                let capacity = effective_capacity(&refs);
                if capacity >= party_size {
                    let mut signature = path.members.clone();
                    signature.sort();
                    if seen.insert(signature.clone()) {
                        out.push(RawCandidate {
                            members: signature,
                            capacity,
                        });
                    }
                    // Fits already; a longer path only wastes seats.
                    continue;
                }
            }
            if path.members.len() >= max_depth {
                continue;
            }
            let tail = *path.members.last().expect("paths are non-empty");
            for next in layout.neighbors(&tail) {
                if path.visited.contains(next)
                    || !eligible_ids.contains(next)
                    || !joinable(next)
                {
                    continue;
                }
                let mut members = path.members.clone();
                members.push(*next);
                let mut visited = path.visited.clone();
                visited.insert(*next);
                worklist.push(Path { members, visited });
            }
        }
    }

    out
}
