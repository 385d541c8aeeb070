use std::collections::BTreeSet;

use ulid::Ulid;

use crate::layout::Layout;
use crate::limits::MAX_PARTY_SIZE;
use crate::model::Resource;

use super::candidates;
use super::scoring::score;
use super::EngineError;

/// A feasible resource set, scored. Members are sorted by id.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub members: Vec<Ulid>,
    pub capacity: u32,
    pub score: f64,
}

/// All feasible candidates for one request, best first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assignment {
    pub candidates: Vec<Candidate>,
}

impl Assignment {
    pub fn best(&self) -> Option<&Candidate> {
        self.candidates.first()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Find the best single resource or connected combination for a party.
///
/// Returns every feasible candidate sorted ascending by score (lower is
/// better), ties broken by the smallest member id. An empty list means the
/// request is infeasible against this available set — that is a value, not
/// an error.
pub fn find_best_assignment(
    party_size: u32,
    available: &BTreeSet<Ulid>,
    layout: &Layout,
    max_depth: usize,
) -> Result<Assignment, EngineError> {
    if party_size == 0 {
        return Err(EngineError::InvalidPartySize(party_size));
    }
    if party_size > MAX_PARTY_SIZE {
        return Err(EngineError::LimitExceeded("party too large"));
    }
    for id in available {
        if !layout.contains(id) {
            return Err(EngineError::UnknownResource(*id));
        }
    }

    let raw = candidates::generate(party_size, available, layout, max_depth);
    let mut scored: Vec<Candidate> = raw
        .into_iter()
        .map(|rc| {
            let refs: Vec<&Resource> = rc
                .members
                .iter()
                .map(|id| layout.resource(id).expect("generator returns known ids"))
                .collect();
            let score = score(&refs, rc.capacity, party_size);
            Candidate {
                members: rc.members,
                capacity: rc.capacity,
                score,
            }
        })
        .collect();

    scored.sort_by(|a, b| {
        a.score
            .total_cmp(&b.score)
            .then_with(|| a.members.cmp(&b.members))
    });

    Ok(Assignment { candidates: scored })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limits::MAX_COMBINATION_DEPTH;
    use crate::model::ResourceKind;

    fn table(kind: ResourceKind, min: u32, max: u32, priority: f64) -> Resource {
        Resource {
            id: Ulid::new(),
            kind,
            min_occupancy: min,
            max_occupancy: max,
            priority_weight: priority,
            position: None,
        }
    }

    /// The reference floor from the calibration notes: two joinable 4-tops
    /// and a round table for 4-7.
    fn reference_floor() -> (Layout, Ulid, Ulid, Ulid) {
        let mut layout = Layout::new();
        let a = table(ResourceKind::Standard, 1, 4, 99.0);
        let b = table(ResourceKind::Standard, 1, 4, 98.0);
        let c = table(ResourceKind::Circular, 4, 7, 96.0);
        let (ida, idb, idc) = (a.id, b.id, c.id);
        layout.insert(a);
        layout.insert(b);
        layout.insert(c);
        layout.connect(ida, idb).unwrap();
        (layout, ida, idb, idc)
    }

    fn find(
        party: u32,
        layout: &Layout,
        available: impl IntoIterator<Item = Ulid>,
    ) -> Assignment {
        let avail: BTreeSet<Ulid> = available.into_iter().collect();
        find_best_assignment(party, &avail, layout, MAX_COMBINATION_DEPTH).unwrap()
    }

    #[test]
    fn four_guests_take_the_best_single() {
        let (layout, a, b, c) = reference_floor();
        let result = find(4, &layout, [a, b, c]);
        assert_eq!(result.best().unwrap().members, vec![a]);
    }

    #[test]
    fn six_guests_take_the_round_table() {
        let (layout, a, b, c) = reference_floor();
        let result = find(6, &layout, [a, b, c]);
        assert_eq!(result.best().unwrap().members, vec![c]);
    }

    #[test]
    fn eight_guests_join_the_pair() {
        let (layout, a, b, _) = reference_floor();
        let result = find(8, &layout, [a, b]);
        let best = result.best().unwrap();
        let mut expected = vec![a, b];
        expected.sort();
        assert_eq!(best.members, expected);
        assert_eq!(best.capacity, 10);
        assert_eq!(best.capacity - 8, 2); // waste
    }

    #[test]
    fn no_fit_is_an_empty_assignment() {
        let (layout, a, _, _) = reference_floor();
        let result = find(6, &layout, [a]);
        assert!(result.is_empty());
        assert!(result.best().is_none());
    }

    #[test]
    fn feasibility_soundness() {
        let (layout, a, b, c) = reference_floor();
        for n in 1..=10 {
            let result = find(n, &layout, [a, b, c]);
            for cand in &result.candidates {
                assert!(cand.capacity >= n, "candidate must fit party of {n}");
                let circular = cand
                    .members
                    .iter()
                    .any(|id| layout.resource(id).unwrap().kind == ResourceKind::Circular);
                if circular {
                    assert_eq!(cand.members.len(), 1, "circular seats alone");
                }
                for id in &cand.members {
                    assert!(layout.resource(id).unwrap().min_occupancy <= n);
                }
            }
        }
    }

    #[test]
    fn candidates_sorted_ascending() {
        let (layout, a, b, c) = reference_floor();
        let result = find(4, &layout, [a, b, c]);
        assert!(result.candidates.len() >= 2);
        for w in result.candidates.windows(2) {
            assert!(w[0].score <= w[1].score);
        }
    }

    #[test]
    fn identical_inputs_identical_output() {
        let (layout, a, b, c) = reference_floor();
        let first = find(6, &layout, [a, b, c]);
        for _ in 0..10 {
            assert_eq!(find(6, &layout, [a, b, c]), first);
        }
    }

    #[test]
    fn equal_scores_tie_break_on_smallest_id() {
        let mut layout = Layout::new();
        let a = table(ResourceKind::Standard, 1, 4, 50.0);
        let b = table(ResourceKind::Standard, 1, 4, 50.0);
        let (ida, idb) = (a.id, b.id);
        layout.insert(a);
        layout.insert(b);
        let result = find(4, &layout, [ida, idb]);
        assert_eq!(result.candidates.len(), 2);
        assert_eq!(result.best().unwrap().members, vec![ida.min(idb)]);
    }

    #[test]
    fn zero_party_rejected() {
        let (layout, a, _, _) = reference_floor();
        let avail: BTreeSet<Ulid> = [a].into_iter().collect();
        let result = find_best_assignment(0, &avail, &layout, MAX_COMBINATION_DEPTH);
        assert!(matches!(result, Err(EngineError::InvalidPartySize(0))));
    }

    #[test]
    fn oversized_party_rejected() {
        let (layout, a, _, _) = reference_floor();
        let avail: BTreeSet<Ulid> = [a].into_iter().collect();
        let result = find_best_assignment(101, &avail, &layout, MAX_COMBINATION_DEPTH);
        assert!(matches!(result, Err(EngineError::LimitExceeded(_))));
    }

    #[test]
    fn unknown_available_id_rejected() {
        let (layout, _, _, _) = reference_floor();
        let avail: BTreeSet<Ulid> = [Ulid::new()].into_iter().collect();
        let result = find_best_assignment(2, &avail, &layout, MAX_COMBINATION_DEPTH);
        assert!(matches!(result, Err(EngineError::UnknownResource(_))));
    }
}
