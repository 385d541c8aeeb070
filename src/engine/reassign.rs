use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use ulid::Ulid;

use crate::layout::Layout;
use crate::model::{PlannedMove, ReassignmentPlan, Span};
use crate::store::BookingStore;

use super::assign::find_best_assignment;
use super::availability::AvailabilityChecker;
use super::EngineError;

/// Tries to clear the ideal resource set for a request that found no direct
/// fit, by relocating the bookings in its way.
///
/// Single-pass heuristic by design: for each of the top-K ideal candidates
/// it re-seats every blocker once, excluding resources already claimed by
/// the candidate or by earlier moves. It does not cross-validate moves
/// beyond that exclusion and does not chain relocations.
pub struct ReassignmentPlanner {
    store: Arc<dyn BookingStore>,
    checker: AvailabilityChecker,
    max_depth: usize,
    top_k: usize,
}

impl ReassignmentPlanner {
    pub fn new(store: Arc<dyn BookingStore>, max_depth: usize, top_k: usize) -> Self {
        let checker = AvailabilityChecker::new(store.clone());
        Self {
            store,
            checker,
            max_depth,
            top_k,
        }
    }

    /// `Ok(None)` means reassignment cannot help: either the party does not
    /// fit the floor at all, or no top-K candidate could be fully cleared.
    /// The caller commits the returned moves and the new assignment in one
    /// transaction; the planner itself holds no lock.
    pub async fn attempt(
        &self,
        party_size: u32,
        window: &Span,
        layout: &Layout,
    ) -> Result<Option<ReassignmentPlan>, EngineError> {
        // Ideal assignment, ignoring current occupancy. If even the full
        // floor can't seat the party, no amount of shuffling will.
        let all: BTreeSet<Ulid> = layout.ids().copied().collect();
        let ideal = find_best_assignment(party_size, &all, layout, self.max_depth)?;
        if ideal.is_empty() {
            metrics::counter!(crate::observability::REASSIGN_ATTEMPTS_TOTAL, "outcome" => "failed")
                .increment(1);
            return Ok(None);
        }

        let overlapping = self.store.active_overlapping(window, None).await;

        for candidate in ideal.candidates.iter().take(self.top_k) {
            let blockers: Vec<_> = overlapping
                .iter()
                .filter(|b| {
                    b.resource_ids
                        .iter()
                        .any(|r| !layout.is_overflow(r) && candidate.members.contains(r))
                })
                .collect();

            if blockers.is_empty() {
                // The availability snapshot was conservative; the set is free.
                metrics::counter!(crate::observability::REASSIGN_ATTEMPTS_TOTAL, "outcome" => "planned")
                    .increment(1);
                return Ok(Some(ReassignmentPlan {
                    chosen: candidate.members.clone(),
                    moves: Vec::new(),
                }));
            }

            let mut claimed: HashSet<Ulid> = candidate.members.iter().copied().collect();
            let mut moves = Vec::with_capacity(blockers.len());
            let mut cleared = true;

            for blocker in &blockers {
                // The blocker keeps its own window: availability for its new
                // seat is computed over the blocker's full original span,
                // not the new request's.
                let taken = self
                    .checker
                    .unavailable(layout, &blocker.span, Some(blocker.id))
                    .await;
                let free: BTreeSet<Ulid> = layout
                    .ids()
                    .filter(|id| !taken.contains(id) && !claimed.contains(id))
                    .copied()
                    .collect();

                let relocation =
                    find_best_assignment(blocker.party_size, &free, layout, self.max_depth)?;
                match relocation.best() {
                    Some(dest) => {
                        claimed.extend(dest.members.iter().copied());
                        moves.push(PlannedMove {
                            booking_id: blocker.id,
                            new_resource_ids: dest.members.clone(),
                        });
                    }
                    None => {
                        tracing::debug!(
                            blocker = %blocker.id,
                            "blocker cannot be relocated, abandoning candidate"
                        );
                        cleared = false;
                        break;
                    }
                }
            }

            if cleared {
                metrics::counter!(crate::observability::REASSIGN_ATTEMPTS_TOTAL, "outcome" => "planned")
                    .increment(1);
                metrics::histogram!(crate::observability::REASSIGN_MOVES)
                    .record(moves.len() as f64);
                return Ok(Some(ReassignmentPlan {
                    chosen: candidate.members.clone(),
                    moves,
                }));
            }
        }

        metrics::counter!(crate::observability::REASSIGN_ATTEMPTS_TOTAL, "outcome" => "failed")
            .increment(1);
        Ok(None)
    }
}
