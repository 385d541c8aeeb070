mod assign;
mod availability;
mod candidates;
mod capacity;
mod error;
mod reassign;
mod scoring;

pub use assign::{find_best_assignment, Assignment, Candidate};
pub use availability::AvailabilityChecker;
pub use candidates::CIRCULAR_MAX_PARTY;
pub use capacity::{capacity_of, effective_capacity, VERTICAL_STACK_THRESHOLD};
pub use error::EngineError;
pub use reassign::ReassignmentPlanner;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use ulid::Ulid;

use crate::layout::LayoutProvider;
use crate::limits::{
    MAX_COMBINATION_DEPTH, MAX_SPAN_DURATION_MS, MAX_VALID_TIMESTAMP_MS, MIN_VALID_TIMESTAMP_MS,
    REASSIGN_TOP_K,
};
use crate::lock::{LockCoordinator, LockService, DEFAULT_ACQUIRE_TIMEOUT, DEFAULT_LOCK_TTL};
use crate::model::{Booking, BookingStatus, ReassignmentPlan, Span};
use crate::observability;
use crate::store::BookingStore;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub max_combination_depth: usize,
    pub reassign_top_k: usize,
    pub lock_ttl: std::time::Duration,
    pub lock_acquire_timeout: std::time::Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_combination_depth: MAX_COMBINATION_DEPTH,
            reassign_top_k: REASSIGN_TOP_K,
            lock_ttl: DEFAULT_LOCK_TTL,
            lock_acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
        }
    }
}

pub(crate) fn validate_window(window: &Span) -> Result<(), EngineError> {
    if window.start >= window.end {
        return Err(EngineError::LimitExceeded("window start must precede end"));
    }
    if window.start < MIN_VALID_TIMESTAMP_MS || window.end > MAX_VALID_TIMESTAMP_MS {
        return Err(EngineError::LimitExceeded("timestamp out of range"));
    }
    if window.duration_ms() > MAX_SPAN_DURATION_MS {
        return Err(EngineError::LimitExceeded("window too wide"));
    }
    Ok(())
}

/// The full booking flow: availability, assignment search, reassignment
/// fallback, distributed lock, transactional commit with re-check.
///
/// All collaborators come in by injection; the engine holds no layout
/// singleton and no mutable state of its own, so one instance is safe to
/// share across any number of request handlers.
pub struct Engine {
    layout: Arc<dyn LayoutProvider>,
    store: Arc<dyn BookingStore>,
    checker: AvailabilityChecker,
    planner: ReassignmentPlanner,
    locks: LockCoordinator,
    config: EngineConfig,
}

impl Engine {
    pub fn new(
        layout: Arc<dyn LayoutProvider>,
        store: Arc<dyn BookingStore>,
        lock_service: Arc<dyn LockService>,
        config: EngineConfig,
    ) -> Self {
        let checker = AvailabilityChecker::new(store.clone());
        let planner = ReassignmentPlanner::new(
            store.clone(),
            config.max_combination_depth,
            config.reassign_top_k,
        );
        let locks = LockCoordinator::new(lock_service, config.lock_ttl, config.lock_acquire_timeout);
        Self {
            layout,
            store,
            checker,
            planner,
            locks,
            config,
        }
    }

    /// Best candidate(s) for a party against an explicit available set.
    pub async fn find_best_assignment(
        &self,
        party_size: u32,
        available: &BTreeSet<Ulid>,
    ) -> Result<Assignment, EngineError> {
        let layout = self.layout.snapshot().await?;
        let assignment = assign::find_best_assignment(
            party_size,
            available,
            &layout,
            self.config.max_combination_depth,
        )?;
        metrics::histogram!(observability::ASSIGNMENT_CANDIDATES)
            .record(assignment.candidates.len() as f64);
        Ok(assignment)
    }

    /// Plan relocations to clear the ideal seat for a request that found no
    /// direct fit. Read-only; the caller commits the plan.
    pub async fn attempt_reassignment(
        &self,
        party_size: u32,
        window: &Span,
    ) -> Result<Option<ReassignmentPlan>, EngineError> {
        validate_window(window)?;
        let layout = self.layout.snapshot().await?;
        self.planner.attempt(party_size, window, &layout).await
    }

    /// Seat a party: search, fall back to reassignment, lock, commit.
    ///
    /// `Ok(None)` is "no availability" — reject, don't retry. Retryable
    /// errors ([`EngineError::is_retryable`]) mean the caller should re-run
    /// the whole request; its availability snapshot is stale.
    pub async fn request_booking(
        &self,
        party_size: u32,
        window: &Span,
    ) -> Result<Option<Booking>, EngineError> {
        self.seat(party_size, window, BookingStatus::Confirmed).await
    }

    /// Same flow, but the booking lands as a short-lived hold.
    pub async fn request_hold(
        &self,
        party_size: u32,
        window: &Span,
    ) -> Result<Option<Booking>, EngineError> {
        self.seat(party_size, window, BookingStatus::Hold).await
    }

    async fn seat(
        &self,
        party_size: u32,
        window: &Span,
        status: BookingStatus,
    ) -> Result<Option<Booking>, EngineError> {
        let started = Instant::now();
        let result = self.seat_inner(party_size, window, status).await;
        metrics::histogram!(observability::BOOKING_REQUEST_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());
        result
    }

    async fn seat_inner(
        &self,
        party_size: u32,
        window: &Span,
        status: BookingStatus,
    ) -> Result<Option<Booking>, EngineError> {
        validate_window(window)?;
        let layout = self.layout.snapshot().await?;

        let free = self.checker.free_resources(&layout, window, None).await;
        let assignment = assign::find_best_assignment(
            party_size,
            &free,
            &layout,
            self.config.max_combination_depth,
        )?;

        let (chosen, moves, outcome) = match assignment.best() {
            Some(candidate) => (candidate.members.clone(), Vec::new(), "seated"),
            None => match self.planner.attempt(party_size, window, &layout).await? {
                Some(plan) => (plan.chosen, plan.moves, "reassigned"),
                None => {
                    tracing::debug!(party_size, "no availability");
                    metrics::counter!(observability::BOOKING_REQUESTS_TOTAL, "outcome" => "infeasible")
                        .increment(1);
                    return Ok(None);
                }
            },
        };

        // Lock everything the commit will touch: the chosen set plus every
        // move destination.
        let mut to_lock = chosen.clone();
        for mv in &moves {
            to_lock.extend(mv.new_resource_ids.iter().copied());
        }
        let guard = match self.locks.lock(&to_lock, window).await {
            Ok(guard) => guard,
            Err(e) => {
                metrics::counter!(observability::BOOKING_REQUESTS_TOTAL, "outcome" => "contention")
                    .increment(1);
                return Err(e);
            }
        };

        let booking = Booking {
            id: Ulid::new(),
            resource_ids: chosen,
            party_size,
            span: *window,
            status,
        };
        // Commit re-checks every overlap inside the store transaction; the
        // guard is released on success and failure alike.
        let committed = self.store.commit(&moves, booking.clone()).await;
        guard.release().await;

        match committed {
            Ok(()) => {
                tracing::info!(
                    booking = %booking.id,
                    party_size,
                    resources = booking.resource_ids.len(),
                    moves = moves.len(),
                    "party seated"
                );
                metrics::counter!(observability::BOOKING_REQUESTS_TOTAL, "outcome" => outcome)
                    .increment(1);
                Ok(Some(booking))
            }
            Err(e) => {
                if matches!(e, EngineError::Conflict(_)) {
                    metrics::counter!(observability::COMMIT_CONFLICTS_TOTAL).increment(1);
                    metrics::counter!(observability::BOOKING_REQUESTS_TOTAL, "outcome" => "conflict")
                        .increment(1);
                }
                Err(e)
            }
        }
    }

    pub async fn cancel_booking(&self, id: Ulid) -> Result<Booking, EngineError> {
        self.store.set_status(id, BookingStatus::Cancelled).await
    }

    pub async fn set_status(
        &self,
        id: Ulid,
        status: BookingStatus,
    ) -> Result<Booking, EngineError> {
        self.store.set_status(id, status).await
    }
}
