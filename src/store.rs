use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use ulid::Ulid;

use crate::engine::EngineError;
use crate::model::{Booking, BookingStatus, PlannedMove, Span};

/// External booking store. The core reads occupancy from it and proposes
/// resource-set changes; the store owns persistence and the serializable
/// commit transaction.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Active bookings whose window overlaps `window` (half-open),
    /// optionally excluding one booking id.
    async fn active_overlapping(&self, window: &Span, exclude: Option<Ulid>) -> Vec<Booking>;

    /// Atomically apply the planned moves and insert the new booking.
    /// The overlap check MUST be re-run inside this transaction: the
    /// availability snapshot the caller searched against has aged by the
    /// time it commits. Each moved booking is re-checked over its own
    /// window, the new booking over its own.
    async fn commit(&self, moves: &[PlannedMove], booking: Booking) -> Result<(), EngineError>;

    /// Insert one booking with no moves.
    async fn create(&self, booking: Booking) -> Result<(), EngineError> {
        self.commit(&[], booking).await
    }

    /// Transition a booking's status, enforcing the lifecycle state machine.
    async fn set_status(&self, id: Ulid, status: BookingStatus) -> Result<Booking, EngineError>;

    async fn get(&self, id: Ulid) -> Option<Booking>;
}

/// Two active bookings collide when their windows overlap and they share any
/// resource other than the overflow resource (which absorbs unlimited
/// parties by design of the floor, not of this store).
fn conflicts(a: &Booking, b: &Booking, overflow: Option<Ulid>) -> bool {
    if !a.status.occupies() || !b.status.occupies() || !a.span.overlaps(&b.span) {
        return false;
    }
    a.resource_ids
        .iter()
        .any(|r| Some(*r) != overflow && b.resource_ids.contains(r))
}

/// Reference store: a single RwLock'd map. The write section is the
/// serializable transaction; nothing else mutates bookings.
pub struct InMemoryBookingStore {
    bookings: RwLock<HashMap<Ulid, Booking>>,
    overflow: Option<Ulid>,
}

impl InMemoryBookingStore {
    pub fn new(overflow: Option<Ulid>) -> Self {
        Self {
            bookings: RwLock::new(HashMap::new()),
            overflow,
        }
    }

    pub async fn len(&self) -> usize {
        self.bookings.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.bookings.read().await.is_empty()
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn active_overlapping(&self, window: &Span, exclude: Option<Ulid>) -> Vec<Booking> {
        let map = self.bookings.read().await;
        let mut out: Vec<Booking> = map
            .values()
            .filter(|b| {
                b.status.occupies()
                    && b.span.overlaps(window)
                    && exclude.is_none_or(|ex| ex != b.id)
            })
            .cloned()
            .collect();
        out.sort_by_key(|b| b.id);
        out
    }

    async fn commit(&self, moves: &[PlannedMove], booking: Booking) -> Result<(), EngineError> {
        let mut map = self.bookings.write().await;

        // Phase 1: stage the moves plus the new booking.
        let mut staged = map.clone();
        let mut touched: Vec<Ulid> = Vec::with_capacity(moves.len() + 1);
        for mv in moves {
            let existing = staged
                .get_mut(&mv.booking_id)
                .ok_or(EngineError::NotFound(mv.booking_id))?;
            if !existing.status.occupies() {
                // Plan went stale: the blocker was cancelled/completed since.
                return Err(EngineError::Conflict(mv.booking_id));
            }
            existing.resource_ids = mv.new_resource_ids.clone();
            touched.push(mv.booking_id);
        }
        let new_id = booking.id;
        staged.insert(new_id, booking);
        touched.push(new_id);

        // Phase 2: re-check every touched booking against the staged state,
        // each over its own window.
        for id in &touched {
            let changed = &staged[id];
            for other in staged.values() {
                if other.id != *id && conflicts(changed, other, self.overflow) {
                    return Err(EngineError::Conflict(other.id));
                }
            }
        }

        *map = staged;
        Ok(())
    }

    async fn set_status(&self, id: Ulid, status: BookingStatus) -> Result<Booking, EngineError> {
        let mut map = self.bookings.write().await;
        let booking = map.get_mut(&id).ok_or(EngineError::NotFound(id))?;
        if !booking.status.can_transition_to(status) {
            return Err(EngineError::InvalidStatusChange {
                from: booking.status,
                to: status,
            });
        }
        booking.status = status;
        Ok(booking.clone())
    }

    async fn get(&self, id: Ulid) -> Option<Booking> {
        self.bookings.read().await.get(&id).cloned()
    }
}
