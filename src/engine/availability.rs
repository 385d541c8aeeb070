use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use ulid::Ulid;

use crate::layout::Layout;
use crate::model::Span;
use crate::store::BookingStore;

/// Read-side occupancy queries against the external booking store.
///
/// Results are advisory: time passes between this check and the commit, so
/// the store re-verifies overlaps inside the commit transaction.
pub struct AvailabilityChecker {
    store: Arc<dyn BookingStore>,
}

impl AvailabilityChecker {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    /// Resource ids held by any active booking overlapping the window
    /// (half-open), optionally excluding one booking. The overflow resource
    /// is filtered unconditionally; it is never reported as taken.
    pub async fn unavailable(
        &self,
        layout: &Layout,
        window: &Span,
        exclude: Option<Ulid>,
    ) -> HashSet<Ulid> {
        let mut taken = HashSet::new();
        for booking in self.store.active_overlapping(window, exclude).await {
            taken.extend(booking.resource_ids);
        }
        if let Some(overflow) = layout.overflow {
            taken.remove(&overflow);
        }
        taken
    }

    /// Layout ids minus the unavailable set, sorted.
    pub async fn free_resources(
        &self,
        layout: &Layout,
        window: &Span,
        exclude: Option<Ulid>,
    ) -> BTreeSet<Ulid> {
        let taken = self.unavailable(layout, window, exclude).await;
        layout
            .ids()
            .filter(|id| !taken.contains(id))
            .copied()
            .collect()
    }
}
