use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unix milliseconds — the only time type.
pub type Ms = i64;

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: Ms,
    pub end: Ms,
}

impl Span {
    pub fn new(start: Ms, end: Ms) -> Self {
        debug_assert!(start < end, "Span start must be before end");
        Self { start, end }
    }

    pub fn duration_ms(&self) -> Ms {
        self.end - self.start
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Physical kind of a seating resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Plain rectangular table; joinable with adjacent tables.
    Standard,
    /// Round table; seats one party alone, never part of a combination.
    Circular,
    /// Two fixed units permanently merged; counts as 2 units in the
    /// capacity formula.
    MergedFixed,
}

/// 2D floor position. Only the stacking (y) axis is consulted, by the
/// vertical-layout capacity rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// A bookable seating unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: Ulid,
    pub kind: ResourceKind,
    pub min_occupancy: u32,
    pub max_occupancy: u32,
    /// Preference rank — lower is worse. The designated overflow resource
    /// sits near zero so it only wins when nothing else fits.
    pub priority_weight: f64,
    pub position: Option<Position>,
}

impl Resource {
    /// Unit weight in the stepped capacity formula.
    pub fn units(&self) -> u32 {
        match self.kind {
            ResourceKind::MergedFixed => 2,
            _ => 1,
        }
    }
}

/// Booking lifecycle. The store owns transitions; the core reads occupancy
/// and validates transitions via [`BookingStatus::can_transition_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Hold,
    PendingDeposit,
    Confirmed,
    CheckedIn,
    Cancelled,
    Completed,
    NoShow,
}

impl BookingStatus {
    /// Whether a booking in this status reserves its resources.
    pub fn occupies(&self) -> bool {
        matches!(
            self,
            BookingStatus::Hold
                | BookingStatus::PendingDeposit
                | BookingStatus::Confirmed
                | BookingStatus::CheckedIn
        )
    }

    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        match self {
            Hold => matches!(next, PendingDeposit | Confirmed | Cancelled),
            PendingDeposit => matches!(next, Confirmed | Cancelled),
            Confirmed => matches!(next, CheckedIn | Cancelled | NoShow),
            CheckedIn => matches!(next, Completed),
            Cancelled | Completed | NoShow => false,
        }
    }
}

/// A seated (or held) party occupying one or more resources for a window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Ulid,
    pub resource_ids: Vec<Ulid>,
    /// Headcount the booking was seated for. Needed when the booking has to
    /// be re-seated to make room for another party.
    pub party_size: u32,
    pub span: Span,
    pub status: BookingStatus,
}

impl Booking {
    pub fn occupies(&self, resource_id: &Ulid) -> bool {
        self.status.occupies() && self.resource_ids.contains(resource_id)
    }
}

/// One relocation the planner proposes: move an existing booking onto a new
/// resource set (same window, same party).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedMove {
    pub booking_id: Ulid,
    pub new_resource_ids: Vec<Ulid>,
}

/// Output of the reassignment planner: the resource set cleared for the new
/// request plus the moves the caller must commit atomically first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReassignmentPlan {
    pub chosen: Vec<Ulid>,
    pub moves: Vec<PlannedMove>,
}
