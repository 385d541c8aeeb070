//! Seating assignment engine for table-service floors.
//!
//! The engine takes a floor layout (tables, join adjacencies, an optional
//! overflow area), a party size and a time window, and produces the best
//! table assignment: a single table where one fits, a joined combination
//! where none does, and a reassignment plan that relocates existing parties
//! when the floor is tight. Commits go through a pluggable [`store`]
//! backend guarded by per-resource, per-hour [`lock`]s, so several engine
//! instances can serve the same floor.

pub mod engine;
pub mod layout;
pub mod limits;
pub mod lock;
pub mod model;
pub mod observability;
pub mod store;

pub use engine::{Engine, EngineConfig, EngineError};
pub use layout::{Layout, LayoutProvider, StaticLayoutProvider};
pub use model::{Booking, BookingStatus, ReassignmentPlan, Resource, ResourceKind, Span};
