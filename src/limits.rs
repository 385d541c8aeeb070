//! Hard limits on inputs. Anything past these is a caller error, not a
//! capacity decision.

use crate::model::Ms;

/// 2000-01-01T00:00:00Z — timestamps before this are garbage input.
pub const MIN_VALID_TIMESTAMP_MS: Ms = 946_684_800_000;

/// 2100-01-01T00:00:00Z.
pub const MAX_VALID_TIMESTAMP_MS: Ms = 4_102_444_800_000;

/// A single booking window never exceeds 24h.
pub const MAX_SPAN_DURATION_MS: Ms = 24 * 3_600_000;

/// Largest party the search will attempt to seat.
pub const MAX_PARTY_SIZE: u32 = 100;

/// Default bound on combination length in the adjacency traversal.
pub const MAX_COMBINATION_DEPTH: usize = 8;

/// How many ideal candidates the reassignment planner tries to clear.
pub const REASSIGN_TOP_K: usize = 3;

/// Upper bound on (resource × hour-bucket) keys per lock acquisition.
pub const MAX_LOCK_KEYS: usize = 512;
