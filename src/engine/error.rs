use ulid::Ulid;

use crate::model::BookingStatus;

/// Error taxonomy. Infeasibility ("no fit") is never an error — the engine
/// returns an empty candidate list or `None` for that. Everything here is
/// either a hard caller error or a retryable contention condition; see
/// [`EngineError::is_retryable`].
#[derive(Debug)]
pub enum EngineError {
    UnknownResource(Ulid),
    InvalidPartySize(u32),
    NotFound(Ulid),
    InvalidStatusChange {
        from: BookingStatus,
        to: BookingStatus,
    },
    LimitExceeded(&'static str),
    /// Lock acquisition timed out — retry the whole search.
    Contention(&'static str),
    /// An overlapping booking was found at commit time; the availability
    /// snapshot was stale. Retry the whole search.
    Conflict(Ulid),
}

impl EngineError {
    /// Whether the caller should retry the request from scratch rather than
    /// reject it.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Contention(_) | EngineError::Conflict(_))
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::UnknownResource(id) => write!(f, "unknown resource: {id}"),
            EngineError::InvalidPartySize(n) => write!(f, "invalid party size: {n}"),
            EngineError::NotFound(id) => write!(f, "not found: {id}"),
            EngineError::InvalidStatusChange { from, to } => {
                write!(f, "invalid status change: {from:?} -> {to:?}")
            }
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            EngineError::Contention(msg) => write!(f, "contention: {msg}"),
            EngineError::Conflict(id) => write!(f, "conflict with booking: {id}"),
        }
    }
}

impl std::error::Error for EngineError {}
