use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use ulid::Ulid;

use crate::engine::EngineError;
use crate::limits::MAX_LOCK_KEYS;
use crate::model::{Ms, Span};

const HOUR_MS: Ms = 3_600_000;

/// How long a commit critical section may hold its keys before the service
/// reclaims them. Caps the damage of a crashed holder.
pub const DEFAULT_LOCK_TTL: Duration = Duration::from_secs(5);
/// Give up acquiring after this long and surface a retryable conflict.
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(2);
const RETRY_BACKOFF: Duration = Duration::from_millis(10);

/// One lockable unit: a resource crossed with an hour bucket of wall time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LockKey {
    pub resource: Ulid,
    pub bucket: Ms,
}

/// Every (resource × hour bucket) the window touches, sorted and deduped.
pub fn lock_keys(resources: &[Ulid], window: &Span) -> Vec<LockKey> {
    let first = window.start.div_euclid(HOUR_MS);
    let last = (window.end - 1).div_euclid(HOUR_MS);
    let mut keys = Vec::with_capacity(resources.len() * (last - first + 1) as usize);
    for resource in resources {
        for bucket in first..=last {
            keys.push(LockKey {
                resource: *resource,
                bucket,
            });
        }
    }
    keys.sort();
    keys.dedup();
    keys
}

/// Distributed mutual exclusion over lock keys. A contention-reduction
/// mechanism only — correctness comes from the store's transactional
/// re-check.
#[async_trait]
pub trait LockService: Send + Sync {
    /// Acquire every key or none. Returns false without holding anything if
    /// any key is taken.
    async fn try_acquire(&self, keys: &[LockKey], ttl: Duration) -> bool;

    async fn release(&self, keys: &[LockKey]);
}

/// Single-process lock table. Per-key check-and-set through the map's entry
/// API, with rollback of partial acquisitions for all-or-nothing semantics.
#[derive(Default)]
pub struct InMemoryLockService {
    held: DashMap<LockKey, Instant>,
}

impl InMemoryLockService {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LockService for InMemoryLockService {
    async fn try_acquire(&self, keys: &[LockKey], ttl: Duration) -> bool {
        let now = Instant::now();
        let expiry = now + ttl;
        for (i, key) in keys.iter().enumerate() {
            let mut taken = false;
            self.held
                .entry(*key)
                .and_modify(|e| {
                    if *e > now {
                        taken = true;
                    } else {
                        *e = expiry; // expired holder, reclaim
                    }
                })
                .or_insert(expiry);
            if taken {
                // Roll back what we grabbed so far.
                for k in &keys[..i] {
                    self.held.remove(k);
                }
                return false;
            }
        }
        true
    }

    async fn release(&self, keys: &[LockKey]) {
        for key in keys {
            self.held.remove(key);
        }
    }
}

/// For tests and single-instance deployments where the store's transaction
/// alone is enough. Selected by injection, never by environment flags.
pub struct NoopLockService;

#[async_trait]
impl LockService for NoopLockService {
    async fn try_acquire(&self, _keys: &[LockKey], _ttl: Duration) -> bool {
        true
    }

    async fn release(&self, _keys: &[LockKey]) {}
}

/// Keys held for one commit critical section. Release is explicit; the TTL
/// is the backstop if the holder dies first.
pub struct LockGuard {
    keys: Vec<LockKey>,
    service: Arc<dyn LockService>,
}

impl LockGuard {
    pub async fn release(self) {
        self.service.release(&self.keys).await;
    }
}

/// Retries `try_acquire` with a short backoff until the acquire timeout,
/// then reports retryable contention. Never fatal.
pub struct LockCoordinator {
    service: Arc<dyn LockService>,
    ttl: Duration,
    acquire_timeout: Duration,
}

impl LockCoordinator {
    pub fn new(service: Arc<dyn LockService>, ttl: Duration, acquire_timeout: Duration) -> Self {
        Self {
            service,
            ttl,
            acquire_timeout,
        }
    }

    pub async fn lock(&self, resources: &[Ulid], window: &Span) -> Result<LockGuard, EngineError> {
        let keys = lock_keys(resources, window);
        if keys.len() > MAX_LOCK_KEYS {
            return Err(EngineError::LimitExceeded("too many lock keys"));
        }
        let deadline = Instant::now() + self.acquire_timeout;
        loop {
            if self.service.try_acquire(&keys, self.ttl).await {
                return Ok(LockGuard {
                    keys,
                    service: self.service.clone(),
                });
            }
            if Instant::now() >= deadline {
                metrics::counter!(crate::observability::LOCK_CONTENTION_TOTAL).increment(1);
                tracing::debug!(keys = keys.len(), "lock acquisition timed out");
                return Err(EngineError::Contention("lock acquisition timed out"));
            }
            tokio::time::sleep(RETRY_BACKOFF).await;
        }
    }
}
