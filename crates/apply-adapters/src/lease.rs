//! Apply-serialization Lease: a process-wide semaphore that bounds the
//! number of applies executing concurrently (SPEC_FULL.md §5, default
//! capacity 1, configurable 1-5 via `EngineConfig.policy.apply_lease_capacity`).
//!
//! Grounded on `examples/original_source/apply_engine/engine.py`'s
//! `asyncio.Semaphore(1)`, reimplemented with `tokio::sync::Semaphore`.

use std::sync::Arc;

use apply_domain::DomainError;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

pub struct ApplySerializationLease {
    semaphore: Arc<Semaphore>,
}

impl ApplySerializationLease {
    pub fn new(capacity: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity.max(1))),
        }
    }

    /// Attempt to acquire a permit without waiting. Returns
    /// `DomainError::LeaseBusy` if the lease is fully held, matching §4.1's
    /// "busy rejection" (the caller gets an immediate error rather than
    /// queuing behind an unrelated apply). The permit is owned rather than
    /// borrowed so it can be moved into the Apply Worker's dedicated OS
    /// thread and held for the lifetime of that one apply flow.
    pub fn try_acquire(&self) -> Result<LeasePermit, DomainError> {
        Arc::clone(&self.semaphore)
            .try_acquire_owned()
            .map(LeasePermit)
            .map_err(|_| DomainError::LeaseBusy)
    }
}

/// An acquired lease permit. Releases automatically on drop.
pub struct LeasePermit(OwnedSemaphorePermit);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_capacity_rejects_second_concurrent_acquire() {
        let lease = ApplySerializationLease::new(1);
        let first = lease.try_acquire().unwrap();
        let second = lease.try_acquire();
        assert!(matches!(second, Err(DomainError::LeaseBusy)));
        drop(first);
        assert!(lease.try_acquire().is_ok());
    }

    #[test]
    fn capacity_of_two_allows_two_concurrent_acquires() {
        let lease = ApplySerializationLease::new(2);
        let _first = lease.try_acquire().unwrap();
        let _second = lease.try_acquire().unwrap();
        assert!(lease.try_acquire().is_err());
    }
}
