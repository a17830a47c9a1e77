//! Per-run leases.
//!
//! At most one harmonization or validation may work on a run at a time. A
//! lease is an entry `run_id -> (token, expiry)` in a shared map; a second
//! request for a leased run is rejected instead of waiting. Leases expire after
//! the configured TTL so a crashed holder cannot wedge a run forever: an
//! expired lease is taken over by the next request, and the previous holder
//! notices via [`LeaseGuard::is_current`] before it commits anything.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use mdo_core::ids::{PREFIX_LEASE, generate_id};

use crate::error::PipelineError;

#[derive(Debug)]
struct Lease {
    token: String,
    expires_at: Instant,
}

type LeaseTable = Arc<Mutex<HashMap<String, Lease>>>;

/// Keyed lease map shared by every request handled by one orchestrator.
#[derive(Debug, Clone)]
pub struct LeaseMap {
    leases: LeaseTable,
    ttl: Duration,
}

/// Releases its lease on drop, unless the lease was taken over meanwhile.
#[derive(Debug)]
pub struct LeaseGuard {
    run_id: String,
    token: String,
    leases: LeaseTable,
}

impl LeaseMap {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            leases: Arc::default(),
            ttl,
        }
    }

    /// Take the lease for `run_id`.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::ConcurrentHarmonizationConflict` if an unexpired
    /// lease is held for the run.
    pub fn acquire(&self, run_id: &str) -> Result<LeaseGuard, PipelineError> {
        let token = generate_id(PREFIX_LEASE)?;
        let now = Instant::now();
        let mut leases = self.leases.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(held) = leases.get(run_id) {
            if held.expires_at > now {
                return Err(PipelineError::ConcurrentHarmonizationConflict {
                    run_id: run_id.to_string(),
                });
            }
            tracing::warn!(run_id, stale_token = %held.token, "taking over expired lease");
        }

        leases.insert(
            run_id.to_string(),
            Lease {
                token: token.clone(),
                expires_at: now + self.ttl,
            },
        );
        Ok(LeaseGuard {
            run_id: run_id.to_string(),
            token,
            leases: Arc::clone(&self.leases),
        })
    }

    /// Whether an unexpired lease is currently held for `run_id`.
    #[must_use]
    pub fn is_held(&self, run_id: &str) -> bool {
        self.leases
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(run_id)
            .is_some_and(|l| l.expires_at > Instant::now())
    }
}

impl LeaseGuard {
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Whether this guard still owns the run's lease.
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.leases
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&self.run_id)
            .is_some_and(|l| l.token == self.token)
    }
}

impl Drop for LeaseGuard {
    fn drop(&mut self) {
        let mut leases = self.leases.lock().unwrap_or_else(PoisonError::into_inner);
        if leases
            .get(&self.run_id)
            .is_some_and(|l| l.token == self.token)
        {
            leases.remove(&self.run_id);
        }
    }
}
