//! Types for the restorer.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::gateway::{AccountId, GatewayError};

use super::catalog::WorkCatalog;
use super::classify::RestorationOutcome;

/// Errors that abort a restoration cycle.
#[derive(Debug, Error)]
pub enum RestorerError {
    /// Release service call failed.
    #[error("release service error: {0}")]
    Gateway(#[from] GatewayError),

    /// Release listing does not have the genre -> account -> codes shape.
    #[error("malformed release listing: {0}")]
    MalformedListing(String),
}

/// What happened during one sweep over the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Restore requests issued.
    pub attempted: usize,
    pub already_online: usize,
    pub accepted: usize,
    pub already_requested: usize,
    /// Requests that errored; their releases stay queued.
    pub failed: usize,
    /// Accounts whose sweep was cut short by the service's rate limit.
    pub rate_limited_accounts: Vec<AccountId>,
    /// Accounts dropped because their queue emptied.
    pub pruned_accounts: Vec<AccountId>,
    /// Releases still queued after the sweep.
    pub remaining: usize,
}

impl SweepReport {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            finished_at: started_at,
            attempted: 0,
            already_online: 0,
            accepted: 0,
            already_requested: 0,
            failed: 0,
            rate_limited_accounts: Vec::new(),
            pruned_accounts: Vec::new(),
            remaining: 0,
        }
    }

    /// Count a classified reply.
    pub fn record(&mut self, outcome: RestorationOutcome) {
        match outcome {
            RestorationOutcome::AlreadyOnline => self.already_online += 1,
            RestorationOutcome::RestoreAccepted => self.accepted += 1,
            RestorationOutcome::AlreadyRequested => self.already_requested += 1,
            RestorationOutcome::RateLimited => {}
        }
    }

    /// Releases that left the queue during this sweep.
    pub fn resolved(&self) -> usize {
        self.already_online + self.accepted + self.already_requested
    }
}

/// Result of a sweep: the mutated catalog and what happened to it.
#[derive(Debug, Clone)]
pub struct SweepOutput {
    pub catalog: WorkCatalog,
    pub report: SweepReport,
}

/// Summary of a full cycle (catalog build followed by sweeps).
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    /// Releases queued right after the catalog was built.
    pub initial: usize,
    /// Releases still queued when the cycle ended.
    pub remaining: usize,
    pub sweeps: Vec<SweepReport>,
}

impl CycleReport {
    /// Whether every queued release was resolved.
    pub fn drained(&self) -> bool {
        self.remaining == 0
    }
}
