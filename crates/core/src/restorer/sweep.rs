//! Restorer implementation.
//!
//! A cycle builds the work catalog once, then sweeps it until it drains:
//! - Accounts are visited one at a time, in catalog order
//! - Each account's releases are restored sequentially, with a random pause
//!   between requests
//! - A rate-limit reply ends the account's turn for the current sweep
//!
//! A cycle also ends early when it runs out of sweeps, when several sweeps in
//! a row resolve nothing, or when the restorer is stopped. Stopping is only
//! observed between sweeps.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::gateway::{AccountId, ApiResponse, ReleaseCode, ReleaseService};

use super::catalog::WorkCatalog;
use super::classify::{classify, is_recognized, RestorationOutcome};
use super::config::RestorerConfig;
use super::pacing::next_delay;
use super::types::{CycleReport, RestorerError, SweepOutput, SweepReport};

/// Drives releases through restore requests until their links are back.
pub struct Restorer {
    config: RestorerConfig,
    service: Arc<dyn ReleaseService>,
    stopped: AtomicBool,
    shutdown_tx: broadcast::Sender<()>,
}

impl Restorer {
    pub fn new(config: RestorerConfig, service: Arc<dyn ReleaseService>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            service,
            stopped: AtomicBool::new(false),
            shutdown_tx,
        }
    }

    pub fn config(&self) -> &RestorerConfig {
        &self.config
    }

    /// Ask the running cycle to end after its current sweep.
    pub fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("Stopping restorer");
        let _ = self.shutdown_tx.send(());
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Sleep for `duration` unless the restorer is stopped first.
    ///
    /// Returns `false` when the wait was cut short by [`Restorer::stop`].
    pub async fn wait(&self, duration: Duration) -> bool {
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        if self.is_stopped() {
            return false;
        }

        tokio::select! {
            _ = shutdown_rx.recv() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }

    /// Fetch the free-account listing and flatten it into a work catalog.
    pub async fn build_catalog(&self) -> Result<WorkCatalog, RestorerError> {
        let listing = self.service.fetch_releases_per_free_account().await?;
        let catalog = WorkCatalog::from_listing(&listing)?;

        for (account, queue) in catalog.iter() {
            info!(account = %account, queued = queue.len(), "Account to check");
        }
        info!(
            accounts = catalog.len(),
            releases = catalog.count_remaining(),
            "Work catalog built"
        );

        Ok(catalog)
    }

    /// Run one sweep over every account of the catalog.
    ///
    /// Resolved releases leave their queue and emptied accounts leave the
    /// catalog. Releases whose request failed, and the rest of a rate-limited
    /// account, stay queued for the next sweep.
    pub async fn run_sweep(&self, mut catalog: WorkCatalog) -> SweepOutput {
        let mut report = SweepReport::new(Utc::now());

        let accounts: Vec<AccountId> = catalog.accounts().cloned().collect();
        for account in accounts {
            let Some(queue) = catalog.queue(&account) else {
                continue;
            };
            let snapshot = queue.to_vec();
            info!(account = %account, queued = snapshot.len(), "Account sweep started");

            for code in &snapshot {
                report.attempted += 1;

                match self.service.restore_release(code).await {
                    Ok(response) => {
                        let outcome = classify(&response);
                        if !outcome.resolves_item() {
                            debug!(
                                account = %account,
                                code = %code,
                                "Wait before new request, leaving account"
                            );
                            report.rate_limited_accounts.push(account.clone());
                            break;
                        }

                        log_outcome(code, outcome, &response);
                        report.record(outcome);
                        catalog.remove_item(&account, code);
                    }
                    Err(e) => {
                        error!(
                            account = %account,
                            code = %code,
                            error = %e,
                            "Problem restoring release"
                        );
                        report.failed += 1;
                    }
                }

                self.pause().await;
            }

            let remaining = catalog.queue(&account).map_or(0, |q| q.len());
            info!(account = %account, remaining = remaining, "Account sweep finished");

            if remaining == 0 {
                let before = catalog.len();
                let pruned = catalog.prune_empty();
                info!(
                    account = %account,
                    before = before,
                    after = catalog.len(),
                    "Removed account"
                );
                report.pruned_accounts.extend(pruned);
            } else {
                debug!(
                    account = %account,
                    remaining = remaining,
                    "Releases still queued for account"
                );
            }
        }

        report.remaining = catalog.count_remaining();
        report.finished_at = Utc::now();

        SweepOutput { catalog, report }
    }

    /// Build a fresh catalog and sweep it until it drains.
    ///
    /// The cycle stops early, leaving the rest queued for the next cycle,
    /// when the sweep budget runs out, when `max_idle_sweeps` sweeps in a row
    /// resolve nothing, or when the restorer is stopped.
    pub async fn run_cycle(&self) -> Result<CycleReport, RestorerError> {
        let mut catalog = self.build_catalog().await?;
        let initial = catalog.count_remaining();
        let mut sweeps: Vec<SweepReport> = Vec::new();
        let mut idle_sweeps = 0u32;

        while !catalog.is_empty() {
            let budget = self.config.max_sweeps_per_cycle as usize;
            if budget > 0 && sweeps.len() >= budget {
                warn!(
                    sweeps = sweeps.len(),
                    remaining = catalog.count_remaining(),
                    "Sweep budget exhausted, releases left for next cycle"
                );
                break;
            }

            if idle_sweeps >= self.config.max_idle_sweeps.max(1) {
                warn!(
                    idle_sweeps = idle_sweeps,
                    remaining = catalog.count_remaining(),
                    "Sweeps stopped making progress, releases left for next cycle"
                );
                break;
            }

            let interval = if sweeps.is_empty() {
                Duration::ZERO
            } else {
                self.config.sweep_interval()
            };
            if !interval.is_zero() {
                debug!(interval = ?interval, "Waiting before next sweep");
            }
            if !self.wait(interval).await {
                info!(
                    sweeps = sweeps.len(),
                    remaining = catalog.count_remaining(),
                    "Restorer stopped, releases left for next cycle"
                );
                break;
            }

            let SweepOutput {
                catalog: swept,
                report,
            } = self.run_sweep(catalog).await;
            catalog = swept;

            if report.resolved() == 0 {
                idle_sweeps += 1;
            } else {
                idle_sweeps = 0;
            }

            info!(
                sweep = sweeps.len() + 1,
                resolved = report.resolved(),
                failed = report.failed,
                rate_limited = report.rate_limited_accounts.len(),
                remaining = report.remaining,
                "Sweep complete"
            );
            sweeps.push(report);
        }

        let remaining = catalog.count_remaining();
        info!(
            initial = initial,
            remaining = remaining,
            sweeps = sweeps.len(),
            "Restoration cycle complete"
        );

        Ok(CycleReport {
            initial,
            remaining,
            sweeps,
        })
    }

    async fn pause(&self) {
        if let Some(delay) = next_delay(&self.config) {
            debug!(delay_ms = delay.as_millis() as u64, "Pacing restore requests");
            tokio::time::sleep(delay).await;
        }
    }
}

fn log_outcome(code: &ReleaseCode, outcome: RestorationOutcome, response: &ApiResponse) {
    match outcome {
        RestorationOutcome::AlreadyOnline => debug!(code = %code, "Already online"),
        RestorationOutcome::RestoreAccepted if !is_recognized(response) => warn!(
            code = %code,
            response = %response,
            "Unrecognized restore reply, treating as accepted"
        ),
        RestorationOutcome::RestoreAccepted => info!(code = %code, "Restore request successful"),
        RestorationOutcome::AlreadyRequested => {
            warn!(code = %code, "Restore already requested")
        }
        RestorationOutcome::RateLimited => {}
    }
}
