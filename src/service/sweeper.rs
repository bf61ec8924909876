//! Resolution Sweeper
//!
//! Background task that closes out plans whose voting deadline has passed:
//! tally the votes, record the outcome, and run the funding rounds for
//! approved plans. Manual resolution may race with a sweep; the plan-version
//! compare-and-swap keeps the two from double-writing, and the sweeper treats
//! a lost race as a skip, not a failure.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, RwLock};
use tokio::time::interval;
use tracing::{debug, error, info, warn};

use crate::config::ClubConfig;
use crate::error::{ClubError, ClubResult};
use crate::ops::{FundingAllocator, VotingEngine};
use crate::storage::LedgerStore;

/// Counts from one sweep pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Plans moved out of `Open` this pass
    pub resolved: u64,
    /// Approved plans that ran their funding rounds
    pub funded: u64,
    /// Plans resolved to `Rejected`
    pub rejected: u64,
    /// Plans left for a later pass (lost races, transient errors)
    pub skipped: u64,
}

/// Background resolver for due plans
pub struct ResolutionSweeper<S: LedgerStore + 'static> {
    store: Arc<S>,
    config: ClubConfig,
    voting: VotingEngine<S>,
    funding: FundingAllocator<S>,
}

impl<S: LedgerStore + 'static> ResolutionSweeper<S> {
    /// Create a sweeper over the given store
    pub fn new(store: Arc<S>, config: ClubConfig) -> Self {
        Self {
            voting: VotingEngine::new(store.clone(), config.clone()),
            funding: FundingAllocator::new(store.clone(), config.clone()),
            store,
            config,
        }
    }

    /// Start the periodic sweep loop
    pub fn start(self) -> SweeperHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let running = Arc::new(RwLock::new(true));
        let running_clone = running.clone();

        let sweep_interval = Duration::from_secs(self.config.sweep_interval_secs);

        tokio::spawn(async move {
            let mut timer = interval(sweep_interval);

            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("resolution sweeper received shutdown signal");
                        break;
                    }
                    _ = timer.tick() => {
                        if *running_clone.read().await {
                            match self.sweep_once(Utc::now()).await {
                                Ok(report) if report != SweepReport::default() => {
                                    info!(
                                        resolved = report.resolved,
                                        funded = report.funded,
                                        rejected = report.rejected,
                                        skipped = report.skipped,
                                        "sweep pass complete"
                                    );
                                }
                                Ok(_) => debug!("sweep pass found no due plans"),
                                Err(e) => error!("sweep pass failed: {}", e),
                            }
                        }
                    }
                }
            }

            info!("resolution sweeper stopped");
        });

        SweeperHandle {
            shutdown_tx,
            running,
        }
    }

    /// Resolve every due plan once, funding the approved ones.
    ///
    /// Per-plan errors are counted and logged, never propagated; one bad plan
    /// must not starve the rest of the queue.
    pub async fn sweep_once(&self, now: DateTime<Utc>) -> ClubResult<SweepReport> {
        let due = self.store.list_due_plans(now).await?;
        let mut report = SweepReport::default();

        for plan in due {
            let outcome = match self.voting.resolve_at(plan.id, now).await {
                Ok(outcome) => outcome,
                Err(e) if e.is_retriable() => {
                    debug!(plan_id = plan.id, "lost resolution race, skipping");
                    report.skipped += 1;
                    continue;
                }
                Err(e) => {
                    error!(plan_id = plan.id, "failed to resolve plan: {}", e);
                    report.skipped += 1;
                    continue;
                }
            };
            report.resolved += 1;

            if !outcome.is_approved() {
                report.rejected += 1;
                continue;
            }

            match self.funding.allocate_at(plan.id, now).await {
                Ok(summary) => {
                    info!(
                        plan_id = plan.id,
                        target_shares = summary.target_shares,
                        allocated = summary.allocated_shares(),
                        "plan funded by sweeper"
                    );
                    report.funded += 1;
                }
                Err(ClubError::NotResolved { .. }) => {
                    // Another worker funded it between resolve and allocate.
                    debug!(plan_id = plan.id, "plan already funded elsewhere");
                    report.skipped += 1;
                }
                Err(e) if e.is_retriable() => {
                    debug!(plan_id = plan.id, "lost funding race, skipping");
                    report.skipped += 1;
                }
                Err(e) => {
                    warn!(plan_id = plan.id, "funding failed, plan stays closed: {}", e);
                    report.skipped += 1;
                }
            }
        }

        Ok(report)
    }
}

/// Sweeper handle
pub struct SweeperHandle {
    shutdown_tx: mpsc::Sender<()>,
    running: Arc<RwLock<bool>>,
}

impl SweeperHandle {
    /// Stop the sweeper
    pub async fn stop(self) {
        *self.running.write().await = false;
        let _ = self.shutdown_tx.send(()).await;
    }

    /// Pause sweeping without tearing down the task
    pub async fn pause(&self) {
        *self.running.write().await = false;
    }

    /// Resume sweeping
    pub async fn resume(&self) {
        *self.running.write().await = true;
    }

    /// Whether the sweeper is actively sweeping
    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }
}
