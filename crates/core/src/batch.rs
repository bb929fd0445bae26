//! Wave-based batch execution
//!
//! Accounts run in consecutive waves of at most `max_concurrency`. Every
//! account of a wave runs on its own task and the whole wave settles before
//! the next one starts, so at most one wave's workflows are ever in flight.
//! Once the process cancellation context fires, no further wave starts.

use std::sync::Arc;

use async_trait::async_trait;
use rewardpilot_domain::Account;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::supervisor::AccountRunReport;

/// Runs one account's initial workflow.
#[async_trait]
pub trait AccountRunner: Send + Sync {
    async fn run_account(&self, account: Account) -> AccountRunReport;
}

/// Runs accounts in bounded waves.
pub struct BatchScheduler {
    runner: Arc<dyn AccountRunner>,
    cancel: CancellationToken,
}

impl BatchScheduler {
    /// Scheduler with its own, never cancelled, token.
    pub fn new(runner: Arc<dyn AccountRunner>) -> Self {
        Self { runner, cancel: CancellationToken::new() }
    }

    /// Stop starting waves once `cancel` fires, usually the job registry's
    /// token.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run every account and return one report per account, in input order.
    ///
    /// A `max_concurrency` of zero is treated as one. A panicking account
    /// task is reported as failed and never stops the batch. After
    /// cancellation the running wave settles and the remaining accounts get
    /// no report.
    #[instrument(skip_all, fields(accounts = accounts.len(), max_concurrency = max_concurrency))]
    pub async fn run_all(&self, accounts: Vec<Account>, max_concurrency: usize) -> Vec<AccountRunReport> {
        let wave_size = max_concurrency.max(1);
        let mut reports = Vec::with_capacity(accounts.len());

        for (wave, chunk) in accounts.chunks(wave_size).enumerate() {
            if self.cancel.is_cancelled() {
                warn!(
                    skipped = accounts.len() - reports.len(),
                    "Shutdown requested, not starting further waves"
                );
                break;
            }
            info!(wave = wave + 1, size = chunk.len(), "Starting wave");

            let handles: Vec<_> = chunk
                .iter()
                .cloned()
                .map(|account| {
                    let runner = Arc::clone(&self.runner);
                    let address = account.address.clone();
                    (address, tokio::spawn(async move { runner.run_account(account).await }))
                })
                .collect();

            for (address, handle) in handles {
                match handle.await {
                    Ok(report) => reports.push(report),
                    Err(e) => {
                        error!(account = %address, error = %e, "Account task failed");
                        reports.push(AccountRunReport::panicked(address, e.to_string()));
                    }
                }
            }
        }

        let succeeded = reports.iter().filter(|report| report.succeeded()).count();
        info!(succeeded, failed = reports.len() - succeeded, "Batch finished");
        reports
    }
}
