//! Cancellable interval jobs

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use parking_lot::Mutex;
use rewardpilot_domain::constants::JOB_JOIN_TIMEOUT_SECS;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::error::{SchedulerError, SchedulerResult};

/// Work executed on every tick of a periodic job.
pub type JobAction = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// An interval job bound to one account.
#[derive(Clone)]
pub struct PeriodicJob {
    pub account: String,
    pub name: &'static str,
    pub interval: Duration,
    pub action: JobAction,
}

impl PeriodicJob {
    pub fn new<F>(account: impl Into<String>, name: &'static str, interval: Duration, action: F) -> Self
    where
        F: Fn() -> BoxFuture<'static, ()> + Send + Sync + 'static,
    {
        Self { account: account.into(), name, interval, action: Arc::new(action) }
    }
}

impl fmt::Debug for PeriodicJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeriodicJob")
            .field("account", &self.account)
            .field("name", &self.name)
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

struct RunningJob {
    account: String,
    name: &'static str,
    handle: JoinHandle<()>,
}

struct RegistryInner {
    cancel: CancellationToken,
    jobs: Mutex<Vec<RunningJob>>,
    join_timeout: Duration,
}

/// Process-wide cancellation context for periodic jobs.
///
/// Cheap to clone; clones share the same token and job list.
#[derive(Clone)]
pub struct JobRegistry {
    inner: Arc<RegistryInner>,
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl JobRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::with_join_timeout(Duration::from_secs(JOB_JOIN_TIMEOUT_SECS))
    }

    #[must_use]
    pub fn with_join_timeout(join_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                cancel: CancellationToken::new(),
                jobs: Mutex::new(Vec::new()),
                join_timeout,
            }),
        }
    }

    /// Spawn `job` on the current runtime. The first tick fires one interval
    /// after registration.
    ///
    /// # Errors
    /// Returns [`SchedulerError::ShuttingDown`] once `shutdown` has begun.
    pub fn spawn_periodic(&self, job: PeriodicJob) -> SchedulerResult<()> {
        let mut jobs = self.inner.jobs.lock();
        if self.inner.cancel.is_cancelled() {
            return Err(SchedulerError::ShuttingDown);
        }

        let cancel = self.inner.cancel.clone();
        let PeriodicJob { account, name, interval, action } = job;
        let loop_account = account.clone();
        let handle = tokio::spawn(async move {
            job_loop(&loop_account, name, interval, &action, &cancel).await;
        });

        debug!(account = %account, job = name, interval_secs = interval.as_secs(), "Job scheduled");
        jobs.push(RunningJob { account, name, handle });
        Ok(())
    }

    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    /// Number of jobs whose loop is still alive.
    #[must_use]
    pub fn active_jobs(&self) -> usize {
        self.inner.jobs.lock().iter().filter(|job| !job.handle.is_finished()).count()
    }

    /// Token cancelled when shutdown begins.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.inner.cancel.clone()
    }

    /// Cancel every job, refuse new registrations and wait for the job
    /// loops to exit. A tick in progress is dropped at its next await point.
    ///
    /// # Errors
    /// Returns [`SchedulerError::Timeout`] if jobs are still running after
    /// the join timeout (they are aborted), or
    /// [`SchedulerError::TaskJoinFailed`] if a job panicked.
    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> SchedulerResult<()> {
        self.inner.cancel.cancel();
        let jobs = std::mem::take(&mut *self.inner.jobs.lock());
        if jobs.is_empty() {
            return Ok(());
        }

        info!(count = jobs.len(), "Stopping periodic jobs");
        let join_timeout = self.inner.join_timeout;
        let aborts: Vec<_> = jobs.iter().map(|job| job.handle.abort_handle()).collect();
        let labels: Vec<_> = jobs.iter().map(|job| format!("{}/{}", job.account, job.name)).collect();
        let handles = jobs.into_iter().map(|job| job.handle);

        let Ok(results) = tokio::time::timeout(join_timeout, futures::future::join_all(handles)).await
        else {
            aborts.iter().for_each(tokio::task::AbortHandle::abort);
            warn!(timeout_secs = join_timeout.as_secs(), "Periodic jobs did not stop in time");
            return Err(SchedulerError::Timeout { seconds: join_timeout.as_secs() });
        };

        let mut first_failure = None;
        for (label, result) in labels.iter().zip(results) {
            if let Err(e) = result {
                warn!(job = %label, error = %e, "Periodic job ended abnormally");
                first_failure.get_or_insert_with(|| format!("{label}: {e}"));
            }
        }
        match first_failure {
            Some(reason) => Err(SchedulerError::TaskJoinFailed(reason)),
            None => {
                info!("Periodic jobs stopped");
                Ok(())
            }
        }
    }
}

async fn job_loop(
    account: &str,
    name: &'static str,
    interval: Duration,
    action: &JobAction,
    cancel: &CancellationToken,
) {
    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                debug!(account = %account, job = name, "Job cancelled");
                break;
            }
            () = tokio::time::sleep(interval) => {
                debug!(account = %account, job = name, "Job tick");
                // A tick paused in a cooldown or waiting for the session lock
                // must not hold up shutdown.
                tokio::select! {
                    () = cancel.cancelled() => {
                        debug!(account = %account, job = name, "Job cancelled during tick");
                        break;
                    }
                    () = (action)() => {}
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures::FutureExt;

    use super::*;

    fn counting_job(counter: &Arc<AtomicUsize>, interval: Duration) -> PeriodicJob {
        let counter = Arc::clone(counter);
        PeriodicJob::new("addr", "tick", interval, move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
            .boxed()
        })
    }

    #[tokio::test(start_paused = true)]
    async fn job_ticks_every_interval() {
        let registry = JobRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));
        registry.spawn_periodic(counting_job(&counter, Duration::from_secs(60))).unwrap();

        tokio::time::sleep(Duration::from_secs(185)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 3);

        registry.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_interrupts_a_tick_in_cooldown() {
        let registry = JobRegistry::new();
        let finished = Arc::new(AtomicUsize::new(0));
        let done = Arc::clone(&finished);
        registry
            .spawn_periodic(PeriodicJob::new("addr", "cooldown", Duration::from_secs(60), move || {
                let done = Arc::clone(&done);
                async move {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    done.fetch_add(1, Ordering::SeqCst);
                }
                .boxed()
            }))
            .unwrap();

        // First tick fires at 60s and is still sleeping at 61s.
        tokio::time::sleep(Duration::from_secs(61)).await;

        let started = tokio::time::Instant::now();
        registry.shutdown().await.unwrap();

        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(finished.load(Ordering::SeqCst), 0);
        assert_eq!(registry.active_jobs(), 0);
    }

    #[tokio::test]
    async fn shutdown_stops_jobs_and_refuses_new_ones() {
        let registry = JobRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));
        registry.spawn_periodic(counting_job(&counter, Duration::from_secs(3600))).unwrap();
        assert_eq!(registry.active_jobs(), 1);

        registry.shutdown().await.unwrap();
        assert!(registry.is_shutting_down());
        assert_eq!(registry.active_jobs(), 0);
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        let refused = registry.spawn_periodic(counting_job(&counter, Duration::from_secs(1)));
        assert!(matches!(refused, Err(SchedulerError::ShuttingDown)));
    }
}
