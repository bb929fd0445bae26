//! Adapter wiring and the run lifecycle

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use rewardpilot_core::{
    BatchScheduler, Clock, Endpoints, JobRegistry, RequestExecutor, RequestPipeline, SessionDeps,
    SessionRunner, SupervisorDeps, SystemClock, TaskSupervisor,
};
use rewardpilot_domain::Config;
use rewardpilot_infra::accounts::{accounts_from_keys, bind_proxies, load_lines};
use rewardpilot_infra::{Ed25519Signer, HttpExecutor, IpifyProbe, JsonFileStore};
use tracing::{info, warn};

/// Run every account once, then keep periodic jobs alive until Ctrl-C.
///
/// Ctrl-C during the initial batch abandons the accounts still in flight.
pub async fn run(config: Config) -> Result<()> {
    let accounts = accounts_from_keys(
        load_lines(&config.files.private_keys).context("cannot load private keys")?,
    )?;
    let proxies = if config.runner.use_proxy {
        load_lines(&config.files.proxies).context("cannot load proxies")?
    } else {
        Vec::new()
    };
    let binding = bind_proxies(&accounts, &proxies, config.runner.use_proxy)?;

    let sessions = JsonFileStore::open(&config.files.session_store).await?;
    let fingerprints = JsonFileStore::open(&config.files.fingerprint_store).await?;

    let executor: Arc<dyn RequestExecutor> = Arc::new(
        HttpExecutor::builder().timeout(Duration::from_secs(config.api.timeout_secs)).build(),
    );
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let jobs = JobRegistry::new();

    let deps = SupervisorDeps {
        session: SessionDeps {
            sessions: Arc::new(sessions),
            signer: Arc::new(Ed25519Signer),
            pipeline: Arc::new(RequestPipeline::new(Arc::clone(&executor), clock)),
            endpoints: Arc::new(Endpoints::new(&config.api)),
            retry_budget: config.runner.retry_budget,
        },
        fingerprints: Arc::new(fingerprints),
        probe: Arc::new(IpifyProbe::new(executor, config.api.proxy_probe_url.clone())),
        jobs: jobs.clone(),
        settings: Arc::new(config.runner.clone()),
        origin: config.api.origin.clone(),
    };
    let runner = SessionRunner::new(TaskSupervisor::new(deps), binding);
    let scheduler =
        BatchScheduler::new(Arc::new(runner)).with_cancellation(jobs.cancellation_token());

    let total = accounts.len();
    tokio::select! {
        reports = scheduler.run_all(accounts, config.runner.wave_size()) => {
            let failed = reports.iter().filter(|report| !report.succeeded()).count();
            info!(
                accounts = total,
                failed,
                periodic_jobs = jobs.active_jobs(),
                "Initial run finished, press Ctrl-C to stop"
            );
            tokio::signal::ctrl_c().await.context("cannot listen for Ctrl-C")?;
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("cannot listen for Ctrl-C")?;
            warn!("Interrupted before every account was processed");
        }
    }

    info!("Shutting down");
    if let Err(e) = jobs.shutdown().await {
        warn!(error = %e, "Periodic jobs did not stop cleanly");
    }
    Ok(())
}
