//! Account workflow state machine

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use rewardpilot_domain::constants::{
    DAILY_TASK_PENDING, INTER_TASK_PAUSE_SECS, STEP_PAUSE_SECS, TASK_ACK_OK, TASK_COMPLETED,
};
use rewardpilot_domain::{
    Account, Balance, DailyTask, Profile, RequestOutcome, RunnerConfig, StatusAck, Task,
};
use tracing::{instrument, warn};

use super::periodic::{self, describe_balance, describe_failure};
use super::{AccountRunReport, SupervisorState, TaskTally, Termination};
use crate::api::Endpoints;
use crate::fingerprint::ClientFingerprint;
use crate::logging::{emit, AccountTag, LogLevel};
use crate::ports::{Clock, KeyValueStore, ProxyProbe};
use crate::scheduling::{JobRegistry, PeriodicJob};
use crate::session::{SessionDeps, SessionManager, SharedSession};

/// Collaborators shared by every account's supervisor.
#[derive(Clone)]
pub struct SupervisorDeps {
    pub session: SessionDeps,
    pub fingerprints: Arc<dyn KeyValueStore>,
    pub probe: Arc<dyn ProxyProbe>,
    pub jobs: JobRegistry,
    pub settings: Arc<RunnerConfig>,
    /// Dashboard origin sent with regular requests
    pub origin: String,
}

/// Drives one account through its workflow and registers its periodic jobs.
#[derive(Clone)]
pub struct TaskSupervisor {
    deps: SupervisorDeps,
}

impl TaskSupervisor {
    #[must_use]
    pub fn new(deps: SupervisorDeps) -> Self {
        Self { deps }
    }

    fn endpoints(&self) -> &Arc<Endpoints> {
        &self.deps.session.endpoints
    }

    fn clock(&self) -> &Arc<dyn Clock> {
        self.deps.session.pipeline.clock()
    }

    /// Run the initial workflow for `account`.
    ///
    /// Returns once the account reached `Steady` or stopped early; periodic
    /// jobs registered on the way keep running until shutdown.
    #[instrument(skip_all, fields(account = %account.address))]
    pub async fn run(&self, account: Account, proxy: Option<String>) -> AccountRunReport {
        let mut report = AccountRunReport::new(&account.address);
        let mut tag =
            AccountTag::new(account.ordinal(), &account.address, self.deps.settings.use_proxy);

        let proxy = match self.resolve_proxy(&mut tag, proxy).await {
            Ok(proxy) => proxy,
            Err(termination) => return terminate(report, &tag, termination),
        };
        report.advance(SupervisorState::ProxyResolved);

        let fingerprint = ClientFingerprint::resolve(
            self.deps.fingerprints.as_ref(),
            &account.address,
            &self.deps.origin,
        )
        .await;
        let address = account.address.clone();
        let mut session =
            SessionManager::load(self.deps.session.clone(), account, proxy, fingerprint, tag.clone())
                .await;
        if let Err(e) = session.ensure_valid_token(false).await {
            return terminate(report, &tag, Termination::NoCredentials { reason: e.to_string() });
        }
        report.advance(SupervisorState::Authenticated);
        let session = session.into_shared();

        if let Err(termination) = self.sync(&session).await {
            return terminate(report, &tag, termination);
        }
        report.advance(SupervisorState::Synced);
        self.schedule(periodic::checkpoint_job(&address, &session, self.endpoints()), &tag);

        self.check_in(&session).await;
        report.advance(SupervisorState::CheckedIn);
        self.clock().sleep(Duration::from_secs(STEP_PAUSE_SECS)).await;

        if self.deps.settings.auto_task {
            report.tasks = self.complete_tasks(&session).await;
        }
        if self.deps.settings.auto_mining {
            periodic::heartbeat(&session, self.endpoints()).await;
            self.schedule(periodic::heartbeat_job(&address, &session, self.endpoints()), &tag);
        }

        report.advance(SupervisorState::Steady);
        report
    }

    async fn resolve_proxy(
        &self,
        tag: &mut AccountTag,
        proxy: Option<String>,
    ) -> Result<Option<String>, Termination> {
        if !self.deps.settings.use_proxy {
            return Ok(None);
        }
        let Some(proxy) = proxy else {
            return Err(Termination::ProxyUnavailable {
                reason: "no proxy assigned to this account".to_string(),
            });
        };

        let ip = self
            .deps
            .probe
            .egress_ip(&proxy)
            .await
            .map_err(|e| Termination::ProxyUnavailable { reason: e.to_string() })?;
        tag.set_egress_ip(ip);

        let delay = start_delay(self.deps.settings.start_delay_secs);
        emit(tag, LogLevel::Info, &format!("Starting in {}s...", delay.as_secs()));
        self.clock().sleep(delay).await;
        Ok(Some(proxy))
    }

    /// Profile and balance must both load. One more attempt is made unless
    /// the API rejected the request outright.
    async fn sync(&self, session: &SharedSession) -> Result<(), Termination> {
        let Err(first) = self.fetch_account_data(session).await else {
            return Ok(());
        };
        if first.is_bad_request() {
            return Err(first);
        }
        session.lock().await.log(LogLevel::Warning, &format!("Can't sync data, retrying | {first}"));
        self.fetch_account_data(session).await
    }

    async fn fetch_account_data(&self, session: &SharedSession) -> Result<(), Termination> {
        let mut session = session.lock().await;

        let outcome = session.send(self.endpoints().profile()).await;
        let profile: Profile =
            outcome.parse().ok_or_else(|| Termination::from_outcome("profile", &outcome))?;

        let outcome = session.send(self.endpoints().balance()).await;
        let balance: Balance =
            outcome.parse().ok_or_else(|| Termination::from_outcome("balance", &outcome))?;

        let referral_code = profile.referral_code.as_deref().unwrap_or("-");
        session.log(
            LogLevel::Custom,
            &format!("Ref code: {referral_code} | {}", describe_balance(&balance)),
        );
        Ok(())
    }

    /// Complete the daily checkin when due. The attempt is stamped whatever
    /// its result so it is not repeated within the window.
    async fn check_in(&self, session: &SharedSession) {
        let mut session = session.lock().await;
        let now = session.now();
        if !session.record().checkin_due(now) {
            session.log(LogLevel::Warning, "You checked in today, skipping");
            return;
        }

        let outcome = session.send(self.endpoints().daily_tasks()).await;
        match outcome.parse::<Vec<DailyTask>>() {
            Some(daily) => match daily.into_iter().find(|task| task.status == DAILY_TASK_PENDING) {
                Some(today) => {
                    let ack = session.send(self.endpoints().checkin()).await;
                    if acknowledged(&ack) {
                        session.log(
                            LogLevel::Success,
                            &format!("{} success | Reward: {}", today.title, today.reward),
                        );
                    } else {
                        session.log(
                            LogLevel::Warning,
                            &format!("Checkin failed | {}", describe_failure(&ack)),
                        );
                    }
                }
                None => session.log(LogLevel::Info, "No daily checkin available"),
            },
            None => session.log(
                LogLevel::Warning,
                &format!("Can't load daily tasks | {}", describe_failure(&outcome)),
            ),
        }

        let at = session.now();
        session.record_checkin(at).await;
    }

    /// Attempt every open one-time task. A failed task never stops the
    /// loop; the lock is released between tasks so periodic jobs can run.
    async fn complete_tasks(&self, session: &SharedSession) -> TaskTally {
        let mut tally = TaskTally::default();

        let outcome = session.lock().await.send(self.endpoints().tasks()).await;
        let Some(tasks) = outcome.parse::<Vec<Task>>() else {
            session
                .lock()
                .await
                .log(LogLevel::Warning, &format!("Can't load tasks | {}", describe_failure(&outcome)));
            return tally;
        };

        for task in tasks.iter().filter(|task| task.status != TASK_COMPLETED) {
            let id = task.id_label();
            if self.deps.settings.skip_tasks.iter().any(|skip| *skip == id) {
                tally.skipped += 1;
                continue;
            }

            self.clock().sleep(Duration::from_secs(INTER_TASK_PAUSE_SECS)).await;
            let mut session = session.lock().await;
            let outcome = session.send(self.endpoints().complete_task(&id)).await;
            if acknowledged(&outcome) {
                tally.completed += 1;
                session.log(
                    LogLevel::Success,
                    &format!("Task {id} | {} complete successfully! | Reward: {}", task.title, task.reward),
                );
            } else {
                tally.failed += 1;
                session.log(
                    LogLevel::Warning,
                    &format!("Can't complete task {id} | {} | {}", task.title, describe_failure(&outcome)),
                );
            }
        }

        tally
    }

    fn schedule(&self, job: PeriodicJob, tag: &AccountTag) {
        let name = job.name;
        if let Err(e) = self.deps.jobs.spawn_periodic(job) {
            warn!(account = %tag.address, job = name, error = %e, "Job not scheduled");
        }
    }
}

fn terminate(report: AccountRunReport, tag: &AccountTag, termination: Termination) -> AccountRunReport {
    emit(tag, LogLevel::Error, &termination.to_string());
    report.terminated(termination)
}

/// Checkin and task acknowledgement: an explicit `statusCode` must be 200,
/// otherwise any successful response counts.
fn acknowledged(outcome: &RequestOutcome) -> bool {
    match outcome.parse::<StatusAck>() {
        Some(StatusAck { status_code: Some(code) }) => code == TASK_ACK_OK,
        Some(StatusAck { status_code: None }) => true,
        None => outcome.is_success(),
    }
}

fn start_delay([min, max]: [u64; 2]) -> Duration {
    let (low, high) = if min <= max { (min, max) } else { (max, min) };
    Duration::from_secs(rand::thread_rng().gen_range(low..=high))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn acknowledgement_rules() {
        let ok = RequestOutcome::Success { status: 200, payload: json!({"statusCode": 200}) };
        let rejected = RequestOutcome::Success { status: 200, payload: json!({"statusCode": 400}) };
        let silent = RequestOutcome::Success { status: 201, payload: json!({}) };
        let bare = RequestOutcome::Success { status: 200, payload: json!(true) };
        let failed = RequestOutcome::failure(400, "nope", rewardpilot_domain::FailureClass::BadRequest);

        assert!(acknowledged(&ok));
        assert!(!acknowledged(&rejected));
        assert!(acknowledged(&silent));
        assert!(acknowledged(&bare));
        assert!(!acknowledged(&failed));
    }

    #[test]
    fn start_delay_stays_in_range() {
        for _ in 0..50 {
            let delay = start_delay([2, 4]).as_secs();
            assert!((2..=4).contains(&delay));
        }
        assert_eq!(start_delay([3, 3]).as_secs(), 3);
        assert!((1..=5).contains(&start_delay([5, 1]).as_secs()));
    }
}
