//! Heartbeat and balance checkpoint jobs

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use rewardpilot_domain::constants::{CHECKPOINT_INTERVAL_SECS, HEARTBEAT_INTERVAL_SECS};
use rewardpilot_domain::{Balance, RequestOutcome};
use serde_json::Value;

use crate::api::Endpoints;
use crate::logging::{truncate, LogLevel};
use crate::scheduling::PeriodicJob;
use crate::session::SharedSession;

pub(crate) fn checkpoint_job(
    address: &str,
    session: &SharedSession,
    endpoints: &Arc<Endpoints>,
) -> PeriodicJob {
    let session = Arc::clone(session);
    let endpoints = Arc::clone(endpoints);
    PeriodicJob::new(address, "checkpoint", Duration::from_secs(CHECKPOINT_INTERVAL_SECS), move || {
        let session = Arc::clone(&session);
        let endpoints = Arc::clone(&endpoints);
        async move { checkpoint(&session, &endpoints).await }.boxed()
    })
}

pub(crate) fn heartbeat_job(
    address: &str,
    session: &SharedSession,
    endpoints: &Arc<Endpoints>,
) -> PeriodicJob {
    let session = Arc::clone(session);
    let endpoints = Arc::clone(endpoints);
    PeriodicJob::new(address, "heartbeat", Duration::from_secs(HEARTBEAT_INTERVAL_SECS), move || {
        let session = Arc::clone(&session);
        let endpoints = Arc::clone(&endpoints);
        async move { heartbeat(&session, &endpoints).await }.boxed()
    })
}

/// Poll and log the point balance.
pub(crate) async fn checkpoint(session: &SharedSession, endpoints: &Endpoints) {
    let mut session = session.lock().await;
    let outcome = session.send(endpoints.balance()).await;
    match outcome.parse::<Balance>() {
        Some(balance) => session.log(LogLevel::Custom, &format!("Checkpoint | {}", describe_balance(&balance))),
        None => session.log(LogLevel::Warning, &format!("Checkpoint failed | {}", describe_failure(&outcome))),
    }
}

/// Report liveness to the API.
pub(crate) async fn heartbeat(session: &SharedSession, endpoints: &Endpoints) {
    let mut session = session.lock().await;
    let outcome = session.send(endpoints.heartbeat()).await;
    if outcome.is_success() {
        session.log(LogLevel::Success, "Heartbeat sent");
    } else {
        session.log(LogLevel::Warning, &format!("Heartbeat failed | {}", describe_failure(&outcome)));
    }
}

pub(crate) fn describe_balance(balance: &Balance) -> String {
    format!(
        "Total points: {} | Today: {} | Referral: {}",
        points(&balance.total_earning_point),
        points(&balance.today_earning_point),
        points(&balance.referral_earning_point),
    )
}

pub(crate) fn describe_failure(outcome: &RequestOutcome) -> String {
    match outcome {
        RequestOutcome::Failure { status, message, class } => {
            format!("status {status} ({class}): {}", truncate(message))
        }
        RequestOutcome::Success { status, payload } => {
            format!("status {status}: {}", truncate(&payload.to_string()))
        }
    }
}

fn points(value: &Value) -> String {
    match value {
        Value::Null => "0".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
