//! Port interfaces for the session runner's external collaborators
//!
//! Every collaborator is `Send + Sync` and shared behind an `Arc` across all
//! account tasks; none of them holds per-account mutable state.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rewardpilot_domain::{KeyHandle, RequestOutcome, RequestSpec, Result};

/// Performs a single HTTP attempt and classifies the result.
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    /// Execute `request` once, optionally through `proxy`.
    ///
    /// Never retries; transport errors come back as `Transient` failures.
    async fn execute(&self, request: &RequestSpec, proxy: Option<&str>) -> RequestOutcome;
}

/// Produces signatures over authentication challenges.
pub trait Signer: Send + Sync {
    /// Sign `message` with the key behind `key`, returning the signature in
    /// the encoding the login endpoint expects.
    ///
    /// # Errors
    /// Returns `RewardPilotError::Signing` if the key material is unusable.
    fn sign(&self, message: &[u8], key: &KeyHandle) -> Result<String>;
}

/// String key-value store for snapshots and cached per-account data.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value; unreadable state is reported as absent.
    async fn get(&self, key: &str) -> Option<String>;

    /// Overwrite the value stored under `key`.
    async fn put(&self, key: &str, value: &str) -> Result<()>;
}

/// Verifies a proxy by asking an echo service for the egress IP.
#[async_trait]
pub trait ProxyProbe: Send + Sync {
    /// # Errors
    /// Returns `RewardPilotError::Proxy` if the proxy is unreachable or the
    /// probe answer is unusable.
    async fn egress_ip(&self, proxy: &str) -> Result<String>;
}

/// Time source and pause primitive.
///
/// Token expiry and checkin windows read `now`; backoff, cooldown and
/// pacing pauses go through `sleep` so they suspend only the calling task.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Current UTC time.
    fn now(&self) -> DateTime<Utc>;

    /// Suspend the calling task for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Wall clock backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}
