//! Shared test helpers for `rewardpilot-core` integration tests.
//!
//! In-memory fakes for every port, so workflows run deterministically
//! without a network, a filesystem or real time.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use rewardpilot_core::{
    Clock, Endpoints, JobRegistry, KeyValueStore, ProxyProbe, RequestExecutor, RequestPipeline,
    SessionDeps, Signer, SupervisorDeps,
};
use rewardpilot_domain::{
    Account, ApiConfig, FailureClass, KeyHandle, RequestOutcome, RequestSpec, Result,
    RewardPilotError, RunnerConfig, SessionRecord,
};
use serde_json::{json, Value};

pub const BASE_URL: &str = "http://api.test";

/// Route tracing output to the test harness; `RUST_LOG` selects the level.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init()
        .ok();
}

/// Fixed starting instant for [`ManualClock`].
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).single().unwrap_or_default()
}

/// Unsigned JWT whose `exp` claim is `exp`.
pub fn make_token(exp: DateTime<Utc>) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(json!({ "exp": exp.timestamp() }).to_string());
    format!("{header}.{payload}.sig")
}

pub fn ok(payload: Value) -> RequestOutcome {
    RequestOutcome::Success { status: 200, payload }
}

pub fn fail(status: u16) -> RequestOutcome {
    RequestOutcome::failure(status, format!("HTTP {status}"), FailureClass::from_status(status))
}

pub fn tokens(access: &str, refresh: &str) -> RequestOutcome {
    ok(json!({ "accessToken": access, "refreshToken": refresh }))
}

/// One request as seen by the executor.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub endpoint: &'static str,
    pub url: String,
    pub authorization: Option<String>,
    pub origin: Option<String>,
    pub proxy: Option<String>,
}

/// Executor answering from per-endpoint scripts.
///
/// Each endpoint replays its outcomes in order and then keeps repeating the
/// last one. Unscripted endpoints answer 404.
#[derive(Default)]
pub struct ScriptedExecutor {
    scripts: Mutex<HashMap<&'static str, (Vec<RequestOutcome>, usize)>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedExecutor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script(&self, endpoint: &'static str, outcomes: Vec<RequestOutcome>) {
        self.scripts.lock().insert(endpoint, (outcomes, 0));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn count(&self, endpoint: &str) -> usize {
        self.calls.lock().iter().filter(|call| call.endpoint == endpoint).count()
    }

    pub fn total(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl RequestExecutor for ScriptedExecutor {
    async fn execute(&self, request: &RequestSpec, proxy: Option<&str>) -> RequestOutcome {
        self.calls.lock().push(RecordedCall {
            endpoint: request.endpoint,
            url: request.url.clone(),
            authorization: request.header("Authorization").map(str::to_string),
            origin: request.header("Origin").map(str::to_string),
            proxy: proxy.map(str::to_string),
        });

        let mut scripts = self.scripts.lock();
        match scripts.get_mut(request.endpoint) {
            Some((outcomes, cursor)) if !outcomes.is_empty() => {
                let index = (*cursor).min(outcomes.len() - 1);
                *cursor += 1;
                outcomes[index].clone()
            }
            _ => RequestOutcome::failure(404, "unscripted endpoint", FailureClass::Fatal),
        }
    }
}

/// Clock that never blocks: `sleep` records the pause and advances `now`.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
    sleeps: Mutex<Vec<Duration>>,
}

impl ManualClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { now: Mutex::new(epoch()), sleeps: Mutex::new(Vec::new()) })
    }

    pub fn advance(&self, by: chrono::Duration) {
        *self.now.lock() += by;
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().clone()
    }

    pub fn sleeps_of(&self, duration: Duration) -> usize {
        self.sleeps.lock().iter().filter(|d| **d == duration).count()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().push(duration);
        if let Ok(step) = chrono::Duration::from_std(duration) {
            *self.now.lock() += step;
        }
        tokio::task::yield_now().await;
    }
}

/// In-memory key-value store.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
    writes: Mutex<usize>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn seed_session(&self, address: &str, record: &SessionRecord) {
        self.values.lock().insert(address.to_string(), record.to_snapshot());
    }

    pub fn session(&self, address: &str) -> Option<SessionRecord> {
        self.values.lock().get(address).map(|raw| SessionRecord::from_snapshot(raw))
    }

    pub fn writes(&self) -> usize {
        *self.writes.lock()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        self.values.lock().insert(key.to_string(), value.to_string());
        *self.writes.lock() += 1;
        Ok(())
    }
}

/// Signer returning a constant signature, or always failing.
pub struct FixedSigner {
    fail: bool,
}

impl FixedSigner {
    pub fn working() -> Arc<Self> {
        Arc::new(Self { fail: false })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self { fail: true })
    }
}

impl Signer for FixedSigner {
    fn sign(&self, _message: &[u8], _key: &KeyHandle) -> Result<String> {
        if self.fail {
            Err(RewardPilotError::Signing("bad key".to_string()))
        } else {
            Ok("signature".to_string())
        }
    }
}

/// Probe answering with a fixed IP, or failing for every proxy.
pub struct StaticProbe {
    ip: Option<String>,
}

impl StaticProbe {
    pub fn answering(ip: &str) -> Arc<Self> {
        Arc::new(Self { ip: Some(ip.to_string()) })
    }

    pub fn unreachable() -> Arc<Self> {
        Arc::new(Self { ip: None })
    }
}

#[async_trait]
impl ProxyProbe for StaticProbe {
    async fn egress_ip(&self, proxy: &str) -> Result<String> {
        self.ip
            .clone()
            .ok_or_else(|| RewardPilotError::Proxy(format!("{proxy} unreachable")))
    }
}

pub fn account(index: usize) -> Account {
    Account::new(format!("Addr{index}"), KeyHandle::new(format!("secret{index}")), index)
}

/// Wires the fakes together the way the binary wires the real adapters.
pub struct Harness {
    pub executor: Arc<ScriptedExecutor>,
    pub clock: Arc<ManualClock>,
    pub sessions: Arc<MemoryStore>,
    pub fingerprints: Arc<MemoryStore>,
    pub signer: Arc<FixedSigner>,
    pub probe: Arc<StaticProbe>,
    pub jobs: JobRegistry,
    pub settings: RunnerConfig,
    pub retry_budget: u32,
}

impl Harness {
    pub fn new() -> Self {
        init_tracing();
        Self {
            executor: ScriptedExecutor::new(),
            clock: ManualClock::new(),
            sessions: MemoryStore::new(),
            fingerprints: MemoryStore::new(),
            signer: FixedSigner::working(),
            probe: StaticProbe::answering("203.0.113.7"),
            jobs: JobRegistry::new(),
            settings: RunnerConfig { start_delay_secs: [0, 0], ..RunnerConfig::default() },
            retry_budget: 2,
        }
    }

    pub fn endpoints() -> Arc<Endpoints> {
        Arc::new(Endpoints::new(&ApiConfig {
            base_url: BASE_URL.to_string(),
            referral_code: "REF123".to_string(),
            ..ApiConfig::default()
        }))
    }

    pub fn session_deps(&self) -> SessionDeps {
        let executor: Arc<dyn RequestExecutor> = self.executor.clone();
        let clock: Arc<dyn Clock> = self.clock.clone();
        SessionDeps {
            sessions: self.sessions.clone(),
            signer: self.signer.clone(),
            pipeline: Arc::new(RequestPipeline::new(executor, clock)),
            endpoints: Self::endpoints(),
            retry_budget: self.retry_budget,
        }
    }

    pub fn supervisor_deps(&self) -> SupervisorDeps {
        SupervisorDeps {
            session: self.session_deps(),
            fingerprints: self.fingerprints.clone(),
            probe: self.probe.clone(),
            jobs: self.jobs.clone(),
            settings: Arc::new(self.settings.clone()),
            origin: "https://dashboard.test".to_string(),
        }
    }

    /// Session record whose access token expires in `access_ttl` and refresh
    /// token in `refresh_ttl` (negative means already expired).
    pub fn record(&self, access_ttl: chrono::Duration, refresh_ttl: chrono::Duration) -> SessionRecord {
        let now = self.clock.now();
        SessionRecord {
            access_token: Some(make_token(now + access_ttl)),
            refresh_token: Some(make_token(now + refresh_ttl)),
            latest_checkin: None,
        }
    }

    /// Scripts for a fresh account whose lists are empty.
    pub fn script_fresh_account(&self) {
        let now = self.clock.now();
        let access = make_token(now + chrono::Duration::hours(1));
        let refresh = make_token(now + chrono::Duration::days(7));
        self.executor.script("login", vec![tokens(&access, &refresh)]);
        self.executor.script("profile", vec![ok(json!({ "referralCode": "ABC" }))]);
        self.executor.script(
            "balance",
            vec![ok(json!({ "totalEarningPoint": 10, "todayEarningPoint": 1, "referralEarningPoint": 0 }))],
        );
        self.executor.script("daily_tasks", vec![ok(json!([]))]);
        self.executor.script("tasks", vec![ok(json!([]))]);
        self.executor.script("heartbeat", vec![ok(json!({}))]);
    }
}
