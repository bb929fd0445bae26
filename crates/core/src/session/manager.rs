//! Session manager
//!
//! Owns the account's [`SessionRecord`] and keeps a valid access token
//! available, preferring the cheapest path: cached token, then refresh, then
//! a signed login. Every successful refresh or login and every checkin stamp
//! is written back to the session store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rewardpilot_domain::constants::CHALLENGE_MESSAGE;
use rewardpilot_domain::{Account, LoginRequest, RequestOutcome, RequestSpec, SessionRecord, TokenPair};
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::error::SessionError;
use crate::api::Endpoints;
use crate::fingerprint::ClientFingerprint;
use crate::logging::{emit, AccountTag, LogLevel};
use crate::pipeline::{RequestPipeline, TokenSource};
use crate::ports::{KeyValueStore, Signer};
use crate::token;

/// A session shared by an account's workflow and its periodic jobs.
///
/// Holding the lock for a whole request keeps one account's requests
/// sequential, so token refreshes never race.
pub type SharedSession = Arc<Mutex<SessionManager>>;

/// Collaborators shared by every account's session.
#[derive(Clone)]
pub struct SessionDeps {
    pub sessions: Arc<dyn KeyValueStore>,
    pub signer: Arc<dyn Signer>,
    pub pipeline: Arc<RequestPipeline>,
    pub endpoints: Arc<Endpoints>,
    pub retry_budget: u32,
}

/// Token lifecycle and authenticated request entry point for one account.
pub struct SessionManager {
    account: Account,
    record: SessionRecord,
    deps: SessionDeps,
    proxy: Option<String>,
    fingerprint: ClientFingerprint,
    tag: AccountTag,
}

impl SessionManager {
    /// Restore the account's persisted record; a missing or corrupt snapshot
    /// starts from an empty session.
    pub async fn load(
        deps: SessionDeps,
        account: Account,
        proxy: Option<String>,
        fingerprint: ClientFingerprint,
        tag: AccountTag,
    ) -> Self {
        let record = deps
            .sessions
            .get(&account.address)
            .await
            .map(|raw| SessionRecord::from_snapshot(&raw))
            .unwrap_or_default();
        Self { account, record, deps, proxy, fingerprint, tag }
    }

    #[must_use]
    pub fn into_shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }

    #[must_use]
    pub fn account(&self) -> &Account {
        &self.account
    }

    #[must_use]
    pub fn record(&self) -> &SessionRecord {
        &self.record
    }

    #[must_use]
    pub fn tag(&self) -> &AccountTag {
        &self.tag
    }

    #[must_use]
    pub fn endpoints(&self) -> &Endpoints {
        &self.deps.endpoints
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.deps.pipeline.clock().now()
    }

    /// Log a message with this account's prefix.
    pub fn log(&self, level: LogLevel, message: &str) {
        emit(&self.tag, level, message);
    }

    /// Return a valid access token.
    ///
    /// Without `force_refresh` a still-valid cached token is returned with no
    /// I/O. Otherwise a valid refresh token is tried first, then a signed
    /// login.
    ///
    /// # Errors
    /// Returns [`SessionError::NoCredentials`] when refresh and login both
    /// fail or the challenge cannot be signed.
    #[instrument(skip(self), fields(account = %self.account.address))]
    pub async fn ensure_valid_token(&mut self, force_refresh: bool) -> Result<String, SessionError> {
        let now = self.now();

        if !force_refresh {
            if let Some(access) = self.record.access_token.as_deref() {
                if token::is_valid(Some(access), now) {
                    return Ok(access.to_string());
                }
            }
        }

        let refresh_token = self
            .record
            .refresh_token
            .clone()
            .filter(|refresh| token::is_valid(Some(refresh), now));
        if let Some(refresh_token) = refresh_token {
            if let Some(access) = self.refresh(&refresh_token).await {
                return Ok(access);
            }
        }

        self.login().await
    }

    async fn refresh(&mut self, refresh_token: &str) -> Option<String> {
        self.log(LogLevel::Info, "Refreshing access token...");
        let spec = self.deps.endpoints.refresh(refresh_token);
        let outcome = self.send_unauthenticated(spec).await;

        match outcome.parse::<TokenPair>() {
            Some(pair) => {
                self.record.access_token = Some(pair.access_token.clone());
                if let Some(rotated) = pair.refresh_token {
                    self.record.refresh_token = Some(rotated);
                }
                self.persist().await;
                self.log(LogLevel::Success, "Access token refreshed");
                Some(pair.access_token)
            }
            None => {
                self.log(
                    LogLevel::Warning,
                    &format!("Refresh failed with status {}, logging in again", outcome.status()),
                );
                None
            }
        }
    }

    async fn login(&mut self) -> Result<String, SessionError> {
        self.log(LogLevel::Info, "Logging in...");
        let signature = self
            .deps
            .signer
            .sign(CHALLENGE_MESSAGE.as_bytes(), &self.account.key)
            .map_err(|e| SessionError::no_credentials(format!("signing failed: {e}")))?;

        let request = LoginRequest {
            message: CHALLENGE_MESSAGE.to_string(),
            wallet_address: self.account.address.clone(),
            signature,
            referral_code: self.deps.endpoints.referral_code().to_string(),
        };
        let spec = self.deps.endpoints.login(&request);
        let outcome = self.send_unauthenticated(spec).await;

        let Some(pair) = outcome.parse::<TokenPair>() else {
            let reason = match &outcome {
                RequestOutcome::Failure { status, message, .. } => {
                    format!("login failed with status {status}: {message}")
                }
                RequestOutcome::Success { .. } => "login response carried no token".to_string(),
            };
            self.log(LogLevel::Error, &reason);
            return Err(SessionError::no_credentials(reason));
        };

        self.record.access_token = Some(pair.access_token.clone());
        if pair.refresh_token.is_some() {
            self.record.refresh_token = pair.refresh_token;
        }
        self.persist().await;
        self.log(LogLevel::Success, "Login successful");
        Ok(pair.access_token)
    }

    /// Send a session-authenticated request through the retry pipeline.
    pub async fn send(&mut self, spec: RequestSpec) -> RequestOutcome {
        let spec = self.decorate(spec);
        let pipeline = Arc::clone(&self.deps.pipeline);
        let proxy = self.proxy.clone();
        let budget = self.deps.retry_budget;
        pipeline.execute(&spec, proxy.as_deref(), budget, Some(self as &mut dyn TokenSource)).await
    }

    async fn send_unauthenticated(&self, spec: RequestSpec) -> RequestOutcome {
        let spec = self.decorate(spec);
        self.deps
            .pipeline
            .execute(&spec, self.proxy.as_deref(), self.deps.retry_budget, None)
            .await
    }

    /// Stamp a checkin attempt and persist it.
    pub async fn record_checkin(&mut self, at: DateTime<Utc>) {
        self.record.latest_checkin = Some(at);
        self.persist().await;
    }

    /// Fingerprint headers go first so request-specific headers override
    /// them.
    fn decorate(&self, mut spec: RequestSpec) -> RequestSpec {
        let mut headers = self.fingerprint.headers();
        headers.append(&mut spec.headers);
        spec.headers = headers;
        spec
    }

    async fn persist(&self) {
        let snapshot = self.record.to_snapshot();
        match self.deps.sessions.put(&self.account.address, &snapshot).await {
            Ok(()) => debug!(account = %self.account.address, "Session saved"),
            Err(e) => warn!(account = %self.account.address, error = %e, "Failed to save session"),
        }
    }
}

#[async_trait]
impl TokenSource for SessionManager {
    async fn access_token(&mut self, force_refresh: bool) -> Result<String, SessionError> {
        self.ensure_valid_token(force_refresh).await
    }
}
