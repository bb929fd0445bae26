//! Resilient request pipeline
//!
//! Wraps a [`RequestExecutor`] with the API's recovery policy:
//!
//! | Class          | Action                                         | Budget |
//! |----------------|------------------------------------------------|--------|
//! | `Unauthorized` | force a token refresh, replay once             | free   |
//! | `BadRequest`   | return immediately, flag a possible API change | -      |
//! | `RateLimited`  | cool down, replay                              | 1 unit |
//! | `Transient`    | short backoff, replay                          | 1 unit |
//! | `Fatal`        | return immediately                             | -      |
//!
//! Pauses go through the [`Clock`] port, so only the calling task waits.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rewardpilot_domain::constants::{RATE_LIMIT_COOLDOWN_SECS, TRANSIENT_BACKOFF_SECS};
use rewardpilot_domain::{FailureClass, RequestAuth, RequestOutcome, RequestSpec};
use tracing::{error, info, instrument, warn};

use crate::logging::truncate;
use crate::ports::{Clock, RequestExecutor};
use crate::session::SessionError;

/// Supplies access tokens for session-authenticated requests.
#[async_trait]
pub trait TokenSource: Send {
    /// Current access token; `force_refresh` skips the cached token.
    async fn access_token(&mut self, force_refresh: bool) -> Result<String, SessionError>;
}

/// Pauses applied before replaying a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub rate_limit_cooldown: Duration,
    pub transient_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            rate_limit_cooldown: Duration::from_secs(RATE_LIMIT_COOLDOWN_SECS),
            transient_backoff: Duration::from_secs(TRANSIENT_BACKOFF_SECS),
        }
    }
}

/// Stateless retry/reauth wrapper shared by every account.
pub struct RequestPipeline {
    executor: Arc<dyn RequestExecutor>,
    clock: Arc<dyn Clock>,
    policy: RetryPolicy,
}

impl RequestPipeline {
    pub fn new(executor: Arc<dyn RequestExecutor>, clock: Arc<dyn Clock>) -> Self {
        Self { executor, clock, policy: RetryPolicy::default() }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Execute `spec` with up to `retry_budget` budgeted replays.
    ///
    /// `tokens` must be provided for [`RequestAuth::Session`] requests; it is
    /// the only way a 401 can be recovered. Never panics or errors: the last
    /// observed failure is returned once recovery is exhausted.
    #[instrument(skip_all, fields(endpoint = spec.endpoint, budget = retry_budget))]
    pub async fn execute(
        &self,
        spec: &RequestSpec,
        proxy: Option<&str>,
        retry_budget: u32,
        mut tokens: Option<&mut dyn TokenSource>,
    ) -> RequestOutcome {
        let session_auth = spec.auth == RequestAuth::Session;
        let mut bearer = match &spec.auth {
            RequestAuth::None => None,
            RequestAuth::Bearer(token) => Some(token.clone()),
            RequestAuth::Session => match tokens.as_deref_mut() {
                Some(source) => match source.access_token(false).await {
                    Ok(token) => Some(token),
                    Err(e) => return no_credentials(spec, &e),
                },
                None => return no_credentials(spec, &SessionError::no_credentials("no session")),
            },
        };

        let mut retries_used = 0u32;
        let mut reauthenticated = false;

        loop {
            let request = authorize(spec, bearer.as_deref());
            let outcome = self.executor.execute(&request, proxy).await;
            report(spec, &outcome);

            let Some(class) = outcome.class() else {
                return outcome;
            };

            let pause = match class {
                FailureClass::Unauthorized => {
                    if session_auth && !reauthenticated {
                        if let Some(source) = tokens.as_deref_mut() {
                            reauthenticated = true;
                            info!(endpoint = spec.endpoint, "Unauthorized, fetching a new token");
                            match source.access_token(true).await {
                                Ok(token) => {
                                    bearer = Some(token);
                                    continue;
                                }
                                Err(e) => return no_credentials(spec, &e),
                            }
                        }
                    }
                    return outcome;
                }
                FailureClass::BadRequest => {
                    error!(
                        endpoint = spec.endpoint,
                        url = %spec.url,
                        "Invalid request, the API may have changed"
                    );
                    return outcome;
                }
                FailureClass::Fatal => return outcome,
                FailureClass::RateLimited => self.policy.rate_limit_cooldown,
                FailureClass::Transient => self.policy.transient_backoff,
            };

            if retries_used >= retry_budget {
                return outcome;
            }
            retries_used += 1;
            warn!(
                endpoint = spec.endpoint,
                retry = retries_used,
                pause_secs = pause.as_secs(),
                "Retrying after pause"
            );
            self.clock.sleep(pause).await;
        }
    }
}

fn authorize(spec: &RequestSpec, bearer: Option<&str>) -> RequestSpec {
    match bearer {
        Some(token) => spec.clone().with_header("Authorization", format!("Bearer {token}")),
        None => spec.clone(),
    }
}

fn report(spec: &RequestSpec, outcome: &RequestOutcome) {
    match outcome {
        RequestOutcome::Success { status, .. } => {
            info!(endpoint = spec.endpoint, status = *status, "Request succeeded");
        }
        RequestOutcome::Failure { status, message, class } => {
            warn!(
                endpoint = spec.endpoint,
                url = %spec.url,
                status = *status,
                class = %class,
                message = %truncate(message),
                "Request failed"
            );
        }
    }
}

fn no_credentials(spec: &RequestSpec, cause: &SessionError) -> RequestOutcome {
    error!(endpoint = spec.endpoint, error = %cause, "No credentials available");
    RequestOutcome::failure(401, cause.to_string(), FailureClass::Fatal)
}
