//! Proxy egress probe

use std::sync::Arc;

use async_trait::async_trait;
use rewardpilot_core::{ProxyProbe, RequestExecutor};
use rewardpilot_domain::{EgressIp, RequestAuth, RequestOutcome, RequestSpec, Result, RewardPilotError};
use tracing::debug;

/// Asks an ipify-style echo service (`{"ip": "..."}`) which address a proxy
/// exits from.
pub struct IpifyProbe {
    executor: Arc<dyn RequestExecutor>,
    url: String,
}

impl IpifyProbe {
    pub fn new(executor: Arc<dyn RequestExecutor>, url: impl Into<String>) -> Self {
        Self { executor, url: url.into() }
    }
}

#[async_trait]
impl ProxyProbe for IpifyProbe {
    async fn egress_ip(&self, proxy: &str) -> Result<String> {
        let spec = RequestSpec::get("proxy_probe", self.url.clone()).with_auth(RequestAuth::None);
        let outcome = self.executor.execute(&spec, Some(proxy)).await;

        if let Some(EgressIp { ip }) = outcome.parse::<EgressIp>() {
            debug!(%ip, "Proxy verified");
            return Ok(ip);
        }
        Err(match outcome {
            RequestOutcome::Failure { status, message, .. } => RewardPilotError::Proxy(format!(
                "Cannot check proxy IP. Status code: {status} | {message}"
            )),
            RequestOutcome::Success { status, .. } => RewardPilotError::Proxy(format!(
                "Cannot check proxy IP. Status code: {status} | missing ip"
            )),
        })
    }
}
