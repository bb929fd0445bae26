use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client as ReqwestClient, Method, Proxy};
use rewardpilot_core::RequestExecutor;
use rewardpilot_domain::{FailureClass, HttpMethod, RequestOutcome, RequestSpec, RewardPilotError};
use serde_json::Value;
use tracing::debug;

use crate::errors::conversions::classify_transport;
use crate::errors::InfraError;

/// Single-attempt HTTP executor.
///
/// Keeps one reqwest client per proxy (and one for direct connections) so
/// connection pools are reused across requests of the same account.
pub struct HttpExecutor {
    clients: DashMap<String, ReqwestClient>,
    timeout: Duration,
}

impl HttpExecutor {
    /// Start building a new HTTP executor.
    pub fn builder() -> HttpExecutorBuilder {
        HttpExecutorBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Self {
        Self::builder().build()
    }

    fn client_for(&self, proxy: Option<&str>) -> Result<ReqwestClient, RewardPilotError> {
        let key = proxy.unwrap_or_default();
        if let Some(client) = self.clients.get(key) {
            return Ok(client.clone());
        }

        let client = self.build_client(proxy)?;
        self.clients.insert(key.to_string(), client.clone());
        Ok(client)
    }

    fn build_client(&self, proxy: Option<&str>) -> Result<ReqwestClient, RewardPilotError> {
        let builder = ReqwestClient::builder().timeout(self.timeout);

        let builder = match proxy {
            Some(url) => {
                let proxy = Proxy::all(url).map_err(|err| {
                    RewardPilotError::Proxy(format!("invalid proxy {url}: {}", InfraError::from(err).0))
                })?;
                builder.proxy(proxy)
            }
            None => builder.no_proxy(),
        };

        builder.build().map_err(|err| {
            let infra: InfraError = err.into();
            RewardPilotError::from(infra)
        })
    }
}

impl Default for HttpExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RequestExecutor for HttpExecutor {
    async fn execute(&self, request: &RequestSpec, proxy: Option<&str>) -> RequestOutcome {
        let client = match self.client_for(proxy) {
            Ok(client) => client,
            Err(err) => return RequestOutcome::failure(0, err.to_string(), FailureClass::Fatal),
        };
        let headers = match header_map(&request.headers) {
            Ok(headers) => headers,
            Err(message) => return RequestOutcome::failure(0, message, FailureClass::Fatal),
        };

        let method = match request.method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
        };
        let mut builder = client.request(method.clone(), &request.url).headers(headers);
        if let (HttpMethod::Post, Some(body)) = (request.method, &request.body) {
            builder = builder.json(body);
        }

        let url = &request.url;
        debug!(endpoint = request.endpoint, %method, %url, proxied = proxy.is_some(), "sending HTTP request");

        let response = match builder.send().await {
            Ok(response) => response,
            Err(err) => return transport_failure(&err),
        };
        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => return transport_failure(&err),
        };
        debug!(endpoint = request.endpoint, %status, "received HTTP response");

        classify_response(status.as_u16(), &body)
    }
}

/// Turn a received response into an outcome.
///
/// Success bodies are unwrapped from their `data` envelope. Error messages
/// come from the body's `message` (or `error`) field when present.
#[must_use]
pub fn classify_response(status: u16, body: &str) -> RequestOutcome {
    let json: Option<Value> = serde_json::from_str(body).ok();

    if (200..300).contains(&status) {
        return match json {
            Some(value) => RequestOutcome::Success { status, payload: unwrap_envelope(value) },
            None if body.trim().is_empty() => RequestOutcome::Success { status, payload: Value::Null },
            None => RequestOutcome::failure(status, "undecodable response body", FailureClass::Fatal),
        };
    }

    let message = json
        .as_ref()
        .and_then(error_message)
        .or_else(|| (!body.trim().is_empty()).then(|| body.trim().to_string()))
        .unwrap_or_else(|| format!("HTTP {status}"));
    RequestOutcome::failure(status, message, FailureClass::from_status(status))
}

fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut map) => match map.remove("data") {
            Some(data) if !data.is_null() => data,
            other => {
                if let Some(data) = other {
                    map.insert("data".to_string(), data);
                }
                Value::Object(map)
            }
        },
        other => other,
    }
}

fn error_message(body: &Value) -> Option<String> {
    ["message", "error"].iter().find_map(|field| match body.get(field)? {
        Value::String(message) => Some(message.clone()),
        Value::Array(items) => Some(
            items.iter().map(|item| item.as_str().map_or_else(|| item.to_string(), str::to_string)).collect::<Vec<_>>().join("; "),
        ),
        Value::Null => None,
        other => Some(other.to_string()),
    })
}

/// Later entries replace earlier ones with the same name.
fn header_map(headers: &[(String, String)]) -> Result<HeaderMap, String> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|err| format!("invalid header name {name}: {err}"))?;
        let value =
            HeaderValue::from_str(value).map_err(|err| format!("invalid header value for {name}: {err}"))?;
        map.insert(name, value);
    }
    Ok(map)
}

fn transport_failure(err: &reqwest::Error) -> RequestOutcome {
    let status = err.status().map_or(0, |status| status.as_u16());
    debug!(error = %err, "HTTP request failed");
    RequestOutcome::failure(status, err.to_string(), classify_transport(err))
}

/// Builder for [`HttpExecutor`].
#[derive(Debug)]
pub struct HttpExecutorBuilder {
    timeout: Duration,
}

impl Default for HttpExecutorBuilder {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(120) }
    }
}

impl HttpExecutorBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Clients are created lazily per proxy, so building cannot fail.
    pub fn build(self) -> HttpExecutor {
        HttpExecutor {
            clients: DashMap::new(),
            timeout: self.timeout,
        }
    }
}
