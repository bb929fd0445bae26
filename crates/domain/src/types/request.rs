//! Request and outcome contracts between the pipeline and executors

use serde_json::Value;

use crate::impl_domain_label_conversions;

/// HTTP methods used by the remote API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl_domain_label_conversions!(HttpMethod {
    Get => "get",
    Post => "post",
});

/// How a request is authenticated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestAuth {
    /// No `Authorization` header
    None,
    /// Current access token of the account's session; eligible for reauth
    Session,
    /// Fixed bearer token (e.g. the refresh token)
    Bearer(String),
}

/// A single logical API call, replayable across retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    /// Short endpoint name for logs, e.g. `balance`
    pub endpoint: &'static str,
    pub method: HttpMethod,
    pub url: String,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
    pub auth: RequestAuth,
}

impl RequestSpec {
    pub fn get(endpoint: &'static str, url: impl Into<String>) -> Self {
        Self {
            endpoint,
            method: HttpMethod::Get,
            url: url.into(),
            body: None,
            headers: Vec::new(),
            auth: RequestAuth::Session,
        }
    }

    pub fn post(endpoint: &'static str, url: impl Into<String>, body: Option<Value>) -> Self {
        Self {
            endpoint,
            method: HttpMethod::Post,
            url: url.into(),
            body,
            headers: Vec::new(),
            auth: RequestAuth::Session,
        }
    }

    #[must_use]
    pub fn with_auth(mut self, auth: RequestAuth) -> Self {
        self.auth = auth;
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Header value by case-insensitive name (last one wins).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .rev()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Classification of a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureClass {
    /// HTTP 401: the token must be refreshed
    Unauthorized,
    /// HTTP 400: protocol mismatch, never retried
    BadRequest,
    /// HTTP 429
    RateLimited,
    /// Network error, timeout or 5xx
    Transient,
    /// Anything else that retrying cannot fix
    Fatal,
}

impl_domain_label_conversions!(FailureClass {
    Unauthorized => "unauthorized",
    BadRequest => "bad_request",
    RateLimited => "rate_limited",
    Transient => "transient",
    Fatal => "fatal",
});

impl FailureClass {
    /// Classify an HTTP error status.
    #[must_use]
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => Self::BadRequest,
            401 => Self::Unauthorized,
            429 => Self::RateLimited,
            408 | 500..=599 => Self::Transient,
            _ => Self::Fatal,
        }
    }
}

/// Result of one HTTP attempt
#[derive(Debug, Clone, PartialEq)]
pub enum RequestOutcome {
    Success { status: u16, payload: Value },
    Failure { status: u16, message: String, class: FailureClass },
}

impl RequestOutcome {
    pub fn failure(status: u16, message: impl Into<String>, class: FailureClass) -> Self {
        Self::Failure { status, message: message.into(), class }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// HTTP status, `0` when no response was received.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            Self::Success { status, .. } | Self::Failure { status, .. } => *status,
        }
    }

    #[must_use]
    pub fn class(&self) -> Option<FailureClass> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { class, .. } => Some(*class),
        }
    }

    #[must_use]
    pub fn payload(&self) -> Option<&Value> {
        match self {
            Self::Success { payload, .. } => Some(payload),
            Self::Failure { .. } => None,
        }
    }

    /// Deserialize the success payload into a wire type.
    #[must_use]
    pub fn parse<T: serde::de::DeserializeOwned>(&self) -> Option<T> {
        self.payload().and_then(|payload| serde_json::from_value(payload.clone()).ok())
    }
}
