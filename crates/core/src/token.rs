//! Client-side bearer token inspection
//!
//! Tokens are JWTs. Only the `exp` claim is read, straight from the payload
//! segment; the signature is the server's business. No clock skew allowance:
//! a token is valid only while `exp` is strictly in the future.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ExpiryClaim {
    exp: Option<i64>,
}

/// Expiry embedded in `token`, or `None` if it cannot be decoded.
#[must_use]
pub fn expiry(token: &str) -> Option<DateTime<Utc>> {
    let payload = token.split('.').nth(1)?;
    // Some issuers pad their segments even though JWT forbids it.
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claim: ExpiryClaim = serde_json::from_slice(&bytes).ok()?;
    Utc.timestamp_opt(claim.exp?, 0).single()
}

/// `true` iff `token` is present, decodable and unexpired at `now`.
#[must_use]
pub fn is_valid(token: Option<&str>, now: DateTime<Utc>) -> bool {
    token.filter(|t| !t.is_empty()).and_then(expiry).is_some_and(|exp| exp > now)
}
