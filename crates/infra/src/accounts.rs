//! Account and proxy list loading
//!
//! Both inputs are plain line files; blank lines are ignored. Accounts are
//! derived from their private keys, and proxies are bound to accounts by
//! position.

use std::path::Path;

use rewardpilot_domain::{Account, KeyHandle, ProxyBinding, Result, RewardPilotError};
use tracing::{info, warn};

use crate::signing::derive_address;

/// Read the non-blank, trimmed lines of `path`.
///
/// # Errors
/// Returns `RewardPilotError::Config` if the file cannot be read.
pub fn load_lines(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .map_err(|e| RewardPilotError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
    Ok(parse_lines(&contents))
}

fn parse_lines(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Build accounts from private keys, in file order.
///
/// # Errors
/// Returns `RewardPilotError::InvalidInput` naming the first key that cannot
/// be decoded.
pub fn accounts_from_keys(keys: Vec<String>) -> Result<Vec<Account>> {
    keys.into_iter()
        .enumerate()
        .map(|(index, secret)| {
            let key = KeyHandle::new(secret);
            let address = derive_address(&key).map_err(|e| {
                RewardPilotError::InvalidInput(format!("private key #{}: {}", index + 1, e))
            })?;
            Ok(Account::new(address, key, index))
        })
        .collect()
}

/// Check the account/proxy counts and bind proxies to accounts.
///
/// # Errors
/// Returns `RewardPilotError::Config` if there are no accounts, or proxies
/// are enabled and fewer proxies than accounts are listed.
pub fn bind_proxies(accounts: &[Account], proxies: &[String], use_proxy: bool) -> Result<ProxyBinding> {
    if accounts.is_empty() {
        return Err(RewardPilotError::Config("No private keys found".to_string()));
    }

    if !use_proxy {
        warn!("You are running without proxies");
        return Ok(ProxyBinding::direct());
    }

    if proxies.len() < accounts.len() {
        return Err(RewardPilotError::Config(format!(
            "Every account needs a proxy: {} accounts, {} proxies",
            accounts.len(),
            proxies.len()
        )));
    }

    if proxies.len() > accounts.len() {
        warn!(unused = proxies.len() - accounts.len(), "More proxies than accounts, extra proxies are unused");
    }

    info!(accounts = accounts.len(), proxies = proxies.len(), "Proxies bound to accounts");
    Ok(ProxyBinding::from_lines(&proxies[..accounts.len()]))
}
