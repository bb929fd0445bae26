//! Account identity and proxy bindings

use std::fmt;

/// Opaque handle to an account's signing key.
///
/// Holds the encoded secret exactly as loaded; only the signing adapter
/// interprets it. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyHandle(String);

impl KeyHandle {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Encoded secret, for signing adapters only.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for KeyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyHandle(<redacted>)")
    }
}

/// One automated identity, created at startup and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// Public address; also the key for persisted session state
    pub address: String,
    pub key: KeyHandle,
    /// Zero-based position in the input list
    pub index: usize,
}

impl Account {
    pub fn new(address: impl Into<String>, key: KeyHandle, index: usize) -> Self {
        Self { address: address.into(), key, index }
    }

    /// One-based number used in operator-facing logs.
    #[must_use]
    pub fn ordinal(&self) -> usize {
        self.index + 1
    }
}

/// Proxy URIs aligned by position with the account list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxyBinding {
    proxies: Vec<Option<String>>,
}

impl ProxyBinding {
    /// Build from raw proxy lines; blank entries mean direct connection.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let proxies = lines
            .into_iter()
            .map(|line| {
                let trimmed = line.as_ref().trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
            .collect();
        Self { proxies }
    }

    /// Binding where every account connects directly.
    #[must_use]
    pub fn direct() -> Self {
        Self::default()
    }

    /// Proxy of the account at `index`; `None` means connect directly.
    #[must_use]
    pub fn proxy_for(&self, index: usize) -> Option<&str> {
        self.proxies.get(index).and_then(|p| p.as_deref())
    }

    /// Number of bound proxy slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    /// True for a direct binding.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_handle_debug_is_redacted() {
        let key = KeyHandle::new("super-secret");
        assert_eq!(format!("{key:?}"), "KeyHandle(<redacted>)");
        assert_eq!(key.expose(), "super-secret");
    }

    #[test]
    fn proxy_binding_is_positional() {
        let binding = ProxyBinding::from_lines(["http://a:1", "  ", "http://c:3"]);

        assert_eq!(binding.len(), 3);
        assert_eq!(binding.proxy_for(0), Some("http://a:1"));
        assert_eq!(binding.proxy_for(1), None);
        assert_eq!(binding.proxy_for(2), Some("http://c:3"));
        assert_eq!(binding.proxy_for(7), None);
    }

    #[test]
    fn ordinal_is_one_based() {
        let account = Account::new("addr", KeyHandle::new("k"), 0);
        assert_eq!(account.ordinal(), 1);
    }
}
