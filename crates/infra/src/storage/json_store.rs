//! JSON object file used as a string key-value store
//!
//! The file holds one flat object whose values are strings (session
//! snapshots are themselves JSON text). The whole object is kept in memory
//! and rewritten on every `put`; writes are serialised by one async mutex.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rewardpilot_core::KeyValueStore;
use rewardpilot_domain::{Result, RewardPilotError};
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use crate::errors::InfraError;

/// Key-value store persisted as a single JSON object file.
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<Map<String, Value>>,
}

impl JsonFileStore {
    /// Open the store at `path`.
    ///
    /// A missing, unreadable or corrupt file counts as empty and is reset to
    /// `{}` so later runs start clean.
    ///
    /// # Errors
    /// Returns `RewardPilotError::Storage` only if the reset itself fails.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => match serde_json::from_str::<Value>(&raw) {
                Ok(Value::Object(map)) => Some(map),
                Ok(_) | Err(_) => {
                    warn!(path = %path.display(), "Can't load store, clearing data");
                    None
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Store file missing, creating it");
                None
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Can't read store, clearing data");
                None
            }
        };

        let store = match entries {
            Some(map) => Self { path, entries: Mutex::new(map) },
            None => {
                let store = Self { path, entries: Mutex::new(Map::new()) };
                store.flush(&Map::new()).await?;
                store
            }
        };
        Ok(store)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of stored keys.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    async fn flush(&self, entries: &Map<String, Value>) -> Result<()> {
        let body = serde_json::to_string_pretty(entries)
            .map_err(|e| RewardPilotError::Storage(format!("failed to encode store: {e}")))?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body).await.map_err(|e| RewardPilotError::from(InfraError::from(e)))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| RewardPilotError::from(InfraError::from(e)))?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Option<String> {
        match self.entries.lock().await.get(key)? {
            Value::String(value) => Some(value.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(key.to_string(), Value::String(value.to_string()));
        self.flush(&entries).await
    }
}
