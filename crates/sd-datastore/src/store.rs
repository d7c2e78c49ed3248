use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{DatastoreError, Result};

/// A single named setting with its provenance timestamps
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsRecord {
    pub namespace: String,
    pub key: String,
    pub data: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl SettingsRecord {
    /// Build the record that replaces `previous` (or a fresh one) with `data`
    pub fn replacing(previous: Option<&SettingsRecord>, namespace: &str, key: &str, data: &str) -> Self {
        let now = Utc::now();
        Self {
            namespace: namespace.to_string(),
            key: key.to_string(),
            data: data.to_string(),
            created: previous.map(|p| p.created).unwrap_or(now),
            modified: now,
        }
    }
}

// Payloads routinely carry credentials, never print them.
impl std::fmt::Debug for SettingsRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsRecord")
            .field("namespace", &self.namespace)
            .field("key", &self.key)
            .field("data", &format_args!("[{} bytes]", self.data.len()))
            .field("created", &self.created)
            .field("modified", &self.modified)
            .finish()
    }
}

/// Key-value settings store addressed by namespace and key
///
/// A `put` unconditionally replaces whatever is stored under the same name,
/// keeping only the original `created` timestamp.
#[async_trait::async_trait]
pub trait Datastore: Send + Sync {
    /// Fetch a setting, failing with [`DatastoreError::NotFound`] when absent
    async fn settings_get(&self, namespace: &str, key: &str) -> Result<SettingsRecord>;

    /// Store a setting, returning the record as written
    async fn settings_put(&self, namespace: &str, key: &str, data: &str) -> Result<SettingsRecord>;
}

#[async_trait::async_trait]
impl<D: Datastore + ?Sized> Datastore for Arc<D> {
    async fn settings_get(&self, namespace: &str, key: &str) -> Result<SettingsRecord> {
        (**self).settings_get(namespace, key).await
    }

    async fn settings_put(&self, namespace: &str, key: &str, data: &str) -> Result<SettingsRecord> {
        (**self).settings_put(namespace, key, data).await
    }
}

/// Check that a namespace or key is safe to use as a single path component
pub fn validate_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

    if valid {
        Ok(())
    } else {
        Err(DatastoreError::InvalidKey(name.to_string()))
    }
}

/// In-memory settings store for testing and short-lived processes
#[derive(Debug, Clone, Default)]
pub struct MemoryDatastore {
    records: Arc<RwLock<HashMap<(String, String), SettingsRecord>>>,
}

impl MemoryDatastore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored settings
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl Datastore for MemoryDatastore {
    async fn settings_get(&self, namespace: &str, key: &str) -> Result<SettingsRecord> {
        validate_name(namespace)?;
        validate_name(key)?;

        self.records
            .read()
            .map_err(|_| DatastoreError::LockPoisoned)?
            .get(&(namespace.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| DatastoreError::not_found(namespace, key))
    }

    async fn settings_put(&self, namespace: &str, key: &str, data: &str) -> Result<SettingsRecord> {
        validate_name(namespace)?;
        validate_name(key)?;

        let mut records = self
            .records
            .write()
            .map_err(|_| DatastoreError::LockPoisoned)?;
        let name = (namespace.to_string(), key.to_string());
        let record = SettingsRecord::replacing(records.get(&name), namespace, key, data);
        records.insert(name, record.clone());
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let store = MemoryDatastore::new();
        let err = store.settings_get("store", "headers").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_put_overwrites_and_keeps_created() {
        let store = MemoryDatastore::new();

        let first = store.settings_put("store", "headers", "one").await.unwrap();
        let second = store.settings_put("store", "headers", "two").await.unwrap();

        assert_eq!(second.created, first.created);
        assert!(second.modified >= first.modified);

        let loaded = store.settings_get("store", "headers").await.unwrap();
        assert_eq!(loaded.data, "two");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_rejects_path_like_names() {
        let store = MemoryDatastore::new();
        for bad in ["", "../etc", ".hidden", "a/b", "white space"] {
            let result = store.settings_put(bad, "headers", "x").await;
            assert!(matches!(result, Err(DatastoreError::InvalidKey(_))), "{bad:?}");
        }
    }

    #[test]
    fn test_debug_hides_payload() {
        let record = SettingsRecord::replacing(None, "store", "headers", "Macaroon root=\"secret\"");
        let printed = format!("{record:?}");
        assert!(!printed.contains("secret"));
        assert!(printed.contains("bytes"));
    }
}
