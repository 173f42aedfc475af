//! Key-value blob store abstraction.
//!
//! Every piece of service state lives behind [`BlobStore`]. Production runs
//! on [`crate::spanner::SpannerBlobStore`]; tests and local development use
//! [`MemoryBlobStore`].

use anyhow::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::error::RecordError;

/// Read mode requested from the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Consistency {
    /// Observe every write that completed before the read started.
    Strong,
    /// Allow a slightly stale snapshot in exchange for a cheaper read.
    ///
    /// Reservation and profile reads never use this; only `/data` reads do.
    Eventual,
}

/// Minimal key-value surface the service needs from its storage backend.
///
/// Values are opaque strings; callers decide whether they hold JSON or a
/// raw pointer. Implementations must be safe to share across handlers.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// Returns `Ok(None)` when the key does not exist.
    async fn get(&self, key: &str, consistency: Consistency) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: String) -> Result<()>;

    /// Remove `key`. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// List every key starting with `prefix`, in ascending key order.
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;

    /// Verify the backend is reachable.
    async fn health_check(&self) -> Result<()>;
}

/// Read `key` with strong consistency and decode it as JSON.
///
/// A value that fails to decode is reported as [`RecordError::Corrupt`].
pub async fn get_json<T: DeserializeOwned>(
    store: &dyn BlobStore,
    key: &str,
) -> std::result::Result<Option<T>, RecordError> {
    match store.get(key, Consistency::Strong).await? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| RecordError::Corrupt {
                key: key.to_string(),
                source,
            }),
        None => Ok(None),
    }
}

/// In-memory blob store backed by an ordered map.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<BTreeMap<String, String>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, BTreeMap<String, String>>> {
        self.blobs
            .read()
            .map_err(|_| anyhow::anyhow!("memory blob store lock poisoned"))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, BTreeMap<String, String>>> {
        self.blobs
            .write()
            .map_err(|_| anyhow::anyhow!("memory blob store lock poisoned"))
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn get(&self, key: &str, _consistency: Consistency) -> Result<Option<String>> {
        Ok(self.read()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        self.write()?.insert(key.to_string(), value);
        tracing::debug!("Stored blob: {}", key);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.write()?.remove(key);
        tracing::debug!("Deleted blob: {}", key);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let blobs = self.read()?;
        Ok(blobs
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect())
    }

    async fn health_check(&self) -> Result<()> {
        self.read().map(|_| ())
    }
}
