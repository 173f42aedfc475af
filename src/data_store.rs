//! Free-form JSON values addressed by caller-chosen keys.
//!
//! Every key is stored under `data:` so nothing written here can collide
//! with reservation, waybill or profile records.

use serde_json::Value as JsonValue;
use std::sync::Arc;

use crate::blob_store::{BlobStore, Consistency};
use crate::error::RecordError;

pub const DATA_PREFIX: &str = "data:";

pub fn data_key(key: &str) -> String {
    format!("{}{}", DATA_PREFIX, key)
}

#[derive(Clone)]
pub struct DataStore {
    blobs: Arc<dyn BlobStore>,
}

impl DataStore {
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self { blobs }
    }

    /// Read the value stored under `key`.
    ///
    /// Uses an eventually consistent read; a value written moments ago may
    /// not be visible yet.
    pub async fn get(&self, key: &str) -> Result<Option<JsonValue>, RecordError> {
        let key = data_key(key);
        match self.blobs.get(&key, Consistency::Eventual).await? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|source| RecordError::Corrupt { key, source }),
            None => Ok(None),
        }
    }

    pub async fn put(&self, key: &str, value: &JsonValue) -> Result<(), RecordError> {
        self.blobs
            .set(&data_key(key), serde_json::to_string(value)?)
            .await?;
        tracing::debug!("Stored data value: {}", key);
        Ok(())
    }

    /// Remove `key`. Removing a missing key succeeds.
    pub async fn remove(&self, key: &str) -> Result<(), RecordError> {
        self.blobs.delete(&data_key(key)).await?;
        tracing::debug!("Removed data value: {}", key);
        Ok(())
    }
}
