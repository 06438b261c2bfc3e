// src/persistence/backing.rs
//! Durable backing interface
//!
//! The engine persists through a pluggable key/value surface with no documented
//! capacity guarantee: `save` may reject payloads above an unknown threshold and
//! the caller is expected to shed data and retry.

use crate::utils::errors::{CaptureError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

/// Async key/value persistence surface
#[async_trait]
pub trait DurableBacking: Send + Sync {
    /// Fetch the stored value for `key`, if any
    async fn load(&self, key: &str) -> Result<Option<Value>>;

    /// Store `value` under `key`, replacing any previous value
    async fn save(&self, key: &str, value: &Value) -> Result<()>;
}

// Shared handles to a backing are backings themselves, so tests and callers
// can keep a handle across engine restarts
#[async_trait]
impl<'a, B: DurableBacking> DurableBacking for &'a B {
    async fn load(&self, key: &str) -> Result<Option<Value>> {
        (**self).load(key).await
    }

    async fn save(&self, key: &str, value: &Value) -> Result<()> {
        (**self).save(key, value).await
    }
}

#[async_trait]
impl<B: DurableBacking> DurableBacking for std::sync::Arc<B> {
    async fn load(&self, key: &str) -> Result<Option<Value>> {
        (**self).load(key).await
    }

    async fn save(&self, key: &str, value: &Value) -> Result<()> {
        (**self).save(key, value).await
    }
}

/// In-memory backing with an optional byte quota
///
/// The quota models the undocumented size threshold of a real host store:
/// saves whose serialized form exceeds it are rejected as recoverable write
/// failures. Used by tests and dry runs.
#[derive(Default)]
pub struct MemoryBacking {
    entries: Mutex<HashMap<String, Value>>,
    quota_bytes: Option<usize>,
}

impl MemoryBacking {
    /// Create an unbounded in-memory backing
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backing that rejects saves larger than `quota_bytes`
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Serialized size of the currently stored value, if any
    pub async fn stored_size(&self, key: &str) -> Option<usize> {
        let entries = self.entries.lock().await;
        entries
            .get(key)
            .and_then(|value| serde_json::to_vec(value).ok())
            .map(|bytes| bytes.len())
    }
}

#[async_trait]
impl DurableBacking for MemoryBacking {
    async fn load(&self, key: &str) -> Result<Option<Value>> {
        let entries = self.entries.lock().await;
        Ok(entries.get(key).cloned())
    }

    async fn save(&self, key: &str, value: &Value) -> Result<()> {
        if let Some(quota) = self.quota_bytes {
            let size = serde_json::to_vec(value)
                .map_err(|e| CaptureError::BackingWrite(format!("Serialization error: {}", e)))?
                .len();
            if size > quota {
                return Err(CaptureError::BackingWrite(format!(
                    "Quota exceeded: {} bytes > {} bytes",
                    size, quota
                )));
            }
        }

        let mut entries = self.entries.lock().await;
        entries.insert(key.to_string(), value.clone());
        Ok(())
    }
}

/// File-per-key backing under a base directory
///
/// Writes go through a temp file and rename, so an interrupted save leaves the
/// previous snapshot intact.
pub struct FileBacking {
    base_dir: PathBuf,
}

impl FileBacking {
    /// Create a file backing rooted at `base_dir`
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{}.json", key))
    }
}

#[async_trait]
impl DurableBacking for FileBacking {
    async fn load(&self, key: &str) -> Result<Option<Value>> {
        let path = self.path_for(key);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(CaptureError::BackingRead(format!(
                    "Failed to read {:?}: {}",
                    path, e
                )))
            }
        };

        let value = serde_json::from_slice(&bytes)
            .map_err(|e| CaptureError::BackingRead(format!("Corrupt file {:?}: {}", path, e)))?;

        debug!("Loaded {} bytes from {:?}", bytes.len(), path);
        Ok(Some(value))
    }

    async fn save(&self, key: &str, value: &Value) -> Result<()> {
        fs::create_dir_all(&self.base_dir).await.map_err(|e| {
            CaptureError::BackingWrite(format!("Failed to create directory: {}", e))
        })?;

        let bytes = serde_json::to_vec(value)
            .map_err(|e| CaptureError::BackingWrite(format!("Serialization error: {}", e)))?;

        let path = self.path_for(key);
        let tmp_path = self.base_dir.join(format!("{}.json.tmp", key));

        fs::write(&tmp_path, &bytes).await.map_err(|e| {
            CaptureError::BackingWrite(format!("Failed to write {:?}: {}", tmp_path, e))
        })?;
        fs::rename(&tmp_path, &path).await.map_err(|e| {
            CaptureError::BackingWrite(format!("Failed to rename into {:?}: {}", path, e))
        })?;

        debug!("Saved {} bytes to {:?}", bytes.len(), path);
        Ok(())
    }
}
