// src/persistence/coordinator.rs
//! Capture engine: lazy load, buffer mutation, save-with-retry
//!
//! The engine owns the capture store and the durable backing. The first caller
//! triggers a load from the backing; concurrent callers share that single
//! in-flight load through a `OnceCell` rather than each fetching independently.
//! Saves are serialized by a gate mutex and snapshot the store only after
//! acquiring it, so a stale sequence can never overwrite a newer one.

use crate::capture::decoder::decode;
use crate::capture::event::CapturedEvent;
use crate::capture::store::CaptureStore;
use crate::persistence::backing::DurableBacking;
use crate::utils::config::CaptureConfig;
use crate::utils::errors::{CaptureError, Result};
use chrono::Utc;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, warn};

/// Bounded durable capture engine
pub struct CaptureEngine<B> {
    backing: B,
    config: CaptureConfig,
    store: Mutex<CaptureStore>,
    loaded: OnceCell<()>,
    save_gate: Mutex<()>,
}

impl<B: DurableBacking> CaptureEngine<B> {
    /// Create an engine over the given backing; nothing is loaded until the
    /// first action arrives
    pub fn new(backing: B, config: CaptureConfig) -> Self {
        let store = CaptureStore::new(&config);
        Self {
            backing,
            config,
            store: Mutex::new(store),
            loaded: OnceCell::new(),
            save_gate: Mutex::new(()),
        }
    }

    /// Load the persisted sequence exactly once, sharing one in-flight load
    /// among concurrent callers
    pub async fn ensure_loaded(&self) {
        self.loaded.get_or_init(|| self.load_from_backing()).await;
    }

    async fn load_from_backing(&self) {
        let stored = match self.backing.load(&self.config.storage_key).await {
            Ok(stored) => stored,
            Err(e) => {
                warn!("Failed to read persisted events, starting empty: {}", e);
                None
            }
        };

        // Anything other than a well-formed record list means no prior data
        let events: Vec<CapturedEvent> = stored
            .and_then(|value| serde_json::from_value(value).ok())
            .unwrap_or_default();

        let (count, trimmed) = {
            let mut store = self.store.lock().await;
            store.replace(events);
            let trimmed = store.evict_to_budget();
            (store.len(), trimmed)
        };

        info!("Loaded {} captured events from backing", count);

        // A sequence persisted under an older budget may arrive over ceiling;
        // persist the trimmed form before serving it
        if trimmed > 0 {
            if let Err(e) = self.persist_with_retry().await {
                warn!("Failed to persist trimmed sequence after load: {}", e);
            }
        }
    }

    /// Current sequence, newest first
    pub async fn events(&self) -> Vec<CapturedEvent> {
        self.ensure_loaded().await;
        let store = self.store.lock().await;
        store.snapshot()
    }

    /// Drop every record and persist the empty sequence
    pub async fn clear(&self) -> Result<()> {
        self.ensure_loaded().await;
        {
            let mut store = self.store.lock().await;
            store.clear();
        }
        self.persist_with_retry().await
    }

    /// Ingest one raw payload
    ///
    /// A successful decode inserts one record per structured event with the raw
    /// bytes dropped; a failed decode inserts a single error-tagged record that
    /// retains them. Eviction runs inside the same lock acquisition as the
    /// inserts, so concurrent captures never interleave mid-mutation. Returns
    /// the number of records added.
    pub async fn capture(&self, url: &str, data: &[u8], timestamp: Option<String>) -> usize {
        self.ensure_loaded().await;

        let timestamp = timestamp.unwrap_or_else(|| Utc::now().to_rfc3339());
        let records = match decode(data) {
            Ok(payloads) => payloads
                .into_iter()
                .map(|payload| CapturedEvent::from_payload(url, timestamp.clone(), payload))
                .collect(),
            Err(e) => {
                debug!("Payload from {} failed to decode: {}", url, e);
                vec![CapturedEvent::from_decode_failure(
                    url,
                    timestamp,
                    data.to_vec(),
                    e.to_string(),
                )]
            }
        };

        let added = records.len();
        {
            let mut store = self.store.lock().await;
            for record in records {
                store.insert(record);
                store.evict_to_budget();
            }
            // Covers the multi-record batch as a whole
            store.evict_to_budget();
        }

        if let Err(e) = self.persist_with_retry().await {
            warn!("Capture persisted nothing: {}", e);
        }

        added
    }

    /// Save the current sequence, shedding oldest records and retrying when the
    /// backing rejects the write
    ///
    /// Each attempt snapshots the store after acquiring the save gate, so saves
    /// are serialized and always write the freshest sequence. An empty sequence
    /// that still fails has nothing left to shed and fails immediately. On
    /// exhaustion the in-memory state remains authoritative.
    pub async fn persist_with_retry(&self) -> Result<()> {
        let _gate = self.save_gate.lock().await;

        let mut last_reason = String::new();
        let mut attempts = 0;
        while attempts < self.config.max_save_attempts {
            attempts += 1;

            let (value, remaining) = {
                let store = self.store.lock().await;
                let value = serde_json::to_value(store.snapshot()).map_err(|e| {
                    CaptureError::BackingWrite(format!("Serialization error: {}", e))
                })?;
                (value, store.len())
            };

            match self.backing.save(&self.config.storage_key, &value).await {
                Ok(()) => {
                    debug!("Persisted {} records on attempt {}", remaining, attempts);
                    return Ok(());
                }
                Err(e) => {
                    last_reason = e.to_string();
                    if remaining == 0 {
                        break;
                    }

                    let mut store = self.store.lock().await;
                    let reclaim = self.config.target_free_bytes.max(store.total_bytes() / 4);
                    let dropped = store.shed(reclaim);
                    warn!(
                        "Save attempt {} rejected ({}), shed {} records and retrying",
                        attempts, last_reason, dropped
                    );
                }
            }
        }

        Err(CaptureError::PersistExhausted {
            attempts,
            reason: last_reason,
        })
    }
}
