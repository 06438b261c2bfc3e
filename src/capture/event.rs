// src/capture/event.rs
//! Captured event records
//!
//! A `CapturedEvent` is created once at ingestion and never mutated. Exactly one
//! of `decoded` or `error` is set: a successful decode drops the raw bytes, a
//! failed decode retains them for operator debugging.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use ulid::Ulid;

/// Structured analytics payload produced by the decoder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedPayload {
    /// Event name
    pub event: String,

    /// Event properties
    #[serde(default)]
    pub properties: Map<String, Value>,

    /// Any additional top-level keys the sender included
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One ingested unit held in the capture buffer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedEvent {
    /// Unique identifier assigned at ingestion, never reused
    pub id: String,

    /// ISO-8601 timestamp, caller-supplied or ingestion-time fallback
    pub timestamp: String,

    /// Page URL the event originated from
    pub url: String,

    /// Hostname derived from `url`, best effort
    pub domain: String,

    /// Structured payload, present only on successful decode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decoded: Option<DecodedPayload>,

    /// Original bytes, retained only when decode failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_data: Option<Vec<u8>>,

    /// Decode failure reason, present only when decode failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CapturedEvent {
    /// Create a record for a successfully decoded payload
    pub fn from_payload(url: &str, timestamp: String, payload: DecodedPayload) -> Self {
        Self {
            id: Ulid::new().to_string(),
            timestamp,
            url: url.to_string(),
            domain: derive_domain(url),
            decoded: Some(payload),
            raw_data: None,
            error: None,
        }
    }

    /// Create a record for a payload that failed to decode
    pub fn from_decode_failure(url: &str, timestamp: String, raw: Vec<u8>, error: String) -> Self {
        Self {
            id: Ulid::new().to_string(),
            timestamp,
            url: url.to_string(),
            domain: derive_domain(url),
            decoded: None,
            raw_data: Some(raw),
            error: Some(error),
        }
    }

    /// Approximate byte cost of this record
    ///
    /// Serialized payload and string metadata are double-counted to approximate a
    /// 2-bytes-per-character internal text encoding; retained raw bytes count once.
    /// The estimate is deterministic, so budget arithmetic is reproducible.
    pub fn estimated_size(&self) -> usize {
        let metadata =
            self.id.len() + self.timestamp.len() + self.url.len() + self.domain.len();
        let mut bytes = metadata * 2;

        if let Some(decoded) = &self.decoded {
            bytes += serde_json::to_vec(decoded).map(|b| b.len()).unwrap_or(0) * 2;
        }

        if let Some(raw) = &self.raw_data {
            bytes += raw.len();
        }

        bytes
    }
}

static HOST_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.-]*://(?:[^/@?#]*@)?([^/:?#]+)")
        .expect("host pattern is valid")
});

/// Extract the hostname from a URL, falling back to the raw string
pub fn derive_domain(url: &str) -> String {
    match HOST_PATTERN.captures(url).and_then(|captures| captures.get(1)) {
        Some(host) => host.as_str().to_string(),
        None => url.to_string(),
    }
}
