// src/capture/decoder.rs
//! Compressed payload decoding
//!
//! One fixed decode path: zstd decompression followed by JSON parsing. A JSON
//! array is a batch of events, a single object is a one-element batch. Decoding
//! is pure and attempted exactly once per payload; the caller keeps the original
//! bytes for retention on failure.

use crate::capture::event::DecodedPayload;
use crate::utils::errors::{CaptureError, Result};
use serde_json::Value;
use tracing::debug;

/// Decode a raw compressed payload into structured events
pub fn decode(raw: &[u8]) -> Result<Vec<DecodedPayload>> {
    let inflated = zstd::decode_all(raw)
        .map_err(|e| CaptureError::DecodeFailed(format!("Decompression error: {}", e)))?;

    debug!("Inflated {} bytes -> {} bytes", raw.len(), inflated.len());

    let document: Value = serde_json::from_slice(&inflated)
        .map_err(|e| CaptureError::DecodeFailed(format!("Invalid JSON: {}", e)))?;

    let items = match document {
        Value::Array(items) => items,
        object => vec![object],
    };

    items
        .into_iter()
        .map(|item| {
            serde_json::from_value(item)
                .map_err(|e| CaptureError::DecodeFailed(format!("Malformed event: {}", e)))
        })
        .collect()
}
