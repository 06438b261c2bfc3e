// src/utils/errors.rs
//! Engine error types
//!
//! Every failure in the capture pipeline is recoverable: decode failures become
//! error-tagged records, backing failures degrade to an empty or trimmed buffer.

use thiserror::Error;

/// Errors produced by the capture engine
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Payload could not be decompressed or parsed
    #[error("Decode failed: {0}")]
    DecodeFailed(String),

    /// Durable backing rejected or failed a read
    #[error("Backing read failed: {0}")]
    BackingRead(String),

    /// Durable backing rejected or failed a write
    #[error("Backing write failed: {0}")]
    BackingWrite(String),

    /// Save retries exhausted without a successful write
    #[error("Persistence retries exhausted after {attempts} attempts: {reason}")]
    PersistExhausted { attempts: u32, reason: String },
}

/// Result alias used throughout the engine
pub type Result<T> = std::result::Result<T, CaptureError>;
