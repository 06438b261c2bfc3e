// src/capture/mod.rs
//! Capture pipeline
//!
//! This module turns raw compressed payloads into bounded, ordered history:
//!
//! - **Decoder**: zstd + JSON decode of raw payloads
//! - **Event**: immutable captured records and their size estimates
//! - **Store**: newest-first buffer with budget-driven eviction
//!
//! ```text
//! raw bytes → decode() → CapturedEvent → CaptureStore (insert + evict)
//! ```

pub mod decoder;
pub mod event;
pub mod store;

// Re-export commonly used types
pub use decoder::decode;
pub use event::{derive_domain, CapturedEvent, DecodedPayload};
pub use store::CaptureStore;
