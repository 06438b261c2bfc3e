// src/lib.rs
//! Relayscope Capture Engine Library
//!
//! A bounded, durable buffer for compressed analytics payloads: decode, hold
//! the most recent records under a byte budget, evict oldest-first, and persist
//! through a pluggable backing that survives restarts.
//!
//! # Architecture
//!
//! - **capture**: payload decoding, captured records, budgeted buffer
//! - **persistence**: durable backing interface, single-flight load, save retry
//! - **dispatch**: the three-action request/response protocol
//! - **utils**: configuration constants and error taxonomy

// Public module exports
pub mod capture;
pub mod dispatch;
pub mod persistence;
pub mod utils;

// Re-export commonly used types
pub use capture::event::{CapturedEvent, DecodedPayload};
pub use dispatch::handler::{Dispatcher, Request, Response};
pub use persistence::backing::{DurableBacking, FileBacking, MemoryBacking};
pub use persistence::coordinator::CaptureEngine;
pub use utils::config::CaptureConfig;
pub use utils::errors::{CaptureError, Result};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
