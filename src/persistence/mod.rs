// src/persistence/mod.rs
//! Durable persistence
//!
//! - **Backing**: pluggable async key/value surface (memory and file impls)
//! - **Coordinator**: single-flight load and save-with-retry around the store
//!
//! The backing has no documented capacity: rejected saves are recovered by
//! shedding the oldest records and retrying, never by failing the pipeline.

pub mod backing;
pub mod coordinator;

// Re-export commonly used types
pub use backing::{DurableBacking, FileBacking, MemoryBacking};
pub use coordinator::CaptureEngine;
