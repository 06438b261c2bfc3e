// src/utils/mod.rs
//! Common utilities
//!
//! - **config**: fixed capture budget constants
//! - **errors**: engine error taxonomy

pub mod config;
pub mod errors;

pub use config::CaptureConfig;
pub use errors::{CaptureError, Result};
