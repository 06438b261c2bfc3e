// src/dispatch/mod.rs
//! Request dispatch
//!
//! The narrow contract external collaborators see: get a snapshot, clear the
//! buffer, or feed a raw payload into the capture pipeline.

pub mod handler;

// Re-export commonly used types
pub use handler::{Dispatcher, Request, Response};
