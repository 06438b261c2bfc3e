// src/utils/config.rs
//! Capture budget configuration
//!
//! The budget constants are fixed product decisions, not user settings. Tests
//! construct smaller configs directly.

/// Maximum running total of estimated record sizes before eviction is forced
pub const DEFAULT_CEILING_BYTES: usize = 8 * 1024 * 1024;

/// Minimum amount reclaimed per eviction pass on overflow or rejected save
pub const DEFAULT_TARGET_FREE_BYTES: usize = 2 * 1024 * 1024;

/// Maximum save attempts before a persist is reported as exhausted
pub const DEFAULT_MAX_SAVE_ATTEMPTS: u32 = 6;

/// Backing-store key the event sequence is persisted under
pub const DEFAULT_STORAGE_KEY: &str = "captured_events";

/// Capture engine configuration
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Storage ceiling (bytes)
    pub ceiling_bytes: usize,

    /// Per-pass eviction target (bytes)
    pub target_free_bytes: usize,

    /// Save retry cap
    pub max_save_attempts: u32,

    /// Persisted record key
    pub storage_key: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            ceiling_bytes: DEFAULT_CEILING_BYTES,
            target_free_bytes: DEFAULT_TARGET_FREE_BYTES,
            max_save_attempts: DEFAULT_MAX_SAVE_ATTEMPTS,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}
