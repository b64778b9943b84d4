use thiserror::Error;

/// Custom error type for the persisted cache tier. Every variant is
/// non-fatal to the write path; the cache degrades to always-fetch.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache payload of {size} bytes exceeds the per-entry cap")]
    PayloadTooLarge { size: usize },
    #[error("Cache storage quota exceeded: {0}")]
    QuotaExceeded(String),
    #[error("Cache serialization failed: {0}")]
    Serialization(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
}
