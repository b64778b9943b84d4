use thiserror::Error;

/// Custom error type for page retrieval. A failed fetch clears page state on
/// the caller's side and is retryable.
#[derive(Debug, Error)]
pub enum PaginationError {
    #[error("Page fetch failed: {0}")]
    FetchFailed(String),
}
