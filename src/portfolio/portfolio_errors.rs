use diesel::result::Error as DieselError;
use thiserror::Error;

/// Custom error type for aggregate computation and persistence
#[derive(Debug, Error)]
pub enum PortfolioError {
    #[error("Aggregate recompute failed: {0}")]
    RecomputeFailed(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl From<DieselError> for PortfolioError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => {
                PortfolioError::NotFound("Portfolio aggregate not found".to_string())
            }
            _ => PortfolioError::DatabaseError(err.to_string()),
        }
    }
}
