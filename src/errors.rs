use thiserror::Error;

/// Error type that captures the failure modes of the chore engine.
///
/// Every check runs before any mutation, so a returned error always means
/// the in-memory state and the persisted snapshot are untouched.
#[derive(Debug, Error)]
pub enum ChoreError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Insufficient points: need {required}, have {available}")]
    InsufficientPoints { required: i64, available: i64 },
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ChoreError>;
