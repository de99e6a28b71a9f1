use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("empty vector provided")]
    EmptyVector,

    #[error("document '{0}' already exists")]
    DuplicateId(String),

    #[error("document '{0}' not found")]
    NotFound(String),

    /// A graph invariant was violated. Signals a bug, never retryable.
    #[error("internal inconsistency: {0}")]
    InternalInconsistency(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type IndexResult<T> = Result<T, IndexError>;
