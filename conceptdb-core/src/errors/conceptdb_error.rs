use super::{ConsistencyError, PropagationError, StorageError};

/// Top-level error type for the ConceptDB workspace.
#[derive(Debug, thiserror::Error)]
pub enum ConceptDbError {
    #[error("not found: {id}")]
    NotFound { id: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("consistency check failed: {0}")]
    Consistency(#[from] ConsistencyError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("propagation error: {0}")]
    Propagation(#[from] PropagationError),

    #[error("config error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("concurrency error: {0}")]
    Concurrency(String),
}

impl ConceptDbError {
    /// Shorthand for a [`ConceptDbError::NotFound`] on any displayable id.
    pub fn not_found(id: impl ToString) -> Self {
        Self::NotFound { id: id.to_string() }
    }

    /// Whether this error only means "the id does not resolve".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Convenience type alias.
pub type ConceptDbResult<T> = Result<T, ConceptDbError>;
