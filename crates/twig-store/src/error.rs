use twig_types::{NodePath, TypeError};

/// Errors from node provider operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The node's data does not exist.
    #[error("not found: {0}")]
    NotFound(NodePath),

    /// A directory was required but the node is a leaf (or absent).
    #[error("not a directory: {0}")]
    NotADirectory(NodePath),

    /// Content was requested from a directory.
    #[error("is a directory: {0}")]
    IsADirectory(NodePath),

    /// The glob could not be compiled.
    #[error("invalid pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// A path string could not be parsed.
    #[error(transparent)]
    InvalidPath(#[from] TypeError),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Returns `true` for the "data does not exist" condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
