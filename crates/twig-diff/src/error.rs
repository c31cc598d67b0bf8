//! Error types for the diff crate.

use twig_store::StoreError;
use twig_types::ContentType;

/// Errors that can occur while pairing or diffing leaves.
///
/// A missing node is never an error; it is an absent value.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// Store operation failed for a reason other than "not found".
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Structured content could not be parsed.
    #[error("cannot parse {path} as {format}: {reason}")]
    Parse {
        path: String,
        format: ContentType,
        reason: String,
    },
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
