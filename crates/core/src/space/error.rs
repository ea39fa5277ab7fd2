//! Space operation errors.

use driftbox_shared::AppError;
use thiserror::Error;

use crate::storage::StorageError;

/// Space operation errors.
#[derive(Debug, Error)]
pub enum SpaceError {
    /// Space id cannot be embedded in a storage key.
    #[error("invalid space id: {0:?}")]
    InvalidSpaceId(String),

    /// Key outside the managed key space.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    /// File too large.
    #[error("file too large: {size} bytes exceeds maximum {max} bytes")]
    FileTooLarge {
        /// Actual file size.
        size: u64,
        /// Maximum allowed size.
        max: u64,
    },

    /// Invalid MIME type.
    #[error("invalid MIME type: {0}")]
    InvalidMimeType(String),

    /// Upload could not be written.
    #[error("failed to store {key}: {source}")]
    StoreWrite {
        /// Target key.
        key: String,
        /// Underlying failure.
        #[source]
        source: StorageError,
    },

    /// Objects could not be enumerated.
    #[error("failed to list {prefix}: {source}")]
    Listing {
        /// Listed prefix.
        prefix: String,
        /// Underlying failure.
        #[source]
        source: StorageError,
    },

    /// Object could not be read.
    #[error("failed to read {key}: {source}")]
    Read {
        /// Object key.
        key: String,
        /// Underlying failure.
        #[source]
        source: StorageError,
    },

    /// Single object delete failed.
    #[error("failed to delete {key}: {source}")]
    Delete {
        /// Object key.
        key: String,
        /// Underlying failure.
        #[source]
        source: StorageError,
    },

    /// One or more deletes of an all-or-nothing batch failed.
    #[error("{} of {attempted} deletes failed", failed.len())]
    AggregateDelete {
        /// Keys whose delete failed.
        failed: Vec<String>,
        /// Deletes issued.
        attempted: usize,
    },

    /// Presigned URL could not be generated.
    #[error("failed to presign {key}: {source}")]
    Presign {
        /// Object key.
        key: String,
        /// Underlying failure.
        #[source]
        source: StorageError,
    },

    /// Object does not exist.
    #[error("file not found: {0}")]
    NotFound(String),
}

impl SpaceError {
    /// Create a file too large error.
    #[must_use]
    pub fn file_too_large(size: u64, max: u64) -> Self {
        Self::FileTooLarge { size, max }
    }
}

impl From<SpaceError> for AppError {
    fn from(err: SpaceError) -> Self {
        let message = err.to_string();
        match err {
            SpaceError::InvalidSpaceId(_) | SpaceError::InvalidKey(_) => Self::Validation(message),
            SpaceError::FileTooLarge { .. } => Self::PayloadTooLarge(message),
            SpaceError::InvalidMimeType(_) => Self::UnsupportedMediaType(message),
            SpaceError::NotFound(_) => Self::NotFound(message),
            SpaceError::Read { source, .. } | SpaceError::Presign { source, .. }
                if source.is_not_found() =>
            {
                Self::NotFound(message)
            }
            SpaceError::AggregateDelete { .. } => Self::Internal(message),
            SpaceError::StoreWrite { .. }
            | SpaceError::Listing { .. }
            | SpaceError::Read { .. }
            | SpaceError::Delete { .. }
            | SpaceError::Presign { .. } => Self::Storage(message),
        }
    }
}
