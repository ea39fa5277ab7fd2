//! Storage error types.

use thiserror::Error;

/// Object store errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Object not found in storage.
    #[error("object not found: {key}")]
    NotFound {
        /// Storage key that was not found.
        key: String,
    },

    /// Presign operation not supported by provider.
    #[error("presign operation not supported by storage provider")]
    PresignNotSupported,

    /// Storage provider configuration error.
    #[error("storage configuration error: {0}")]
    Configuration(String),

    /// Backend operation error.
    #[error("storage operation failed: {0}")]
    Operation(String),
}

impl StorageError {
    /// Create a not found error.
    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an operation error.
    #[must_use]
    pub fn operation(msg: impl Into<String>) -> Self {
        Self::Operation(msg.into())
    }

    /// Whether the object was simply absent.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Attach the key to an OpenDAL error.
    ///
    /// `Unsupported` stays an operation error here; only the presign call
    /// site knows it means presigning is unavailable.
    pub(crate) fn from_opendal(key: &str, err: &opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::NotFound => Self::not_found(key),
            _ => Self::Operation(format!("{key}: {err}")),
        }
    }
}

impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::NotFound => Self::NotFound {
                key: err.to_string(),
            },
            _ => Self::Operation(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_detection() {
        assert!(StorageError::not_found("spaces/a/b.txt").is_not_found());
        assert!(!StorageError::operation("boom").is_not_found());
        assert!(!StorageError::PresignNotSupported.is_not_found());
    }

    #[test]
    fn test_opendal_error_mapping() {
        let err = opendal::Error::new(opendal::ErrorKind::NotFound, "gone");
        assert!(matches!(
            StorageError::from_opendal("spaces/a/b.txt", &err),
            StorageError::NotFound { key } if key == "spaces/a/b.txt"
        ));

        let err = opendal::Error::new(opendal::ErrorKind::Unsupported, "no listing");
        assert!(matches!(
            StorageError::from_opendal("spaces/a/", &err),
            StorageError::Operation(msg) if msg.contains("spaces/a/")
        ));
        let err = opendal::Error::new(opendal::ErrorKind::Unsupported, "no stat");
        assert!(matches!(StorageError::from(err), StorageError::Operation(_)));

        let err = opendal::Error::new(opendal::ErrorKind::PermissionDenied, "denied");
        assert!(matches!(
            StorageError::from_opendal("k", &err),
            StorageError::Operation(_)
        ));
    }
}
