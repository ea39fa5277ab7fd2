//! Capability interface over an external blob store.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use super::error::StorageError;

/// Content type used when the uploader did not supply one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// One entry of a prefix listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    /// Storage key.
    pub key: String,
    /// Size in bytes.
    pub size: u64,
    /// When the store last wrote the object.
    pub last_modified: DateTime<Utc>,
}

/// Result of a metadata fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectHead {
    /// Stored content type, if the store kept one.
    pub content_type: Option<String>,
    /// User-defined metadata written alongside the object.
    pub metadata: HashMap<String, String>,
}

/// A fully read object.
#[derive(Debug, Clone)]
pub struct ObjectBody {
    /// Object bytes.
    pub data: Bytes,
    /// Stored content type.
    pub content_type: Option<String>,
}

/// Write request for [`ObjectStore::put`].
#[derive(Debug, Clone)]
pub struct PutObject {
    /// Storage key.
    pub key: String,
    /// Object bytes.
    pub data: Bytes,
    /// Content type.
    pub content_type: String,
    /// User-defined metadata.
    pub metadata: HashMap<String, String>,
}

/// Object store capabilities consumed by the lifecycle manager.
///
/// Implementations must be thread-safe; fan-out issues several calls at once.
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// Write an object, replacing whatever was stored under the same key.
    async fn put(&self, request: PutObject) -> Result<(), StorageError>;

    /// Read a whole object.
    async fn get(&self, key: &str) -> Result<ObjectBody, StorageError>;

    /// Enumerate every object whose key starts with `prefix`.
    ///
    /// No ordering is guaranteed. Objects that vanish or cannot be described
    /// while the listing is assembled are left out; only a failure to
    /// enumerate the prefix is an error.
    async fn list(&self, prefix: &str) -> Result<Vec<ObjectSummary>, StorageError>;

    /// Fetch content type and user metadata.
    ///
    /// Returns [`StorageError::NotFound`] when the key vanished.
    async fn head(&self, key: &str) -> Result<ObjectHead, StorageError>;

    /// Delete an object. Deleting an absent key succeeds.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Generate a time-limited read URL.
    async fn presign_read(&self, key: &str, ttl: Duration) -> Result<String, StorageError>;

    /// Short provider name for logs.
    fn provider_name(&self) -> &'static str;
}
