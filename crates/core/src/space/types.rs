//! Space types and data structures.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One stored object, as seen by a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    /// Storage key.
    pub key: String,
    /// Owning space.
    pub space_id: String,
    /// File name within the space.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// MIME type.
    pub content_type: String,
    /// When the store wrote the object.
    pub uploaded_at: DateTime<Utc>,
    /// When the object becomes eligible for cleanup.
    pub expires_at: DateTime<Utc>,
    /// Public or presigned download link. Empty for internal resolution.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub download_url: String,
}

/// Aggregate view over one space. Recomputed on every call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpaceStats {
    /// Space id.
    pub space_id: String,
    /// Number of files.
    pub total_files: usize,
    /// Sum of file sizes in bytes.
    pub total_size: u64,
    /// Most recent upload, or the time of the call for an empty space.
    pub last_modified: DateTime<Utc>,
}

impl SpaceStats {
    /// Stats of an empty space.
    #[must_use]
    pub fn empty(space_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            space_id: space_id.to_string(),
            total_files: 0,
            total_size: 0,
            last_modified: now,
        }
    }

    /// Aggregate a listing.
    #[must_use]
    pub fn from_files(space_id: &str, files: &[StoredFile], now: DateTime<Utc>) -> Self {
        Self {
            space_id: space_id.to_string(),
            total_files: files.len(),
            total_size: files.iter().map(|f| f.size).sum(),
            last_modified: files.iter().map(|f| f.uploaded_at).max().unwrap_or(now),
        }
    }
}

/// Outcome of one cleanup run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupResult {
    /// Confirmed deletions. Always `deleted_files.len()`.
    pub deleted_count: usize,
    /// Deleted file names, in processing order.
    pub deleted_files: Vec<String>,
    /// Expired objects whose delete failed.
    pub failed_count: usize,
}

impl CleanupResult {
    pub(crate) fn record_deleted(&mut self, name: String) {
        self.deleted_files.push(name);
        self.deleted_count = self.deleted_files.len();
    }
}

/// File handed to [`SpaceService::upload_file`](super::SpaceService::upload_file).
#[derive(Debug, Clone)]
pub struct UploadFile {
    /// Sanitized file name.
    pub name: String,
    /// MIME type, if the client sent one.
    pub content_type: Option<String>,
    /// File contents.
    pub data: Bytes,
}

impl UploadFile {
    /// Create an upload.
    #[must_use]
    pub fn new(name: impl Into<String>, content_type: Option<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content_type,
            data: data.into(),
        }
    }
}

/// Presigned download link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignedUrl {
    /// The presigned URL.
    pub url: String,
    /// When the URL expires.
    pub expires_at: DateTime<Utc>,
}

/// Object contents for proxied downloads.
#[derive(Debug, Clone)]
pub struct DownloadedFile {
    /// File name for `Content-Disposition`.
    pub name: String,
    /// MIME type.
    pub content_type: String,
    /// File contents.
    pub data: Bytes,
}
