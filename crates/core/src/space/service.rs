//! Space lifecycle service.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use super::error::SpaceError;
use super::expiry::{ExpiryPolicy, is_expired, upload_metadata};
use super::key::{
    ObjectLocation, ROOT_PREFIX, is_managed_key, object_key, space_prefix, validate_space_id,
};
use super::strategy::{FailureStrategy, Settled};
use super::types::{
    CleanupResult, DownloadedFile, PresignedUrl, SpaceStats, StoredFile, UploadFile,
};
use crate::clock::Clock;
use crate::storage::{
    DEFAULT_CONTENT_TYPE, ObjectHead, ObjectStore, ObjectSummary, PutObject, StorageConfig,
    StorageError,
};

/// Metadata fetches kept in flight at once while resolving a listing.
pub const METADATA_CONCURRENCY: usize = 16;

/// Longest TTL a presigned link may carry (7 days, the S3 limit).
pub const MAX_PRESIGN_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Placeholder handed out when a download link cannot be generated.
#[must_use]
pub fn download_error_url(key: &str) -> String {
    format!("#download-error-{key}")
}

/// Ephemeral file lifecycle over an [`ObjectStore`].
///
/// Holds no state of its own: the store is the system of record. Every
/// operation reads the store fresh, so listings and stats always reflect
/// what is stored at call time.
pub struct SpaceService {
    store: Arc<dyn ObjectStore>,
    config: StorageConfig,
    clock: Arc<dyn Clock>,
    expiry: ExpiryPolicy,
}

impl SpaceService {
    /// Create a new space service.
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>, config: StorageConfig, clock: Arc<dyn Clock>) -> Self {
        let expiry = ExpiryPolicy::from_secs(config.retention_secs);
        Self {
            store,
            config,
            clock,
            expiry,
        }
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Get the storage provider name.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.store.provider_name()
    }

    /// Store a file in a space.
    ///
    /// The object carries its upload time, expiry and space as user
    /// metadata. A file with the same name in the same space is replaced.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The space id or file name cannot form a key
    /// - File size exceeds limit
    /// - MIME type is not allowed
    /// - The store rejects the write
    pub async fn upload_file(
        &self,
        space_id: &str,
        file: UploadFile,
    ) -> Result<StoredFile, SpaceError> {
        validate_space_id(space_id)?;
        if matches!(file.name.as_str(), "" | "." | "..") || file.name.contains('/') {
            return Err(SpaceError::InvalidKey(file.name));
        }

        let size = file.data.len() as u64;
        if size > self.config.max_file_size {
            return Err(SpaceError::file_too_large(size, self.config.max_file_size));
        }

        let content_type = file
            .content_type
            .map(|t| t.trim().to_string())
            .unwrap_or_default();
        if !self.config.is_mime_type_allowed(&content_type) {
            return Err(SpaceError::InvalidMimeType(content_type));
        }
        let content_type = if content_type.is_empty() {
            DEFAULT_CONTENT_TYPE.to_string()
        } else {
            content_type
        };

        let key = object_key(space_id, &file.name);
        let uploaded_at = self.clock.now();
        let expires_at = self.expiry.expires_at(uploaded_at);

        self.store
            .put(PutObject {
                key: key.clone(),
                data: file.data,
                content_type: content_type.clone(),
                metadata: upload_metadata(space_id, uploaded_at, expires_at),
            })
            .await
            .map_err(|source| SpaceError::StoreWrite {
                key: key.clone(),
                source,
            })?;

        info!(
            space_id = %space_id,
            key = %key,
            size,
            expires_at = %expires_at,
            "File uploaded"
        );

        let download_url = self.download_url(&key).await;
        Ok(StoredFile {
            key,
            space_id: space_id.to_string(),
            name: file.name,
            size,
            content_type,
            uploaded_at,
            expires_at,
            download_url,
        })
    }

    /// List the files of a space, most recent first.
    ///
    /// Best effort: files whose metadata cannot be fetched are left out.
    ///
    /// # Errors
    ///
    /// Returns an error if the space id is invalid or the store cannot
    /// enumerate the space.
    pub async fn list_files(&self, space_id: &str) -> Result<Vec<StoredFile>, SpaceError> {
        let mut files = self.resolve_space(space_id).await?;

        let urls = join_all(files.iter().map(|f| self.download_url(&f.key))).await;
        for (file, url) in files.iter_mut().zip(urls) {
            file.download_url = url;
        }

        Ok(files)
    }

    /// Files of a space together with stats computed from the same listing.
    ///
    /// # Errors
    ///
    /// Returns an error if the space id is invalid or the space cannot be
    /// listed.
    pub async fn list_files_with_stats(
        &self,
        space_id: &str,
    ) -> Result<(Vec<StoredFile>, SpaceStats), SpaceError> {
        let files = self.list_files(space_id).await?;
        let stats = SpaceStats::from_files(space_id, &files, self.clock.now());
        Ok((files, stats))
    }

    /// Aggregate stats of a space.
    ///
    /// Never fails: any error yields empty stats stamped with the current
    /// time.
    pub async fn get_space_stats(&self, space_id: &str) -> SpaceStats {
        let now = self.clock.now();
        match self.resolve_space(space_id).await {
            Ok(files) => SpaceStats::from_files(space_id, &files, now),
            Err(e) => {
                warn!(space_id = %space_id, error = %e, "Space stats unavailable, reporting empty");
                SpaceStats::empty(space_id, now)
            }
        }
    }

    /// Delete one file. Deleting a missing file succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is outside the managed key space or the
    /// store fails the delete.
    pub async fn delete_file(&self, key: &str) -> Result<(), SpaceError> {
        if !is_managed_key(key) {
            return Err(SpaceError::InvalidKey(key.to_string()));
        }

        self.store
            .delete(key)
            .await
            .map_err(|source| SpaceError::Delete {
                key: key.to_string(),
                source,
            })?;

        info!(key = %key, "File deleted");
        Ok(())
    }

    /// Delete every file of a space.
    ///
    /// Deletes run concurrently and all of them settle before returning.
    /// Deletes that succeeded stay done even when others fail.
    ///
    /// # Errors
    ///
    /// Returns [`SpaceError::AggregateDelete`] if any delete failed, or a
    /// listing error if the space cannot be enumerated.
    pub async fn clear_space(&self, space_id: &str) -> Result<usize, SpaceError> {
        validate_space_id(space_id)?;
        let prefix = space_prefix(space_id);
        let objects = self.list_objects(&prefix).await?;
        let attempted = objects.len();

        let results = join_all(objects.into_iter().map(|object| async move {
            self.store
                .delete(&object.key)
                .await
                .map(|()| object.key.clone())
                .map_err(|err| (object.key, err))
        }))
        .await;

        match FailureStrategy::AllOrNothing.settle(results, |(key, err)| {
            warn!(space_id = %space_id, key = %key, error = %err, "Failed to delete file while clearing space");
        }) {
            Settled::Complete(deleted) => {
                info!(space_id = %space_id, deleted = deleted.len(), "Space cleared");
                Ok(deleted.len())
            }
            Settled::Failed { failed, .. } => Err(SpaceError::AggregateDelete {
                failed: failed.into_iter().map(|(key, _)| key).collect(),
                attempted,
            }),
        }
    }

    /// Delete expired files of one space, or of every space when `space_id`
    /// is `None`.
    ///
    /// Best effort per object: a failed delete is logged and skipped. Running
    /// it twice in a row deletes nothing the second time.
    ///
    /// # Errors
    ///
    /// Returns an error only if the candidates cannot be enumerated.
    pub async fn clean_expired_files(
        &self,
        space_id: Option<&str>,
    ) -> Result<CleanupResult, SpaceError> {
        let candidates = match space_id {
            Some(space_id) => self.resolve_space(space_id).await?,
            None => self.resolve_objects(ROOT_PREFIX).await?,
        };

        let now = self.clock.now();
        let mut result = CleanupResult::default();
        let mut outcomes = Vec::new();

        for file in candidates.into_iter().filter(|f| is_expired(f.expires_at, now)) {
            let outcome = match self.store.delete(&file.key).await {
                Ok(()) => Ok(file),
                Err(err) => Err((file, err)),
            };
            outcomes.push(outcome);
        }

        let deleted = match FailureStrategy::BestEffort.settle(outcomes, |(file, err)| {
            result.failed_count += 1;
            warn!(
                space_id = %file.space_id,
                key = %file.key,
                error = %err,
                "Failed to delete expired file"
            );
        }) {
            Settled::Complete(deleted) | Settled::Failed { succeeded: deleted, .. } => deleted,
        };

        for file in deleted {
            debug!(space_id = %file.space_id, key = %file.key, "Expired file deleted");
            result.record_deleted(file.name);
        }

        info!(
            space_id = space_id.unwrap_or("*"),
            deleted = result.deleted_count,
            failed = result.failed_count,
            "Cleanup finished"
        );
        Ok(result)
    }

    /// Generate a presigned download URL.
    ///
    /// `ttl_secs` defaults to the configured download TTL and is clamped to
    /// `1..=MAX_PRESIGN_TTL_SECS`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is outside the managed key space or the
    /// store cannot presign.
    pub async fn generate_presigned_download_url(
        &self,
        key: &str,
        ttl_secs: Option<u64>,
    ) -> Result<PresignedUrl, SpaceError> {
        if !is_managed_key(key) {
            return Err(SpaceError::InvalidKey(key.to_string()));
        }

        let ttl_secs = ttl_secs
            .unwrap_or(self.config.presign_download_ttl_secs)
            .clamp(1, MAX_PRESIGN_TTL_SECS);
        let url = self
            .store
            .presign_read(key, Duration::from_secs(ttl_secs))
            .await
            .map_err(|source| SpaceError::Presign {
                key: key.to_string(),
                source,
            })?;

        Ok(PresignedUrl {
            url,
            expires_at: add_secs(self.clock.now(), ttl_secs),
        })
    }

    /// Read a whole file for proxying.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is outside the managed key space or the
    /// object cannot be read.
    pub async fn download_file(&self, key: &str) -> Result<DownloadedFile, SpaceError> {
        if !is_managed_key(key) {
            return Err(SpaceError::InvalidKey(key.to_string()));
        }

        let body = self.store.get(key).await.map_err(|source| {
            if source.is_not_found() {
                SpaceError::NotFound(key.to_string())
            } else {
                SpaceError::Read {
                    key: key.to_string(),
                    source,
                }
            }
        })?;

        Ok(DownloadedFile {
            name: ObjectLocation::parse(key).file_name,
            content_type: body
                .content_type
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            data: body.data,
        })
    }

    /// Files of one space without download links, most recent first.
    async fn resolve_space(&self, space_id: &str) -> Result<Vec<StoredFile>, SpaceError> {
        validate_space_id(space_id)?;
        let mut files = self.resolve_objects(&space_prefix(space_id)).await?;
        files.sort_by(|a, b| {
            b.uploaded_at
                .cmp(&a.uploaded_at)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(files)
    }

    /// List `prefix` and fetch metadata for every object, at most
    /// [`METADATA_CONCURRENCY`] at a time.
    ///
    /// Objects whose metadata fetch fails are dropped. Order follows the
    /// store's listing.
    async fn resolve_objects(&self, prefix: &str) -> Result<Vec<StoredFile>, SpaceError> {
        let objects = self.list_objects(prefix).await?;
        let lookups: Vec<_> = objects.iter().map(|o| self.store.head(&o.key)).collect();
        let heads: Vec<_> = stream::iter(lookups)
            .buffered(METADATA_CONCURRENCY)
            .collect()
            .await;

        let resolved = objects
            .into_iter()
            .zip(heads)
            .map(|(summary, head)| match head {
                Ok(head) => Ok(self.stored_file(summary, head)),
                Err(err) => Err((summary.key, err)),
            });

        match FailureStrategy::BestEffort.settle(resolved, |(key, err)| {
            log_skipped(key, err);
        }) {
            Settled::Complete(files) | Settled::Failed { succeeded: files, .. } => Ok(files),
        }
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectSummary>, SpaceError> {
        self.store
            .list(prefix)
            .await
            .map_err(|source| SpaceError::Listing {
                prefix: prefix.to_string(),
                source,
            })
    }

    fn stored_file(&self, summary: ObjectSummary, head: ObjectHead) -> StoredFile {
        let location = ObjectLocation::parse(&summary.key);
        let expires_at = self
            .expiry
            .resolve_from_metadata(summary.last_modified, &head.metadata);

        StoredFile {
            key: summary.key,
            space_id: location.space_id,
            name: location.file_name,
            size: summary.size,
            content_type: head
                .content_type
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            uploaded_at: summary.last_modified,
            expires_at,
            download_url: String::new(),
        }
    }

    /// Public link when a public domain is configured, presigned link
    /// otherwise. Presign failures yield the placeholder URL.
    async fn download_url(&self, key: &str) -> String {
        if let Some(domain) = &self.config.public_domain {
            return format!("https://{}/{key}", domain.trim_end_matches('/'));
        }

        let ttl = Duration::from_secs(self.config.presign_download_ttl_secs);
        match self.store.presign_read(key, ttl).await {
            Ok(url) => url,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to presign download URL");
                download_error_url(key)
            }
        }
    }
}

fn log_skipped(key: &str, err: &StorageError) {
    if err.is_not_found() {
        debug!(key = %key, "Object vanished before its metadata was read");
    } else {
        warn!(key = %key, error = %err, "Skipping object with unreadable metadata");
    }
}

fn add_secs(t: DateTime<Utc>, secs: u64) -> DateTime<Utc> {
    i64::try_from(secs)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .and_then(|d| t.checked_add_signed(d))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
