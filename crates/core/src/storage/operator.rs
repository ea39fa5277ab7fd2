//! Object store backed by Apache OpenDAL.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use opendal::{ErrorKind, Operator, services};
use tracing::{debug, warn};

use super::adapter::{ObjectBody, ObjectHead, ObjectStore, ObjectSummary, PutObject};
use super::config::{StorageConfig, StorageProvider};
use super::error::StorageError;
use crate::space::{META_UPLOADED_AT, parse_metadata_time};

/// Object store over an OpenDAL operator.
pub struct OpendalStore {
    operator: Operator,
    provider: &'static str,
    content_type: bool,
    user_metadata: bool,
}

impl OpendalStore {
    /// Create a store from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        let operator = Self::create_operator(&config.provider)?;
        let capability = operator.info().full_capability();
        let user_metadata = capability.write_with_user_metadata;
        if !user_metadata {
            warn!(
                provider = config.provider.name(),
                "Backend cannot store user metadata, expiry will be derived from upload time"
            );
        }

        Ok(Self {
            operator,
            provider: config.provider.name(),
            content_type: capability.write_with_content_type,
            user_metadata,
        })
    }

    /// Create OpenDAL operator from provider config.
    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        match provider {
            StorageProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => {
                let builder = services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
                    .pipe(Ok)
            }
            StorageProvider::AzureBlob {
                account,
                access_key,
                container,
            } => {
                let builder = services::Azblob::default()
                    .account_name(account)
                    .account_key(access_key)
                    .container(container);

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
                    .pipe(Ok)
            }
            StorageProvider::LocalFs { root } => {
                let builder = services::Fs::default().root(
                    root.to_str()
                        .ok_or_else(|| StorageError::configuration("invalid path"))?,
                );

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
                    .pipe(Ok)
            }
            StorageProvider::Memory => Err(StorageError::configuration(
                "memory provider is served by MemoryObjectStore",
            )),
        }
    }

    /// Size and modification time, from the listing entry when the backend
    /// filled them in, from a stat call otherwise.
    ///
    /// `Ok(None)` means the object has no usable upload time and is left out
    /// of the listing.
    async fn summarize(
        &self,
        key: &str,
        meta: &opendal::Metadata,
    ) -> Result<Option<ObjectSummary>, StorageError> {
        if let Some(last_modified) = meta
            .last_modified()
            .and_then(|t| parse_timestamp(&t.to_string()))
        {
            return Ok(Some(ObjectSummary {
                key: key.to_string(),
                size: meta.content_length(),
                last_modified,
            }));
        }

        let stat = self
            .operator
            .stat(key)
            .await
            .map_err(|e| StorageError::from_opendal(key, &e))?;
        let stat_modified = stat
            .last_modified()
            .and_then(|t| parse_timestamp(&t.to_string()));

        let Some(last_modified) = upload_time(stat_modified, stat.user_metadata()) else {
            warn!(key = %key, "Backend reported no modification time, skipping object");
            return Ok(None);
        };

        Ok(Some(ObjectSummary {
            key: key.to_string(),
            size: stat.content_length(),
            last_modified,
        }))
    }
}

#[async_trait]
impl ObjectStore for OpendalStore {
    async fn put(&self, request: PutObject) -> Result<(), StorageError> {
        let PutObject {
            key,
            data,
            content_type,
            metadata,
        } = request;

        debug!(key = %key, bytes = data.len(), "Writing object");

        let mut write = self.operator.write_with(&key, data);
        if self.content_type {
            write = write.content_type(&content_type);
        }
        if self.user_metadata {
            write = write.user_metadata(metadata);
        }
        write.await.map_err(|e| StorageError::from_opendal(&key, &e))?;

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<ObjectBody, StorageError> {
        let meta = self
            .operator
            .stat(key)
            .await
            .map_err(|e| StorageError::from_opendal(key, &e))?;
        let data = self
            .operator
            .read(key)
            .await
            .map_err(|e| StorageError::from_opendal(key, &e))?
            .to_bytes();

        Ok(ObjectBody {
            data,
            content_type: meta.content_type().map(String::from),
        })
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ObjectSummary>, StorageError> {
        let entries = self
            .operator
            .list_with(prefix)
            .recursive(true)
            .await
            .map_err(|e| StorageError::from_opendal(prefix, &e))?;

        let mut objects = Vec::with_capacity(entries.len());
        for entry in entries {
            if entry.metadata().is_dir() {
                continue;
            }
            match self.summarize(entry.path(), entry.metadata()).await {
                Ok(Some(summary)) => objects.push(summary),
                Ok(None) => {}
                Err(e) if e.is_not_found() => {
                    debug!(key = %entry.path(), "Object vanished while listing");
                }
                Err(e) => {
                    warn!(key = %entry.path(), error = %e, "Skipping unreadable object");
                }
            }
        }

        debug!(prefix = %prefix, count = objects.len(), "Listed objects");
        Ok(objects)
    }

    async fn head(&self, key: &str) -> Result<ObjectHead, StorageError> {
        let meta = self
            .operator
            .stat(key)
            .await
            .map_err(|e| StorageError::from_opendal(key, &e))?;

        Ok(ObjectHead {
            content_type: meta.content_type().map(String::from),
            metadata: meta.user_metadata().cloned().unwrap_or_default(),
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        match self.operator.delete(key).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(key = %key, "Object already gone");
                Ok(())
            }
            Err(e) => Err(StorageError::from_opendal(key, &e)),
        }
    }

    async fn presign_read(&self, key: &str, ttl: Duration) -> Result<String, StorageError> {
        let file_name = key.rsplit('/').next().unwrap_or("download");

        let presigned = self
            .operator
            .presign_read_with(key, ttl)
            .override_content_disposition(&crate::space::content_disposition(file_name))
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::Unsupported => StorageError::PresignNotSupported,
                _ => StorageError::from_opendal(key, &e),
            })?;

        Ok(presigned.uri().to_string())
    }

    fn provider_name(&self) -> &'static str {
        self.provider
    }
}

/// Upload time of a listed object: the store's modification time, else the
/// `uploaded-at` metadata written at upload.
fn upload_time(
    last_modified: Option<DateTime<Utc>>,
    metadata: Option<&HashMap<String, String>>,
) -> Option<DateTime<Utc>> {
    last_modified.or_else(|| {
        metadata
            .and_then(|m| m.get(META_UPLOADED_AT))
            .and_then(|raw| parse_metadata_time(raw))
    })
}

/// OpenDAL hands timestamps back as its own type; go through the text form.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw.trim_end_matches(" UTC"), "%Y-%m-%d %H:%M:%S%.f")
                .ok()
                .map(|t| t.and_utc())
        })
}

/// Extension trait for pipe operator.
trait Pipe: Sized {
    fn pipe<F, R>(self, f: F) -> R
    where
        F: FnOnce(Self) -> R,
    {
        f(self)
    }
}

impl<T> Pipe for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2026-03-01T12:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2026-03-01T12:30:00+00:00"), Some(expected));
        assert_eq!(parse_timestamp("2026-03-01 12:30:00 UTC"), Some(expected));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_upload_time_prefers_store_time() {
        let stored = Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 0).unwrap();
        let metadata = HashMap::from([(
            META_UPLOADED_AT.to_string(),
            "2026-02-01T00:00:00.000Z".to_string(),
        )]);

        assert_eq!(upload_time(Some(stored), Some(&metadata)), Some(stored));
        assert_eq!(
            upload_time(None, Some(&metadata)),
            Some(Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_upload_time_missing_everywhere() {
        let garbled = HashMap::from([(META_UPLOADED_AT.to_string(), "soon".to_string())]);

        assert_eq!(upload_time(None, None), None);
        assert_eq!(upload_time(None, Some(&HashMap::new())), None);
        assert_eq!(upload_time(None, Some(&garbled)), None);
    }

    #[test]
    fn test_memory_provider_rejected() {
        let config = StorageConfig::new(StorageProvider::Memory);
        assert!(matches!(
            OpendalStore::from_config(&config),
            Err(StorageError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_local_fs_roundtrip() {
        let root = std::env::temp_dir().join(format!(
            "driftbox-opendal-{}",
            Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        let config = StorageConfig::new(StorageProvider::local_fs(&root));
        let store = OpendalStore::from_config(&config).expect("fs store");
        assert_eq!(store.provider_name(), "local");

        store
            .put(PutObject {
                key: "spaces/s1/a.txt".to_string(),
                data: bytes::Bytes::from_static(b"hello"),
                content_type: "text/plain".to_string(),
                metadata: std::collections::HashMap::new(),
            })
            .await
            .expect("put");

        let listed = store.list("spaces/s1/").await.expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].key, "spaces/s1/a.txt");
        assert_eq!(listed[0].size, 5);

        let body = store.get("spaces/s1/a.txt").await.expect("get");
        assert_eq!(&body.data[..], b"hello");

        store.delete("spaces/s1/a.txt").await.expect("delete");
        store
            .delete("spaces/s1/a.txt")
            .await
            .expect("second delete is a no-op");
        assert!(store.head("spaces/s1/a.txt").await.unwrap_err().is_not_found());

        let _ = std::fs::remove_dir_all(root);
    }

    fn temp_root(tag: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!(
            "driftbox-{tag}-{}",
            Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ))
    }

    async fn put_text(store: &OpendalStore, key: &str) {
        store
            .put(PutObject {
                key: key.to_string(),
                data: bytes::Bytes::from_static(b"hello"),
                content_type: "text/plain".to_string(),
                metadata: HashMap::new(),
            })
            .await
            .expect("put");
    }

    #[tokio::test]
    async fn test_presign_unsupported_on_fs() {
        let root = temp_root("presign");
        let store =
            OpendalStore::from_config(&StorageConfig::new(StorageProvider::local_fs(&root)))
                .expect("fs store");
        put_text(&store, "spaces/s1/a.txt").await;

        let err = store
            .presign_read("spaces/s1/a.txt", Duration::from_secs(60))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::PresignNotSupported));

        let _ = std::fs::remove_dir_all(root);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_list_skips_entry_that_vanished() {
        let root = temp_root("dangling");
        let store =
            OpendalStore::from_config(&StorageConfig::new(StorageProvider::local_fs(&root)))
                .expect("fs store");
        put_text(&store, "spaces/s1/good.txt").await;
        std::os::unix::fs::symlink(root.join("nowhere"), root.join("spaces/s1/gone.txt"))
            .expect("symlink");

        let listed = store.list("spaces/s1/").await.expect("list");
        let keys: Vec<&str> = listed.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["spaces/s1/good.txt"]);

        let _ = std::fs::remove_dir_all(root);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_space_survives_entry_that_vanished() {
        use crate::clock::SystemClock;
        use crate::space::SpaceService;
        use std::sync::Arc;

        let root = temp_root("dangling-space");
        let config = StorageConfig::new(StorageProvider::local_fs(&root));
        let store = Arc::new(OpendalStore::from_config(&config).expect("fs store"));
        put_text(&store, "spaces/s1/good.txt").await;
        std::os::unix::fs::symlink(root.join("nowhere"), root.join("spaces/s1/gone.txt"))
            .expect("symlink");

        let service = SpaceService::new(store, config, Arc::new(SystemClock));

        let files = service.list_files("s1").await.expect("listing");
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "good.txt");
        assert_eq!(service.get_space_stats("s1").await.total_files, 1);

        let result = service
            .clean_expired_files(Some("s1"))
            .await
            .expect("cleanup");
        assert_eq!(result.deleted_count, 0);
        let global = service.clean_expired_files(None).await.expect("sweep");
        assert_eq!(global.deleted_count, 0);

        let _ = std::fs::remove_dir_all(root);
    }
}
