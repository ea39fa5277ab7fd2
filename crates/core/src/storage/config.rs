//! Storage configuration types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use driftbox_shared::{StorageKind, StorageSettings};

use super::error::StorageError;

/// Storage provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageProvider {
    /// S3-compatible storage: Cloudflare R2, AWS S3, DigitalOcean Spaces
    S3 {
        /// S3 endpoint URL.
        endpoint: String,
        /// S3 bucket name.
        bucket: String,
        /// Access key ID.
        access_key_id: String,
        /// Secret access key.
        secret_access_key: String,
        /// Region (`auto` for R2).
        region: String,
    },
    /// Azure Blob Storage
    AzureBlob {
        /// Azure storage account name.
        account: String,
        /// Azure storage access key.
        access_key: String,
        /// Azure container name.
        container: String,
    },
    /// Local filesystem (development only)
    LocalFs {
        /// Root directory path.
        root: PathBuf,
    },
    /// Process memory (development and tests)
    Memory,
}

impl StorageProvider {
    /// Create S3-compatible provider (Cloudflare R2, AWS S3).
    #[must_use]
    pub fn s3(
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self::S3 {
            endpoint: endpoint.into(),
            bucket: bucket.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            region: region.into(),
        }
    }

    /// Create Azure Blob Storage provider.
    #[must_use]
    pub fn azure_blob(
        account: impl Into<String>,
        access_key: impl Into<String>,
        container: impl Into<String>,
    ) -> Self {
        Self::AzureBlob {
            account: account.into(),
            access_key: access_key.into(),
            container: container.into(),
        }
    }

    /// Create local filesystem provider (development only).
    #[must_use]
    pub fn local_fs(root: impl Into<PathBuf>) -> Self {
        Self::LocalFs { root: root.into() }
    }

    /// Get the provider name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::S3 { .. } => "s3",
            Self::AzureBlob { .. } => "azure_blob",
            Self::LocalFs { .. } => "local",
            Self::Memory => "memory",
        }
    }

    /// Get the bucket/container name.
    #[must_use]
    pub fn bucket(&self) -> &str {
        match self {
            Self::S3 { bucket, .. } => bucket,
            Self::AzureBlob { container, .. } => container,
            Self::LocalFs { root } => root.to_str().unwrap_or("local"),
            Self::Memory => "memory",
        }
    }

    /// Build a provider from environment settings.
    ///
    /// Missing endpoint, bucket or credentials are fatal: the service must
    /// not start against a half-configured store.
    pub fn from_settings(settings: &StorageSettings) -> Result<Self, StorageError> {
        fn required<'a>(value: Option<&'a String>, name: &str) -> Result<&'a str, StorageError> {
            value
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| StorageError::configuration(format!("missing storage {name}")))
        }

        match settings.provider {
            StorageKind::S3 => Ok(Self::s3(
                required(settings.endpoint.as_ref(), "endpoint")?,
                required(settings.bucket.as_ref(), "bucket")?,
                required(settings.access_key_id.as_ref(), "access_key_id")?,
                required(settings.secret_access_key.as_ref(), "secret_access_key")?,
                settings.region.clone(),
            )),
            StorageKind::Azblob => Ok(Self::azure_blob(
                required(settings.endpoint.as_ref(), "endpoint")?,
                required(settings.access_key_id.as_ref(), "access_key_id")?,
                required(settings.bucket.as_ref(), "bucket")?,
            )),
            StorageKind::Fs => Ok(Self::local_fs(required(settings.root.as_ref(), "root")?)),
            StorageKind::Memory => Ok(Self::Memory),
        }
    }
}

/// Storage service configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Storage provider configuration.
    pub provider: StorageProvider,
    /// Domain serving the bucket publicly. Download links are built from it
    /// instead of being presigned.
    pub public_domain: Option<String>,
    /// Maximum file size in bytes.
    pub max_file_size: u64,
    /// Presigned download URL TTL in seconds (default: 3600 = 1 hour).
    pub presign_download_ttl_secs: u64,
    /// Retention window in seconds (default: 86400 = 24 hours).
    pub retention_secs: u64,
    /// Allowed MIME types for upload.
    pub allowed_mime_types: Vec<String>,
}

impl StorageConfig {
    /// Default max file size: 10MB.
    pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;
    /// Default download TTL: 1 hour.
    pub const DEFAULT_DOWNLOAD_TTL: u64 = 3600;
    /// Default retention: 24 hours.
    pub const DEFAULT_RETENTION: u64 = 86_400;

    /// Create a new storage config with default settings.
    #[must_use]
    pub fn new(provider: StorageProvider) -> Self {
        Self {
            provider,
            public_domain: None,
            max_file_size: Self::DEFAULT_MAX_FILE_SIZE,
            presign_download_ttl_secs: Self::DEFAULT_DOWNLOAD_TTL,
            retention_secs: Self::DEFAULT_RETENTION,
            allowed_mime_types: Self::default_mime_types(),
        }
    }

    /// Build the full config from environment settings.
    pub fn from_settings(settings: &StorageSettings) -> Result<Self, StorageError> {
        let provider = StorageProvider::from_settings(settings)?;
        let mut config = Self::new(provider)
            .with_max_file_size(settings.max_file_size)
            .with_download_ttl(settings.download_url_ttl_secs)
            .with_retention(settings.retention_secs);

        if let Some(domain) = settings
            .public_domain
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
        {
            config = config.with_public_domain(domain);
        }

        Ok(config)
    }

    /// Set maximum file size.
    #[must_use]
    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }

    /// Set presigned download URL TTL.
    #[must_use]
    pub fn with_download_ttl(mut self, secs: u64) -> Self {
        self.presign_download_ttl_secs = secs;
        self
    }

    /// Set the retention window.
    #[must_use]
    pub fn with_retention(mut self, secs: u64) -> Self {
        self.retention_secs = secs;
        self
    }

    /// Serve downloads from a public domain instead of presigned links.
    #[must_use]
    pub fn with_public_domain(mut self, domain: impl Into<String>) -> Self {
        self.public_domain = Some(domain.into());
        self
    }

    /// Set allowed MIME types.
    #[must_use]
    pub fn with_allowed_mime_types(mut self, types: Vec<String>) -> Self {
        self.allowed_mime_types = types;
        self
    }

    /// Default allowed MIME types for uploads.
    #[must_use]
    pub fn default_mime_types() -> Vec<String> {
        [
            // Images
            "image/jpeg",
            "image/png",
            "image/gif",
            "image/webp",
            // Documents
            "application/pdf",
            "text/plain",
            "text/csv",
            "application/msword",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            "application/vnd.ms-excel",
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            "application/vnd.ms-powerpoint",
            "application/vnd.openxmlformats-officedocument.presentationml.presentation",
            // Archives
            "application/zip",
            "application/x-rar-compressed",
            "application/x-7z-compressed",
            // Media
            "video/mp4",
            "video/avi",
            "video/mov",
            "audio/mp3",
            "audio/wav",
            "audio/flac",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }

    /// Check if a MIME type is allowed.
    ///
    /// An empty type means the client did not say; it is stored as opaque
    /// binary and accepted.
    #[must_use]
    pub fn is_mime_type_allowed(&self, mime_type: &str) -> bool {
        mime_type.is_empty() || self.allowed_mime_types.iter().any(|t| t == mime_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(provider: StorageKind) -> StorageSettings {
        StorageSettings {
            provider,
            endpoint: Some("https://account.r2.cloudflarestorage.com".to_string()),
            bucket: Some("driftbox".to_string()),
            access_key_id: Some("access_key".to_string()),
            secret_access_key: Some("secret_key".to_string()),
            region: "auto".to_string(),
            root: None,
            public_domain: None,
            max_file_size: StorageConfig::DEFAULT_MAX_FILE_SIZE,
            download_url_ttl_secs: StorageConfig::DEFAULT_DOWNLOAD_TTL,
            retention_secs: StorageConfig::DEFAULT_RETENTION,
        }
    }

    #[test]
    fn test_storage_provider_s3() {
        let provider = StorageProvider::s3(
            "https://account.r2.cloudflarestorage.com",
            "driftbox",
            "access_key",
            "secret_key",
            "auto",
        );
        assert_eq!(provider.name(), "s3");
        assert_eq!(provider.bucket(), "driftbox");
    }

    #[test]
    fn test_storage_provider_local() {
        let provider = StorageProvider::local_fs("./storage");
        assert_eq!(provider.name(), "local");
        assert_eq!(StorageProvider::Memory.name(), "memory");
    }

    #[test]
    fn test_from_settings_s3() {
        let config = StorageConfig::from_settings(&settings(StorageKind::S3))
            .expect("complete settings should be accepted");
        assert_eq!(config.provider.name(), "s3");
        assert_eq!(config.provider.bucket(), "driftbox");
        assert_eq!(config.retention_secs, 86_400);
        assert!(config.public_domain.is_none());
    }

    #[test]
    fn test_from_settings_missing_credentials_is_fatal() {
        let mut incomplete = settings(StorageKind::S3);
        incomplete.secret_access_key = None;
        let err = StorageConfig::from_settings(&incomplete).unwrap_err();
        assert!(matches!(err, StorageError::Configuration(msg) if msg.contains("secret_access_key")));

        let mut blank = settings(StorageKind::S3);
        blank.endpoint = Some("   ".to_string());
        assert!(matches!(
            StorageConfig::from_settings(&blank),
            Err(StorageError::Configuration(_))
        ));
    }

    #[test]
    fn test_from_settings_public_domain() {
        let mut with_domain = settings(StorageKind::S3);
        with_domain.public_domain = Some("files.example.com".to_string());
        let config = StorageConfig::from_settings(&with_domain).expect("valid settings");
        assert_eq!(config.public_domain.as_deref(), Some("files.example.com"));
    }

    #[test]
    fn test_from_settings_fs_requires_root() {
        let mut fs = settings(StorageKind::Fs);
        assert!(StorageConfig::from_settings(&fs).is_err());

        fs.root = Some("./data".to_string());
        let config = StorageConfig::from_settings(&fs).expect("root provided");
        assert_eq!(config.provider.name(), "local");
    }

    #[test]
    fn test_storage_config_defaults() {
        let config = StorageConfig::new(StorageProvider::Memory);
        assert_eq!(config.max_file_size, StorageConfig::DEFAULT_MAX_FILE_SIZE);
        assert_eq!(
            config.presign_download_ttl_secs,
            StorageConfig::DEFAULT_DOWNLOAD_TTL
        );
        assert_eq!(config.retention_secs, StorageConfig::DEFAULT_RETENTION);
        assert!(!config.allowed_mime_types.is_empty());
    }

    #[test]
    fn test_mime_type_validation() {
        let config = StorageConfig::new(StorageProvider::Memory);
        assert!(config.is_mime_type_allowed("application/pdf"));
        assert!(config.is_mime_type_allowed("text/plain"));
        assert!(config.is_mime_type_allowed(""));
        assert!(!config.is_mime_type_allowed("application/x-executable"));
        assert!(!config.is_mime_type_allowed("text/html"));
    }
}
