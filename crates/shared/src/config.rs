//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Object storage configuration.
    pub storage: StorageSettings,
    /// Expired file cleanup configuration.
    #[serde(default)]
    pub cleanup: CleanupSettings,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Which object store backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    /// S3-compatible store (Cloudflare R2, AWS S3).
    #[default]
    S3,
    /// Azure Blob Storage.
    Azblob,
    /// Local filesystem, development only.
    Fs,
    /// In-process memory store, nothing survives a restart.
    Memory,
}

/// Object storage settings as read from the environment.
///
/// Credentials are optional here so that a missing value surfaces as a
/// storage configuration error when the store is built, not as an opaque
/// deserialization failure.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Backend kind.
    #[serde(default)]
    pub provider: StorageKind,
    /// Endpoint URL (S3) or account name (Azure).
    pub endpoint: Option<String>,
    /// Bucket or container name.
    pub bucket: Option<String>,
    /// Access key id (S3) or account key (Azure).
    pub access_key_id: Option<String>,
    /// Secret access key (S3 only).
    pub secret_access_key: Option<String>,
    /// Region, `auto` for R2.
    #[serde(default = "default_region")]
    pub region: String,
    /// Root directory for the `fs` provider.
    pub root: Option<String>,
    /// Public domain serving the bucket; download links skip presigning when set.
    pub public_domain: Option<String>,
    /// Maximum upload size in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Lifetime of presigned download links in seconds.
    #[serde(default = "default_download_url_ttl")]
    pub download_url_ttl_secs: u64,
    /// How long an uploaded file lives before it is eligible for cleanup.
    #[serde(default = "default_retention")]
    pub retention_secs: u64,
}

fn default_region() -> String {
    "auto".to_string()
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024 // 10MB
}

fn default_download_url_ttl() -> u64 {
    3600 // 1 hour
}

fn default_retention() -> u64 {
    86_400 // 24 hours
}

/// Scheduled cleanup settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CleanupSettings {
    /// Run the background sweeper.
    #[serde(default = "default_cleanup_enabled")]
    pub enabled: bool,
    /// Seconds between two sweeps.
    #[serde(default = "default_cleanup_interval")]
    pub interval_secs: u64,
    /// Bearer token required by the scheduled cleanup endpoint, if any.
    pub auth_token: Option<String>,
}

impl Default for CleanupSettings {
    fn default() -> Self {
        Self {
            enabled: default_cleanup_enabled(),
            interval_secs: default_cleanup_interval(),
            auth_token: None,
        }
    }
}

fn default_cleanup_enabled() -> bool {
    true
}

fn default_cleanup_interval() -> u64 {
    3600 // 1 hour
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("DRIFTBOX").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_environment() {
        temp_env::with_vars(
            [
                ("DRIFTBOX__STORAGE__PROVIDER", Some("s3")),
                (
                    "DRIFTBOX__STORAGE__ENDPOINT",
                    Some("https://account.r2.cloudflarestorage.com"),
                ),
                ("DRIFTBOX__STORAGE__BUCKET", Some("driftbox")),
                ("DRIFTBOX__STORAGE__ACCESS_KEY_ID", Some("key")),
                ("DRIFTBOX__STORAGE__SECRET_ACCESS_KEY", Some("secret")),
                ("DRIFTBOX__SERVER__PORT", Some("9000")),
                ("DRIFTBOX__CLEANUP__AUTH_TOKEN", Some("cron-token")),
            ],
            || {
                let config = AppConfig::load().expect("config should load");

                assert_eq!(config.server.port, 9000);
                assert_eq!(config.server.host, "0.0.0.0");
                assert_eq!(config.storage.provider, StorageKind::S3);
                assert_eq!(config.storage.bucket.as_deref(), Some("driftbox"));
                assert_eq!(config.storage.region, "auto");
                assert_eq!(config.storage.max_file_size, 10 * 1024 * 1024);
                assert_eq!(config.storage.retention_secs, 86_400);
                assert!(config.storage.public_domain.is_none());
                assert!(config.cleanup.enabled);
                assert_eq!(config.cleanup.interval_secs, 3600);
                assert_eq!(config.cleanup.auth_token.as_deref(), Some("cron-token"));
            },
        );
    }

    #[test]
    fn test_memory_provider_needs_no_credentials() {
        temp_env::with_vars(
            [
                ("DRIFTBOX__STORAGE__PROVIDER", Some("memory")),
                ("DRIFTBOX__CLEANUP__ENABLED", Some("false")),
            ],
            || {
                let config = AppConfig::load().expect("config should load");

                assert_eq!(config.storage.provider, StorageKind::Memory);
                assert!(config.storage.endpoint.is_none());
                assert!(!config.cleanup.enabled);
            },
        );
    }

    #[test]
    fn test_cleanup_defaults() {
        let cleanup = CleanupSettings::default();
        assert!(cleanup.enabled);
        assert_eq!(cleanup.interval_secs, 3600);
        assert!(cleanup.auth_token.is_none());
    }
}
