//! Ephemeral file spaces.
//!
//! This module provides the lifecycle of files uploaded into named spaces:
//! - Key scheme (`spaces/{space_id}/{file_name}`)
//! - Expiry metadata and the fallback for objects without it
//! - Listing and per-space stats
//! - Cleanup of expired files, per space or global
//! - Clearing a whole space
//! - Scheduled cleanup in the background

mod error;
mod expiry;
mod key;
mod naming;
mod service;
mod strategy;
mod sweeper;
mod types;

pub use error::SpaceError;
pub use expiry::{
    DEFAULT_RETENTION, ExpiryPolicy, META_EXPIRES_AT, META_SPACE_ID, META_UPLOADED_AT,
    is_expired, resolve_expiry,
};
pub(crate) use expiry::parse_metadata_time;
pub use key::{
    ObjectLocation, ROOT_PREFIX, UNKNOWN_SPACE, object_key, space_prefix, validate_space_id,
};
pub use naming::{content_disposition, sanitize_file_name, unique_file_name};
pub use service::{MAX_PRESIGN_TTL_SECS, METADATA_CONCURRENCY, SpaceService, download_error_url};
pub use strategy::{FailureStrategy, Settled};
pub use sweeper::{SweeperConfig, SweeperHandle, spawn_sweeper};
pub use types::{CleanupResult, DownloadedFile, PresignedUrl, SpaceStats, StoredFile, UploadFile};
