//! Object store adapter built on Apache OpenDAL.
//!
//! This module provides vendor-agnostic object storage with support for:
//! - S3-compatible: Cloudflare R2, AWS S3, DigitalOcean Spaces
//! - Azure Blob Storage
//! - Local filesystem (development only)
//! - Process memory (development and tests)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    ObjectStore (trait)                           │
//! ├────────────────────────────────┬────────────────────────────────┤
//! │ OpendalStore                   │ MemoryObjectStore              │
//! │ op.write_with / op.stat        │ DashMap + Clock                │
//! │ op.list_with / op.delete       │ fault injection                │
//! │ op.presign_read_with           │                                │
//! └────────────────────────────────┴────────────────────────────────┘
//! ```

mod adapter;
mod config;
mod error;
mod memory;
mod operator;

use std::sync::Arc;

pub use adapter::{
    DEFAULT_CONTENT_TYPE, ObjectBody, ObjectHead, ObjectStore, ObjectSummary, PutObject,
};
pub use config::{StorageConfig, StorageProvider};
pub use error::StorageError;
pub use memory::MemoryObjectStore;
pub use operator::OpendalStore;

use crate::clock::Clock;

/// Build the object store selected by `config`.
///
/// # Errors
///
/// Returns [`StorageError::Configuration`] if the backend cannot be
/// initialized.
pub fn create_store(
    config: &StorageConfig,
    clock: Arc<dyn Clock>,
) -> Result<Arc<dyn ObjectStore>, StorageError> {
    let store: Arc<dyn ObjectStore> = match config.provider {
        StorageProvider::Memory => Arc::new(MemoryObjectStore::new(clock)),
        _ => Arc::new(OpendalStore::from_config(config)?),
    };

    tracing::info!(provider = store.provider_name(), "Object store ready");
    Ok(store)
}
