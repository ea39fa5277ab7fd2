//! In-memory object store.
//!
//! Non-persistent store on a `DashMap`. Timestamps come from an injected
//! [`Clock`], and individual operations can be made to fail, which makes it
//! the test double for everything above the adapter. It also backs the
//! `memory` provider for local runs without credentials.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use dashmap::{DashMap, DashSet};

use super::adapter::{ObjectBody, ObjectHead, ObjectStore, ObjectSummary, PutObject};
use super::error::StorageError;
use crate::clock::{Clock, SystemClock};

/// Entry stored in the memory backend.
#[derive(Debug, Clone)]
struct MemoryObject {
    data: Bytes,
    content_type: Option<String>,
    metadata: HashMap<String, String>,
    last_modified: DateTime<Utc>,
}

/// Injected failures.
#[derive(Debug, Default)]
struct Faults {
    list: AtomicBool,
    put: AtomicBool,
    presign: AtomicBool,
    head: DashSet<String>,
    delete: DashSet<String>,
}

/// In-memory object store.
pub struct MemoryObjectStore {
    objects: DashMap<String, MemoryObject>,
    clock: Arc<dyn Clock>,
    faults: Faults,
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl MemoryObjectStore {
    /// Creates an empty store stamping writes with `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            objects: DashMap::new(),
            clock,
            faults: Faults::default(),
        }
    }

    /// Returns the number of objects in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns true if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Whether an object is stored under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.objects.contains_key(key)
    }

    /// Store an object bypassing the write path, e.g. one written before
    /// expiry metadata existed.
    pub fn insert_raw(
        &self,
        key: impl Into<String>,
        data: impl Into<Bytes>,
        content_type: Option<&str>,
        metadata: HashMap<String, String>,
        last_modified: DateTime<Utc>,
    ) {
        self.objects.insert(
            key.into(),
            MemoryObject {
                data: data.into(),
                content_type: content_type.map(String::from),
                metadata,
                last_modified,
            },
        );
    }

    /// Make every `list` call fail.
    pub fn fail_list(&self, fail: bool) {
        self.faults.list.store(fail, Ordering::SeqCst);
    }

    /// Make every `put` call fail.
    pub fn fail_puts(&self, fail: bool) {
        self.faults.put.store(fail, Ordering::SeqCst);
    }

    /// Make every `presign_read` call fail.
    pub fn fail_presign(&self, fail: bool) {
        self.faults.presign.store(fail, Ordering::SeqCst);
    }

    /// Make `head` fail for one key.
    pub fn fail_head_for(&self, key: impl Into<String>) {
        self.faults.head.insert(key.into());
    }

    /// Make `delete` fail for one key.
    pub fn fail_delete_for(&self, key: impl Into<String>) {
        self.faults.delete.insert(key.into());
    }

    /// Remove all injected failures.
    pub fn clear_faults(&self) {
        self.fail_list(false);
        self.fail_puts(false);
        self.fail_presign(false);
        self.faults.head.clear();
        self.faults.delete.clear();
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, request: PutObject) -> Result<(), StorageError> {
        if self.faults.put.load(Ordering::SeqCst) {
            return Err(StorageError::operation(format!(
                "injected put failure: {}",
                request.key
            )));
        }

        self.objects.insert(
            request.key,
            MemoryObject {
                data: request.data,
                content_type: Some(request.content_type),
                metadata: request.metadata,
                last_modified: self.clock.now(),
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<ObjectBody, StorageError> {
        self.objects
            .get(key)
            .map(|entry| ObjectBody {
                data: entry.data.clone(),
                content_type: entry.content_type.clone(),
            })
            .ok_or_else(|| StorageError::not_found(key))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<ObjectSummary>, StorageError> {
        if self.faults.list.load(Ordering::SeqCst) {
            return Err(StorageError::operation(format!(
                "injected list failure: {prefix}"
            )));
        }

        let mut objects: Vec<ObjectSummary> = self
            .objects
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| ObjectSummary {
                key: entry.key().clone(),
                size: entry.data.len() as u64,
                last_modified: entry.last_modified,
            })
            .collect();

        // Sort by key for consistent ordering
        objects.sort_by(|a, b| a.key.cmp(&b.key));

        Ok(objects)
    }

    async fn head(&self, key: &str) -> Result<ObjectHead, StorageError> {
        if self.faults.head.contains(key) {
            return Err(StorageError::operation(format!(
                "injected head failure: {key}"
            )));
        }

        self.objects
            .get(key)
            .map(|entry| ObjectHead {
                content_type: entry.content_type.clone(),
                metadata: entry.metadata.clone(),
            })
            .ok_or_else(|| StorageError::not_found(key))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        if self.faults.delete.contains(key) {
            return Err(StorageError::operation(format!(
                "injected delete failure: {key}"
            )));
        }

        self.objects.remove(key);
        Ok(())
    }

    async fn presign_read(&self, key: &str, ttl: Duration) -> Result<String, StorageError> {
        if self.faults.presign.load(Ordering::SeqCst) {
            return Err(StorageError::operation(format!(
                "injected presign failure: {key}"
            )));
        }

        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| StorageError::operation(format!("invalid presign ttl: {e}")))?;
        let expires = self.clock.now() + ttl;

        Ok(format!("memory://{key}?expires={}", expires.timestamp()))
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}
