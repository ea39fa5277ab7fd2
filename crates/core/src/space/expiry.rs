//! Expiry metadata model.
//!
//! Every object written through [`SpaceService`](super::SpaceService) carries
//! its expiry as user metadata. Objects without it (older uploads, backends
//! that drop user metadata) expire one retention window after the store's own
//! modification time, never after the time they happen to be read.

use std::collections::HashMap;

use chrono::{DateTime, Duration, SecondsFormat, Utc};

/// Metadata key holding the upload instant.
pub const META_UPLOADED_AT: &str = "uploaded-at";
/// Metadata key holding the expiry instant.
pub const META_EXPIRES_AT: &str = "expires-at";
/// Metadata key holding the owning space.
pub const META_SPACE_ID: &str = "space-id";

/// Default retention window.
pub const DEFAULT_RETENTION: Duration = Duration::hours(24);

/// Resolve the expiry of an object.
///
/// An explicit expiry always wins; otherwise the object expires one default
/// retention window after it was written.
#[must_use]
pub fn resolve_expiry(
    uploaded_at: DateTime<Utc>,
    explicit: Option<DateTime<Utc>>,
) -> DateTime<Utc> {
    ExpiryPolicy::default().resolve(uploaded_at, explicit)
}

/// Retention policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
    retention: Duration,
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self {
            retention: DEFAULT_RETENTION,
        }
    }
}

impl ExpiryPolicy {
    /// Policy with a custom retention window.
    #[must_use]
    pub fn new(retention: Duration) -> Self {
        Self { retention }
    }

    /// Policy from a retention window in seconds.
    #[must_use]
    pub fn from_secs(secs: u64) -> Self {
        let secs = i64::try_from(secs).unwrap_or(i64::MAX).min(i64::MAX / 1000);
        Self::new(Duration::seconds(secs))
    }

    /// Retention window.
    #[must_use]
    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Expiry assigned to an object written at `uploaded_at`.
    #[must_use]
    pub fn expires_at(&self, uploaded_at: DateTime<Utc>) -> DateTime<Utc> {
        uploaded_at
            .checked_add_signed(self.retention)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Explicit expiry if present, derived one otherwise.
    #[must_use]
    pub fn resolve(
        &self,
        uploaded_at: DateTime<Utc>,
        explicit: Option<DateTime<Utc>>,
    ) -> DateTime<Utc> {
        explicit.unwrap_or_else(|| self.expires_at(uploaded_at))
    }

    /// Resolve the expiry from stored user metadata.
    ///
    /// An unparseable `expires-at` value counts as absent.
    #[must_use]
    pub fn resolve_from_metadata(
        &self,
        uploaded_at: DateTime<Utc>,
        metadata: &HashMap<String, String>,
    ) -> DateTime<Utc> {
        let explicit = metadata
            .get(META_EXPIRES_AT)
            .and_then(|raw| parse_metadata_time(raw));
        self.resolve(uploaded_at, explicit)
    }
}

/// Strict comparison: an object expiring exactly at `now` is still live.
#[must_use]
pub fn is_expired(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    expires_at < now
}

/// Metadata written alongside a new object.
#[must_use]
pub fn upload_metadata(
    space_id: &str,
    uploaded_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
) -> HashMap<String, String> {
    HashMap::from([
        (META_UPLOADED_AT.to_string(), format_metadata_time(uploaded_at)),
        (META_EXPIRES_AT.to_string(), format_metadata_time(expires_at)),
        (META_SPACE_ID.to_string(), space_id.to_string()),
    ])
}

fn format_metadata_time(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn parse_metadata_time(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|t| t.with_timezone(&Utc))
}
