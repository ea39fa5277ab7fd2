//! Storage key scheme.
//!
//! ```text
//! spaces/{space_id}/{file_name}
//! ```

use super::error::SpaceError;

/// Prefix every space lives under.
pub const ROOT_PREFIX: &str = "spaces/";

/// Space id reported for keys that carry none.
pub const UNKNOWN_SPACE: &str = "unknown";

/// Check that a space id can be embedded in a key.
///
/// # Errors
///
/// Returns [`SpaceError::InvalidSpaceId`] for empty ids, ids containing a
/// path separator, and the `.`/`..` segments.
pub fn validate_space_id(space_id: &str) -> Result<(), SpaceError> {
    if space_id.is_empty() || space_id.contains('/') || space_id == "." || space_id == ".." {
        return Err(SpaceError::InvalidSpaceId(space_id.to_string()));
    }
    Ok(())
}

/// Prefix of every object in `space_id`, trailing slash included.
#[must_use]
pub fn space_prefix(space_id: &str) -> String {
    format!("{ROOT_PREFIX}{space_id}/")
}

/// Key for `file_name` in `space_id`.
///
/// The file name is expected to be sanitized already.
#[must_use]
pub fn object_key(space_id: &str, file_name: &str) -> String {
    format!("{ROOT_PREFIX}{space_id}/{file_name}")
}

/// Space and file name recovered from a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLocation {
    /// Space id, or [`UNKNOWN_SPACE`].
    pub space_id: String,
    /// File name.
    pub file_name: String,
}

impl ObjectLocation {
    /// Decode a storage key.
    ///
    /// Keys outside the scheme still decode: the space becomes
    /// [`UNKNOWN_SPACE`] and the file name is the last path segment.
    #[must_use]
    pub fn parse(key: &str) -> Self {
        if let Some(rest) = key.strip_prefix(ROOT_PREFIX)
            && let Some((space_id, file_name)) = rest.split_once('/')
            && !space_id.is_empty()
            && !file_name.is_empty()
        {
            return Self {
                space_id: space_id.to_string(),
                file_name: file_name.to_string(),
            };
        }

        Self {
            space_id: UNKNOWN_SPACE.to_string(),
            file_name: key.rsplit('/').next().unwrap_or(key).to_string(),
        }
    }
}

/// Whether `key` is safe to hand to a single-object delete.
#[must_use]
pub fn is_managed_key(key: &str) -> bool {
    key.strip_prefix(ROOT_PREFIX)
        .and_then(|rest| rest.split_once('/'))
        .is_some_and(|(space_id, file_name)| {
            validate_space_id(space_id).is_ok()
                && !file_name.is_empty()
                && !file_name.split('/').any(|segment| segment == "..")
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("s1", true)]
    #[case("team-notes_2026", true)]
    #[case("", false)]
    #[case("a/b", false)]
    #[case(".", false)]
    #[case("..", false)]
    fn test_validate_space_id(#[case] space_id: &str, #[case] valid: bool) {
        assert_eq!(validate_space_id(space_id).is_ok(), valid);
    }

    #[test]
    fn test_object_key() {
        assert_eq!(object_key("s1", "a.txt"), "spaces/s1/a.txt");
        assert_eq!(space_prefix("s1"), "spaces/s1/");
    }

    #[rstest]
    #[case("spaces/s1/a.txt", "s1", "a.txt")]
    #[case("spaces/s1/nested/a.txt", "s1", "nested/a.txt")]
    #[case("spaces/lonely", "unknown", "lonely")]
    #[case("spaces//a.txt", "unknown", "a.txt")]
    #[case("elsewhere/b.bin", "unknown", "b.bin")]
    fn test_parse_location(#[case] key: &str, #[case] space_id: &str, #[case] file_name: &str) {
        let location = ObjectLocation::parse(key);
        assert_eq!(location.space_id, space_id);
        assert_eq!(location.file_name, file_name);
    }

    #[rstest]
    #[case("spaces/s1/a.txt", true)]
    #[case("spaces/s1/", false)]
    #[case("spaces/../a.txt", false)]
    #[case("spaces/s1/../../etc", false)]
    #[case("other/s1/a.txt", false)]
    fn test_is_managed_key(#[case] key: &str, #[case] managed: bool) {
        assert_eq!(is_managed_key(key), managed);
    }

    proptest! {
        #[test]
        fn prop_key_roundtrip(
            space_id in "[A-Za-z0-9_-]{1,24}",
            file_name in "[A-Za-z0-9._-]{1,40}",
        ) {
            let key = object_key(&space_id, &file_name);
            let location = ObjectLocation::parse(&key);
            prop_assert_eq!(location.space_id, space_id);
            prop_assert_eq!(location.file_name, file_name);
            prop_assert!(key.starts_with(ROOT_PREFIX));
        }
    }
}
