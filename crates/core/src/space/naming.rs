//! File name helpers.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Everything except the characters `encodeURIComponent` leaves alone.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Replace every character that is not ASCII alphanumeric, `.`, `_`, `-` or
/// a CJK unified ideograph (U+4E00..=U+9FA5) with `_`.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric()
                || matches!(c, '.' | '_' | '-')
                || ('\u{4E00}'..='\u{9FA5}').contains(&c)
            {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Sanitize `name` and suffix it with `_1`, `_2`, ... before the extension
/// until it collides with nothing in `existing`.
#[must_use]
pub fn unique_file_name<S: AsRef<str>>(name: &str, existing: &[S]) -> String {
    let sanitized = sanitize_file_name(name);
    let taken = |candidate: &str| existing.iter().any(|e| e.as_ref() == candidate);

    if !taken(&sanitized) {
        return sanitized;
    }

    let (stem, extension) = match sanitized.rsplit_once('.') {
        Some((stem, ext)) if !ext.is_empty() => (stem, Some(ext)),
        _ => (sanitized.as_str(), None),
    };

    (1u64..)
        .map(|counter| match extension {
            Some(ext) => format!("{stem}_{counter}.{ext}"),
            None => format!("{stem}_{counter}"),
        })
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| sanitized.clone())
}

/// `Content-Disposition` value forcing a download under `file_name`.
#[must_use]
pub fn content_disposition(file_name: &str) -> String {
    let encoded = utf8_percent_encode(file_name, COMPONENT);
    format!("attachment; filename=\"{encoded}\"; filename*=UTF-8''{encoded}")
}
