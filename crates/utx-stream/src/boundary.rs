//! Message boundary detection by trial parse.
//!
//! The feed sends one JSON object per notification with no length prefix or
//! delimiter. A buffer is considered complete when it decodes as exactly one
//! well-formed top-level object. Every decode failure reads as "not enough
//! bytes yet", so corrupt input is never reported here; it simply never
//! completes. A well-formed object of the wrong shape is reported complete and
//! fails later in the extractor.

use serde::de::IgnoredAny;

/// Returns `true` if `buf` holds one complete top-level JSON object.
///
/// Leading and trailing whitespace is accepted. Anything after the object
/// (including a second object) makes the buffer incomplete.
pub fn is_complete(buf: &[u8]) -> bool {
    match buf.iter().copied().find(|b| !b.is_ascii_whitespace()) {
        Some(b'{') => serde_json::from_slice::<IgnoredAny>(buf).is_ok(),
        _ => false,
    }
}
