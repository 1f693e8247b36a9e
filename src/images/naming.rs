//! Blob path generation.
//!
//! Paths have the form `events/<event_id>/<uuid-v4><extension>`. A v4 UUID
//! carries 122 random bits, so paths are unique without a lookup.

use eventimg_common::{Error, EventId, Result};
use uuid::Uuid;

/// Extension used for every stored blob.
pub const JPEG_EXTENSION: &str = ".jpg";

/// Generate a fresh relative blob path for an event.
///
/// # Errors
///
/// [`Error::Validation`] if `extension` is empty, does not start with `.`, or
/// contains a path separator.
pub fn generate(event_id: EventId, extension: &str) -> Result<String> {
    validate_extension(extension)?;
    Ok(format!(
        "events/{}/{}{}",
        event_id,
        Uuid::new_v4().simple(),
        extension
    ))
}

fn validate_extension(extension: &str) -> Result<()> {
    if extension.is_empty() {
        return Err(Error::validation("file extension cannot be empty"));
    }
    if !extension.starts_with('.') || extension.len() == 1 {
        return Err(Error::validation(format!(
            "file extension must start with '.', got {extension:?}"
        )));
    }
    if extension.contains(['/', '\\']) {
        return Err(Error::validation(format!(
            "file extension cannot contain a path separator: {extension:?}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn event(id: i64) -> EventId {
        EventId::new(id).unwrap()
    }

    #[test]
    fn test_path_layout() {
        let path = generate(event(42), ".jpg").unwrap();
        assert!(path.starts_with("events/42/"), "{path}");
        assert!(path.ends_with(".jpg"), "{path}");

        let token = path
            .strip_prefix("events/42/")
            .and_then(|rest| rest.strip_suffix(".jpg"))
            .unwrap();
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_no_duplicates_for_one_event() {
        let paths: HashSet<String> = (0..10_000)
            .map(|_| generate(event(7), JPEG_EXTENSION).unwrap())
            .collect();
        assert_eq!(paths.len(), 10_000);
    }

    #[test]
    fn test_rejects_bad_extensions() {
        for ext in ["", "jpg", ".", "./x", ".a\\b"] {
            assert!(
                matches!(generate(event(1), ext), Err(Error::Validation(_))),
                "extension {ext:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_non_positive_event_cannot_reach_generate() {
        // EventId is the only way in, and it refuses non-positive keys.
        assert!(matches!(EventId::new(0), Err(Error::Validation(_))));
        assert!(matches!(EventId::new(-3), Err(Error::Validation(_))));
    }
}
