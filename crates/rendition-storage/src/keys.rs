//! Shared key and upload-parameter checks for storage backends.

use crate::{StorageError, StorageResult};
use std::ops::RangeInclusive;

/// Reject empty keys and empty content types before any backend work.
pub(crate) fn validate_upload_params(
    key: &str,
    content_type: &str,
    size_range: &RangeInclusive<u64>,
) -> StorageResult<()> {
    validate_key(key)?;
    if content_type.is_empty() {
        return Err(StorageError::InvalidInput(
            "Content type must not be empty".to_string(),
        ));
    }
    if size_range.is_empty() {
        return Err(StorageError::InvalidInput(format!(
            "Invalid size range {}..={}",
            size_range.start(),
            size_range.end()
        )));
    }
    Ok(())
}

pub(crate) fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::InvalidInput(
            "Storage key must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Percent-encode each `/`-separated segment of a key for use in a URL path.
#[cfg_attr(not(feature = "storage-local"), allow(dead_code))]
pub(crate) fn encode_key_path(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_inputs_are_rejected() {
        assert!(validate_upload_params("", "image/png", &(1..=10)).is_err());
        assert!(validate_upload_params("a.png", "", &(1..=10)).is_err());
        #[allow(clippy::reversed_empty_ranges)]
        let empty = 10..=1;
        assert!(validate_upload_params("a.png", "image/png", &empty).is_err());
        assert!(validate_upload_params("a.png", "image/png", &(1..=10)).is_ok());
    }

    #[test]
    fn encodes_segments_but_keeps_separators() {
        assert_eq!(encode_key_path("720p/my cat.webp"), "720p/my%20cat.webp");
    }
}
