//! Safety utilities to prevent writing or deleting outside the export tree.
//!
//! Document identifiers become file names, and stale-file cleanup deletes
//! files in the output directory, so both are validated before use.

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

/// A single path component: no separators, no control characters, no leading dot.
static DOCUMENT_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^./\\\x00-\x1f][^/\\\x00-\x1f]*$").unwrap());

/// Whether a document identifier can be used verbatim as `<id>.json`.
///
/// Only file naming depends on this; records with other identifiers are
/// still loaded and exported everywhere else.
pub fn is_safe_document_id(id: &str) -> bool {
    DOCUMENT_ID.is_match(id) && !id.contains("..")
}

/// Validates that the output directory is safe to write into and prune.
///
/// Checks:
/// - Output cannot be the source database itself
/// - Output cannot be a filesystem root
/// - Output cannot be an existing regular file
pub fn validate_output_dir(output: &Path, source: &Path) -> Result<()> {
    if output == source {
        bail!(
            "Safety check failed: output '{}' cannot be the same as source '{}'",
            output.display(),
            source.display()
        );
    }

    if output.parent().is_none() {
        bail!(
            "Safety check failed: output '{}' is a filesystem root",
            output.display()
        );
    }

    if output.is_file() {
        bail!(
            "Safety check failed: output '{}' is a file, expected a directory",
            output.display()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_safe_document_ids() {
        assert!(is_safe_document_id("aB3xYz09"));
        assert!(is_safe_document_id("concert_2019-07-04"));
        assert!(is_safe_document_id("v1.2"));
        assert!(is_safe_document_id("show 12"));
        assert!(is_safe_document_id("Café"));
    }

    #[test]
    fn test_unsafe_document_ids() {
        assert!(!is_safe_document_id(""));
        assert!(!is_safe_document_id("../etc"));
        assert!(!is_safe_document_id("a/b"));
        assert!(!is_safe_document_id(".hidden"));
        assert!(!is_safe_document_id("a..b"));
        assert!(!is_safe_document_id("a\\b"));
        assert!(!is_safe_document_id("line\nbreak"));
    }

    #[test]
    fn test_valid_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("website").join("data");
        let source = dir.path().join("concerts.sqlite3");
        assert!(validate_output_dir(&output, &source).is_ok());
    }

    #[test]
    fn test_output_equals_source() {
        let path = PathBuf::from("/data/concerts.sqlite3");
        let result = validate_output_dir(&path, &path);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("cannot be the same as source"));
    }

    #[test]
    fn test_output_root_blocked() {
        let result = validate_output_dir(Path::new("/"), Path::new("/data/concerts.sqlite3"));
        assert!(result.unwrap_err().to_string().contains("filesystem root"));
    }

    #[test]
    fn test_output_file_blocked() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let result = validate_output_dir(file.path(), Path::new("/data/concerts.sqlite3"));
        assert!(result.is_err());
    }
}
