//! File-type queries used to reject directories before treating a CLI
//! argument as a byte source or sink.
//!
//! Grounded on `jafreck-lz4r/src/util/file_status.rs`, trimmed to the
//! one predicate `casm::io` actually needs — this crate neither walks
//! directory trees nor preserves source-file metadata, so the
//! regular-file/ownership/permission/fd-type queries the teacher carries
//! for its multi-file CLI have no counterpart here.

use std::fs;
use std::path::Path;

/// Returns `true` if `path` refers to a directory.
pub fn is_directory(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.file_type().is_dir()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn is_directory_true_for_directory() {
        let dir = TempDir::new().unwrap();
        assert!(is_directory(dir.path()));
    }

    #[test]
    fn nonexistent_path_is_not_a_directory() {
        let p = Path::new("/nonexistent/__casm_test_path__");
        assert!(!is_directory(p));
    }
}
