//! Placeholder Path Resolution
//!
//! Stored audio paths may embed a portable project-root marker of the form
//! `##_draftpath_placeholder_<token>_##`. The marker is substituted with the
//! live project directory for filesystem access, but re-emitted in
//! placeholder form when the stored string is rewritten, so drafts stay
//! portable across machines.

use std::path::{Path, PathBuf};

/// Marker prefix embedded in stored paths
pub const PLACEHOLDER_PREFIX: &str = "##_draftpath_placeholder_";
/// Marker suffix embedded in stored paths
pub const PLACEHOLDER_SUFFIX: &str = "_##";
/// Canonical audio-storage subdirectory inside a project
pub const TEXT_READING_DIR: &str = "textReading";

/// Extracts the placeholder token from a stored path, if it carries one
pub fn placeholder_token(stored: &str) -> Option<&str> {
    let after = stored.split(PLACEHOLDER_PREFIX).nth(1)?;
    after.split(PLACEHOLDER_SUFFIX).next()
}

/// Resolves a stored path against the live project directory.
///
/// Paths without a marker are returned verbatim.
pub fn resolve(stored: &str, project_root: &Path) -> PathBuf {
    match placeholder_token(stored) {
        Some(token) => {
            let marker = format!("{PLACEHOLDER_PREFIX}{token}{PLACEHOLDER_SUFFIX}");
            PathBuf::from(stored.replace(&marker, &project_root.to_string_lossy()))
        }
        None => PathBuf::from(stored),
    }
}

/// Builds a placeholder-form stored path pointing into the canonical
/// audio-storage subdirectory
pub fn reading_dir_stored_path(token: &str, file_name: &str) -> String {
    format!("{PLACEHOLDER_PREFIX}{token}{PLACEHOLDER_SUFFIX}/{TEXT_READING_DIR}/{file_name}")
}

/// True when a stored path already lives in the canonical subdirectory
pub fn in_reading_dir(stored: &str) -> bool {
    stored.contains(TEXT_READING_DIR)
}

/// Extracts the trailing file name from a stored path under the canonical
/// subdirectory. Handles both separator conventions, since drafts written
/// on Windows store backslashes.
pub fn reading_file_name(stored: &str) -> Option<&str> {
    let fwd = format!("{TEXT_READING_DIR}/");
    let back = format!("{TEXT_READING_DIR}\\");
    if let Some(name) = stored.split(&fwd).nth(1) {
        return Some(name);
    }
    stored.split(&back).nth(1)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const STORED: &str = "##_draftpath_placeholder_ABC_##/textReading/x.wav";

    #[test]
    fn test_token_extraction() {
        assert_eq!(placeholder_token(STORED), Some("ABC"));
        assert_eq!(placeholder_token("/abs/path/x.wav"), None);
    }

    #[test]
    fn test_resolve_substitutes_project_root() {
        let resolved = resolve(STORED, Path::new("/proj"));
        assert_eq!(resolved, PathBuf::from("/proj/textReading/x.wav"));
    }

    #[test]
    fn test_resolve_passthrough_without_marker() {
        let resolved = resolve("/abs/path/x.wav", Path::new("/proj"));
        assert_eq!(resolved, PathBuf::from("/abs/path/x.wav"));
    }

    #[test]
    fn test_stored_path_reemitted_in_placeholder_form() {
        let stored = reading_dir_stored_path("ABC", "y.wav");
        assert_eq!(stored, "##_draftpath_placeholder_ABC_##/textReading/y.wav");
        assert_eq!(placeholder_token(&stored), Some("ABC"));
    }

    #[test]
    fn test_reading_file_name_both_separators() {
        assert_eq!(reading_file_name(STORED), Some("x.wav"));
        assert_eq!(
            reading_file_name(r"C:\drafts\p\textReading\y.wav"),
            Some("y.wav")
        );
        assert_eq!(reading_file_name("/elsewhere/x.wav"), None);
    }
}
