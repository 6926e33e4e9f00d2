//! Draft Persistence Gateway
//!
//! Atomic load/save of the draft file with backup-on-write. Each mutation
//! class gets its own backup suffix so a user can recover from different
//! operation types independently. Backups are recovery artifacts, never
//! deleted on success.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::document::Draft;
use crate::error::{DraftError, DraftResult};

/// The draft file name inside a project directory
pub const DRAFT_FILE_NAME: &str = "draft_content.json";

// =============================================================================
// Backup Classes
// =============================================================================

/// Backup suffix per mutation class
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackupKind {
    /// General edits, including batch audio replacement
    General,
    /// Caption-content-only edits
    TextEdit,
    /// Script import (bulk caption creation)
    ScriptImport,
}

impl BackupKind {
    /// Suffix appended to the full draft file name
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::General => ".bak",
            Self::TextEdit => ".textbak",
            Self::ScriptImport => ".scriptbak",
        }
    }

    /// Backup path for a given draft path
    pub fn backup_path(&self, draft_path: &Path) -> PathBuf {
        let mut os = draft_path.as_os_str().to_os_string();
        os.push(self.suffix());
        PathBuf::from(os)
    }
}

// =============================================================================
// Load / Save
// =============================================================================

/// Loads a draft document from disk.
///
/// Unknown keys at any nesting level are retained in the returned model and
/// re-emitted on save.
pub fn load(path: &Path) -> DraftResult<Draft> {
    let raw = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            DraftError::DocumentNotFound(path.display().to_string())
        } else {
            DraftError::IoFailure(e)
        }
    })?;

    let value: serde_json::Value = serde_json::from_str(&raw)
        .map_err(|e| DraftError::MalformedDocument(e.to_string()))?;

    let obj = value
        .as_object()
        .ok_or_else(|| DraftError::MalformedDocument("root is not an object".to_string()))?;
    for key in ["materials", "tracks"] {
        if !obj.contains_key(key) {
            return Err(DraftError::MalformedDocument(format!(
                "missing required key: {key}"
            )));
        }
    }

    serde_json::from_value(value).map_err(|e| DraftError::MalformedDocument(e.to_string()))
}

/// Saves a draft document, backing up the existing file first.
///
/// The write goes through a temporary file in the same directory followed by
/// a rename, so a crash mid-write leaves either the old file or the new one,
/// never a truncated document.
pub fn save(draft: &Draft, path: &Path, backup: BackupKind) -> DraftResult<()> {
    if path.exists() {
        let backup_path = backup.backup_path(path);
        fs::copy(path, &backup_path)?;
        debug!(backup = %backup_path.display(), "draft backed up before write");
    }

    let json = serde_json::to_string_pretty(draft)?;

    let mut tmp_os = path.as_os_str().to_os_string();
    tmp_os.push(".tmp");
    let tmp_path = PathBuf::from(tmp_os);

    fs::write(&tmp_path, json)?;
    fs::rename(&tmp_path, path)?;

    debug!(path = %path.display(), "draft saved");
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const MINIMAL_DRAFT: &str = r#"{
        "fps": 30.0,
        "materials": {
            "texts": [],
            "audios": [],
            "material_animations": [],
            "videos": [{"id": "V1", "path": "clip.mp4"}]
        },
        "tracks": [],
        "duration": 0,
        "canvas_config": {"width": 1080, "height": 1920}
    }"#;

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let result = load(&dir.path().join(DRAFT_FILE_NAME));
        assert!(matches!(result, Err(DraftError::DocumentNotFound(_))));
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(DRAFT_FILE_NAME);
        fs::write(&path, "{ not json").unwrap();

        let result = load(&path);
        assert!(matches!(result, Err(DraftError::MalformedDocument(_))));
    }

    #[test]
    fn test_load_missing_required_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(DRAFT_FILE_NAME);
        fs::write(&path, r#"{"materials": {}}"#).unwrap();

        let result = load(&path);
        assert!(matches!(result, Err(DraftError::MalformedDocument(_))));
    }

    #[test]
    fn test_roundtrip_preserves_unknown_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(DRAFT_FILE_NAME);
        fs::write(&path, MINIMAL_DRAFT).unwrap();

        let draft = load(&path).unwrap();
        save(&draft, &path, BackupKind::General).unwrap();

        let before: serde_json::Value = serde_json::from_str(MINIMAL_DRAFT).unwrap();
        let after: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_save_creates_backup_and_keeps_it() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(DRAFT_FILE_NAME);
        fs::write(&path, MINIMAL_DRAFT).unwrap();

        let draft = load(&path).unwrap();
        save(&draft, &path, BackupKind::General).unwrap();

        let backup = dir.path().join(format!("{DRAFT_FILE_NAME}.bak"));
        assert!(backup.exists());
        let backup_contents = fs::read_to_string(&backup).unwrap();
        assert_eq!(backup_contents, MINIMAL_DRAFT);
    }

    #[test]
    fn test_backup_suffix_per_mutation_class() {
        let path = Path::new("/p/draft_content.json");
        assert_eq!(
            BackupKind::TextEdit.backup_path(path),
            PathBuf::from("/p/draft_content.json.textbak")
        );
        assert_eq!(
            BackupKind::ScriptImport.backup_path(path),
            PathBuf::from("/p/draft_content.json.scriptbak")
        );
    }

    #[test]
    fn test_first_save_without_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(DRAFT_FILE_NAME);

        save(&Draft::default(), &path, BackupKind::General).unwrap();
        assert!(path.exists());
        assert!(!dir.path().join(format!("{DRAFT_FILE_NAME}.bak")).exists());
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(DRAFT_FILE_NAME);
        save(&Draft::default(), &path, BackupKind::General).unwrap();

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
