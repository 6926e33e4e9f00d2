//! Audio Replacement Pipeline
//!
//! Batch workflow that swaps generated voice files into a draft: for each
//! replacement item the resolved physical destination is overwritten, the
//! file is additionally mirrored into the canonical `textReading/`
//! subdirectory when the stored path lives elsewhere, and the timeline
//! synchronizer brings segments back in line with the new duration. Item failures are collected, never fatal to siblings; the
//! draft is written back once at the end, behind a `.bak` backup.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::document::{io, io::BackupKind, Draft};
use crate::error::{DraftError, DraftResult};
use crate::index::ReferenceIndex;
use crate::paths;
use crate::sync::{self, AudioUpdate, PlacementPolicy};
use crate::types::{MaterialId, TimeUs};

// =============================================================================
// Batch Input / Output
// =============================================================================

/// One audio file to swap in for a text-to-audio material
#[derive(Clone, Debug)]
pub struct ReplacementItem {
    pub material_id: MaterialId,
    /// Freshly generated file on the local filesystem
    pub new_audio_path: PathBuf,
    /// New duration; measured from the WAV header when absent
    pub duration: Option<TimeUs>,
}

/// Outcome of a single item
#[derive(Clone, Debug)]
pub struct ItemResult {
    pub id: MaterialId,
    pub success: bool,
    pub message: String,
}

/// Aggregated outcome of a batch run
#[derive(Clone, Debug, Default)]
pub struct BatchOutcome {
    pub success_count: usize,
    pub failed_count: usize,
    pub results: Vec<ItemResult>,
}

/// Reads the duration of a WAV file from its header
pub fn wav_duration_us(path: &Path) -> DraftResult<TimeUs> {
    let reader = hound::WavReader::open(path).map_err(|e| DraftError::UnreadableAudio {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let spec = reader.spec();
    let samples = reader.duration() as i64;
    Ok(samples * 1_000_000 / spec.sample_rate as i64)
}

// =============================================================================
// Pipeline
// =============================================================================

/// Batch audio replacement over the draft in a project directory
pub struct ReplacePipeline {
    project_dir: PathBuf,
}

impl ReplacePipeline {
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_dir: project_dir.into(),
        }
    }

    /// Path of the draft document this pipeline operates on
    pub fn draft_path(&self) -> PathBuf {
        self.project_dir.join(io::DRAFT_FILE_NAME)
    }

    /// Runs the batch: load, per-item copy+sync, optional repositioning,
    /// single save.
    ///
    /// Item failures are aggregated in the outcome. Load and save failures
    /// are fatal.
    pub fn run(&self, items: &[ReplacementItem], policy: PlacementPolicy) -> DraftResult<BatchOutcome> {
        let draft_path = self.draft_path();
        let mut draft = io::load(&draft_path)?;
        let index = ReferenceIndex::build(&draft);

        let mut outcome = BatchOutcome::default();
        let mut synced: Vec<(MaterialId, TimeUs)> = Vec::new();

        for item in items {
            match self.apply_item(&mut draft, &index, item, policy) {
                Ok(duration) => {
                    outcome.success_count += 1;
                    synced.push((item.material_id.clone(), duration));
                    outcome.results.push(ItemResult {
                        id: item.material_id.clone(),
                        success: true,
                        message: String::new(),
                    });
                }
                Err(e) => {
                    warn!(material = %item.material_id, error = %e, "replacement item failed");
                    outcome.failed_count += 1;
                    outcome.results.push(ItemResult {
                        id: item.material_id.clone(),
                        success: false,
                        message: e.to_string(),
                    });
                }
            }
        }

        if policy == PlacementPolicy::Append && !synced.is_empty() {
            sync::append_reposition(&mut draft, &index, &synced)?;
        }
        draft.recompute_duration();

        io::save(&draft, &draft_path, BackupKind::General)?;
        info!(
            ok = outcome.success_count,
            failed = outcome.failed_count,
            "replacement batch saved"
        );
        Ok(outcome)
    }

    /// Copies one file into place and synchronizes the timeline for it.
    /// Returns the applied duration.
    fn apply_item(
        &self,
        draft: &mut Draft,
        index: &ReferenceIndex,
        item: &ReplacementItem,
        policy: PlacementPolicy,
    ) -> DraftResult<TimeUs> {
        if !item.new_audio_path.exists() {
            return Err(DraftError::SourceFileMissing(
                item.new_audio_path.display().to_string(),
            ));
        }
        let duration = match item.duration {
            Some(d) => d,
            None => wav_duration_us(&item.new_audio_path)?,
        };

        let stored = draft
            .audio_material(&item.material_id)
            .map(|a| a.path.clone())
            .ok_or_else(|| DraftError::DanglingReference {
                kind: "audio material",
                id: item.material_id.clone(),
            })?;

        // The resolved physical destination is always overwritten
        let resolved = paths::resolve(&stored, &self.project_dir);
        if let Some(parent) = resolved.parent() {
            fs::create_dir_all(parent)?;
        }
        if item.new_audio_path != resolved {
            fs::copy(&item.new_audio_path, &resolved)?;
        }

        let new_stored = if paths::in_reading_dir(&stored) {
            stored
        } else {
            // Also mirror into the canonical subdirectory, under a
            // per-material name so batch items cannot collide on the
            // incoming files' basenames
            let file_name = format!("{}.wav", item.material_id.as_str().to_lowercase());
            let mirror = self
                .project_dir
                .join(paths::TEXT_READING_DIR)
                .join(&file_name);
            if let Some(parent) = mirror.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(&item.new_audio_path, &mirror)?;
            match paths::placeholder_token(&stored) {
                Some(token) => paths::reading_dir_stored_path(token, &file_name),
                // Without a portable marker the stored path keeps pointing
                // at the overwritten physical file
                None => stored,
            }
        };

        let update = AudioUpdate {
            material_id: item.material_id.clone(),
            path: new_stored,
            duration,
        };
        sync::apply_audio_update(draft, index, &update)?;

        if policy == PlacementPolicy::SyncToCaption {
            sync::sync_position_to_caption(draft, index, &item.material_id)?;
        }
        Ok(duration)
    }
}

// =============================================================================
// Audio Overview
// =============================================================================

/// Per-clip summary for the text-to-audio materials in a draft
#[derive(Clone, Debug)]
pub struct AudioClipInfo {
    pub id: MaterialId,
    pub name: Option<String>,
    pub resolved_path: PathBuf,
    pub file_exists: bool,
    pub text_id: Option<MaterialId>,
    pub text_content: Option<String>,
    pub replaced: bool,
}

/// Lists every text-to-audio clip with its resolved path and caption.
///
/// When the resolved path does not exist but the stored path names a file
/// under `textReading/`, the project's own `textReading/` directory is
/// checked as a fallback, covering drafts moved between machines without
/// placeholder markers.
pub fn audio_overview(draft: &Draft, project_dir: &Path) -> Vec<AudioClipInfo> {
    draft
        .materials
        .audios
        .iter()
        .filter(|a| a.is_text_to_audio())
        .map(|audio| {
            let mut resolved = paths::resolve(&audio.path, project_dir);
            if !resolved.exists() {
                if let Some(file_name) = paths::reading_file_name(&audio.path) {
                    let fallback = project_dir.join(paths::TEXT_READING_DIR).join(file_name);
                    if fallback.exists() {
                        resolved = fallback;
                    }
                }
            }
            let text_id = audio.linked_text().cloned();
            let text_content = text_id
                .as_ref()
                .and_then(|id| draft.text_material(id))
                .map(|t| t.caption_text());
            AudioClipInfo {
                id: audio.id.clone(),
                name: audio.name.clone(),
                file_exists: resolved.exists(),
                resolved_path: resolved,
                text_id,
                text_content,
                replaced: audio.replaced(),
            }
        })
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
