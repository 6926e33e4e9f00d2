//! Timeline Synchronizer
//!
//! Enforces the duration/position invariants between a caption, its
//! generated audio, and their placements on the parallel text/audio tracks.
//! Given "audio material X now has duration D and path P", every dependent
//! structure is updated so the draft invariants hold:
//!
//! - audio segment target/source durations equal the material duration
//! - the paired caption segment lasts exactly as long as the voice line
//! - `Draft::duration` equals the maximum segment end
//!
//! Placement policies for batch replacement:
//!
//! - `Keep`: audio keeps its original start time
//! - `SyncToCaption`: audio moves to the caption's start (captions are
//!   authoritative for position)
//! - `Append`: the whole batch is repositioned back-to-back in original
//!   start order

use std::path::Path;

use serde_json::Value;
use tracing::{debug, warn};

use crate::document::{AnimationMaterial, AudioMaterial, Draft, Segment, TextMaterial, TrackKind};
use crate::error::{DraftError, DraftResult};
use crate::index::{segment_at, segment_at_mut, ReferenceIndex, SegmentLoc};
use crate::paths;
use crate::types::{MaterialId, SegmentId, TimeRange, TimeUs};

/// Default caption display length when no timing information exists (3s)
const DEFAULT_CAPTION_DURATION: TimeUs = 3_000_000;

/// Duration estimate when no audio has been generated yet (300ms/character)
const ESTIMATE_US_PER_CHAR: TimeUs = 300_000;

// =============================================================================
// Placement Policy
// =============================================================================

/// How replaced segments are positioned on the timeline
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlacementPolicy {
    /// Audio keeps its original start time
    Keep,
    /// Audio start is overwritten with the paired caption's start
    SyncToCaption,
    /// The batch is laid out back-to-back in original start order
    Append,
}

impl PlacementPolicy {
    /// Builds a policy from the external interface's boolean pair,
    /// rejecting the contradictory combination.
    pub fn from_flags(sync_position: bool, append_to_last: bool) -> DraftResult<Self> {
        match (sync_position, append_to_last) {
            (true, true) => Err(DraftError::ConflictingPolicies),
            (true, false) => Ok(Self::SyncToCaption),
            (false, true) => Ok(Self::Append),
            (false, false) => Ok(Self::Keep),
        }
    }
}

// =============================================================================
// Audio Update
// =============================================================================

/// A single "audio material X now has duration D and path P" mutation
#[derive(Clone, Debug)]
pub struct AudioUpdate {
    pub material_id: MaterialId,
    /// New stored path (placeholder form preserved by the caller)
    pub path: String,
    /// New duration in microseconds
    pub duration: TimeUs,
}

/// Locates the audio-track segment for an audio material.
///
/// Direct material-id match first; then the segment's own id, then the
/// caption's `text_to_audio_ids` containment. The two fallbacks cover
/// legacy drafts that keyed the association on segment ids.
fn locate_audio_segment(
    index: &ReferenceIndex,
    audio_id: &MaterialId,
    text_id: Option<&MaterialId>,
) -> Option<SegmentLoc> {
    if let Some(loc) = index.audio_segment_loc(audio_id) {
        return Some(loc);
    }
    if let Some(loc) = index.audio_segment_loc_by_segment_id(&SegmentId::new(audio_id.as_str())) {
        return Some(loc);
    }
    let text_id = text_id?;
    index
        .audio_ids_for_text(text_id)
        .iter()
        .find_map(|related| {
            index.audio_segment_loc_by_segment_id(&SegmentId::new(related.as_str()))
        })
}

/// Applies a single audio update: material metadata, the audio segment's
/// source/target durations, and the paired caption segment's duration.
///
/// Positioning is left untouched; see [`sync_position_to_caption`] and
/// [`append_reposition`]. Orphan audio (no caption link) only updates its
/// own segment.
pub fn apply_audio_update(
    draft: &mut Draft,
    index: &ReferenceIndex,
    update: &AudioUpdate,
) -> DraftResult<()> {
    if update.duration <= 0 {
        return Err(DraftError::InvalidTimeRange {
            start: 0,
            duration: update.duration,
        });
    }

    let material = draft
        .audio_material_mut(&update.material_id)
        .ok_or_else(|| DraftError::DanglingReference {
            kind: "audio material",
            id: update.material_id.clone(),
        })?;
    material.duration = update.duration;
    material.path = update.path.clone();
    material.status = Some(true);
    let text_id = material.linked_text().cloned();

    let audio_loc = locate_audio_segment(index, &update.material_id, text_id.as_ref())
        .ok_or_else(|| DraftError::DanglingReference {
            kind: "audio segment",
            id: update.material_id.clone(),
        })?;
    if let Some(segment) = segment_at_mut(draft, audio_loc) {
        segment.target_timerange.duration = update.duration;
        if let Some(source) = &mut segment.source_timerange {
            source.duration = update.duration;
        }
    }
    debug!(material = %update.material_id, duration_us = update.duration, "audio segment synced");

    if let Some(text_id) = &text_id {
        match index.text_segment_loc(text_id) {
            Some(text_loc) => {
                if let Some(segment) = segment_at_mut(draft, text_loc) {
                    segment.target_timerange.duration = update.duration;
                }
            }
            None => {
                warn!(text = %text_id, audio = %update.material_id,
                      "caption has no segment, skipping duration sync");
            }
        }
    }

    draft.recompute_duration();
    Ok(())
}

/// Moves the audio segment to its paired caption's start time. The caption
/// start is never altered. Orphan audio is a no-op.
pub fn sync_position_to_caption(
    draft: &mut Draft,
    index: &ReferenceIndex,
    audio_id: &MaterialId,
) -> DraftResult<()> {
    let Some(text_id) = index.text_id_for_audio(audio_id) else {
        return Ok(());
    };
    let Some(text_loc) = index.text_segment_loc(text_id) else {
        return Ok(());
    };
    let caption_start = segment_at(draft, text_loc)
        .map(|s| s.target_timerange.start)
        .unwrap_or(0);

    if let Some(audio_loc) = locate_audio_segment(index, audio_id, Some(text_id)) {
        if let Some(segment) = segment_at_mut(draft, audio_loc) {
            segment.target_timerange.start = caption_start;
            debug!(audio = %audio_id, start_us = caption_start, "audio moved to caption start");
        }
    }
    Ok(())
}

/// Repositions a batch of replaced segments back-to-back.
///
/// Segments are stably sorted by their original start (preserving relative
/// order on ties), the cursor starts at the first segment's original start,
/// and each audio segment plus its paired caption is moved to the cursor,
/// which then advances by that item's duration. The result is gap-free
/// regardless of original spacing.
pub fn append_reposition(
    draft: &mut Draft,
    index: &ReferenceIndex,
    items: &[(MaterialId, TimeUs)],
) -> DraftResult<()> {
    let mut ordered: Vec<(SegmentLoc, TimeUs, TimeUs, Option<MaterialId>)> = Vec::new();
    for (audio_id, duration) in items {
        let text_id = index.text_id_for_audio(audio_id).cloned();
        let Some(loc) = locate_audio_segment(index, audio_id, text_id.as_ref()) else {
            warn!(audio = %audio_id, "no audio segment for append repositioning");
            continue;
        };
        let original_start = segment_at(draft, loc)
            .map(|s| s.target_timerange.start)
            .unwrap_or(0);
        ordered.push((loc, original_start, *duration, text_id));
    }

    if ordered.is_empty() {
        return Ok(());
    }
    ordered.sort_by_key(|(_, start, _, _)| *start);

    let mut cursor = ordered[0].1;
    for (loc, _, duration, text_id) in ordered {
        if let Some(segment) = segment_at_mut(draft, loc) {
            segment.target_timerange.start = cursor;
        }
        if let Some(text_id) = &text_id {
            if let Some(text_loc) = index.text_segment_loc(text_id) {
                if let Some(segment) = segment_at_mut(draft, text_loc) {
                    segment.target_timerange.start = cursor;
                }
            }
        }
        cursor += duration;
    }

    draft.recompute_duration();
    Ok(())
}

// =============================================================================
// Caption/Audio Attachment
// =============================================================================

/// Picks the stored-path form for a new audio file: placeholder form when
/// the draft already uses placeholder paths, absolute otherwise.
fn stored_reading_path(draft: &Draft, project_root: &Path, file_name: &str) -> String {
    let token = draft
        .materials
        .audios
        .iter()
        .find_map(|a| paths::placeholder_token(&a.path).map(str::to_string));
    match token {
        Some(token) => paths::reading_dir_stored_path(&token, file_name),
        None => project_root
            .join(paths::TEXT_READING_DIR)
            .join(file_name)
            .to_string_lossy()
            .into_owned(),
    }
}

fn truncated_name(text: &str) -> String {
    let mut name: String = text.chars().take(20).collect();
    if text.chars().count() > 20 {
        name.push_str("...");
    }
    name
}

/// Adds the `extra_material_refs` link from a text segment to its
/// decorative animation placeholder
fn push_material_ref(segment: &mut Segment, animation_id: &MaterialId) {
    let refs = segment
        .extra
        .entry("extra_material_refs".to_string())
        .or_insert_with(|| Value::Array(vec![]));
    if let Some(array) = refs.as_array_mut() {
        array.push(Value::String(animation_id.to_string()));
    }
}

/// Creates audio bookkeeping for every caption that has none yet: an audio
/// material with a `textReading` path and zero duration (filled in at
/// replacement time), the forward/back links, a sticker-animation
/// placeholder, and an audio segment mirroring the caption's timerange.
///
/// Captions without a segment get a default placement first. Returns the
/// number of captions processed.
pub fn attach_audio_to_captions(draft: &mut Draft, project_root: &Path) -> DraftResult<usize> {
    draft.ensure_track(TrackKind::Text);
    draft.ensure_track(TrackKind::Audio);

    let has_audio: std::collections::HashSet<MaterialId> = draft
        .materials
        .audios
        .iter()
        .filter_map(|a| a.linked_text().cloned())
        .collect();

    let pending: Vec<MaterialId> = draft
        .materials
        .texts
        .iter()
        .filter(|t| !has_audio.contains(&t.id))
        .map(|t| t.id.clone())
        .collect();

    let mut attached = 0;
    for text_id in pending {
        let caption_text = draft
            .text_material(&text_id)
            .map(|t| t.caption_text())
            .unwrap_or_default();

        // Place the caption if it has no segment yet
        let text_track = draft.ensure_track(TrackKind::Text);
        if text_track.segment_for_material(&text_id).is_none() {
            text_track.segments.push(Segment::new(
                text_id.clone(),
                TimeRange::new(0, DEFAULT_CAPTION_DURATION),
            ));
        }
        let caption_range = text_track
            .segment_for_material(&text_id)
            .map(|s| s.target_timerange)
            .unwrap_or(TimeRange::new(0, DEFAULT_CAPTION_DURATION));

        let audio_id = MaterialId::generate();
        let file_name = format!("{}.wav", audio_id.as_str().to_lowercase());
        let stored_path = stored_reading_path(draft, project_root, &file_name);

        draft.materials.audios.push(AudioMaterial {
            id: audio_id.clone(),
            path: stored_path,
            // Filled in once TTS generates the file
            duration: 0,
            text_id: Some(text_id.clone()),
            status: None,
            name: Some(truncated_name(&caption_text)),
            kind: Some(AudioMaterial::TEXT_TO_AUDIO.to_string()),
            extra: serde_json::Map::new(),
        });

        let animation = AnimationMaterial::sticker_placeholder();
        let animation_id = animation.id.clone();
        draft.materials.material_animations.push(animation);

        if let Some(text) = draft.text_material_mut(&text_id) {
            text.text_to_audio_ids = Some(vec![audio_id.clone()]);
        }
        if let Some(track) = draft.track_of_kind_mut(&TrackKind::Text) {
            if let Some(segment) = track.segment_for_material_mut(&text_id) {
                push_material_ref(segment, &animation_id);
            }
        }

        let audio_track = draft.ensure_track(TrackKind::Audio);
        audio_track.segments.push(
            Segment::new(audio_id.clone(), caption_range)
                .with_full_source(caption_range.duration),
        );

        attached += 1;
    }

    draft.recompute_duration();
    debug!(count = attached, "captions given audio bookkeeping");
    Ok(attached)
}

// =============================================================================
// Script Import
// =============================================================================

/// One script line to import as a caption/audio pair
#[derive(Clone, Debug)]
pub struct ScriptEntry {
    pub text: String,
    /// Explicit duration; estimated from character count when absent
    pub duration: Option<TimeUs>,
}

/// Estimates a reading duration from the non-whitespace character count
fn estimate_duration(text: &str) -> TimeUs {
    let chars = text
        .chars()
        .filter(|c| !matches!(c, ' ' | '\n' | '\t'))
        .count() as TimeUs;
    chars.max(1) * ESTIMATE_US_PER_CHAR
}

/// Appends script entries to the end of the timeline as caption/audio
/// material+segment pairs, `gap` microseconds apart. Blank entries are
/// skipped. Returns the number of entries imported.
pub fn import_script(
    draft: &mut Draft,
    project_root: &Path,
    entries: &[ScriptEntry],
    gap: TimeUs,
) -> DraftResult<usize> {
    draft.ensure_track(TrackKind::Text);
    draft.ensure_track(TrackKind::Audio);

    let mut cursor = draft.total_duration();
    let mut imported = 0;

    for entry in entries {
        let text = entry.text.trim();
        if text.is_empty() {
            continue;
        }
        let duration = entry.duration.unwrap_or_else(|| estimate_duration(text));
        if duration <= 0 {
            return Err(DraftError::InvalidTimeRange { start: cursor, duration });
        }

        let text_id = MaterialId::generate();
        let audio_id = MaterialId::generate();

        let content = serde_json::json!({
            "text": text,
            "styles": [{
                "size": 6.0,
                "range": [0, text.chars().count()],
            }],
        });
        draft.materials.texts.push(TextMaterial {
            id: text_id.clone(),
            content: serde_json::to_string(&content)?,
            text_to_audio_ids: Some(vec![audio_id.clone()]),
            extra: serde_json::Map::new(),
        });

        let file_name = format!("{}.wav", audio_id.as_str().to_lowercase());
        let stored_path = stored_reading_path(draft, project_root, &file_name);
        draft.materials.audios.push(AudioMaterial {
            id: audio_id.clone(),
            path: stored_path,
            duration,
            text_id: Some(text_id.clone()),
            status: None,
            name: Some(truncated_name(text)),
            kind: Some(AudioMaterial::TEXT_TO_AUDIO.to_string()),
            extra: serde_json::Map::new(),
        });

        let animation = AnimationMaterial::sticker_placeholder();
        let animation_id = animation.id.clone();
        draft.materials.material_animations.push(animation);

        let range = TimeRange::new(cursor, duration);
        let text_track = draft.ensure_track(TrackKind::Text);
        let mut text_segment = Segment::new(text_id, range);
        push_material_ref(&mut text_segment, &animation_id);
        text_track.segments.push(text_segment);

        let audio_track = draft.ensure_track(TrackKind::Audio);
        audio_track
            .segments
            .push(Segment::new(audio_id, range).with_full_source(duration));

        cursor += duration + gap;
        imported += 1;
    }

    draft.recompute_duration();
    debug!(count = imported, "script entries imported");
    Ok(imported)
}

// =============================================================================
// Tests
// =============================================================================
