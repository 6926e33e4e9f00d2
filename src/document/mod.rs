//! Draft Document Model
//!
//! Typed in-memory representation of a draft project file: materials grouped
//! by kind, ordered tracks of segments, and the total timeline duration.
//!
//! Every struct carries a flattened `extra` map so that fields the engine
//! does not model survive a load/save cycle unchanged. The draft file is
//! written by an external editor that adds keys freely; dropping any of them
//! would corrupt the project.

pub mod io;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{DraftError, DraftResult};
use crate::types::{MaterialId, SegmentId, TimeRange, TimeUs, TrackId};

// =============================================================================
// Materials
// =============================================================================

/// Text caption material. `content` is itself a JSON-encoded sub-document
/// holding the caption string and style ranges.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextMaterial {
    pub id: MaterialId,
    #[serde(default)]
    pub content: String,
    /// Forward link to the audio material(s) voicing this caption
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_to_audio_ids: Option<Vec<MaterialId>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TextMaterial {
    /// Extracts the caption string from the content sub-document.
    /// Returns an empty string when the content is missing or unparsable.
    pub fn caption_text(&self) -> String {
        serde_json::from_str::<Value>(&self.content)
            .ok()
            .and_then(|v| v.get("text").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_default()
    }

    /// Replaces the caption string inside the content sub-document,
    /// preserving every other key. Style ranges covering the old text are
    /// extended/shrunk to the new character count.
    pub fn set_caption_text(&mut self, text: &str) -> DraftResult<()> {
        let mut content: Map<String, Value> = if self.content.is_empty() {
            Map::new()
        } else {
            serde_json::from_str(&self.content)
                .map_err(|e| DraftError::MalformedDocument(format!("text content: {e}")))?
        };

        content.insert("text".to_string(), Value::String(text.to_string()));

        let char_count = text.chars().count() as i64;
        if let Some(styles) = content.get_mut("styles").and_then(Value::as_array_mut) {
            for style in styles {
                if let Some(range) = style.get_mut("range").and_then(Value::as_array_mut) {
                    if range.len() >= 2 {
                        range[1] = Value::from(char_count);
                    }
                }
            }
        }

        self.content = serde_json::to_string(&Value::Object(content))?;
        Ok(())
    }

    /// Returns the first linked audio material id, if any
    pub fn first_audio_id(&self) -> Option<&MaterialId> {
        self.text_to_audio_ids
            .as_ref()
            .and_then(|ids| ids.first())
            .filter(|id| !id.is_empty())
    }
}

/// Generated voice-over material backing a caption
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AudioMaterial {
    pub id: MaterialId,
    /// Stored path: either absolute, or carrying a project-root placeholder
    /// token (see [`crate::paths`])
    #[serde(default)]
    pub path: String,
    /// Duration in microseconds
    #[serde(default)]
    pub duration: TimeUs,
    /// Back-link to the caption this audio voices. Legacy drafts store an
    /// empty string instead of omitting the key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_id: Option<MaterialId>,
    /// True once the audio has been regenerated since creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AudioMaterial {
    /// The kind tag the editor writes for TTS-generated audio
    pub const TEXT_TO_AUDIO: &'static str = "text_to_audio";

    /// Returns the owning caption id, treating an empty string as absent
    pub fn linked_text(&self) -> Option<&MaterialId> {
        self.text_id.as_ref().filter(|id| !id.is_empty())
    }

    /// True if this material was generated from a caption
    pub fn is_text_to_audio(&self) -> bool {
        self.kind.as_deref() == Some(Self::TEXT_TO_AUDIO)
    }

    /// True if this audio has been regenerated since creation
    pub fn replaced(&self) -> bool {
        self.status.unwrap_or(false)
    }
}

/// Decorative overlay material referenced by text segments. Opaque to the
/// engine; kept only for schema completeness.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimationMaterial {
    pub id: MaterialId,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AnimationMaterial {
    /// Creates the placeholder sticker-animation record the editor expects
    /// alongside a generated caption
    pub fn sticker_placeholder() -> Self {
        let mut extra = Map::new();
        extra.insert("animations".to_string(), Value::Array(vec![]));
        extra.insert(
            "multi_language_current".to_string(),
            Value::String("none".to_string()),
        );
        extra.insert(
            "type".to_string(),
            Value::String("sticker_animation".to_string()),
        );
        Self {
            id: MaterialId::generate(),
            extra,
        }
    }
}

/// Material library, grouped by kind. The on-disk key for animations is
/// `material_animations`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Materials {
    #[serde(default)]
    pub texts: Vec<TextMaterial>,
    #[serde(default)]
    pub audios: Vec<AudioMaterial>,
    #[serde(default)]
    pub material_animations: Vec<AnimationMaterial>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// =============================================================================
// Tracks and Segments
// =============================================================================

/// Track kind tag. Kinds the engine does not interpret (video, effect, ...)
/// pass through untouched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackKind {
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "audio")]
    Audio,
    #[serde(untagged)]
    Other(String),
}

/// A placement of one material on a track
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: SegmentId,
    pub material_id: MaterialId,
    pub target_timerange: TimeRange,
    /// In/out points within the physical audio file (audio segments only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_timerange: Option<TimeRange>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Segment {
    /// Creates a segment placing `material_id` at `range`, with a fresh id
    pub fn new(material_id: MaterialId, range: TimeRange) -> Self {
        Self {
            id: SegmentId::generate(),
            material_id,
            target_timerange: range,
            source_timerange: None,
            extra: Map::new(),
        }
    }

    /// Adds source in/out points spanning the whole file duration
    pub fn with_full_source(mut self, duration: TimeUs) -> Self {
        self.source_timerange = Some(TimeRange::new(0, duration));
        self
    }
}

/// An ordered, kind-tagged list of segments
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    #[serde(rename = "type")]
    pub kind: TrackKind,
    #[serde(default)]
    pub segments: Vec<Segment>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Track {
    /// Creates an empty track in the shape the editor writes
    pub fn new(kind: TrackKind) -> Self {
        let mut extra = Map::new();
        extra.insert("attribute".to_string(), Value::from(0));
        extra.insert("flag".to_string(), Value::from(0));
        extra.insert("is_default_name".to_string(), Value::Bool(true));
        extra.insert("name".to_string(), Value::String(String::new()));
        Self {
            id: TrackId::generate(),
            kind,
            segments: Vec::new(),
            extra,
        }
    }

    /// Finds the first segment referencing `material_id`
    pub fn segment_for_material(&self, material_id: &MaterialId) -> Option<&Segment> {
        self.segments.iter().find(|s| &s.material_id == material_id)
    }

    /// Mutable variant of [`Self::segment_for_material`]
    pub fn segment_for_material_mut(&mut self, material_id: &MaterialId) -> Option<&mut Segment> {
        self.segments
            .iter_mut()
            .find(|s| &s.material_id == material_id)
    }
}

// =============================================================================
// Draft
// =============================================================================

/// Root draft document
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    #[serde(default)]
    pub materials: Materials,
    #[serde(default)]
    pub tracks: Vec<Track>,
    /// Total timeline length in microseconds; must equal the maximum
    /// segment end across all tracks
    #[serde(default)]
    pub duration: TimeUs,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Draft {
    /// Returns all tracks of the given kind, in document order
    pub fn tracks_of_kind(&self, kind: &TrackKind) -> Vec<&Track> {
        self.tracks.iter().filter(|t| &t.kind == kind).collect()
    }

    /// Returns the first track of the given kind, mutably
    pub fn track_of_kind_mut(&mut self, kind: &TrackKind) -> Option<&mut Track> {
        self.tracks.iter_mut().find(|t| &t.kind == kind)
    }

    /// Returns the first track of the given kind, creating an empty one
    /// when the draft has none
    pub fn ensure_track(&mut self, kind: TrackKind) -> &mut Track {
        let pos = match self.tracks.iter().position(|t| t.kind == kind) {
            Some(pos) => pos,
            None => {
                self.tracks.push(Track::new(kind));
                self.tracks.len() - 1
            }
        };
        &mut self.tracks[pos]
    }

    /// Looks up a text material by id
    pub fn text_material(&self, id: &MaterialId) -> Option<&TextMaterial> {
        self.materials.texts.iter().find(|m| &m.id == id)
    }

    /// Looks up a text material by id, mutably
    pub fn text_material_mut(&mut self, id: &MaterialId) -> Option<&mut TextMaterial> {
        self.materials.texts.iter_mut().find(|m| &m.id == id)
    }

    /// Looks up an audio material by id
    pub fn audio_material(&self, id: &MaterialId) -> Option<&AudioMaterial> {
        self.materials.audios.iter().find(|m| &m.id == id)
    }

    /// Looks up an audio material by id, mutably
    pub fn audio_material_mut(&mut self, id: &MaterialId) -> Option<&mut AudioMaterial> {
        self.materials.audios.iter_mut().find(|m| &m.id == id)
    }

    /// Maximum segment end across all tracks
    pub fn total_duration(&self) -> TimeUs {
        self.tracks
            .iter()
            .flat_map(|t| t.segments.iter())
            .map(|s| s.target_timerange.end())
            .max()
            .unwrap_or(0)
    }

    /// Recomputes the scalar `duration` from the segments. Called after
    /// every engine mutation.
    pub fn recompute_duration(&mut self) {
        self.duration = self.total_duration();
    }
}

// =============================================================================
// Tests
// =============================================================================
