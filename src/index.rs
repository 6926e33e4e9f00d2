//! Reference Index
//!
//! Derived O(1) lookup maps over a loaded draft: material resolution by id,
//! the caption/audio association in both directions, and segment locations
//! by owning material. The index is a pure view; it is never persisted and
//! must be rebuilt explicitly after a mutation batch.

use std::collections::HashMap;

use crate::document::{AnimationMaterial, AudioMaterial, Draft, Segment, TextMaterial, TrackKind};
use crate::types::{MaterialId, SegmentId};

// =============================================================================
// Material View
// =============================================================================

/// Tagged view over a material of any kind
#[derive(Clone, Copy, Debug)]
pub enum Material<'a> {
    Text(&'a TextMaterial),
    Audio(&'a AudioMaterial),
    Animation(&'a AnimationMaterial),
}

impl<'a> Material<'a> {
    pub fn id(&self) -> &'a MaterialId {
        match self {
            Self::Text(m) => &m.id,
            Self::Audio(m) => &m.id,
            Self::Animation(m) => &m.id,
        }
    }
}

// =============================================================================
// Segment Location
// =============================================================================

/// Position of a segment inside the draft's track list
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SegmentLoc {
    pub track: usize,
    pub segment: usize,
}

/// Resolves a location back to its segment
pub fn segment_at<'a>(draft: &'a Draft, loc: SegmentLoc) -> Option<&'a Segment> {
    draft.tracks.get(loc.track)?.segments.get(loc.segment)
}

/// Mutable variant of [`segment_at`]
pub fn segment_at_mut(draft: &mut Draft, loc: SegmentLoc) -> Option<&mut Segment> {
    draft.tracks.get_mut(loc.track)?.segments.get_mut(loc.segment)
}

// =============================================================================
// Reference Index
// =============================================================================

/// Lookup maps derived from a draft
#[derive(Debug, Default)]
pub struct ReferenceIndex {
    texts: HashMap<MaterialId, usize>,
    audios: HashMap<MaterialId, usize>,
    animations: HashMap<MaterialId, usize>,
    audio_to_text: HashMap<MaterialId, MaterialId>,
    text_to_audios: HashMap<MaterialId, Vec<MaterialId>>,
    text_segments: HashMap<MaterialId, SegmentLoc>,
    audio_segments: HashMap<MaterialId, SegmentLoc>,
    audio_segments_by_id: HashMap<SegmentId, SegmentLoc>,
}

impl ReferenceIndex {
    /// Builds the index in a single pass over materials and tracks.
    ///
    /// Where duplicates exist (two segments claiming one material), the
    /// first in document order wins, matching the draft invariant of at
    /// most one audio segment per audio material.
    pub fn build(draft: &Draft) -> Self {
        let mut index = Self::default();

        for (i, text) in draft.materials.texts.iter().enumerate() {
            index.texts.insert(text.id.clone(), i);
            if let Some(audio_ids) = &text.text_to_audio_ids {
                if !audio_ids.is_empty() {
                    index
                        .text_to_audios
                        .insert(text.id.clone(), audio_ids.clone());
                }
            }
        }

        for (i, audio) in draft.materials.audios.iter().enumerate() {
            index.audios.insert(audio.id.clone(), i);
            if let Some(text_id) = audio.linked_text() {
                index
                    .audio_to_text
                    .insert(audio.id.clone(), text_id.clone());
            }
        }

        for (i, animation) in draft.materials.material_animations.iter().enumerate() {
            index.animations.insert(animation.id.clone(), i);
        }

        for (ti, track) in draft.tracks.iter().enumerate() {
            let by_material = match track.kind {
                TrackKind::Text => &mut index.text_segments,
                TrackKind::Audio => &mut index.audio_segments,
                TrackKind::Other(_) => continue,
            };
            for (si, segment) in track.segments.iter().enumerate() {
                let loc = SegmentLoc {
                    track: ti,
                    segment: si,
                };
                by_material
                    .entry(segment.material_id.clone())
                    .or_insert(loc);
                if track.kind == TrackKind::Audio {
                    index
                        .audio_segments_by_id
                        .entry(segment.id.clone())
                        .or_insert(loc);
                }
            }
        }

        index
    }

    /// Resolves a material id to its record, of whatever kind
    pub fn material<'a>(&self, draft: &'a Draft, id: &MaterialId) -> Option<Material<'a>> {
        if let Some(&i) = self.texts.get(id) {
            return draft.materials.texts.get(i).map(Material::Text);
        }
        if let Some(&i) = self.audios.get(id) {
            return draft.materials.audios.get(i).map(Material::Audio);
        }
        if let Some(&i) = self.animations.get(id) {
            return draft
                .materials
                .material_animations
                .get(i)
                .map(Material::Animation);
        }
        None
    }

    /// Caption owning the given audio material
    pub fn text_id_for_audio(&self, audio_id: &MaterialId) -> Option<&MaterialId> {
        self.audio_to_text.get(audio_id)
    }

    /// Audio materials voicing the given caption
    pub fn audio_ids_for_text(&self, text_id: &MaterialId) -> &[MaterialId] {
        self.text_to_audios
            .get(text_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Audio-track segment owned by the given audio material
    pub fn audio_segment_loc(&self, material_id: &MaterialId) -> Option<SegmentLoc> {
        self.audio_segments.get(material_id).copied()
    }

    /// Audio-track segment looked up by its own segment id. Legacy drafts
    /// sometimes key the caption/audio association on the segment id rather
    /// than the material id.
    pub fn audio_segment_loc_by_segment_id(&self, segment_id: &SegmentId) -> Option<SegmentLoc> {
        self.audio_segments_by_id.get(segment_id).copied()
    }

    /// Text-track segment owned by the given text material
    pub fn text_segment_loc(&self, material_id: &MaterialId) -> Option<SegmentLoc> {
        self.text_segments.get(material_id).copied()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{AudioMaterial, Materials, Segment, TextMaterial, Track};
    use crate::types::TimeRange;
    use serde_json::Map;

    fn test_draft() -> Draft {
        let text = TextMaterial {
            id: MaterialId::new("T1"),
            content: r#"{"text":"Hello"}"#.to_string(),
            text_to_audio_ids: Some(vec![MaterialId::new("A1")]),
            extra: Map::new(),
        };
        let audio = AudioMaterial {
            id: MaterialId::new("A1"),
            path: String::new(),
            duration: 1_000_000,
            text_id: Some(MaterialId::new("T1")),
            status: None,
            name: None,
            kind: Some(AudioMaterial::TEXT_TO_AUDIO.to_string()),
            extra: Map::new(),
        };

        let mut draft = Draft {
            materials: Materials {
                texts: vec![text],
                audios: vec![audio],
                ..Default::default()
            },
            ..Default::default()
        };

        let text_track = draft.ensure_track(TrackKind::Text);
        text_track.segments.push(Segment::new(
            MaterialId::new("T1"),
            TimeRange::new(0, 1_000_000),
        ));

        let audio_track = draft.ensure_track(TrackKind::Audio);
        let mut seg = Segment::new(MaterialId::new("A1"), TimeRange::new(0, 1_000_000));
        seg.id = SegmentId::new("SEG-A1");
        audio_track.segments.push(seg);

        draft
    }

    #[test]
    fn test_material_lookup_by_kind() {
        let draft = test_draft();
        let index = ReferenceIndex::build(&draft);

        assert!(matches!(
            index.material(&draft, &MaterialId::new("T1")),
            Some(Material::Text(_))
        ));
        assert!(matches!(
            index.material(&draft, &MaterialId::new("A1")),
            Some(Material::Audio(_))
        ));
        assert!(index.material(&draft, &MaterialId::new("missing")).is_none());
    }

    #[test]
    fn test_association_both_directions() {
        let draft = test_draft();
        let index = ReferenceIndex::build(&draft);

        assert_eq!(
            index.text_id_for_audio(&MaterialId::new("A1")),
            Some(&MaterialId::new("T1"))
        );
        assert_eq!(
            index.audio_ids_for_text(&MaterialId::new("T1")),
            &[MaterialId::new("A1")]
        );
        assert!(index.audio_ids_for_text(&MaterialId::new("T9")).is_empty());
    }

    #[test]
    fn test_segment_lookup_by_material_and_segment_id() {
        let draft = test_draft();
        let index = ReferenceIndex::build(&draft);

        let by_material = index.audio_segment_loc(&MaterialId::new("A1")).unwrap();
        let by_segment = index
            .audio_segment_loc_by_segment_id(&SegmentId::new("SEG-A1"))
            .unwrap();
        assert_eq!(by_material, by_segment);

        let segment = segment_at(&draft, by_material).unwrap();
        assert_eq!(segment.material_id, MaterialId::new("A1"));
    }

    #[test]
    fn test_first_segment_wins_on_duplicate_material() {
        let mut draft = test_draft();
        let dup = Segment::new(MaterialId::new("A1"), TimeRange::new(9, 9));
        draft
            .track_of_kind_mut(&TrackKind::Audio)
            .unwrap()
            .segments
            .push(dup);

        let index = ReferenceIndex::build(&draft);
        let loc = index.audio_segment_loc(&MaterialId::new("A1")).unwrap();
        assert_eq!(loc.segment, 0);
    }

    #[test]
    fn test_non_engine_tracks_skipped() {
        let mut draft = test_draft();
        let mut video = Track::new(TrackKind::Other("video".to_string()));
        video
            .segments
            .push(Segment::new(MaterialId::new("V1"), TimeRange::new(0, 5)));
        draft.tracks.push(video);

        let index = ReferenceIndex::build(&draft);
        assert!(index.audio_segment_loc(&MaterialId::new("V1")).is_none());
        assert!(index.text_segment_loc(&MaterialId::new("V1")).is_none());
    }
}
