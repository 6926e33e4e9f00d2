//! Subtitle Timing Exporter
//!
//! Turns caption lines into timed subtitle cues. Two sources of timing:
//! a cumulative layout over an ordered caption list (for export before the
//! timeline has real placements), and the absolute timerange of caption
//! segments already on a draft's text track.
//!
//! Duration precedence for the cumulative layout: measured WAV duration,
//! then a caller-supplied cached duration, then a character-count estimate.

pub mod formats;

use std::path::PathBuf;

use crate::document::{Draft, TrackKind};
use crate::replace::wav_duration_us;
use crate::types::US_PER_SEC;

/// Fallback reading-speed estimate (seconds per character)
const ESTIMATE_SEC_PER_CHAR: f64 = 0.3;

/// A subtitle line with absolute timestamps in seconds
#[derive(Clone, Debug, PartialEq)]
pub struct SubtitleCue {
    pub text: String,
    pub start_sec: f64,
    pub end_sec: f64,
}

/// A caption line awaiting layout
#[derive(Clone, Debug, Default)]
pub struct CaptionClip {
    pub text: String,
    /// Generated voice file, measured when readable
    pub audio_path: Option<PathBuf>,
    /// Duration remembered from a previous generation run
    pub cached_duration_sec: Option<f64>,
}

impl CaptionClip {
    /// Best available duration for this clip
    fn duration_sec(&self) -> f64 {
        if let Some(path) = &self.audio_path {
            if let Ok(us) = wav_duration_us(path) {
                return us as f64 / US_PER_SEC as f64;
            }
        }
        if let Some(cached) = self.cached_duration_sec {
            return cached;
        }
        self.text.chars().count() as f64 * ESTIMATE_SEC_PER_CHAR
    }
}

/// Lays out clips cumulatively from time zero, `gap_sec` apart.
///
/// Timestamps are strictly monotonic for non-empty clips whenever
/// `gap_sec >= 0`.
pub fn layout_cues(clips: &[CaptionClip], gap_sec: f64) -> Vec<SubtitleCue> {
    let mut cues = Vec::with_capacity(clips.len());
    let mut cursor = 0.0;
    for clip in clips {
        if clip.text.trim().is_empty() {
            continue;
        }
        let duration = clip.duration_sec();
        cues.push(SubtitleCue {
            text: clip.text.clone(),
            start_sec: cursor,
            end_sec: cursor + duration,
        });
        cursor += duration + gap_sec;
    }
    cues
}

/// Derives cues from the caption segments already placed on a draft's text
/// tracks, sorted by start time.
pub fn cues_from_draft(draft: &Draft) -> Vec<SubtitleCue> {
    let mut cues: Vec<SubtitleCue> = Vec::new();
    for track in draft.tracks_of_kind(&TrackKind::Text) {
        for segment in &track.segments {
            let Some(material) = draft.text_material(&segment.material_id) else {
                continue;
            };
            let text = material.caption_text();
            if text.is_empty() {
                continue;
            }
            let range = segment.target_timerange;
            cues.push(SubtitleCue {
                text,
                start_sec: range.start as f64 / US_PER_SEC as f64,
                end_sec: range.end() as f64 / US_PER_SEC as f64,
            });
        }
    }
    cues.sort_by(|a, b| a.start_sec.total_cmp(&b.start_sec));
    cues
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Materials, Segment, TextMaterial};
    use crate::types::{MaterialId, TimeRange};
    use serde_json::Map;

    fn clip(text: &str, cached: Option<f64>) -> CaptionClip {
        CaptionClip {
            text: text.to_string(),
            audio_path: None,
            cached_duration_sec: cached,
        }
    }

    #[test]
    fn test_cumulative_layout_with_gap() {
        let cues = layout_cues(
            &[clip("Hi", Some(1.5)), clip("there", Some(2.0))],
            0.03,
        );
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].start_sec, 0.0);
        assert_eq!(cues[0].end_sec, 1.5);
        assert!((cues[1].start_sec - 1.53).abs() < 1e-9);
        assert!((cues[1].end_sec - 3.53).abs() < 1e-9);
    }

    #[test]
    fn test_blank_clips_skipped() {
        let cues = layout_cues(&[clip("  ", Some(1.0)), clip("line", Some(1.0))], 0.0);
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].start_sec, 0.0);
    }

    #[test]
    fn test_duration_estimate_from_char_count() {
        // 5 characters, no audio, no cache
        let cues = layout_cues(&[clip("abcde", None)], 0.0);
        assert!((cues[0].end_sec - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_measured_duration_beats_cache() {
        let dir = tempfile::tempdir().unwrap();
        let wav = dir.path().join("c.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&wav, spec).unwrap();
        for _ in 0..8000 {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();

        let cues = layout_cues(
            &[CaptionClip {
                text: "measured".to_string(),
                audio_path: Some(wav),
                cached_duration_sec: Some(9.0),
            }],
            0.0,
        );
        assert!((cues[0].end_sec - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cues_from_draft_sorted_by_start() {
        let mut draft = Draft {
            materials: Materials {
                texts: vec![
                    TextMaterial {
                        id: MaterialId::new("T1"),
                        content: r#"{"text":"second"}"#.to_string(),
                        text_to_audio_ids: None,
                        extra: Map::new(),
                    },
                    TextMaterial {
                        id: MaterialId::new("T2"),
                        content: r#"{"text":"first"}"#.to_string(),
                        text_to_audio_ids: None,
                        extra: Map::new(),
                    },
                ],
                ..Default::default()
            },
            ..Default::default()
        };
        let track = draft.ensure_track(TrackKind::Text);
        track.segments.push(Segment::new(
            MaterialId::new("T1"),
            TimeRange::new(2_000_000, 1_000_000),
        ));
        track.segments.push(Segment::new(
            MaterialId::new("T2"),
            TimeRange::new(0, 1_500_000),
        ));

        let cues = cues_from_draft(&draft);
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].text, "first");
        assert_eq!(cues[0].end_sec, 1.5);
        assert_eq!(cues[1].text, "second");
        assert_eq!(cues[1].start_sec, 2.0);
    }
}
