//! Subtitle Serialization Formats
//!
//! SRT, ASS, and LRC writers over [`SubtitleCue`] lists. Timestamp shapes
//! are format-exact: SRT `HH:MM:SS,mmm`, ASS `H:MM:SS.cc`, LRC `[MM:SS.cc]`.

use std::fmt::Write;

use super::SubtitleCue;

// =============================================================================
// SRT
// =============================================================================

/// `HH:MM:SS,mmm`
fn srt_timestamp(sec: f64) -> String {
    let total_ms = (sec * 1000.0).round() as i64;
    let h = total_ms / 3_600_000;
    let m = total_ms % 3_600_000 / 60_000;
    let s = total_ms % 60_000 / 1000;
    let ms = total_ms % 1000;
    format!("{h:02}:{m:02}:{s:02},{ms:03}")
}

/// Serializes cues as SubRip: 1-indexed blocks separated by blank lines
pub fn export_srt(cues: &[SubtitleCue]) -> String {
    let mut out = String::new();
    for (i, cue) in cues.iter().enumerate() {
        let _ = write!(
            out,
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            srt_timestamp(cue.start_sec),
            srt_timestamp(cue.end_sec),
            cue.text
        );
    }
    out
}

// =============================================================================
// ASS
// =============================================================================

const ASS_HEADER: &str = "\
[Script Info]
Title: 剪映导出字幕
ScriptType: v4.00+
WrapStyle: 0
ScaledBorderAndShadow: yes
YCbCr Matrix: TV.601
PlayResX: 1920
PlayResY: 1080

[V4+ Styles]
Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding
Style: Default,Arial,48,&H00FFFFFF,&H000000FF,&H00000000,&H80000000,0,0,0,0,100,100,0,0,1,2,2,2,10,10,10,1

[Events]
Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text
";

/// `H:MM:SS.cc` (single-digit hour, centiseconds)
fn ass_timestamp(sec: f64) -> String {
    let total_cs = (sec * 100.0).round() as i64;
    let h = total_cs / 360_000;
    let m = total_cs % 360_000 / 6_000;
    let s = total_cs % 6_000 / 100;
    let cs = total_cs % 100;
    format!("{h}:{m:02}:{s:02}.{cs:02}")
}

/// Serializes cues as Advanced SubStation Alpha with a fixed 1920x1080
/// default style. Line breaks inside a cue become `\N`.
pub fn export_ass(cues: &[SubtitleCue]) -> String {
    let mut out = String::from(ASS_HEADER);
    for cue in cues {
        let text = cue.text.replace('\n', "\\N");
        let _ = writeln!(
            out,
            "Dialogue: 0,{},{},Default,,0,0,0,,{}",
            ass_timestamp(cue.start_sec),
            ass_timestamp(cue.end_sec),
            text
        );
    }
    out
}

// =============================================================================
// LRC
// =============================================================================

/// `[MM:SS.cc]`
fn lrc_timestamp(sec: f64) -> String {
    let total_cs = (sec * 100.0).round() as i64;
    let m = total_cs / 6_000;
    let s = total_cs % 6_000 / 100;
    let cs = total_cs % 100;
    format!("[{m:02}:{s:02}.{cs:02}]")
}

const LRC_HEADER: &str = "\
[ti:Multi-Voice TTS]
[ar:TTS Generator]
[al:Generated]
[by:Multi-Voice TTS Manager]

";

/// Serializes cues as LRC lyric lines behind the fixed tag header.
/// Newlines inside a cue collapse to spaces.
pub fn export_lrc(cues: &[SubtitleCue]) -> String {
    let mut out = String::from(LRC_HEADER);
    for cue in cues {
        let text = cue.text.replace('\n', " ");
        let _ = writeln!(out, "{}{}", lrc_timestamp(cue.start_sec), text);
    }
    out
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn cue(text: &str, start: f64, end: f64) -> SubtitleCue {
        SubtitleCue {
            text: text.to_string(),
            start_sec: start,
            end_sec: end,
        }
    }

    #[test]
    fn test_srt_first_block() {
        let out = export_srt(&[cue("Hi", 0.0, 1.5)]);
        assert_eq!(out, "1\n00:00:00,000 --> 00:00:01,500\nHi\n\n");
    }

    #[test]
    fn test_srt_gap_offsets_second_block() {
        let out = export_srt(&[cue("Hi", 0.0, 1.5), cue("there", 1.53, 3.53)]);
        assert!(out.contains("2\n00:00:01,530 --> 00:00:03,530\nthere\n"));
    }

    #[test]
    fn test_srt_rounds_to_milliseconds() {
        let out = export_srt(&[cue("x", 0.0005, 3661.9996)]);
        assert!(out.contains("00:00:00,001 --> 01:01:02,000"));
    }

    #[test]
    fn test_ass_header_and_dialogue() {
        let out = export_ass(&[cue("line one\nline two", 1.0, 2.25)]);
        assert!(out.starts_with("[Script Info]\nTitle: 剪映导出字幕\n"));
        assert!(out.contains("PlayResX: 1920"));
        assert!(out.contains("PlayResY: 1080"));
        assert!(out.contains(
            "Style: Default,Arial,48,&H00FFFFFF,&H000000FF,&H00000000,&H80000000,\
             0,0,0,0,100,100,0,0,1,2,2,2,10,10,10,1"
        ));
        assert!(out.contains(
            "Dialogue: 0,0:00:01.00,0:00:02.25,Default,,0,0,0,,line one\\Nline two"
        ));
    }

    #[test]
    fn test_ass_timestamp_shape() {
        assert_eq!(ass_timestamp(0.0), "0:00:00.00");
        assert_eq!(ass_timestamp(3725.5), "1:02:05.50");
    }

    #[test]
    fn test_lrc_header_and_collapsed_newlines() {
        let out = export_lrc(&[cue("two\nlines", 61.5, 63.0)]);
        assert_eq!(
            out,
            "[ti:Multi-Voice TTS]\n[ar:TTS Generator]\n[al:Generated]\n\
             [by:Multi-Voice TTS Manager]\n\n[01:01.50]two lines\n"
        );
    }
}
