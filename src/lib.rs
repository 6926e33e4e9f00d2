//! draftsync — Draft Timeline Synchronization Engine
//!
//! Library for editing a video editor's `draft_content.json` project file:
//! loading and saving it with full round-trip fidelity, keeping caption and
//! generated-voice segments consistent when audio files are replaced, and
//! exporting caption timing as SRT/ASS/LRC subtitles.
//!
//! The typical workflow:
//!
//! 1. Load a draft with [`document::io::load`] (or let [`ReplacePipeline`]
//!    do it).
//! 2. Attach audio bookkeeping to captions that lack it
//!    ([`sync::attach_audio_to_captions`]) or import a script
//!    ([`sync::import_script`]).
//! 3. Run a replacement batch ([`ReplacePipeline::run`]) once TTS files
//!    exist; the synchronizer keeps segment durations and positions in
//!    line with the new audio.
//! 4. Export subtitles from the updated draft
//!    ([`subtitles::cues_from_draft`] plus a writer in
//!    [`subtitles::formats`]).

pub mod document;
pub mod error;
pub mod index;
pub mod paths;
pub mod replace;
pub mod subtitles;
pub mod sync;
pub mod types;

pub use document::io::{load, save, BackupKind, DRAFT_FILE_NAME};
pub use document::Draft;
pub use error::{DraftError, DraftResult};
pub use index::ReferenceIndex;
pub use replace::{BatchOutcome, ItemResult, ReplacePipeline, ReplacementItem};
pub use subtitles::{CaptionClip, SubtitleCue};
pub use sync::{AudioUpdate, PlacementPolicy, ScriptEntry};
pub use types::{MaterialId, SegmentId, TimeRange, TimeUs, TrackId};
