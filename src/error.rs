//! Engine Error Definitions
//!
//! Defines error types used throughout the synchronization engine.

use thiserror::Error;

use crate::types::MaterialId;

/// Engine error types
#[derive(Error, Debug)]
pub enum DraftError {
    // =========================================================================
    // Document Errors
    // =========================================================================
    #[error("Draft file not found: {0}")]
    DocumentNotFound(String),

    #[error("Malformed draft document: {0}")]
    MalformedDocument(String),

    // =========================================================================
    // Reference Errors
    // =========================================================================
    #[error("Dangling reference: no {kind} with id {id}")]
    DanglingReference { kind: &'static str, id: MaterialId },

    // =========================================================================
    // Replacement Errors
    // =========================================================================
    #[error("Replacement source audio missing: {0}")]
    SourceFileMissing(String),

    #[error("Cannot measure audio duration of {path}: {reason}")]
    UnreadableAudio { path: String, reason: String },

    #[error("Invalid time range: start {start}us, duration {duration}us")]
    InvalidTimeRange { start: i64, duration: i64 },

    #[error("sync_position and append_to_last are mutually exclusive")]
    ConflictingPolicies,

    // =========================================================================
    // General Errors
    // =========================================================================
    #[error("IO error: {0}")]
    IoFailure(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Engine result type
pub type DraftResult<T> = Result<T, DraftError>;
