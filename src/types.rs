//! Core Type Definitions
//!
//! Defines the id newtypes and time primitives used throughout the engine.
//! Draft files measure all timeline positions in microseconds.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Time Types
// =============================================================================

/// Time in microseconds (the draft file's native unit)
pub type TimeUs = i64;

/// Microseconds per second
pub const US_PER_SEC: i64 = 1_000_000;

/// A placement on the shared timeline: start position and length,
/// both in microseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: TimeUs,
    pub duration: TimeUs,
}

impl TimeRange {
    pub fn new(start: TimeUs, duration: TimeUs) -> Self {
        Self { start, duration }
    }

    /// Returns the end position (start + duration)
    pub fn end(&self) -> TimeUs {
        self.start + self.duration
    }

    /// A range is valid when it starts on the timeline and is not degenerate
    pub fn is_valid(&self) -> bool {
        self.start >= 0 && self.duration > 0
    }
}

// =============================================================================
// ID Types
// =============================================================================

macro_rules! id_newtype {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Generates a fresh id in the draft file's convention
            /// (uppercase UUID v4).
            pub fn generate() -> Self {
                Self(Uuid::new_v4().to_string().to_uppercase())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

id_newtype!(
    /// Material unique identifier (text, audio, or animation material)
    MaterialId
);

id_newtype!(
    /// Track segment unique identifier
    SegmentId
);

id_newtype!(
    /// Track unique identifier
    TrackId
);

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_range_end() {
        let range = TimeRange::new(1_000_000, 500_000);
        assert_eq!(range.end(), 1_500_000);
    }

    #[test]
    fn test_time_range_validity() {
        assert!(TimeRange::new(0, 1).is_valid());
        assert!(!TimeRange::new(0, 0).is_valid());
        assert!(!TimeRange::new(-1, 100).is_valid());
        assert!(!TimeRange::new(5, -5).is_valid());
    }

    #[test]
    fn test_generated_id_is_uppercase() {
        let id = MaterialId::generate();
        assert_eq!(id.as_str(), id.as_str().to_uppercase());
        assert_eq!(id.as_str().len(), 36);
    }

    #[test]
    fn test_id_serde_transparent() {
        let id = MaterialId::new("ABC-123");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"ABC-123\"");

        let back: MaterialId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
