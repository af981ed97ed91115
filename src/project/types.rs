// Types for project persistence
// One plain serde record per entity; this is the schema the persistence
// boundary speaks. Records are JSON-representable and decoding is lenient:
// every record carries a flattened map that keeps undeclared input fields
// through a decode/re-encode cycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::arrangement::ExtraFields;
use crate::sequencer::timebase::TimeSignature;

/// Project format version
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl ProjectVersion {
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    pub fn current() -> Self {
        Self::new(1, 0, 0)
    }
}

impl std::fmt::Display for ProjectVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Project metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectMetadata {
    /// Project name
    pub name: String,
    /// Version of the project format
    pub version: ProjectVersion,
    /// Creation timestamp
    pub created: DateTime<Utc>,
    /// Last modification timestamp
    pub modified: DateTime<Utc>,
    /// Default tempo (BPM)
    pub tempo: f64,
    /// Default time signature
    pub time_signature: TimeSignature,
    /// Author/creator information
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Project description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl Default for ProjectMetadata {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            name: "Untitled".to_string(),
            version: ProjectVersion::current(),
            created: now,
            modified: now,
            tempo: 120.0,
            time_signature: TimeSignature::default(),
            author: None,
            description: None,
            extra: ExtraFields::new(),
        }
    }
}

/// Persisted form of a note: `{ row, time, duration }`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NoteRecord {
    pub row: i32,
    pub time: f64,
    pub duration: f64,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Persisted form of a score: `{ id, notes }`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreRecord {
    pub id: String,
    #[serde(default)]
    pub notes: Vec<NoteRecord>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Persisted form of a pattern: `{ id, name, scores? }`
///
/// The pattern's private transport is deliberately absent; it is rebuilt
/// fresh on load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatternRecord {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scores: Option<Vec<ScoreRecord>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Persisted form of a sample source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SampleRecord {
    pub id: Uuid,
    pub name: String,
    pub duration: f64,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// One breakpoint of a persisted automation clip
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AutomationPointRecord {
    pub time: f64,
    pub value: f64,
}

/// Persisted form of an automation clip source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AutomationClipRecord {
    pub id: Uuid,
    #[serde(default)]
    pub points: Vec<AutomationPointRecord>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Persisted form of one placed element
///
/// Each element tags its kind and stores a *reference* to the underlying
/// source, never an inline copy. Resolving `source` back to a live entity
/// is the loading caller's responsibility.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlaylistElementRecord {
    Pattern {
        source: Uuid,
        time: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration: Option<f64>,
        #[serde(flatten)]
        extra: ExtraFields,
    },
    Sample {
        source: Uuid,
        time: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration: Option<f64>,
        #[serde(flatten)]
        extra: ExtraFields,
    },
    Automation {
        source: Uuid,
        time: f64,
        #[serde(flatten)]
        extra: ExtraFields,
    },
}

/// Persisted form of the playlist: `{ elements? }`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PlaylistRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elements: Option<Vec<PlaylistElementRecord>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// A whole persisted project
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub metadata: ProjectMetadata,
    #[serde(default)]
    pub patterns: Vec<PatternRecord>,
    #[serde(default)]
    pub samples: Vec<SampleRecord>,
    #[serde(default)]
    pub automations: Vec<AutomationClipRecord>,
    #[serde(default)]
    pub playlist: PlaylistRecord,
    #[serde(flatten)]
    pub extra: ExtraFields,
}
