// Arrangement module
// The musical data model: notes, scores, patterns, placeable sources, and
// the playlist that arranges them against the master transport

pub mod automation;
pub mod note;
pub mod pattern;
pub mod playlist;
pub mod sample;
pub mod score;

/// Unknown persisted fields carried on a live entity
///
/// Decoding is lenient: fields the schema does not declare survive the round
/// trip instead of being dropped.
pub type ExtraFields = serde_json::Map<String, serde_json::Value>;

pub use automation::{AutomationClip, AutomationPoint};
pub use note::Note;
pub use pattern::{DEFAULT_MIN_DURATION, Pattern};
pub use playlist::{
    Playlist, PlaylistElement, ScheduledAutomation, ScheduledPattern, ScheduledSample,
    SharedAutomation, SharedPattern, SharedSample,
};
pub use sample::Sample;
pub use score::Score;
