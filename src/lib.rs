// beatline - musical scheduling core
// Patterns, scores, and playlist placements mapped onto a beat-based
// transport clock, with a JSON persistence boundary

pub mod arrangement;
pub mod project;
pub mod sequencer;

// Re-export commonly used types for convenience
pub use arrangement::{
    AutomationClip, AutomationPoint, Note, Pattern, Playlist, PlaylistElement, Sample,
    ScheduledAutomation, ScheduledPattern, ScheduledSample, Score,
};
pub use project::{Project, ProjectError, ProjectManager};
pub use sequencer::{
    Beats, EventHandle, EventPhase, PlaybackEvent, PlaybackPayload, Schedulable, ScheduleError,
    Tempo, Ticks, TimeSignature, Transport,
};
