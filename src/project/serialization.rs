// Conversions between live arrangement entities and their persisted records
//
// Decoding validates field-by-field and constructs a fresh entity or fails;
// it never partially mutates a live object. Nothing here touches a
// transport: deserialized entities come back inactive and the caller decides
// when to activate them.

use std::collections::HashMap;

use uuid::Uuid;

use crate::arrangement::{
    AutomationClip, AutomationPoint, Note, Pattern, Playlist, PlaylistElement, Sample,
    ScheduledAutomation, ScheduledPattern, ScheduledSample, Score, SharedAutomation,
    SharedPattern, SharedSample,
};
use crate::sequencer::timebase::Beats;

use super::ProjectError;
use super::types::{
    AutomationClipRecord, AutomationPointRecord, NoteRecord, PatternRecord,
    PlaylistElementRecord, PlaylistRecord, SampleRecord, ScoreRecord,
};

pub fn note_to_record(note: &Note) -> NoteRecord {
    NoteRecord {
        row: note.row(),
        time: note.time().value(),
        duration: note.duration().value(),
        extra: note.extra().clone(),
    }
}

pub fn note_from_record(record: NoteRecord) -> Result<Note, ProjectError> {
    if !record.time.is_finite() || record.time < 0.0 {
        return Err(ProjectError::InvalidStructure(format!(
            "Note time must be >= 0, got {}",
            record.time
        )));
    }
    if !record.duration.is_finite() || record.duration <= 0.0 {
        return Err(ProjectError::InvalidStructure(format!(
            "Note duration must be > 0, got {}",
            record.duration
        )));
    }
    let mut note = Note::new(record.row, Beats::new(record.time), Beats::new(record.duration));
    note.set_extra(record.extra);
    Ok(note)
}

pub fn score_to_record(score: &Score) -> ScoreRecord {
    ScoreRecord {
        id: score.id().to_string(),
        notes: score.notes().iter().map(note_to_record).collect(),
        extra: score.extra().clone(),
    }
}

pub fn score_from_record(record: ScoreRecord) -> Result<Score, ProjectError> {
    let mut score = Score::new(record.id);
    for note_record in record.notes {
        score.add_note(note_from_record(note_record)?);
    }
    score.set_extra(record.extra);
    Ok(score)
}

pub fn pattern_to_record(pattern: &Pattern) -> PatternRecord {
    PatternRecord {
        id: pattern.id(),
        name: pattern.name().to_string(),
        scores: Some(pattern.scores().iter().map(score_to_record).collect()),
        extra: pattern.extra().clone(),
    }
}

/// Rebuild a pattern from its record
///
/// The private transport is always constructed fresh; call
/// [`Pattern::activate`] afterwards to register the contained notes on it.
pub fn pattern_from_record(record: PatternRecord) -> Result<Pattern, ProjectError> {
    let mut pattern = Pattern::with_id(record.id, record.name);
    for score_record in record.scores.unwrap_or_default() {
        pattern.add_score(score_from_record(score_record)?);
    }
    pattern.set_extra(record.extra);
    Ok(pattern)
}

pub fn sample_to_record(sample: &Sample) -> SampleRecord {
    SampleRecord {
        id: sample.id(),
        name: sample.name().to_string(),
        duration: sample.duration().value(),
        extra: sample.extra().clone(),
    }
}

pub fn sample_from_record(record: SampleRecord) -> Result<Sample, ProjectError> {
    if !record.duration.is_finite() || record.duration <= 0.0 {
        return Err(ProjectError::InvalidStructure(format!(
            "Sample duration must be > 0, got {}",
            record.duration
        )));
    }
    let mut sample = Sample::with_id(record.id, record.name, Beats::new(record.duration));
    sample.set_extra(record.extra);
    Ok(sample)
}

pub fn automation_to_record(clip: &AutomationClip) -> AutomationClipRecord {
    AutomationClipRecord {
        id: clip.id(),
        points: clip
            .points()
            .iter()
            .map(|point| AutomationPointRecord {
                time: point.time.value(),
                value: point.value,
            })
            .collect(),
        extra: clip.extra().clone(),
    }
}

pub fn automation_from_record(record: AutomationClipRecord) -> Result<AutomationClip, ProjectError> {
    let mut clip = AutomationClip::with_id(record.id);
    for point in record.points {
        if !point.time.is_finite() || point.time < 0.0 {
            return Err(ProjectError::InvalidStructure(format!(
                "Automation point time must be >= 0, got {}",
                point.time
            )));
        }
        clip.add_point(AutomationPoint::new(Beats::new(point.time), point.value));
    }
    clip.set_extra(record.extra);
    Ok(clip)
}

pub fn element_to_record(element: &PlaylistElement) -> PlaylistElementRecord {
    match element {
        PlaylistElement::Pattern(placement) => PlaylistElementRecord::Pattern {
            source: placement
                .pattern()
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .id(),
            time: placement.time().value(),
            duration: placement.duration_override().map(|d| d.value()),
            extra: placement.extra().clone(),
        },
        PlaylistElement::Sample(placement) => PlaylistElementRecord::Sample {
            source: placement
                .sample()
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .id(),
            time: placement.time().value(),
            duration: placement.duration_override().map(|d| d.value()),
            extra: placement.extra().clone(),
        },
        PlaylistElement::Automation(placement) => PlaylistElementRecord::Automation {
            source: placement
                .clip()
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .id(),
            time: placement.time().value(),
            extra: placement.extra().clone(),
        },
    }
}

pub fn playlist_to_record(playlist: &Playlist) -> PlaylistRecord {
    PlaylistRecord {
        elements: Some(playlist.elements().iter().map(element_to_record).collect()),
        extra: playlist.extra().clone(),
    }
}

/// Already-materialized sources a playlist decode resolves against
///
/// The caller loads/constructs the referenced patterns, samples, and clips
/// first; the decode path never sees a raw id without a live entity behind
/// it.
#[derive(Debug, Default)]
pub struct ArrangementSources {
    patterns: HashMap<Uuid, SharedPattern>,
    samples: HashMap<Uuid, SharedSample>,
    automations: HashMap<Uuid, SharedAutomation>,
}

impl ArrangementSources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_pattern(&mut self, pattern: SharedPattern) {
        let id = pattern
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .id();
        self.patterns.insert(id, pattern);
    }

    pub fn insert_sample(&mut self, sample: SharedSample) {
        let id = sample
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .id();
        self.samples.insert(id, sample);
    }

    pub fn insert_automation(&mut self, clip: SharedAutomation) {
        let id = clip
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .id();
        self.automations.insert(id, clip);
    }

    pub fn pattern(&self, id: Uuid) -> Option<&SharedPattern> {
        self.patterns.get(&id)
    }

    pub fn sample(&self, id: Uuid) -> Option<&SharedSample> {
        self.samples.get(&id)
    }

    pub fn automation(&self, id: Uuid) -> Option<&SharedAutomation> {
        self.automations.get(&id)
    }
}

fn placement_time(time: f64) -> Result<Beats, ProjectError> {
    if !time.is_finite() || time < 0.0 {
        return Err(ProjectError::InvalidStructure(format!(
            "Placement time must be >= 0, got {time}"
        )));
    }
    Ok(Beats::new(time))
}

fn placement_duration(duration: Option<f64>) -> Result<Option<Beats>, ProjectError> {
    match duration {
        None => Ok(None),
        Some(value) if value.is_finite() && value > 0.0 => Ok(Some(Beats::new(value))),
        Some(value) => Err(ProjectError::InvalidStructure(format!(
            "Placement duration must be > 0, got {value}"
        ))),
    }
}

pub fn element_from_record(
    record: PlaylistElementRecord,
    sources: &ArrangementSources,
) -> Result<PlaylistElement, ProjectError> {
    match record {
        PlaylistElementRecord::Pattern {
            source,
            time,
            duration,
            extra,
        } => {
            let pattern = sources
                .pattern(source)
                .ok_or(ProjectError::UnresolvedReference {
                    kind: "pattern",
                    id: source,
                })?;
            let mut placement = ScheduledPattern::new(
                std::sync::Arc::clone(pattern),
                placement_time(time)?,
                placement_duration(duration)?,
            );
            placement.set_extra(extra);
            Ok(PlaylistElement::Pattern(placement))
        }
        PlaylistElementRecord::Sample {
            source,
            time,
            duration,
            extra,
        } => {
            let sample = sources
                .sample(source)
                .ok_or(ProjectError::UnresolvedReference {
                    kind: "sample",
                    id: source,
                })?;
            let mut placement = ScheduledSample::new(
                std::sync::Arc::clone(sample),
                placement_time(time)?,
                placement_duration(duration)?,
            );
            placement.set_extra(extra);
            Ok(PlaylistElement::Sample(placement))
        }
        PlaylistElementRecord::Automation {
            source,
            time,
            extra,
        } => {
            let clip = sources
                .automation(source)
                .ok_or(ProjectError::UnresolvedReference {
                    kind: "automation clip",
                    id: source,
                })?;
            let mut placement =
                ScheduledAutomation::new(std::sync::Arc::clone(clip), placement_time(time)?);
            placement.set_extra(extra);
            Ok(PlaylistElement::Automation(placement))
        }
    }
}

/// Rebuild a playlist from its record against pre-resolved sources
///
/// Comes back inactive; call [`Playlist::activate`] to register the elements
/// on the fresh master transport.
pub fn playlist_from_record(
    record: PlaylistRecord,
    sources: &ArrangementSources,
) -> Result<Playlist, ProjectError> {
    let mut elements = Vec::new();
    for element_record in record.elements.unwrap_or_default() {
        elements.push(element_from_record(element_record, sources)?);
    }
    let mut playlist = Playlist::new(elements);
    playlist.set_extra(record.extra);
    Ok(playlist)
}
