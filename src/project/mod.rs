// Project persistence boundary
// Plain JSON records per entity, validation, and a manager for save/load

pub mod manager;
pub mod serialization;
pub mod types;

use uuid::Uuid;

pub use manager::ProjectManager;
pub use serialization::{
    ArrangementSources, automation_from_record, automation_to_record, element_from_record,
    element_to_record, note_from_record, note_to_record, pattern_from_record, pattern_to_record,
    playlist_from_record, playlist_to_record, sample_from_record, sample_to_record,
    score_from_record, score_to_record,
};
pub use types::{
    AutomationClipRecord, AutomationPointRecord, NoteRecord, PatternRecord,
    PlaylistElementRecord, PlaylistRecord, Project, ProjectMetadata, ProjectVersion, SampleRecord,
    ScoreRecord,
};

/// Errors at the persistence boundary
///
/// All of these are recoverable; the loading layer falls back to a default
/// project rather than propagating. Invariant violations inside the live
/// model are asserts, not variants here.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid project structure: {0}")]
    InvalidStructure(String),

    #[error("Unresolved {kind} reference: {id}")]
    UnresolvedReference { kind: &'static str, id: Uuid },
}

/// Validate a decoded project before any live entity is built from it
pub fn validate_project(project: &Project) -> Result<(), ProjectError> {
    if project.metadata.name.trim().is_empty() {
        return Err(ProjectError::InvalidStructure(
            "Project name cannot be empty".to_string(),
        ));
    }

    if project.metadata.name.len() > 255 {
        return Err(ProjectError::InvalidStructure(
            "Project name cannot exceed 255 characters".to_string(),
        ));
    }

    if project.metadata.version.major < 1 {
        return Err(ProjectError::InvalidStructure(
            "Invalid project format version".to_string(),
        ));
    }

    if !(20.0..=999.0).contains(&project.metadata.tempo) {
        return Err(ProjectError::InvalidStructure(
            "Tempo must be between 20 and 999 BPM".to_string(),
        ));
    }

    if project.metadata.time_signature.numerator == 0
        || !project.metadata.time_signature.denominator.is_power_of_two()
    {
        return Err(ProjectError::InvalidStructure(
            "Invalid time signature".to_string(),
        ));
    }

    // Pattern ids must be unique across the project
    let mut pattern_ids = std::collections::HashSet::new();
    for pattern in &project.patterns {
        if !pattern_ids.insert(pattern.id) {
            return Err(ProjectError::InvalidStructure(format!(
                "Duplicate pattern id: {}",
                pattern.id
            )));
        }

        if pattern.name.len() > 255 {
            return Err(ProjectError::InvalidStructure(format!(
                "Pattern {} name cannot exceed 255 characters",
                pattern.id
            )));
        }

        for score in pattern.scores.as_deref().unwrap_or_default() {
            for note in &score.notes {
                if !note.time.is_finite() || note.time < 0.0 {
                    return Err(ProjectError::InvalidStructure(format!(
                        "Pattern {}: note time must be >= 0",
                        pattern.id
                    )));
                }
                if !note.duration.is_finite() || note.duration <= 0.0 {
                    return Err(ProjectError::InvalidStructure(format!(
                        "Pattern {}: note duration must be > 0",
                        pattern.id
                    )));
                }
            }
        }
    }

    // Every playlist reference must point at a declared source
    if let Some(elements) = &project.playlist.elements {
        let sample_ids: std::collections::HashSet<Uuid> =
            project.samples.iter().map(|s| s.id).collect();
        let automation_ids: std::collections::HashSet<Uuid> =
            project.automations.iter().map(|a| a.id).collect();

        for element in elements {
            match element {
                PlaylistElementRecord::Pattern { source, .. } => {
                    if !pattern_ids.contains(source) {
                        return Err(ProjectError::UnresolvedReference {
                            kind: "pattern",
                            id: *source,
                        });
                    }
                }
                PlaylistElementRecord::Sample { source, .. } => {
                    if !sample_ids.contains(source) {
                        return Err(ProjectError::UnresolvedReference {
                            kind: "sample",
                            id: *source,
                        });
                    }
                }
                PlaylistElementRecord::Automation { source, .. } => {
                    if !automation_ids.contains(source) {
                        return Err(ProjectError::UnresolvedReference {
                            kind: "automation clip",
                            id: *source,
                        });
                    }
                }
            }
        }
    }

    Ok(())
}
