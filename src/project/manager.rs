// Project manager for loading and saving projects
// Where the project file lives is the caller's policy; this layer only
// reads, writes, validates, and falls back

use std::fs;
use std::path::Path;

use chrono::Utc;
use uuid::Uuid;

use crate::arrangement::ExtraFields;

use super::types::{PatternRecord, Project};
use super::{ProjectError, validate_project};

/// Handles saving and loading projects as pretty-printed JSON
#[derive(Debug, Default)]
pub struct ProjectManager;

impl ProjectManager {
    pub fn new() -> Self {
        Self
    }

    /// Create a new empty project with one default pattern
    pub fn create_new_project(&self, name: impl Into<String>) -> Project {
        let mut project = Project::default();
        project.metadata.name = name.into();
        project.patterns.push(PatternRecord {
            id: Uuid::new_v4(),
            name: "Pattern 1".to_string(),
            scores: Some(Vec::new()),
            extra: ExtraFields::new(),
        });
        project
    }

    /// Write `project` to `path`, refreshing its modification timestamp
    pub fn save_to_path(&self, project: &mut Project, path: &Path) -> Result<(), ProjectError> {
        project.metadata.modified = Utc::now();
        let json = serde_json::to_string_pretty(project)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Read and validate a project from `path`
    ///
    /// The record graph is fully parsed and validated before anything is
    /// handed back, so a failure never leaves partially decoded state
    /// behind.
    pub fn load_from_path(&self, path: &Path) -> Result<Project, ProjectError> {
        let json = fs::read_to_string(path)?;
        let project: Project = serde_json::from_str(&json)?;
        validate_project(&project)?;
        Ok(project)
    }

    /// Load `path`, falling back to a fresh default project when the file
    /// is missing, unparsable, or structurally invalid
    ///
    /// The recovery path for corrupt persisted data: the caller gets a
    /// known-good state and may overwrite the corrupt file on the next save.
    pub fn load_or_default(&self, path: &Path) -> Project {
        match self.load_from_path(path) {
            Ok(project) => project,
            Err(err) => {
                log::warn!(
                    "falling back to a default project, could not load {}: {err}",
                    path.display()
                );
                self.create_new_project("Untitled")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("song.json");

        let manager = ProjectManager::new();
        let mut project = manager.create_new_project("Round Trip");
        project.metadata.author = Some("someone".to_string());

        manager.save_to_path(&mut project, &path).unwrap();
        let loaded = manager.load_from_path(&path).unwrap();

        assert_eq!(loaded.metadata.name, "Round Trip");
        assert_eq!(loaded.metadata.author.as_deref(), Some("someone"));
        assert_eq!(loaded.patterns.len(), 1);
        assert_eq!(loaded.patterns[0].id, project.patterns[0].id);
    }

    #[test]
    fn test_save_refreshes_modified_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("song.json");

        let manager = ProjectManager::new();
        let mut project = manager.create_new_project("Stamped");
        let created = project.metadata.created;

        manager.save_to_path(&mut project, &path).unwrap();
        assert!(project.metadata.modified >= created);
    }

    #[test]
    fn test_corrupt_file_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("song.json");
        fs::write(&path, "{ this is not json").unwrap();

        let manager = ProjectManager::new();
        let project = manager.load_or_default(&path);
        assert_eq!(project.metadata.name, "Untitled");
        assert_eq!(project.patterns.len(), 1);
    }

    #[test]
    fn test_missing_file_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ProjectManager::new();
        let project = manager.load_or_default(&dir.path().join("nope.json"));
        assert_eq!(project.metadata.name, "Untitled");
    }

    #[test]
    fn test_structurally_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("song.json");

        let manager = ProjectManager::new();
        let mut project = manager.create_new_project("Bad Tempo");
        project.metadata.tempo = 5.0;
        let json = serde_json::to_string(&project).unwrap();
        fs::write(&path, json).unwrap();

        assert!(matches!(
            manager.load_from_path(&path),
            Err(ProjectError::InvalidStructure(_))
        ));
    }
}
