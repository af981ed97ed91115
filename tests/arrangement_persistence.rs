// Integration test for the arrangement persistence boundary
// Builds a realistic project, saves it, loads it back, and rebuilds the
// live arrangement against the loaded records

use std::sync::{Arc, Mutex};

use beatline::arrangement::{
    Note, Pattern, PlaylistElement, Sample, ScheduledPattern, ScheduledSample, Score,
};
use beatline::project::{
    ArrangementSources, ProjectManager, pattern_from_record, pattern_to_record,
    playlist_from_record, playlist_to_record, sample_from_record, sample_to_record,
};
use beatline::sequencer::{Beats, Ticks};
use beatline::{Playlist, PlaybackPayload};

fn build_melody_pattern() -> Pattern {
    let mut pattern = Pattern::create("Melody");
    let mut lead = Score::new("lead");
    lead.add_note(Note::new(60, Beats::new(0.0), Beats::new(1.0)));
    lead.add_note(Note::new(62, Beats::new(1.0), Beats::new(1.0)));
    lead.add_note(Note::new(64, Beats::new(2.0), Beats::new(1.0)));
    lead.add_note(Note::new(65, Beats::new(3.0), Beats::new(1.0)));
    pattern.add_score(lead);
    pattern
}

#[test]
fn test_complete_project_persistence() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("song.json");

    // Author a project: one pattern, one sample, a playlist placing the
    // pattern twice and the sample once
    let pattern = build_melody_pattern();
    let sample = Sample::create("kick", Beats::new(0.5));

    let shared_pattern = Arc::new(Mutex::new(pattern));
    let shared_sample = Arc::new(Mutex::new(sample));

    let mut playlist = Playlist::new(vec![
        PlaylistElement::Pattern(ScheduledPattern::new(
            Arc::clone(&shared_pattern),
            Beats::new(0.0),
            None,
        )),
        PlaylistElement::Pattern(ScheduledPattern::new(
            Arc::clone(&shared_pattern),
            Beats::new(8.0),
            Some(Beats::new(4.0)),
        )),
        PlaylistElement::Sample(ScheduledSample::new(
            Arc::clone(&shared_sample),
            Beats::new(4.0),
            None,
        )),
    ]);
    playlist.activate();

    let manager = ProjectManager::new();
    let mut project = manager.create_new_project("Integration Test Project");
    project.metadata.author = Some("Test User".to_string());
    project.patterns.clear();
    project
        .patterns
        .push(pattern_to_record(&shared_pattern.lock().unwrap()));
    project
        .samples
        .push(sample_to_record(&shared_sample.lock().unwrap()));
    project.playlist = playlist_to_record(&playlist);

    manager.save_to_path(&mut project, &path).unwrap();

    // Load it back and rebuild the live arrangement
    let loaded = manager.load_from_path(&path).unwrap();
    assert_eq!(loaded.metadata.name, "Integration Test Project");
    assert_eq!(loaded.metadata.author.as_deref(), Some("Test User"));
    assert_eq!(loaded.patterns.len(), 1);
    assert_eq!(loaded.samples.len(), 1);

    let mut sources = ArrangementSources::new();
    for record in loaded.patterns.clone() {
        let mut rebuilt = pattern_from_record(record).unwrap();
        rebuilt.activate();
        sources.insert_pattern(Arc::new(Mutex::new(rebuilt)));
    }
    for record in loaded.samples.clone() {
        sources.insert_sample(Arc::new(Mutex::new(sample_from_record(record).unwrap())));
    }

    let mut rebuilt_playlist = playlist_from_record(loaded.playlist.clone(), &sources).unwrap();
    assert_eq!(rebuilt_playlist.elements().len(), 3);
    rebuilt_playlist.activate();

    // The rebuilt arrangement plays: both pattern placements and the sample
    // fire on the fresh master transport
    let transport = rebuilt_playlist.transport().clone();
    transport.start();
    transport.advance(Ticks(16 * 480));

    let events = transport.drain_events();
    let pattern_starts = events
        .iter()
        .filter(|e| {
            matches!(e.payload, PlaybackPayload::Pattern { .. })
                && e.phase == beatline::EventPhase::Start
        })
        .count();
    let sample_starts = events
        .iter()
        .filter(|e| matches!(e.payload, PlaybackPayload::Sample { .. }))
        .count();
    assert_eq!(pattern_starts, 2);
    assert!(sample_starts >= 1);
}

#[test]
fn test_shared_pattern_edit_reaches_every_placement_after_reload() {
    // Place one pattern twice, reload, edit the single shared source, and
    // check both placements observe the edit
    let shared_pattern = Arc::new(Mutex::new(build_melody_pattern()));

    let playlist = Playlist::new(vec![
        PlaylistElement::Pattern(ScheduledPattern::new(
            Arc::clone(&shared_pattern),
            Beats::new(0.0),
            None,
        )),
        PlaylistElement::Pattern(ScheduledPattern::new(
            Arc::clone(&shared_pattern),
            Beats::new(8.0),
            None,
        )),
    ]);

    let pattern_record = pattern_to_record(&shared_pattern.lock().unwrap());
    let playlist_record = playlist_to_record(&playlist);

    let reloaded_pattern = Arc::new(Mutex::new(pattern_from_record(pattern_record).unwrap()));
    let mut sources = ArrangementSources::new();
    sources.insert_pattern(Arc::clone(&reloaded_pattern));
    let rebuilt = playlist_from_record(playlist_record, &sources).unwrap();

    // Edit through the shared source
    {
        let mut pattern = reloaded_pattern.lock().unwrap();
        pattern.scores_mut()[0].add_note(Note::new(72, Beats::new(6.0), Beats::new(2.0)));
    }

    for element in rebuilt.elements() {
        let PlaylistElement::Pattern(placement) = element else {
            panic!("expected pattern placements");
        };
        let pattern = placement.pattern().lock().unwrap();
        assert_eq!(pattern.scores()[0].len(), 5);
        drop(pattern);
        assert_eq!(placement.effective_duration(), Beats::new(8.0));
    }
}

#[test]
fn test_unknown_project_fields_survive_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("song.json");

    let manager = ProjectManager::new();
    let mut project = manager.create_new_project("Forward Compatible");
    project
        .extra
        .insert("themeColor".to_string(), serde_json::json!("#ff00ff"));
    project.patterns[0]
        .extra
        .insert("dude".to_string(), serde_json::json!("test"));

    manager.save_to_path(&mut project, &path).unwrap();
    let loaded = manager.load_from_path(&path).unwrap();

    assert_eq!(loaded.extra.get("themeColor").unwrap(), "#ff00ff");
    assert_eq!(loaded.patterns[0].extra.get("dude").unwrap(), "test");
}

#[test]
fn test_disposed_arrangement_stays_silent_after_reload_of_sources() {
    let shared_pattern = Arc::new(Mutex::new(build_melody_pattern()));
    let mut playlist = Playlist::new(vec![PlaylistElement::Pattern(ScheduledPattern::new(
        Arc::clone(&shared_pattern),
        Beats::new(0.0),
        None,
    ))]);
    playlist.activate();

    let transport = playlist.transport().clone();
    playlist.dispose().unwrap();

    transport.start();
    transport.advance(Ticks(32 * 480));
    assert!(transport.drain_events().is_empty());

    // The shared pattern itself is untouched by playlist disposal
    let mut pattern = shared_pattern.lock().unwrap();
    assert!(!pattern.is_disposed());
    pattern.activate();
    assert!(pattern.transport().scheduled_count() > 0);
}
