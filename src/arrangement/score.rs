// Score - the notes of one instrument/track within a Pattern

use crate::sequencer::schedulable::{Schedulable, ScheduleError};
use crate::sequencer::timebase::Beats;
use crate::sequencer::transport::Transport;

use super::ExtraFields;
use super::note::Note;

/// An ordered collection of notes for one instrument
///
/// Order is insertion order; it carries no temporal meaning but is stable
/// across a persistence round trip. A Score is owned by exactly one Pattern.
#[derive(Debug)]
pub struct Score {
    id: String,
    notes: Vec<Note>,
    transport: Option<Transport>,
    disposed: bool,
    extra: ExtraFields,
}

impl Score {
    /// Factory producing an empty score
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            notes: Vec::new(),
            transport: None,
            disposed: false,
            extra: ExtraFields::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn notes_mut(&mut self) -> &mut [Note] {
        self.assert_live();
        &mut self.notes
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    /// Derived length: the furthest note end, zero when empty
    ///
    /// Recomputed on every call; never cached.
    pub fn duration(&self) -> Beats {
        self.notes
            .iter()
            .fold(Beats::ZERO, |max, note| max.max(note.end()))
    }

    /// Add a note; a live score registers it on its transport immediately
    pub fn add_note(&mut self, mut note: Note) {
        self.assert_live();
        if let Some(transport) = &self.transport {
            note.schedule(transport);
        }
        self.notes.push(note);
    }

    /// Remove and return the note at `index`, cancelling its registration first
    pub fn remove_note(&mut self, index: usize) -> Note {
        self.assert_live();
        let mut note = self.notes.remove(index);
        note.unschedule();
        note
    }

    /// Unschedule every note, then release them
    ///
    /// A failing note teardown is logged and the loop keeps going; the
    /// remaining notes are still disposed.
    pub fn dispose(&mut self) -> Result<(), ScheduleError> {
        self.assert_live();
        let mut first_error = None;
        for note in &mut self.notes {
            if let Err(err) = note.dispose() {
                log::warn!("score {:?}: note teardown failed: {err}", self.id);
                first_error.get_or_insert(err);
            }
        }
        self.notes.clear();
        self.transport = None;
        self.disposed = true;
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn extra(&self) -> &ExtraFields {
        &self.extra
    }

    pub fn set_extra(&mut self, extra: ExtraFields) {
        self.extra = extra;
    }

    fn assert_live(&self) {
        assert!(!self.disposed, "Operation on a disposed score");
    }
}

impl Schedulable for Score {
    fn schedule(&mut self, transport: &Transport) {
        self.assert_live();
        for note in &mut self.notes {
            note.schedule(transport);
        }
        self.transport = Some(transport.clone());
    }

    fn unschedule(&mut self) {
        self.assert_live();
        for note in &mut self.notes {
            note.unschedule();
        }
        self.transport = None;
    }

    fn is_scheduled(&self) -> bool {
        self.transport.is_some()
    }
}
