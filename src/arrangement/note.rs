// Note - a pitched event inside a Score

use crate::sequencer::schedulable::{Schedulable, ScheduleError, ScheduleSlot};
use crate::sequencer::timebase::Beats;
use crate::sequencer::transport::{PlaybackPayload, Transport};

use super::ExtraFields;

/// A pitched event at a beat position
///
/// `row` is the piano-roll row. Time and duration are beats; the note knows
/// nothing about ticks or real time.
#[derive(Debug)]
pub struct Note {
    row: i32,
    time: Beats,
    duration: Beats,
    slot: ScheduleSlot,
    extra: ExtraFields,
}

impl Note {
    /// Creates a new note
    pub fn new(row: i32, time: Beats, duration: Beats) -> Self {
        assert!(time.value() >= 0.0, "Note time must be >= 0");
        assert!(duration.value() > 0.0, "Note duration must be > 0");

        Self {
            row,
            time,
            duration,
            slot: ScheduleSlot::new(),
            extra: ExtraFields::new(),
        }
    }

    pub fn row(&self) -> i32 {
        self.row
    }

    pub fn time(&self) -> Beats {
        self.time
    }

    pub fn duration(&self) -> Beats {
        self.duration
    }

    /// Beat at which the note ends
    pub fn end(&self) -> Beats {
        self.time + self.duration
    }

    pub fn set_row(&mut self, row: i32) {
        self.row = row;
        self.reschedule_if_bound();
    }

    pub fn set_time(&mut self, time: Beats) {
        assert!(time.value() >= 0.0, "Note time must be >= 0");
        self.time = time;
        self.reschedule_if_bound();
    }

    pub fn set_duration(&mut self, duration: Beats) {
        assert!(duration.value() > 0.0, "Note duration must be > 0");
        self.duration = duration;
        self.reschedule_if_bound();
    }

    /// Unknown persisted fields carried through decode and re-encode
    pub fn extra(&self) -> &ExtraFields {
        &self.extra
    }

    pub fn set_extra(&mut self, extra: ExtraFields) {
        self.extra = extra;
    }

    /// Cancel this note's registration as part of teardown
    pub fn dispose(&mut self) -> Result<(), ScheduleError> {
        self.slot.release()
    }

    // An edit to a live note moves its registration in place
    fn reschedule_if_bound(&mut self) {
        if let Some(transport) = self.slot.transport().cloned() {
            self.schedule(&transport);
        }
    }
}

impl Schedulable for Note {
    fn schedule(&mut self, transport: &Transport) {
        let handle = transport.schedule_payload(
            self.time,
            self.duration,
            PlaybackPayload::Note { row: self.row },
        );
        // bind() cancels any previous registration, including one on
        // another transport
        self.slot.bind(transport, vec![handle]);
    }

    fn unschedule(&mut self) {
        if self.slot.release().is_err() {
            log::warn!("note registration was already cancelled");
        }
    }

    fn is_scheduled(&self) -> bool {
        self.slot.is_bound()
    }
}
