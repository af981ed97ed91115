// Pattern - a named, reusable clip of one or more scores
// Owns a private transport so durations and offsets can be queried without
// an external clock

use uuid::Uuid;

use crate::sequencer::schedulable::{Schedulable, ScheduleError};
use crate::sequencer::timebase::Beats;
use crate::sequencer::transport::Transport;

use super::ExtraFields;
use super::score::Score;

/// Default minimum pattern length: one 4/4 bar
pub const DEFAULT_MIN_DURATION: Beats = Beats(4.0);

/// A reusable clip composed of one or more scores
///
/// The pattern exclusively owns its scores and notes. Its private transport
/// exists purely for internal timing bookkeeping and is never serialized.
#[derive(Debug)]
pub struct Pattern {
    id: Uuid,
    name: String,
    scores: Vec<Score>,
    transport: Transport,
    min_duration: Beats,
    active: bool,
    disposed: bool,
    extra: ExtraFields,
}

impl Pattern {
    /// Factory: fresh v4 UUID, empty score list, fresh private transport
    pub fn create(name: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), name)
    }

    /// Construct with a known id (deserialization path)
    ///
    /// Construction is pure; call [`Pattern::activate`] to register the
    /// contained notes on the private transport.
    pub fn with_id(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            scores: Vec::new(),
            transport: Transport::new(),
            min_duration: DEFAULT_MIN_DURATION,
            active: false,
            disposed: false,
            extra: ExtraFields::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.assert_live();
        self.name = name.into();
    }

    pub fn scores(&self) -> &[Score] {
        &self.scores
    }

    pub fn scores_mut(&mut self) -> &mut [Score] {
        self.assert_live();
        &mut self.scores
    }

    /// The pattern's private timing transport
    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Whether the contained notes are registered on the private transport
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Register every note of every score on the private transport
    ///
    /// The explicit second phase of the lifecycle; construction never
    /// schedules anything.
    pub fn activate(&mut self) {
        self.assert_live();
        let transport = self.transport.clone();
        for score in &mut self.scores {
            score.schedule(&transport);
        }
        self.active = true;
    }

    /// Add a score; an active pattern registers its notes immediately
    pub fn add_score(&mut self, mut score: Score) {
        self.assert_live();
        if self.active {
            let transport = self.transport.clone();
            score.schedule(&transport);
        }
        self.scores.push(score);
    }

    /// Derived length with a configurable floor
    ///
    /// `max(min_duration, furthest note end across all scores)`. The floor
    /// defaults to one 4/4 bar so an empty pattern still occupies a measure.
    pub fn duration(&self) -> Beats {
        self.scores
            .iter()
            .fold(self.min_duration, |max, score| max.max(score.duration()))
    }

    pub fn min_duration(&self) -> Beats {
        self.min_duration
    }

    pub fn set_min_duration(&mut self, floor: Beats) {
        assert!(floor.value() > 0.0, "Pattern duration floor must be > 0");
        self.min_duration = floor;
    }

    /// Remove, while disposing, every score matching `predicate`
    ///
    /// One filter-and-dispose pass over a freshly built retained list, so
    /// removal can never skip or double-visit a score. Matched scores are
    /// disposed before they are detached; a failed teardown is logged and
    /// the pass continues.
    pub fn remove_scores(&mut self, predicate: impl Fn(&Score) -> bool) {
        self.assert_live();
        let mut retained = Vec::with_capacity(self.scores.len());
        for mut score in std::mem::take(&mut self.scores) {
            if predicate(&score) {
                if let Err(err) = score.dispose() {
                    log::warn!("pattern {}: score teardown failed: {err}", self.id);
                }
            } else {
                retained.push(score);
            }
        }
        self.scores = retained;
    }

    /// Dispose every score (and with it every note), then become inert
    pub fn dispose(&mut self) -> Result<(), ScheduleError> {
        self.assert_live();
        let mut first_error = None;
        for score in &mut self.scores {
            if let Err(err) = score.dispose() {
                log::warn!("pattern {}: score teardown failed: {err}", self.id);
                first_error.get_or_insert(err);
            }
        }
        self.scores.clear();
        self.active = false;
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
        assert!(!self.disposed, "Operation on a disposed pattern");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrangement::note::Note;
    use crate::sequencer::timebase::Ticks;

    fn score_with_note(id: &str, row: i32, time: f64, duration: f64) -> Score {
        let mut score = Score::new(id);
        score.add_note(Note::new(row, Beats::new(time), Beats::new(duration)));
        score
    }

    #[test]
    fn test_create_allocates_unique_ids() {
        let a = Pattern::create("A");
        let b = Pattern::create("B");
        assert_ne!(a.id(), b.id());
        assert_eq!(a.name(), "A");
        assert!(!a.is_active());
    }

    #[test]
    fn test_empty_pattern_duration_floor() {
        let pattern = Pattern::create("empty");
        assert_eq!(pattern.duration(), Beats::new(4.0));
    }

    #[test]
    fn test_duration_floor_dominates_short_content() {
        let mut pattern = Pattern::create("short");
        pattern.add_score(score_with_note("lead", 44, 0.0, 1.0));
        // Score reports 1 beat; the pattern still reports one full bar
        assert_eq!(pattern.scores()[0].duration(), Beats::new(1.0));
        assert_eq!(pattern.duration(), Beats::new(4.0));
    }

    #[test]
    fn test_long_content_beats_the_floor() {
        let mut pattern = Pattern::create("long");
        pattern.add_score(score_with_note("lead", 60, 10.0, 2.0));
        assert_eq!(pattern.duration(), Beats::new(12.0));
    }

    #[test]
    fn test_configurable_floor() {
        let mut pattern = Pattern::create("waltz");
        pattern.set_min_duration(Beats::new(3.0));
        assert_eq!(pattern.duration(), Beats::new(3.0));
    }

    #[test]
    fn test_activate_registers_all_notes() {
        let mut pattern = Pattern::create("A");
        pattern.add_score(score_with_note("lead", 60, 0.0, 1.0));
        pattern.add_score(score_with_note("bass", 36, 1.0, 1.0));
        assert_eq!(pattern.transport().scheduled_count(), 0);

        pattern.activate();
        assert_eq!(pattern.transport().scheduled_count(), 2);
    }

    #[test]
    fn test_add_score_to_active_pattern_registers_it() {
        let mut pattern = Pattern::create("A");
        pattern.activate();
        pattern.add_score(score_with_note("lead", 60, 0.0, 1.0));
        assert_eq!(pattern.transport().scheduled_count(), 1);
    }

    #[test]
    fn test_remove_scores_disposes_matches_only() {
        let mut pattern = Pattern::create("A");
        pattern.add_score(score_with_note("keep-1", 60, 0.0, 1.0));
        pattern.add_score(score_with_note("drop-1", 61, 0.0, 1.0));
        pattern.add_score(score_with_note("keep-2", 62, 0.0, 1.0));
        pattern.add_score(score_with_note("drop-2", 63, 0.0, 1.0));
        pattern.activate();
        assert_eq!(pattern.transport().scheduled_count(), 4);

        pattern.remove_scores(|score| score.id().starts_with("drop"));

        assert_eq!(pattern.scores().len(), 2);
        assert_eq!(pattern.scores()[0].id(), "keep-1");
        assert_eq!(pattern.scores()[1].id(), "keep-2");
        // No orphaned registrations from the removed scores
        assert_eq!(pattern.transport().scheduled_count(), 2);
    }

    #[test]
    fn test_dispose_then_advance_is_silent() {
        let mut pattern = Pattern::create("A");
        pattern.add_score(score_with_note("lead", 60, 0.0, 1.0));
        pattern.activate();

        let transport = pattern.transport().clone();
        assert!(pattern.dispose().is_ok());

        // The former registration windows must be dead
        transport.start();
        transport.advance(Ticks(8 * 480));
        assert!(transport.drain_events().is_empty());
    }

    #[test]
    #[should_panic(expected = "disposed pattern")]
    fn test_operation_after_dispose_panics() {
        let mut pattern = Pattern::create("A");
        let _ = pattern.dispose();
        pattern.add_score(Score::new("lead"));
    }
}
