// Playlist - the top-level arrangement
// Placed elements hold shared references to their sources: one pattern may
// be placed many times, and an edit to it is visible from every placement

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::sequencer::schedulable::{Schedulable, ScheduleError, ScheduleSlot};
use crate::sequencer::timebase::{Beats, Ticks};
use crate::sequencer::transport::{PlaybackPayload, Transport};

use super::ExtraFields;
use super::automation::AutomationClip;
use super::pattern::Pattern;
use super::sample::Sample;

pub type SharedPattern = Arc<Mutex<Pattern>>;
pub type SharedSample = Arc<Mutex<Sample>>;
pub type SharedAutomation = Arc<Mutex<AutomationClip>>;

fn lock<T>(shared: &Mutex<T>) -> MutexGuard<'_, T> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A pattern instance placed on the arrangement timeline
///
/// The placement duration may differ from the pattern's natural duration
/// (trimming or looping the clip). When unset, the live pattern's current
/// duration applies.
#[derive(Debug)]
pub struct ScheduledPattern {
    pattern: SharedPattern,
    time: Beats,
    duration: Option<Beats>,
    slot: ScheduleSlot,
    extra: ExtraFields,
}

impl ScheduledPattern {
    pub fn new(pattern: SharedPattern, time: Beats, duration: Option<Beats>) -> Self {
        assert!(time.value() >= 0.0, "Placement time must be >= 0");
        if let Some(duration) = duration {
            assert!(duration.value() > 0.0, "Placement duration must be > 0");
        }
        Self {
            pattern,
            time,
            duration,
            slot: ScheduleSlot::new(),
            extra: ExtraFields::new(),
        }
    }

    pub fn pattern(&self) -> &SharedPattern {
        &self.pattern
    }

    pub fn time(&self) -> Beats {
        self.time
    }

    pub fn duration_override(&self) -> Option<Beats> {
        self.duration
    }

    /// Placement duration, falling back to the live pattern's own
    pub fn effective_duration(&self) -> Beats {
        self.duration
            .unwrap_or_else(|| lock(&self.pattern).duration())
    }

    pub fn extra(&self) -> &ExtraFields {
        &self.extra
    }

    pub fn set_extra(&mut self, extra: ExtraFields) {
        self.extra = extra;
    }

    pub fn dispose(&mut self) -> Result<(), ScheduleError> {
        self.slot.release()
    }
}

impl Schedulable for ScheduledPattern {
    fn schedule(&mut self, transport: &Transport) {
        let id = lock(&self.pattern).id();
        let duration = self.effective_duration();
        let handle = transport.schedule_payload(self.time, duration, PlaybackPayload::Pattern { id });
        self.slot.bind(transport, vec![handle]);
    }

    fn unschedule(&mut self) {
        if self.slot.release().is_err() {
            log::warn!("pattern placement registration was already cancelled");
        }
    }

    fn is_scheduled(&self) -> bool {
        self.slot.is_bound()
    }
}

/// A sample region placed on the arrangement timeline
#[derive(Debug)]
pub struct ScheduledSample {
    sample: SharedSample,
    time: Beats,
    duration: Option<Beats>,
    slot: ScheduleSlot,
    extra: ExtraFields,
}

impl ScheduledSample {
    pub fn new(sample: SharedSample, time: Beats, duration: Option<Beats>) -> Self {
        assert!(time.value() >= 0.0, "Placement time must be >= 0");
        if let Some(duration) = duration {
            assert!(duration.value() > 0.0, "Placement duration must be > 0");
        }
        Self {
            sample,
            time,
            duration,
            slot: ScheduleSlot::new(),
            extra: ExtraFields::new(),
        }
    }

    pub fn sample(&self) -> &SharedSample {
        &self.sample
    }

    pub fn time(&self) -> Beats {
        self.time
    }

    pub fn duration_override(&self) -> Option<Beats> {
        self.duration
    }

    pub fn effective_duration(&self) -> Beats {
        self.duration
            .unwrap_or_else(|| lock(&self.sample).duration())
    }

    pub fn extra(&self) -> &ExtraFields {
        &self.extra
    }

    pub fn set_extra(&mut self, extra: ExtraFields) {
        self.extra = extra;
    }

    pub fn dispose(&mut self) -> Result<(), ScheduleError> {
        self.slot.release()
    }
}

impl Schedulable for ScheduledSample {
    fn schedule(&mut self, transport: &Transport) {
        let id = lock(&self.sample).id();
        let duration = self.effective_duration();
        let handle = transport.schedule_payload(self.time, duration, PlaybackPayload::Sample { id });
        self.slot.bind(transport, vec![handle]);
    }

    fn unschedule(&mut self) {
        if self.slot.release().is_err() {
            log::warn!("sample placement registration was already cancelled");
        }
    }

    fn is_scheduled(&self) -> bool {
        self.slot.is_bound()
    }
}

/// An automation clip placed on the arrangement timeline
///
/// The extent always comes from the clip itself; there is no trim override.
#[derive(Debug)]
pub struct ScheduledAutomation {
    clip: SharedAutomation,
    time: Beats,
    slot: ScheduleSlot,
    extra: ExtraFields,
}

impl ScheduledAutomation {
    pub fn new(clip: SharedAutomation, time: Beats) -> Self {
        assert!(time.value() >= 0.0, "Placement time must be >= 0");
        Self {
            clip,
            time,
            slot: ScheduleSlot::new(),
            extra: ExtraFields::new(),
        }
    }

    pub fn clip(&self) -> &SharedAutomation {
        &self.clip
    }

    pub fn time(&self) -> Beats {
        self.time
    }

    pub fn effective_duration(&self) -> Beats {
        lock(&self.clip).duration()
    }

    pub fn extra(&self) -> &ExtraFields {
        &self.extra
    }

    pub fn set_extra(&mut self, extra: ExtraFields) {
        self.extra = extra;
    }

    pub fn dispose(&mut self) -> Result<(), ScheduleError> {
        self.slot.release()
    }
}

impl Schedulable for ScheduledAutomation {
    fn schedule(&mut self, transport: &Transport) {
        let (id, duration) = {
            let clip = lock(&self.clip);
            assert!(!clip.is_empty(), "Cannot schedule an empty automation clip");
            // A clip whose points all sit at time zero still spans one tick
            (clip.id(), clip.duration().max(Ticks(1).to_beats()))
        };
        let handle =
            transport.schedule_payload(self.time, duration, PlaybackPayload::Automation { id });
        self.slot.bind(transport, vec![handle]);
    }

    fn unschedule(&mut self) {
        if self.slot.release().is_err() {
            log::warn!("automation placement registration was already cancelled");
        }
    }

    fn is_scheduled(&self) -> bool {
        self.slot.is_bound()
    }
}

/// The kinds of element that can be placed on a playlist
#[derive(Debug)]
pub enum PlaylistElement {
    Pattern(ScheduledPattern),
    Sample(ScheduledSample),
    Automation(ScheduledAutomation),
}

impl PlaylistElement {
    pub fn time(&self) -> Beats {
        match self {
            PlaylistElement::Pattern(p) => p.time(),
            PlaylistElement::Sample(s) => s.time(),
            PlaylistElement::Automation(a) => a.time(),
        }
    }

    pub fn effective_duration(&self) -> Beats {
        match self {
            PlaylistElement::Pattern(p) => p.effective_duration(),
            PlaylistElement::Sample(s) => s.effective_duration(),
            PlaylistElement::Automation(a) => a.effective_duration(),
        }
    }

    pub fn dispose(&mut self) -> Result<(), ScheduleError> {
        match self {
            PlaylistElement::Pattern(p) => p.dispose(),
            PlaylistElement::Sample(s) => s.dispose(),
            PlaylistElement::Automation(a) => a.dispose(),
        }
    }
}

impl Schedulable for PlaylistElement {
    fn schedule(&mut self, transport: &Transport) {
        match self {
            PlaylistElement::Pattern(p) => p.schedule(transport),
            PlaylistElement::Sample(s) => s.schedule(transport),
            PlaylistElement::Automation(a) => a.schedule(transport),
        }
    }

    fn unschedule(&mut self) {
        match self {
            PlaylistElement::Pattern(p) => p.unschedule(),
            PlaylistElement::Sample(s) => s.unschedule(),
            PlaylistElement::Automation(a) => a.unschedule(),
        }
    }

    fn is_scheduled(&self) -> bool {
        match self {
            PlaylistElement::Pattern(p) => p.is_scheduled(),
            PlaylistElement::Sample(s) => s.is_scheduled(),
            PlaylistElement::Automation(a) => a.is_scheduled(),
        }
    }
}

/// The top-level arrangement: placed elements against the master transport
///
/// Element order is arrangement z-order, not temporal order; elements may
/// overlap in time.
#[derive(Debug)]
pub struct Playlist {
    elements: Vec<PlaylistElement>,
    transport: Transport,
    active: bool,
    extra: ExtraFields,
}

impl Playlist {
    /// Construction is pure; call [`Playlist::activate`] to register the
    /// elements on the master transport.
    pub fn new(elements: Vec<PlaylistElement>) -> Self {
        Self {
            elements,
            transport: Transport::new(),
            active: false,
            extra: ExtraFields::new(),
        }
    }

    /// The master transport
    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn elements(&self) -> &[PlaylistElement] {
        &self.elements
    }

    pub fn elements_mut(&mut self) -> &mut [PlaylistElement] {
        &mut self.elements
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Register every element on the master transport
    pub fn activate(&mut self) {
        let transport = self.transport.clone();
        for element in &mut self.elements {
            element.schedule(&transport);
        }
        self.active = true;
    }

    /// Place an element; an active playlist registers it immediately
    pub fn push_element(&mut self, mut element: PlaylistElement) {
        if self.active {
            let transport = self.transport.clone();
            element.schedule(&transport);
        }
        self.elements.push(element);
    }

    /// Remove and return the element at `index`, cancelling its registration
    /// first
    pub fn remove_element(&mut self, index: usize) -> PlaylistElement {
        let mut element = self.elements.remove(index);
        element.unschedule();
        element
    }

    /// Unschedule every element and release them
    ///
    /// Symmetric with Pattern/Score disposal: a failing element teardown is
    /// logged and the loop keeps going.
    pub fn dispose(&mut self) -> Result<(), ScheduleError> {
        let mut first_error = None;
        for element in &mut self.elements {
            if let Err(err) = element.dispose() {
                log::warn!("playlist: element teardown failed: {err}");
                first_error.get_or_insert(err);
            }
        }
        self.elements.clear();
        self.active = false;
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub fn extra(&self) -> &ExtraFields {
        &self.extra
    }

    pub fn set_extra(&mut self, extra: ExtraFields) {
        self.extra = extra;
    }
}
