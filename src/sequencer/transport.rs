// Transport - the beat-based scheduling clock
// Registers timed callbacks and fires them as the playhead advances

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use uuid::Uuid;

use super::timebase::{Beats, Tempo, Ticks, TimeSignature};

/// Opaque handle to one registration on a transport
///
/// Handles are only meaningful on the transport that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventHandle(u64);

/// Which edge of a scheduled event is firing
///
/// `Start`/`End` pair up the way NoteOn/NoteOff do in a MIDI stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPhase {
    Start,
    End,
}

/// What a fired event refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackPayload {
    /// A pitched note event; `row` is the piano-roll row
    Note { row: i32 },
    /// A pattern placement on the arrangement
    Pattern { id: Uuid },
    /// An audio sample placement
    Sample { id: Uuid },
    /// An automation clip placement
    Automation { id: Uuid },
}

/// A playback notification emitted by a fired registration
///
/// The external audio engine drains these via [`Transport::drain_events`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackEvent {
    pub tick: Ticks,
    pub phase: EventPhase,
    pub payload: PlaybackPayload,
}

/// Callback invoked when a registration fires
pub type EventCallback = Box<dyn FnMut(EventPhase, Ticks) + Send>;

struct ScheduledEvent {
    start: Ticks,
    end: Ticks,
    callback: EventCallback,
}

struct TransportInner {
    events: HashMap<EventHandle, ScheduledEvent>,
    next_handle: u64,

    playing: bool,
    position: Ticks,

    loop_enabled: bool,
    loop_start: Ticks,
    loop_end: Ticks,

    tempo: Tempo,
    signature: TimeSignature,
}

/// The shared musical clock
///
/// Cheap to clone; clones refer to the same clock. Every aggregate that needs
/// internal timing (Pattern, Playlist) owns its own `Transport` and never
/// shares it with another aggregate.
#[derive(Clone)]
pub struct Transport {
    inner: Arc<Mutex<TransportInner>>,
    sink: Arc<Mutex<Vec<PlaybackEvent>>>,
}

impl Transport {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(TransportInner {
                events: HashMap::new(),
                next_handle: 1,
                playing: false,
                position: Ticks::ZERO,
                loop_enabled: false,
                loop_start: Ticks::ZERO,
                loop_end: Ticks::ZERO,
                tempo: Tempo::default(),
                signature: TimeSignature::default(),
            })),
            sink: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Whether two transport values refer to the same underlying clock
    pub fn same_transport(&self, other: &Transport) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn lock(&self) -> MutexGuard<'_, TransportInner> {
        // A panic mid-callback must not wedge the clock for everyone else
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a callback at `time` for `duration`, both in beats
    ///
    /// Beat values are converted to ticks rounding up, so a registration
    /// never fires before its nominal musical time. The callback fires once
    /// with [`EventPhase::Start`] and once with [`EventPhase::End`]. It must
    /// not call back into this transport.
    pub fn schedule<F>(&self, time: Beats, duration: Beats, callback: F) -> EventHandle
    where
        F: FnMut(EventPhase, Ticks) + Send + 'static,
    {
        assert!(time.value() >= 0.0, "Scheduled time must be >= 0");
        assert!(
            duration.value() > 0.0,
            "Scheduled duration must be positive"
        );

        let start = time.to_ticks();
        let mut end = (time + duration).to_ticks();
        if end <= start {
            // Sub-tick durations still get a well-ordered Start/End pair
            end = start + Ticks(1);
        }

        let mut inner = self.lock();
        let handle = EventHandle(inner.next_handle);
        inner.next_handle += 1;
        inner.events.insert(
            handle,
            ScheduledEvent {
                start,
                end,
                callback: Box::new(callback),
            },
        );
        handle
    }

    /// Register a callback that emits `payload` into the playback event sink
    pub fn schedule_payload(
        &self,
        time: Beats,
        duration: Beats,
        payload: PlaybackPayload,
    ) -> EventHandle {
        let sink = Arc::clone(&self.sink);
        self.schedule(time, duration, move |phase, tick| {
            let mut sink = sink.lock().unwrap_or_else(PoisonError::into_inner);
            sink.push(PlaybackEvent {
                tick,
                phase,
                payload,
            });
        })
    }

    /// Cancel one registration
    ///
    /// Returns `false` when the handle is stale (already cancelled); stale
    /// handles are a defensive no-op, never an error.
    pub fn unschedule(&self, handle: EventHandle) -> bool {
        self.lock().events.remove(&handle).is_some()
    }

    /// Number of live registrations
    pub fn scheduled_count(&self) -> usize {
        self.lock().events.len()
    }

    pub fn start(&self) {
        self.lock().playing = true;
    }

    pub fn stop(&self) {
        self.lock().playing = false;
    }

    pub fn is_playing(&self) -> bool {
        self.lock().playing
    }

    /// Move the playhead without firing anything
    pub fn seek(&self, position: Beats) {
        self.lock().position = position.to_ticks();
    }

    pub fn position(&self) -> Ticks {
        self.lock().position
    }

    pub fn set_loop_enabled(&self, enabled: bool) {
        self.lock().loop_enabled = enabled;
    }

    pub fn set_loop_region(&self, start: Beats, end: Beats) {
        assert!(
            end.value() > start.value(),
            "Loop end must be after loop start"
        );
        let mut inner = self.lock();
        inner.loop_start = start.to_ticks();
        inner.loop_end = end.to_ticks();
    }

    pub fn tempo(&self) -> Tempo {
        self.lock().tempo
    }

    pub fn set_tempo(&self, tempo: Tempo) {
        self.lock().tempo = tempo;
    }

    pub fn signature(&self) -> TimeSignature {
        self.lock().signature
    }

    pub fn set_signature(&self, signature: TimeSignature) {
        self.lock().signature = signature;
    }

    /// Advance the playhead by `delta` ticks, firing due registrations
    ///
    /// Fires the Start phase of every registration whose start tick lies in
    /// the traversed window and the End phase of every one whose end tick
    /// does, wrapping at the loop end when looping is enabled. Does nothing
    /// while stopped. Ends fire before Starts that share a tick.
    pub fn advance(&self, delta: Ticks) {
        let mut inner = self.lock();
        if !inner.playing {
            return;
        }

        let mut remaining = delta.value();
        let mut cursor = inner.position;
        while remaining > 0 {
            let loop_active = inner.loop_enabled
                && inner.loop_end > inner.loop_start
                && cursor < inner.loop_end;
            let window_end = Ticks(cursor.value() + remaining);
            if loop_active && window_end >= inner.loop_end {
                let segment_end = inner.loop_end;
                fire_window(&mut inner, cursor, segment_end);
                // A registration running exactly to the loop boundary must
                // close before the playhead wraps, or its End is lost and
                // the next pass refires an unpaired Start
                fire_ends_at(&mut inner, segment_end);
                remaining -= (segment_end - cursor).value();
                cursor = inner.loop_start;
            } else {
                fire_window(&mut inner, cursor, window_end);
                cursor = window_end;
                remaining = 0;
            }
        }
        inner.position = cursor;
    }

    /// Take every playback event emitted since the previous drain
    pub fn drain_events(&self) -> Vec<PlaybackEvent> {
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *sink)
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("Transport")
            .field("playing", &inner.playing)
            .field("position", &inner.position)
            .field("events", &inner.events.len())
            .finish()
    }
}

/// Fire the End edge of every registration ending exactly at `tick`
///
/// Loop-wrap flush: windows are half-open, so an End sitting on the loop
/// boundary is never inside any traversed window.
fn fire_ends_at(inner: &mut TransportInner, tick: Ticks) {
    let due: Vec<EventHandle> = inner
        .events
        .iter()
        .filter(|(_, event)| event.end == tick)
        .map(|(handle, _)| *handle)
        .collect();
    for handle in due {
        if let Some(event) = inner.events.get_mut(&handle) {
            (event.callback)(EventPhase::End, tick);
        }
    }
}

/// Fire every registration edge that falls in `[start, end)`
fn fire_window(inner: &mut TransportInner, start: Ticks, end: Ticks) {
    let mut due: Vec<(EventHandle, EventPhase, Ticks)> = Vec::new();
    for (handle, event) in &inner.events {
        if event.start >= start && event.start < end {
            due.push((*handle, EventPhase::Start, event.start));
        }
        if event.end >= start && event.end < end {
            due.push((*handle, EventPhase::End, event.end));
        }
    }

    // Tick order; NoteOff-style Ends ahead of Starts on the same tick
    due.sort_by_key(|(_, phase, tick)| (*tick, *phase == EventPhase::Start));

    for (handle, phase, tick) in due {
        if let Some(event) = inner.events.get_mut(&handle) {
            (event.callback)(phase, tick);
        }
    }
}
