// Sequencer module
// Musical time representation, the transport clock, and the Schedulable capability

pub mod schedulable;
pub mod timebase;
pub mod transport;

pub use schedulable::{Schedulable, ScheduleError, ScheduleSlot};
pub use timebase::{Beats, PPQN, Tempo, Ticks, TimeSignature};
pub use transport::{EventHandle, EventPhase, PlaybackEvent, PlaybackPayload, Transport};
