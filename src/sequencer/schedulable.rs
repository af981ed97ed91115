// Schedulable - the capability of holding timed registrations on a transport

use super::transport::{EventHandle, Transport};

/// Recoverable problems while tearing scheduled state down
///
/// Bulk disposal loops catch and log these instead of aborting; see the
/// `dispose` implementations in the arrangement module.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    /// A registration this entity believed it owned was already gone
    #[error("registration was already cancelled on the transport")]
    StaleRegistration,
}

/// Anything that can register timed playback callbacks against a transport
///
/// Lifecycle is two-phase: construction never touches a transport; callers
/// schedule explicitly. An entity is never registered on two transports at
/// once — scheduling while already bound elsewhere cancels the old binding
/// first.
pub trait Schedulable {
    /// Register this entity's callbacks on `transport`
    fn schedule(&mut self, transport: &Transport);

    /// Cancel this entity's registrations, leaving it schedulable again
    fn unschedule(&mut self);

    fn is_scheduled(&self) -> bool;
}

/// Bookkeeping shared by every Schedulable implementation
///
/// Remembers which transport the entity is bound to and which handles it
/// owns there, so cancellation touches exactly this entity's registrations.
#[derive(Debug, Default)]
pub struct ScheduleSlot {
    binding: Option<(Transport, Vec<EventHandle>)>,
}

impl ScheduleSlot {
    pub fn new() -> Self {
        Self { binding: None }
    }

    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    /// The transport this slot is currently bound to, if any
    pub fn transport(&self) -> Option<&Transport> {
        self.binding.as_ref().map(|(transport, _)| transport)
    }

    /// Record a fresh binding, cancelling any previous one first
    pub fn bind(&mut self, transport: &Transport, handles: Vec<EventHandle>) {
        if self.release().is_err() {
            log::warn!("stale registration found while rebinding to a new transport");
        }
        self.binding = Some((transport.clone(), handles));
    }

    /// Append a handle to the current binding
    ///
    /// The handle must come from the bound transport.
    pub fn push_handle(&mut self, transport: &Transport, handle: EventHandle) {
        match &mut self.binding {
            Some((bound, handles)) => {
                assert!(
                    bound.same_transport(transport),
                    "Handle belongs to a different transport than the bound one"
                );
                handles.push(handle);
            }
            None => self.binding = Some((transport.clone(), vec![handle])),
        }
    }

    /// Cancel every handle and clear the binding
    ///
    /// Returns `Err` when some registration had already vanished; callers in
    /// bulk disposal loops log this and keep going.
    pub fn release(&mut self) -> Result<(), ScheduleError> {
        let Some((transport, handles)) = self.binding.take() else {
            return Ok(());
        };
        let mut stale = false;
        for handle in handles {
            stale |= !transport.unschedule(handle);
        }
        if stale {
            Err(ScheduleError::StaleRegistration)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::timebase::Beats;
    use crate::sequencer::transport::PlaybackPayload;

    #[test]
    fn test_release_cancels_all_handles() {
        let transport = Transport::new();
        let mut slot = ScheduleSlot::new();
        for row in 0..3 {
            let handle = transport.schedule_payload(
                Beats::ZERO,
                Beats::new(1.0),
                PlaybackPayload::Note { row },
            );
            slot.push_handle(&transport, handle);
        }
        assert_eq!(transport.scheduled_count(), 3);

        assert!(slot.release().is_ok());
        assert_eq!(transport.scheduled_count(), 0);
        assert!(!slot.is_bound());
    }

    #[test]
    fn test_release_reports_stale_registration() {
        let transport = Transport::new();
        let mut slot = ScheduleSlot::new();
        let handle = transport.schedule_payload(
            Beats::ZERO,
            Beats::new(1.0),
            PlaybackPayload::Note { row: 60 },
        );
        slot.push_handle(&transport, handle);

        // Someone cancelled behind the slot's back
        transport.unschedule(handle);

        assert!(matches!(
            slot.release(),
            Err(ScheduleError::StaleRegistration)
        ));
        assert!(!slot.is_bound());
    }

    #[test]
    fn test_bind_replaces_previous_transport() {
        let first = Transport::new();
        let second = Transport::new();
        let mut slot = ScheduleSlot::new();

        let handle = first.schedule_payload(
            Beats::ZERO,
            Beats::new(1.0),
            PlaybackPayload::Note { row: 60 },
        );
        slot.push_handle(&first, handle);

        let handle2 = second.schedule_payload(
            Beats::ZERO,
            Beats::new(1.0),
            PlaybackPayload::Note { row: 60 },
        );
        slot.bind(&second, vec![handle2]);

        // The old transport no longer holds this entity's registration
        assert_eq!(first.scheduled_count(), 0);
        assert_eq!(second.scheduled_count(), 1);
        assert!(slot.transport().unwrap().same_transport(&second));
    }

    #[test]
    #[should_panic(expected = "different transport")]
    fn test_push_handle_across_transports_panics() {
        let first = Transport::new();
        let second = Transport::new();
        let mut slot = ScheduleSlot::new();

        let h1 = first.schedule_payload(
            Beats::ZERO,
            Beats::new(1.0),
            PlaybackPayload::Note { row: 1 },
        );
        slot.push_handle(&first, h1);

        let h2 = second.schedule_payload(
            Beats::ZERO,
            Beats::new(1.0),
            PlaybackPayload::Note { row: 2 },
        );
        slot.push_handle(&second, h2);
    }
}
