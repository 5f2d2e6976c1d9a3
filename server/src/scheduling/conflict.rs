use super::{RoomConflict, TimeSlot};
use crate::data_store::models::Event;
use crate::data_store::{EventId, RoomId, StoreError};
use log::debug;

/// Read access to the events of a room, as required by the [ConflictChecker].
///
/// Implemented by the data store backends on top of their (transactional) connection.
pub trait RoomEventSource {
    /// Get the events in room `room_id` which might overlap the `window`, leaving out the event
    /// with id `exclude`.
    ///
    /// Implementations may return more events than strictly necessary (e.g. all events of the
    /// room). The [ConflictChecker] applies the overlap rule on the returned events by itself.
    fn room_events_near(
        &mut self,
        room_id: RoomId,
        window: &TimeSlot,
        exclude: Option<EventId>,
    ) -> Result<Vec<Event>, StoreError>;
}

impl RoomEventSource for Vec<Event> {
    fn room_events_near(
        &mut self,
        room_id: RoomId,
        _window: &TimeSlot,
        exclude: Option<EventId>,
    ) -> Result<Vec<Event>, StoreError> {
        Ok(self
            .iter()
            .filter(|e| e.room_id == room_id && Some(e.id) != exclude)
            .cloned()
            .collect())
    }
}

/// Decide if the stored `event` blocks room `room_id` for the `slot`.
///
/// This is the one conflict rule: same room, not the excluded event, and overlapping time slots.
pub fn is_conflicting(
    event: &Event,
    room_id: RoomId,
    slot: &TimeSlot,
    exclude: Option<EventId>,
) -> bool {
    event.room_id == room_id && Some(event.id) != exclude && slot.overlaps(&event.time_slot())
}

/// Detects events that occupy a room during a requested time slot.
///
/// The checker never modifies any data. For the result to stay valid until a subsequent write,
/// the caller must hold the room's lock (see [crate::data_store]).
pub struct ConflictChecker<'a, S: RoomEventSource + ?Sized> {
    source: &'a mut S,
}

impl<'a, S: RoomEventSource + ?Sized> ConflictChecker<'a, S> {
    pub fn new(source: &'a mut S) -> Self {
        Self { source }
    }

    /// Check if any event other than `exclude` occupies room `room_id` during `slot`.
    pub fn has_conflict(
        &mut self,
        room_id: RoomId,
        slot: &TimeSlot,
        exclude: Option<EventId>,
    ) -> Result<bool, StoreError> {
        Ok(self
            .source
            .room_events_near(room_id, slot, exclude)?
            .iter()
            .any(|e| is_conflicting(e, room_id, slot, exclude)))
    }

    /// Get all events other than `exclude` that occupy room `room_id` during `slot`, in
    /// chronological order.
    pub fn conflicting_events(
        &mut self,
        room_id: RoomId,
        slot: &TimeSlot,
        exclude: Option<EventId>,
    ) -> Result<Vec<Event>, StoreError> {
        let mut result: Vec<Event> = self
            .source
            .room_events_near(room_id, slot, exclude)?
            .into_iter()
            .filter(|e| is_conflicting(e, room_id, slot, exclude))
            .collect();
        result.sort_by_key(|e| (e.start_time, e.end_time, e.id));
        Ok(result)
    }

    /// Fail with [StoreError::RoomConflict] if room `room_id` is occupied during `slot` by any
    /// event other than `exclude`. The error names the earliest blocking event.
    pub fn ensure_free(
        &mut self,
        room_id: RoomId,
        slot: &TimeSlot,
        exclude: Option<EventId>,
    ) -> Result<(), StoreError> {
        let blocking_event = self
            .conflicting_events(room_id, slot, exclude)?
            .into_iter()
            .next();
        match blocking_event {
            None => Ok(()),
            Some(blocking_event) => {
                debug!(
                    "Room {} is blocked during {} by event {}",
                    room_id, slot, blocking_event.id
                );
                Err(StoreError::RoomConflict(RoomConflict {
                    room_id,
                    requested: *slot,
                    blocking_event: Some(blocking_event),
                }))
            }
        }
    }
}
