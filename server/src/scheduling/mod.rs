//! Time slots and room conflict detection
//!
//! A room must never host two events whose time slots overlap. This module holds the single
//! definition of "overlap" ([TimeSlot::overlaps]), the [ConflictChecker] that applies it to the
//! events stored for a room, and the logic for merging partial event updates
//! ([merge_event_patch]).
//!
//! Time slots are half-open intervals `[start, end)`: an event ending at 10:00 and another one
//! starting at 10:00 in the same room do not conflict.
//!
//! The [ConflictChecker] is used by every store operation that places an event in a room
//! (creating, updating, rescheduling) and by the read-only availability check. The store
//! implementations are responsible for running the check and the subsequent write under one
//! per-room lock.

use crate::data_store::models::{Event, EventPatch, NewEvent};
use crate::data_store::{EventId, RoomId, StoreError};
use chrono::{DateTime, Utc};
use std::fmt::{Display, Formatter};

mod conflict;

pub use conflict::{is_conflicting, ConflictChecker, RoomEventSource};

/// A half-open time interval `[start, end)` with `start < end`.
///
/// The only way to create a TimeSlot from untrusted input is [TimeSlot::new], which rejects empty
/// and reversed intervals. Thus, all conflict checks can rely on a valid interval.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimeSlot {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeSlot {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, InvalidTimeSlot> {
        if start >= end {
            return Err(InvalidTimeSlot { start, end });
        }
        Ok(Self { start, end })
    }

    /// Create a TimeSlot from values read from the data store, which are guaranteed to satisfy
    /// `start < end` by the database schema.
    pub(crate) fn from_stored(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        debug_assert!(start < end, "stored time slot must not be empty");
        Self { start, end }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Check if two time slots overlap, i.e. share at least one instant.
    ///
    /// Touching slots (`self.end == other.start`) do not overlap.
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl Display for TimeSlot {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} - {}",
            self.start.format("%Y-%m-%d %H:%M"),
            self.end.format("%Y-%m-%d %H:%M")
        )
    }
}

impl From<TimeSlot> for schoolplan_api_types::TimeInterval {
    fn from(value: TimeSlot) -> Self {
        Self {
            start_time: value.start,
            end_time: value.end,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvalidTimeSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Display for InvalidTimeSlot {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "start_time ({}) must be earlier than end_time ({})",
            self.start.to_rfc3339(),
            self.end.to_rfc3339()
        )
    }
}

impl std::error::Error for InvalidTimeSlot {}

impl From<InvalidTimeSlot> for StoreError {
    fn from(value: InvalidTimeSlot) -> Self {
        StoreError::InvalidInputData(value.to_string())
    }
}

/// A rejected attempt to place an event in a room, because the room is occupied by another event
/// during (part of) the requested time.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomConflict {
    pub room_id: RoomId,
    pub requested: TimeSlot,
    /// The earliest of the events blocking the room
    pub blocking_event: Option<Event>,
}

impl Display for RoomConflict {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Room {} is already reserved for another event at the selected time ({}).",
            self.room_id, self.requested
        )?;
        if let Some(blocking_event) = &self.blocking_event {
            write!(
                f,
                " The conflicting event starts at {} and ends at {}.",
                blocking_event.start_time.format("%Y-%m-%d %H:%M"),
                blocking_event.end_time.format("%Y-%m-%d %H:%M")
            )?;
        }
        f.write_str(" Please choose a different room or time.")
    }
}

impl From<RoomConflict> for schoolplan_api_types::RoomConflict {
    fn from(value: RoomConflict) -> Self {
        Self {
            room_id: value.room_id,
            requested: value.requested.into(),
            blocking_event: value.blocking_event.map(|e| e.into()),
        }
    }
}

impl From<Event> for schoolplan_api_types::BlockingEvent {
    fn from(value: Event) -> Self {
        Self {
            id: value.id,
            start_time: value.start_time,
            end_time: value.end_time,
        }
    }
}

/// Result of applying an [EventPatch] to a stored event
#[derive(Debug, Clone, PartialEq)]
pub struct MergedEvent {
    pub id: EventId,
    /// The full set of effective values after the update
    pub values: NewEvent,
    pub slot: TimeSlot,
    /// True, if the room or one of the times differs from the stored event. Only then, the
    /// update needs to pass the conflict check.
    pub placement_changed: bool,
    pub teacher_changed: bool,
    pub lesson_changed: bool,
}

/// Merge the given patch over the current values of an event.
///
/// Fields missing in the patch retain the current value. The resulting time slot is validated,
/// so a patch that only moves `end_time` before the current `start_time` is rejected.
pub fn merge_event_patch(current: &Event, patch: &EventPatch) -> Result<MergedEvent, InvalidTimeSlot> {
    let values = NewEvent {
        room_id: patch.room_id.unwrap_or(current.room_id),
        teacher_id: patch.teacher_id.unwrap_or(current.teacher_id),
        lesson_id: patch.lesson_id.unwrap_or(current.lesson_id),
        start_time: patch.start_time.unwrap_or(current.start_time),
        end_time: patch.end_time.unwrap_or(current.end_time),
    };
    let slot = values.time_slot()?;
    Ok(MergedEvent {
        id: current.id,
        placement_changed: values.room_id != current.room_id
            || values.start_time != current.start_time
            || values.end_time != current.end_time,
        teacher_changed: values.teacher_id != current.teacher_id,
        lesson_changed: values.lesson_id != current.lesson_id,
        values,
        slot,
    })
}
