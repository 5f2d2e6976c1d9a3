use crate::data_store::{EventFilter, LessonId, RoomId, TeacherId};
use crate::scheduling::{InvalidTimeSlot, TimeSlot};
use chrono::{DateTime, Utc};
use schoolplan_api_types::timestamp;
use serde::Deserialize;

/// Query parameters for filtering the list of events
#[derive(Deserialize, Debug, Default)]
pub struct EventFilterAsQuery {
    #[serde(default)]
    pub room_id: Option<RoomId>,
    #[serde(default)]
    pub teacher_id: Option<TeacherId>,
    #[serde(default)]
    pub lesson_id: Option<LessonId>,
    #[serde(default, deserialize_with = "timestamp::deserialize_optional")]
    pub after: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamp::deserialize_optional")]
    pub before: Option<DateTime<Utc>>,
}

impl From<EventFilterAsQuery> for EventFilter {
    fn from(value: EventFilterAsQuery) -> Self {
        EventFilter {
            after: value.after,
            before: value.before,
            room: value.room_id,
            teacher: value.teacher_id,
            lesson: value.lesson_id,
        }
    }
}

/// Query parameters of an availability check for a time slot in a room given by the query
#[derive(Deserialize, Debug)]
pub struct AvailabilityQuery {
    pub room_id: RoomId,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub start_time: DateTime<Utc>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub end_time: DateTime<Utc>,
}

impl AvailabilityQuery {
    pub fn time_slot(&self) -> Result<TimeSlot, InvalidTimeSlot> {
        TimeSlot::new(self.start_time, self.end_time)
    }
}

/// Query parameters of an availability check for a room given in the URL path
#[derive(Deserialize, Debug)]
pub struct TimeSlotQuery {
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub start_time: DateTime<Utc>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub end_time: DateTime<Utc>,
}

impl TimeSlotQuery {
    pub fn time_slot(&self) -> Result<TimeSlot, InvalidTimeSlot> {
        TimeSlot::new(self.start_time, self.end_time)
    }
}

/// Query parameters of the calendar feed, as sent by common calendar widgets
#[derive(Deserialize, Debug)]
pub struct CalendarWindowQuery {
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub start: DateTime<Utc>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub end: DateTime<Utc>,
}

impl CalendarWindowQuery {
    pub fn time_slot(&self) -> Result<TimeSlot, InvalidTimeSlot> {
        TimeSlot::new(self.start, self.end)
    }
}
