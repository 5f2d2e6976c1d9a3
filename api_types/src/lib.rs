use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub type EventId = i32;
pub type RoomId = i32;
pub type TeacherId = i32;
pub type LessonId = i32;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Teacher {
    pub id: TeacherId,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NewTeacher {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Partial update of a teacher. Fields missing in the JSON object keep their current value. An
/// explicit `"email": null` clears the e-mail address.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct TeacherPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_some",
        skip_serializing_if = "Option::is_none"
    )]
    pub email: Option<Option<String>>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Lesson {
    pub id: LessonId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NewLesson {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct LessonPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_some",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    #[serde(default)]
    pub capacity: Option<i32>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NewRoom {
    pub name: String,
    #[serde(default)]
    pub capacity: Option<i32>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct RoomPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_some",
        skip_serializing_if = "Option::is_none"
    )]
    pub capacity: Option<Option<i32>>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Event {
    pub id: EventId,
    pub room_id: RoomId,
    pub teacher_id: TeacherId,
    pub lesson_id: LessonId,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub start_time: DateTime<Utc>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub end_time: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NewEvent {
    pub room_id: RoomId,
    pub teacher_id: TeacherId,
    pub lesson_id: LessonId,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub start_time: DateTime<Utc>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub end_time: DateTime<Utc>,
}

/// Partial update of an event. Fields missing in the JSON object keep their current value.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct EventPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<RoomId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher_id: Option<TeacherId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lesson_id: Option<LessonId>,
    #[serde(
        default,
        deserialize_with = "timestamp::deserialize_optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "timestamp::deserialize_optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_time: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Reschedule {
    pub room_id: RoomId,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub start_time: DateTime<Utc>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub end_time: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TimeInterval {
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub start_time: DateTime<Utc>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub end_time: DateTime<Utc>,
}

/// An existing event, which blocks a room for the requested time
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct BlockingEvent {
    pub id: EventId,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub start_time: DateTime<Utc>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub end_time: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RoomConflict {
    pub room_id: RoomId,
    pub requested: TimeInterval,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocking_event: Option<BlockingEvent>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Availability {
    pub room_id: RoomId,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub start_time: DateTime<Utc>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub end_time: DateTime<Utc>,
    pub is_available: bool,
    pub conflicting_events_count: usize,
    #[serde(default)]
    pub conflicting_events: Vec<BlockingEvent>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TeacherEvents {
    pub teacher: Teacher,
    pub events: Vec<Event>,
}

/// One item of the calendar feed, in the shape expected by common calendar widgets
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CalendarItem {
    pub id: EventId,
    pub title: String,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub start: DateTime<Utc>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub end: DateTime<Utc>,
    pub room_id: RoomId,
    pub room_name: String,
}

/// Deserialize a present JSON value (including `null`) into `Some(..)`. Combined with
/// `#[serde(default)]`, this allows distinguishing a missing field from an explicit `null`.
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Lenient timestamp parsing for API input.
///
/// Accepts RFC 3339 timestamps as well as the plain `YYYY-MM-DD HH:MM:SS` format (taken as UTC).
/// Output is always serialized as RFC 3339 by chrono's default implementation.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    const PLAIN_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn parse(value: &str) -> Result<DateTime<Utc>, String> {
        if let Ok(t) = DateTime::parse_from_rfc3339(value) {
            return Ok(t.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(value, PLAIN_FORMAT)
            .map(|t| t.and_utc())
            .map_err(|_| {
                format!(
                    "invalid timestamp '{}', expected RFC 3339 or YYYY-MM-DD HH:MM:SS",
                    value
                )
            })
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        parse(&value).map_err(D::Error::custom)
    }

    pub fn deserialize_optional<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(value) => parse(&value).map(Some).map_err(D::Error::custom),
        }
    }
}
