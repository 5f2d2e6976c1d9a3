use crate::data_store::{EventId, LessonId, RoomId, TeacherId};
use crate::scheduling::{InvalidTimeSlot, TimeSlot};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

const MAX_NAME_LENGTH: usize = 255;

#[derive(Clone, Debug, PartialEq, Queryable, Selectable, Identifiable)]
#[diesel(table_name=super::schema::teachers)]
pub struct Teacher {
    pub id: TeacherId,
    pub name: String,
    pub email: Option<String>,
}

impl From<Teacher> for schoolplan_api_types::Teacher {
    fn from(value: Teacher) -> Self {
        Self {
            id: value.id,
            name: value.name,
            email: value.email,
        }
    }
}

#[derive(Clone, Debug, Insertable)]
#[diesel(table_name=super::schema::teachers)]
pub struct NewTeacher {
    pub name: String,
    pub email: Option<String>,
}

impl NewTeacher {
    pub fn validate(&self) -> Result<(), String> {
        validate_name("name", &self.name)?;
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        Ok(())
    }
}

impl From<schoolplan_api_types::NewTeacher> for NewTeacher {
    fn from(value: schoolplan_api_types::NewTeacher) -> Self {
        Self {
            name: value.name,
            email: value.email,
        }
    }
}

#[derive(Clone, Debug, Default, AsChangeset)]
#[diesel(table_name=super::schema::teachers)]
pub struct TeacherPatch {
    pub name: Option<String>,
    pub email: Option<Option<String>>,
}

impl TeacherPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none()
    }

    pub fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.name {
            validate_name("name", name)?;
        }
        if let Some(Some(email)) = &self.email {
            validate_email(email)?;
        }
        Ok(())
    }
}

impl From<schoolplan_api_types::TeacherPatch> for TeacherPatch {
    fn from(value: schoolplan_api_types::TeacherPatch) -> Self {
        Self {
            name: value.name,
            email: value.email,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Queryable, Selectable, Identifiable)]
#[diesel(table_name=super::schema::lessons)]
pub struct Lesson {
    pub id: LessonId,
    pub name: String,
    pub description: Option<String>,
}

impl From<Lesson> for schoolplan_api_types::Lesson {
    fn from(value: Lesson) -> Self {
        Self {
            id: value.id,
            name: value.name,
            description: value.description,
        }
    }
}

#[derive(Clone, Debug, Insertable)]
#[diesel(table_name=super::schema::lessons)]
pub struct NewLesson {
    pub name: String,
    pub description: Option<String>,
}

impl NewLesson {
    pub fn validate(&self) -> Result<(), String> {
        validate_name("name", &self.name)
    }
}

impl From<schoolplan_api_types::NewLesson> for NewLesson {
    fn from(value: schoolplan_api_types::NewLesson) -> Self {
        Self {
            name: value.name,
            description: value.description,
        }
    }
}

#[derive(Clone, Debug, Default, AsChangeset)]
#[diesel(table_name=super::schema::lessons)]
pub struct LessonPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
}

impl LessonPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }

    pub fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.name {
            validate_name("name", name)?;
        }
        Ok(())
    }
}

impl From<schoolplan_api_types::LessonPatch> for LessonPatch {
    fn from(value: schoolplan_api_types::LessonPatch) -> Self {
        Self {
            name: value.name,
            description: value.description,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Queryable, Selectable, Identifiable)]
#[diesel(table_name=super::schema::rooms)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub capacity: Option<i32>,
}

impl From<Room> for schoolplan_api_types::Room {
    fn from(value: Room) -> Self {
        Self {
            id: value.id,
            name: value.name,
            capacity: value.capacity,
        }
    }
}

#[derive(Clone, Debug, Insertable)]
#[diesel(table_name=super::schema::rooms)]
pub struct NewRoom {
    pub name: String,
    pub capacity: Option<i32>,
}

impl NewRoom {
    pub fn validate(&self) -> Result<(), String> {
        validate_name("name", &self.name)?;
        validate_capacity(self.capacity)
    }
}

impl From<schoolplan_api_types::NewRoom> for NewRoom {
    fn from(value: schoolplan_api_types::NewRoom) -> Self {
        Self {
            name: value.name,
            capacity: value.capacity,
        }
    }
}

#[derive(Clone, Debug, Default, AsChangeset)]
#[diesel(table_name=super::schema::rooms)]
pub struct RoomPatch {
    pub name: Option<String>,
    pub capacity: Option<Option<i32>>,
}

impl RoomPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.capacity.is_none()
    }

    pub fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.name {
            validate_name("name", name)?;
        }
        if let Some(capacity) = self.capacity {
            validate_capacity(capacity)?;
        }
        Ok(())
    }
}

impl From<schoolplan_api_types::RoomPatch> for RoomPatch {
    fn from(value: schoolplan_api_types::RoomPatch) -> Self {
        Self {
            name: value.name,
            capacity: value.capacity,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Queryable, Selectable, Identifiable)]
#[diesel(table_name=super::schema::events)]
pub struct Event {
    pub id: EventId,
    pub room_id: RoomId,
    pub teacher_id: TeacherId,
    pub lesson_id: LessonId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl Event {
    pub fn time_slot(&self) -> TimeSlot {
        TimeSlot::from_stored(self.start_time, self.end_time)
    }
}

impl From<Event> for schoolplan_api_types::Event {
    fn from(value: Event) -> Self {
        Self {
            id: value.id,
            room_id: value.room_id,
            teacher_id: value.teacher_id,
            lesson_id: value.lesson_id,
            start_time: value.start_time,
            end_time: value.end_time,
        }
    }
}

/// Data of an event to be created, or the full set of new values of an existing event.
#[derive(Clone, Debug, PartialEq, Insertable, AsChangeset)]
#[diesel(table_name=super::schema::events)]
pub struct NewEvent {
    pub room_id: RoomId,
    pub teacher_id: TeacherId,
    pub lesson_id: LessonId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl NewEvent {
    pub fn time_slot(&self) -> Result<TimeSlot, InvalidTimeSlot> {
        TimeSlot::new(self.start_time, self.end_time)
    }
}

impl From<schoolplan_api_types::NewEvent> for NewEvent {
    fn from(value: schoolplan_api_types::NewEvent) -> Self {
        Self {
            room_id: value.room_id,
            teacher_id: value.teacher_id,
            lesson_id: value.lesson_id,
            start_time: value.start_time,
            end_time: value.end_time,
        }
    }
}

/// Partial update of an event. `None` fields keep the event's current value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventPatch {
    pub room_id: Option<RoomId>,
    pub teacher_id: Option<TeacherId>,
    pub lesson_id: Option<LessonId>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl From<schoolplan_api_types::EventPatch> for EventPatch {
    fn from(value: schoolplan_api_types::EventPatch) -> Self {
        Self {
            room_id: value.room_id,
            teacher_id: value.teacher_id,
            lesson_id: value.lesson_id,
            start_time: value.start_time,
            end_time: value.end_time,
        }
    }
}

fn validate_name(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} must not be empty", field));
    }
    if value.chars().count() > MAX_NAME_LENGTH {
        return Err(format!(
            "{} must not be longer than {} characters",
            field, MAX_NAME_LENGTH
        ));
    }
    Ok(())
}

fn validate_email(value: &str) -> Result<(), String> {
    if value.chars().count() > MAX_NAME_LENGTH {
        return Err(format!(
            "email must not be longer than {} characters",
            MAX_NAME_LENGTH
        ));
    }
    match value.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            Ok(())
        }
        _ => Err(format!("'{}' is not a valid email address", value)),
    }
}

fn validate_capacity(value: Option<i32>) -> Result<(), String> {
    match value {
        Some(capacity) if capacity < 1 => Err("capacity must be at least 1".to_owned()),
        _ => Ok(()),
    }
}
