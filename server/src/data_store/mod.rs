//! The backend part of the backend: the database interface
//!
//! The primary entry point to this module is the function [get_store_from_env], which returns an
//! object implementing the [SchoolPlanStore] trait. This object can be shared between threads in
//! a global application state and be used to create [SchoolPlanStoreFacade] instances for
//! interaction with the database. These provide a CRUD-like interface, using the data models from
//! the [models] module, plus the scheduling operations, which guard rooms against double booking.
//!
//! The primary implementation of [SchoolPlanStore] ([postgres::PgDataStore]) wraps a PostgreSQL
//! connection pool and its corresponding [SchoolPlanStoreFacade] objects
//! ([postgres::PgDataStoreFacade]) hold a reference to one pooled connection each, using the Diesel
//! query DSL for implementing the database interaction.
//!
//! # Scheduling and room locking
//!
//! Every operation that places an event in a room (create, update, reschedule) checks for
//! conflicting events with the [crate::scheduling::ConflictChecker] and writes the event in the
//! same transaction, while holding a row lock on the target room. Concurrent scheduling
//! operations on the same room are thereby serialized, so two overlapping events can never both
//! pass the check.
//!
//! There is also a mock implementation for unittests.

use crate::cli_error::CliError;
use crate::scheduling::{RoomConflict, TimeSlot};
use crate::setup;
use chrono::{DateTime, Utc};
use std::fmt::Debug;

pub mod models;
mod postgres;
mod schema;

/// Get a [SchoolPlanStore] instance, according the "DATABASE_URL" environment variable.
///
/// The DATABASE_URL must be a PosgreSQL connection url, following the schema
/// "postgres://{user}:{password}@{host}/{database}".
pub fn get_store_from_env() -> Result<impl SchoolPlanStore, CliError> {
    postgres::PgDataStore::new(&setup::get_database_url_from_env()?)
        .map_err(|err| CliError::UnexpectedStoreError(err.to_string()))
}

pub type EventId = i32;
pub type RoomId = i32;
pub type TeacherId = i32;
pub type LessonId = i32;

pub trait SchoolPlanStoreFacade {
    fn get_teachers(&mut self) -> Result<Vec<models::Teacher>, StoreError>;
    fn get_teacher(&mut self, teacher_id: TeacherId) -> Result<models::Teacher, StoreError>;
    fn create_teacher(&mut self, teacher: models::NewTeacher)
        -> Result<models::Teacher, StoreError>;
    fn update_teacher(
        &mut self,
        teacher_id: TeacherId,
        teacher: models::TeacherPatch,
    ) -> Result<models::Teacher, StoreError>;
    /// Delete a teacher. Fails with [StoreError::InvalidInputData] if events of the teacher
    /// still exist.
    fn delete_teacher(&mut self, teacher_id: TeacherId) -> Result<(), StoreError>;

    fn get_lessons(&mut self) -> Result<Vec<models::Lesson>, StoreError>;
    fn get_lesson(&mut self, lesson_id: LessonId) -> Result<models::Lesson, StoreError>;
    fn create_lesson(&mut self, lesson: models::NewLesson) -> Result<models::Lesson, StoreError>;
    fn update_lesson(
        &mut self,
        lesson_id: LessonId,
        lesson: models::LessonPatch,
    ) -> Result<models::Lesson, StoreError>;
    fn delete_lesson(&mut self, lesson_id: LessonId) -> Result<(), StoreError>;

    /// Get all rooms, ordered by name
    fn get_rooms(&mut self) -> Result<Vec<models::Room>, StoreError>;
    fn get_room(&mut self, room_id: RoomId) -> Result<models::Room, StoreError>;
    /// Create a new room.
    ///
    /// Fails with [StoreError::ConflictEntityExists] if another room with the same name exists.
    fn create_room(&mut self, room: models::NewRoom) -> Result<models::Room, StoreError>;
    fn update_room(
        &mut self,
        room_id: RoomId,
        room: models::RoomPatch,
    ) -> Result<models::Room, StoreError>;
    fn delete_room(&mut self, room_id: RoomId) -> Result<(), StoreError>;

    /// Get a filtered list of events
    ///
    /// Events are returned in chronological order, i.e. sorted by (start_time, end_time, id)
    fn get_events(&mut self, filter: EventFilter) -> Result<Vec<models::Event>, StoreError>;
    fn get_event(&mut self, event_id: EventId) -> Result<models::Event, StoreError>;

    /// Schedule a new event.
    ///
    /// # return value
    /// - `Ok(event)` with the newly generated id, if the event has been created
    /// - `Err(StoreError::RoomConflict(_))` if the room is occupied by another event during (part
    ///   of) the requested time. Nothing is written in this case.
    /// - `Err(StoreError::InvalidInputData(_))` if the time slot is invalid or the room, teacher or
    ///   lesson does not exist
    /// - `Err(_)` if something different went wrong, as usual
    fn create_event(&mut self, event: models::NewEvent) -> Result<models::Event, StoreError>;

    /// Update some fields of an existing event.
    ///
    /// The patch is merged over the stored event. If the resulting room or time slot differs from
    /// the stored one, the event is checked for conflicts with all other events in the room.
    ///
    /// Returns `Err(StoreError::NotExisting)` if the event does not exist and
    /// `Err(StoreError::RoomConflict(_))` if the change would double-book the room.
    fn update_event(
        &mut self,
        event_id: EventId,
        event: models::EventPatch,
    ) -> Result<models::Event, StoreError>;

    /// Move an existing event to the given room and time slot, after checking for conflicts with
    /// all other events in the room.
    fn reschedule_event(
        &mut self,
        event_id: EventId,
        room_id: RoomId,
        slot: TimeSlot,
    ) -> Result<models::Event, StoreError>;

    fn delete_event(&mut self, event_id: EventId) -> Result<(), StoreError>;

    /// Get the events which occupy the given room during (part of) the given time slot, in
    /// chronological order. An empty result means, the room is available.
    ///
    /// Returns `Err(StoreError::NotExisting)` if the room does not exist.
    fn check_room_availability(
        &mut self,
        room_id: RoomId,
        slot: TimeSlot,
    ) -> Result<Vec<models::Event>, StoreError>;
}

/// Filter options for retrieving events from the store via SchoolPlanStoreFacade::get_events()
///
/// Can be constructed through the EventFilterBuilder
#[derive(Default, Debug, Clone)]
pub struct EventFilter {
    /// Filter for events that end after the given point in time (this includes events that span
    /// over this point in time)
    pub after: Option<DateTime<Utc>>,
    /// Filter for events that begin before the given point in time (this includes events that
    /// span over this point in time)
    pub before: Option<DateTime<Utc>>,
    pub room: Option<RoomId>,
    pub teacher: Option<TeacherId>,
    pub lesson: Option<LessonId>,
}

impl EventFilter {
    /// Checks if a given event matches the filter
    ///
    /// Usually, filtering should be done by the database. This function can be used for separate
    /// checks of individual events in software.
    pub fn matches(&self, event: &models::Event) -> bool {
        if let Some(after) = self.after {
            if after >= event.end_time {
                return false;
            }
        }
        if let Some(before) = self.before {
            if before <= event.start_time {
                return false;
            }
        }
        if let Some(room) = self.room {
            if room != event.room_id {
                return false;
            }
        }
        if let Some(teacher) = self.teacher {
            if teacher != event.teacher_id {
                return false;
            }
        }
        if let Some(lesson) = self.lesson {
            if lesson != event.lesson_id {
                return false;
            }
        }
        true
    }
}

/// Builder for constructing EventFilter objects
#[derive(Default)]
pub struct EventFilterBuilder {
    result: EventFilter,
}

impl EventFilterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add filter, to only include events that end after the given point in time (this includes
    /// events that span over this point in time)
    pub fn after(mut self, after: DateTime<Utc>) -> Self {
        self.result.after = Some(after);
        self
    }
    /// Add filter, to only include events that begin before the given point in time (this
    /// includes events that span over this point in time)
    pub fn before(mut self, before: DateTime<Utc>) -> Self {
        self.result.before = Some(before);
        self
    }
    /// Add filter to only include events overlapping the given time slot
    pub fn overlapping(self, slot: &TimeSlot) -> Self {
        self.after(slot.start()).before(slot.end())
    }
    pub fn in_room(mut self, room_id: RoomId) -> Self {
        self.result.room = Some(room_id);
        self
    }
    pub fn taught_by(mut self, teacher_id: TeacherId) -> Self {
        self.result.teacher = Some(teacher_id);
        self
    }
    pub fn of_lesson(mut self, lesson_id: LessonId) -> Self {
        self.result.lesson = Some(lesson_id);
        self
    }

    /// Create the EventFilter object
    pub fn build(self) -> EventFilter {
        self.result
    }
}

pub trait SchoolPlanStore: Send + Sync {
    fn get_facade<'a>(&'a self) -> Result<Box<dyn SchoolPlanStoreFacade + 'a>, StoreError>;
}

#[derive(Debug)]
pub enum StoreError {
    /// Connection the database failed. See string description for details.
    ConnectionError(String),
    /// The query could not be executed because of some error not covered by the other members (see
    /// string description)
    QueryError(diesel::result::Error),
    /// Database transaction could not be commited due to a conflicting concurrent transaction
    TransactionConflict,
    /// The requested entity does not exist
    NotExisting,
    /// The entity could not be created because it already exists, or collides with a unique
    /// property (e.g. the name) of an existing entity.
    ConflictEntityExists,
    /// The event could not be placed, because the room is occupied during the requested time.
    RoomConflict(RoomConflict),
    /// The provided data is invalid, i.e. it does not match the expected ranges, references a
    /// non-existing entity or violates a SQL constraint. See string description for details.
    InvalidInputData(String),
    /// Some data queried from the database could not be deserialized. See string description for
    /// details.
    InvalidDataInDatabase(String),
}

impl From<diesel::result::Error> for StoreError {
    fn from(error: diesel::result::Error) -> Self {
        match error {
            diesel::result::Error::NotFound => Self::NotExisting,
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            ) => Self::ConflictEntityExists,
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::SerializationFailure,
                _,
            ) => Self::TransactionConflict,
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::ForeignKeyViolation
                | diesel::result::DatabaseErrorKind::CheckViolation,
                info,
            ) => Self::InvalidInputData(
                info.constraint_name()
                    .and_then(postgres::description_for_postgres_constraint)
                    .map(|d| d.to_owned())
                    .unwrap_or_else(|| info.message().to_owned()),
            ),
            diesel::result::Error::SerializationError(e) => Self::InvalidInputData(e.to_string()),
            diesel::result::Error::DeserializationError(e) => {
                Self::InvalidDataInDatabase(e.to_string())
            }
            _ => Self::QueryError(error),
        }
    }
}

impl From<r2d2::Error> for StoreError {
    fn from(error: r2d2::Error) -> Self {
        Self::ConnectionError(error.to_string())
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConnectionError(e) => write!(f, "Error connecting to database: {}", e),
            Self::QueryError(e) => write!(f, "Error while executing database query: {}", e),
            Self::TransactionConflict => f.write_str("Database transaction could not be commited due to a conflicting concurrent transaction"),
            Self::NotExisting => f.write_str("Database record does not exist."),
            Self::ConflictEntityExists => f.write_str("Database record exists already."),
            Self::RoomConflict(conflict) => write!(f, "{}", conflict),
            Self::InvalidInputData(e) => {
                write!(f, "Data to be stored in database is not valid: {}", e)
            }
            Self::InvalidDataInDatabase(e) => {
                write!(f, "Data queried from database could not be deserialized: {}", e)
            }
        }
    }
}

impl std::error::Error for StoreError {}
