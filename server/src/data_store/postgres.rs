use super::{
    models, schema, EventFilter, EventId, LessonId, RoomId, SchoolPlanStore,
    SchoolPlanStoreFacade, StoreError, TeacherId,
};
use crate::scheduling::{merge_event_patch, ConflictChecker, RoomEventSource, TimeSlot};
use diesel::expression::AsExpression;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use log::debug;

#[derive(Clone)]
pub struct PgDataStore {
    pool: diesel::r2d2::Pool<diesel::r2d2::ConnectionManager<PgConnection>>,
}

impl PgDataStore {
    pub fn new(database_url: &str) -> Result<Self, StoreError> {
        let connection_manager = diesel::r2d2::ConnectionManager::<PgConnection>::new(database_url);
        Ok(Self {
            pool: diesel::r2d2::Pool::builder()
                .test_on_check_out(true)
                .min_idle(Some(2))
                .build(connection_manager)?,
        })
    }
}

impl SchoolPlanStore for PgDataStore {
    fn get_facade<'a>(&'a self) -> Result<Box<dyn SchoolPlanStoreFacade + 'a>, StoreError> {
        Ok(Box::new(PgDataStoreFacade::with_pooled_connection(
            self.pool.get()?,
        )))
    }
}

pub struct PgDataStoreFacade {
    connection: diesel::r2d2::PooledConnection<diesel::r2d2::ConnectionManager<PgConnection>>,
}

impl PgDataStoreFacade {
    pub fn with_pooled_connection(
        connection: diesel::r2d2::PooledConnection<diesel::r2d2::ConnectionManager<PgConnection>>,
    ) -> Self {
        Self { connection }
    }
}

/// Adapter for running the [ConflictChecker] on a connection with an open transaction
struct PgRoomEvents<'c> {
    connection: &'c mut PgConnection,
}

impl<'c> PgRoomEvents<'c> {
    fn new(connection: &'c mut PgConnection) -> Self {
        Self { connection }
    }
}

impl RoomEventSource for PgRoomEvents<'_> {
    fn room_events_near(
        &mut self,
        the_room_id: RoomId,
        window: &TimeSlot,
        exclude: Option<EventId>,
    ) -> Result<Vec<models::Event>, StoreError> {
        use schema::events::dsl::*;

        // Narrow down the candidates using the (room_id, start_time, end_time) index. The
        // ConflictChecker applies the actual overlap rule on the result.
        let mut query = events
            .filter(room_id.eq(the_room_id))
            .filter(start_time.lt(window.end()))
            .filter(end_time.gt(window.start()))
            .select(models::Event::as_select())
            .into_boxed();
        if let Some(exclude) = exclude {
            query = query.filter(id.ne(exclude));
        }
        Ok(query.load::<models::Event>(self.connection)?)
    }
}

impl SchoolPlanStoreFacade for PgDataStoreFacade {
    fn get_teachers(&mut self) -> Result<Vec<models::Teacher>, StoreError> {
        use schema::teachers::dsl::*;

        Ok(teachers
            .select(models::Teacher::as_select())
            .order_by((name, id))
            .load::<models::Teacher>(&mut self.connection)?)
    }

    fn get_teacher(&mut self, teacher_id: TeacherId) -> Result<models::Teacher, StoreError> {
        use schema::teachers::dsl::*;

        teachers
            .filter(id.eq(teacher_id))
            .select(models::Teacher::as_select())
            .first::<models::Teacher>(&mut self.connection)
            .map_err(|e| e.into())
    }

    fn create_teacher(
        &mut self,
        teacher: models::NewTeacher,
    ) -> Result<models::Teacher, StoreError> {
        use schema::teachers::dsl::*;
        teacher.validate().map_err(StoreError::InvalidInputData)?;

        Ok(diesel::insert_into(teachers)
            .values(&teacher)
            .returning(models::Teacher::as_returning())
            .get_result::<models::Teacher>(&mut self.connection)?)
    }

    fn update_teacher(
        &mut self,
        teacher_id: TeacherId,
        teacher: models::TeacherPatch,
    ) -> Result<models::Teacher, StoreError> {
        use schema::teachers::dsl::*;
        teacher.validate().map_err(StoreError::InvalidInputData)?;
        if teacher.is_empty() {
            return self.get_teacher(teacher_id);
        }

        Ok(diesel::update(teachers)
            .filter(id.eq(teacher_id))
            .set(&teacher)
            .returning(models::Teacher::as_returning())
            .get_result::<models::Teacher>(&mut self.connection)?)
    }

    fn delete_teacher(&mut self, teacher_id: TeacherId) -> Result<(), StoreError> {
        use schema::teachers::dsl::*;

        let count = diesel::delete(teachers)
            .filter(id.eq(teacher_id))
            .execute(&mut self.connection)?;
        if count == 0 {
            return Err(StoreError::NotExisting);
        }
        Ok(())
    }

    fn get_lessons(&mut self) -> Result<Vec<models::Lesson>, StoreError> {
        use schema::lessons::dsl::*;

        Ok(lessons
            .select(models::Lesson::as_select())
            .order_by((name, id))
            .load::<models::Lesson>(&mut self.connection)?)
    }

    fn get_lesson(&mut self, lesson_id: LessonId) -> Result<models::Lesson, StoreError> {
        use schema::lessons::dsl::*;

        lessons
            .filter(id.eq(lesson_id))
            .select(models::Lesson::as_select())
            .first::<models::Lesson>(&mut self.connection)
            .map_err(|e| e.into())
    }

    fn create_lesson(&mut self, lesson: models::NewLesson) -> Result<models::Lesson, StoreError> {
        use schema::lessons::dsl::*;
        lesson.validate().map_err(StoreError::InvalidInputData)?;

        Ok(diesel::insert_into(lessons)
            .values(&lesson)
            .returning(models::Lesson::as_returning())
            .get_result::<models::Lesson>(&mut self.connection)?)
    }

    fn update_lesson(
        &mut self,
        lesson_id: LessonId,
        lesson: models::LessonPatch,
    ) -> Result<models::Lesson, StoreError> {
        use schema::lessons::dsl::*;
        lesson.validate().map_err(StoreError::InvalidInputData)?;
        if lesson.is_empty() {
            return self.get_lesson(lesson_id);
        }

        Ok(diesel::update(lessons)
            .filter(id.eq(lesson_id))
            .set(&lesson)
            .returning(models::Lesson::as_returning())
            .get_result::<models::Lesson>(&mut self.connection)?)
    }

    fn delete_lesson(&mut self, lesson_id: LessonId) -> Result<(), StoreError> {
        use schema::lessons::dsl::*;

        let count = diesel::delete(lessons)
            .filter(id.eq(lesson_id))
            .execute(&mut self.connection)?;
        if count == 0 {
            return Err(StoreError::NotExisting);
        }
        Ok(())
    }

    fn get_rooms(&mut self) -> Result<Vec<models::Room>, StoreError> {
        use schema::rooms::dsl::*;

        Ok(rooms
            .select(models::Room::as_select())
            .order_by((name, id))
            .load::<models::Room>(&mut self.connection)?)
    }

    fn get_room(&mut self, room_id: RoomId) -> Result<models::Room, StoreError> {
        use schema::rooms::dsl::*;

        rooms
            .filter(id.eq(room_id))
            .select(models::Room::as_select())
            .first::<models::Room>(&mut self.connection)
            .map_err(|e| e.into())
    }

    fn create_room(&mut self, room: models::NewRoom) -> Result<models::Room, StoreError> {
        use schema::rooms::dsl::*;
        room.validate().map_err(StoreError::InvalidInputData)?;

        Ok(diesel::insert_into(rooms)
            .values(&room)
            .returning(models::Room::as_returning())
            .get_result::<models::Room>(&mut self.connection)?)
    }

    fn update_room(
        &mut self,
        room_id: RoomId,
        room: models::RoomPatch,
    ) -> Result<models::Room, StoreError> {
        use schema::rooms::dsl::*;
        room.validate().map_err(StoreError::InvalidInputData)?;
        if room.is_empty() {
            return self.get_room(room_id);
        }

        Ok(diesel::update(rooms)
            .filter(id.eq(room_id))
            .set(&room)
            .returning(models::Room::as_returning())
            .get_result::<models::Room>(&mut self.connection)?)
    }

    fn delete_room(&mut self, room_id: RoomId) -> Result<(), StoreError> {
        use schema::rooms::dsl::*;

        let count = diesel::delete(rooms)
            .filter(id.eq(room_id))
            .execute(&mut self.connection)?;
        if count == 0 {
            return Err(StoreError::NotExisting);
        }
        Ok(())
    }

    fn get_events(&mut self, filter: EventFilter) -> Result<Vec<models::Event>, StoreError> {
        use schema::events::dsl::*;

        Ok(events
            .filter(event_filter_to_sql(filter))
            .order_by((start_time.asc(), end_time.asc(), id.asc()))
            .select(models::Event::as_select())
            .load::<models::Event>(&mut self.connection)?)
    }

    fn get_event(&mut self, event_id: EventId) -> Result<models::Event, StoreError> {
        use schema::events::dsl::*;

        events
            .filter(id.eq(event_id))
            .select(models::Event::as_select())
            .first::<models::Event>(&mut self.connection)
            .map_err(|e| e.into())
    }

    fn create_event(&mut self, event: models::NewEvent) -> Result<models::Event, StoreError> {
        use schema::events::dsl::*;
        let slot = event.time_slot()?;

        self.connection.transaction(|connection| {
            check_event_references(connection, event.teacher_id, event.lesson_id)?;
            lock_room(connection, event.room_id)?;
            ConflictChecker::new(&mut PgRoomEvents::new(connection)).ensure_free(
                event.room_id,
                &slot,
                None,
            )?;

            let created = diesel::insert_into(events)
                .values(&event)
                .returning(models::Event::as_returning())
                .get_result::<models::Event>(connection)?;
            debug!(
                "Scheduled event {} in room {} ({})",
                created.id, created.room_id, slot
            );
            Ok(created)
        })
    }

    fn update_event(
        &mut self,
        event_id: EventId,
        event: models::EventPatch,
    ) -> Result<models::Event, StoreError> {
        use schema::events::dsl::*;

        self.connection.transaction(|connection| {
            let current = events
                .filter(id.eq(event_id))
                .select(models::Event::as_select())
                .for_update()
                .first::<models::Event>(connection)?;
            let merged = merge_event_patch(&current, &event)?;

            if merged.teacher_changed || merged.lesson_changed {
                check_event_references(
                    connection,
                    merged.values.teacher_id,
                    merged.values.lesson_id,
                )?;
            }
            if merged.placement_changed {
                lock_room(connection, merged.values.room_id)?;
                ConflictChecker::new(&mut PgRoomEvents::new(connection)).ensure_free(
                    merged.values.room_id,
                    &merged.slot,
                    Some(event_id),
                )?;
            }

            Ok(diesel::update(events)
                .filter(id.eq(event_id))
                .set(&merged.values)
                .returning(models::Event::as_returning())
                .get_result::<models::Event>(connection)?)
        })
    }

    fn reschedule_event(
        &mut self,
        event_id: EventId,
        the_room_id: RoomId,
        slot: TimeSlot,
    ) -> Result<models::Event, StoreError> {
        use schema::events::dsl::*;

        self.connection.transaction(|connection| {
            // Lock the event first, to get the same lock order as in update_event()
            events
                .filter(id.eq(event_id))
                .select(id)
                .for_update()
                .first::<EventId>(connection)?;
            lock_room(connection, the_room_id)?;
            ConflictChecker::new(&mut PgRoomEvents::new(connection)).ensure_free(
                the_room_id,
                &slot,
                Some(event_id),
            )?;

            let updated = diesel::update(events)
                .filter(id.eq(event_id))
                .set((
                    room_id.eq(the_room_id),
                    start_time.eq(slot.start()),
                    end_time.eq(slot.end()),
                ))
                .returning(models::Event::as_returning())
                .get_result::<models::Event>(connection)?;
            debug!(
                "Rescheduled event {} to room {} ({})",
                updated.id, updated.room_id, slot
            );
            Ok(updated)
        })
    }

    fn delete_event(&mut self, event_id: EventId) -> Result<(), StoreError> {
        use schema::events::dsl::*;

        let count = diesel::delete(events)
            .filter(id.eq(event_id))
            .execute(&mut self.connection)?;
        if count == 0 {
            return Err(StoreError::NotExisting);
        }
        Ok(())
    }

    fn check_room_availability(
        &mut self,
        room_id: RoomId,
        slot: TimeSlot,
    ) -> Result<Vec<models::Event>, StoreError> {
        self.connection.transaction(|connection| {
            schema::rooms::table
                .find(room_id)
                .select(schema::rooms::id)
                .first::<RoomId>(connection)?;
            ConflictChecker::new(&mut PgRoomEvents::new(connection)).conflicting_events(
                room_id,
                &slot,
                None,
            )
        })
    }
}

/// Take the row lock of the given room for the rest of the current transaction.
///
/// All scheduling operations placing an event in a room take this lock before running the
/// conflict check. Fails with [StoreError::InvalidInputData] if the room does not exist.
fn lock_room(connection: &mut PgConnection, room_id: RoomId) -> Result<(), StoreError> {
    use schema::rooms::dsl::*;

    rooms
        .filter(id.eq(room_id))
        .select(id)
        .for_update()
        .first::<RoomId>(connection)
        .optional()?
        .ok_or_else(|| {
            StoreError::InvalidInputData("room_id must reference an existing room.".to_owned())
        })?;
    Ok(())
}

/// Check that the teacher and the lesson referenced by an event exist.
fn check_event_references(
    connection: &mut PgConnection,
    teacher_id: TeacherId,
    lesson_id: LessonId,
) -> Result<(), StoreError> {
    use diesel::dsl::exists;
    use diesel::select;

    if !select(exists(schema::teachers::table.find(teacher_id))).get_result::<bool>(connection)? {
        return Err(StoreError::InvalidInputData(
            "teacher_id must reference an existing teacher.".to_owned(),
        ));
    }
    if !select(exists(schema::lessons::table.find(lesson_id))).get_result::<bool>(connection)? {
        return Err(StoreError::InvalidInputData(
            "lesson_id must reference an existing lesson.".to_owned(),
        ));
    }
    Ok(())
}

type BoxedBoolExpression<'a, Table> =
    Box<dyn BoxableExpression<Table, diesel::pg::Pg, SqlType = diesel::sql_types::Bool> + 'a>;

fn event_filter_to_sql<'a>(filter: EventFilter) -> BoxedBoolExpression<'a, schema::events::table> {
    use schema::events::dsl::*;

    let mut expression: BoxedBoolExpression<'a, schema::events::table> =
        Box::new(diesel::dsl::sql::<diesel::sql_types::Bool>("TRUE"));
    if let Some(after) = filter.after {
        expression = Box::new(expression.as_expression().and(end_time.gt(after)));
    }
    if let Some(before) = filter.before {
        expression = Box::new(expression.as_expression().and(start_time.lt(before)));
    }
    if let Some(room) = filter.room {
        expression = Box::new(expression.as_expression().and(room_id.eq(room)));
    }
    if let Some(teacher) = filter.teacher {
        expression = Box::new(expression.as_expression().and(teacher_id.eq(teacher)));
    }
    if let Some(lesson) = filter.lesson {
        expression = Box::new(expression.as_expression().and(lesson_id.eq(lesson)));
    }
    expression
}

/// Get a human-readable description of the consistency expectation that is checked by a specific
/// constraint in our Postgres database schema by the constraint's name.
///
/// These are visible to the user when creating or updating entities inconsistently via the REST
/// API.
///
/// Returns None, when no human-readable description is present of the given constraint name. This
/// may be the case when we don't expect this constraint to be violated by a user interaction.
pub fn description_for_postgres_constraint(constraint_name: &str) -> Option<&'static str> {
    match constraint_name {
        "events_room_id_fkey" => Some("Room is still used by events or does not exist."),
        "events_teacher_id_fkey" => Some("Teacher still has events or does not exist."),
        "events_lesson_id_fkey" => Some("Lesson is still used by events or does not exist."),
        "events_time_range" => Some("Event's start_time must be earlier than end_time."),
        "rooms_capacity_positive" => Some("Room's capacity must be at least 1."),
        _ => None,
    }
}
