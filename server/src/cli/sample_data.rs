use crate::cli_error::CliError;
use crate::data_store::models::{Event, NewEvent, NewLesson, NewRoom, NewTeacher};
use crate::data_store::{get_store_from_env, SchoolPlanStore, SchoolPlanStoreFacade, StoreError};
use crate::setup;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use log::info;

const SAMPLE_TEACHERS: [(&str, &str); 4] = [
    ("John Smith", "john.smith@school.com"),
    ("Sarah Johnson", "sarah.johnson@school.com"),
    ("Michael Brown", "michael.brown@school.com"),
    ("Emily Davis", "emily.davis@school.com"),
];

const SAMPLE_LESSONS: [(&str, &str); 6] = [
    ("Mathematics", "Advanced mathematics course"),
    ("Physics", "Physics fundamentals"),
    ("Chemistry", "Chemistry laboratory course"),
    ("Biology", "Biology and life sciences"),
    ("English Literature", "English literature and composition"),
    ("History", "World history course"),
];

const SAMPLE_ROOMS: [(&str, i32); 5] = [
    ("Room 101", 30),
    ("Room 102", 25),
    ("Room 103", 35),
    ("Laboratory A", 20),
    ("Laboratory B", 20),
];

/// Sample events as (lesson index, teacher index, room index, days from today, begin, end)
const SAMPLE_EVENTS: [(usize, usize, usize, u64, (u32, u32), (u32, u32)); 3] = [
    (0, 0, 0, 1, (9, 0), (10, 30)),
    (2, 1, 3, 1, (11, 0), (12, 30)),
    (4, 3, 1, 2, (14, 0), (15, 30)),
];

/// Fill the database with a small set of teachers, lessons, rooms and events for demonstration
/// purposes. Event times are placed relative to the current date in the configured school
/// timezone.
pub fn seed_sample_data() -> Result<(), CliError> {
    let timezone = setup::get_timezone_from_env()?;
    let data_store_pool = get_store_from_env()?;
    let mut data_store = data_store_pool.get_facade()?;

    let today = Utc::now().with_timezone(&timezone).date_naive();
    let events = fill_sample_data(&mut *data_store, &timezone, today)?;
    info!("Created sample data with {} events.", events.len());
    println!("Sample data created successfully.");
    Ok(())
}

fn fill_sample_data<Tz: TimeZone>(
    store: &mut dyn SchoolPlanStoreFacade,
    timezone: &Tz,
    today: NaiveDate,
) -> Result<Vec<Event>, StoreError> {
    let mut teacher_ids = Vec::new();
    for (name, email) in SAMPLE_TEACHERS {
        let teacher = store.create_teacher(NewTeacher {
            name: name.to_owned(),
            email: Some(email.to_owned()),
        })?;
        teacher_ids.push(teacher.id);
    }

    let mut lesson_ids = Vec::new();
    for (name, description) in SAMPLE_LESSONS {
        let lesson = store.create_lesson(NewLesson {
            name: name.to_owned(),
            description: Some(description.to_owned()),
        })?;
        lesson_ids.push(lesson.id);
    }

    let mut room_ids = Vec::new();
    for (name, capacity) in SAMPLE_ROOMS {
        let room = store.create_room(NewRoom {
            name: name.to_owned(),
            capacity: Some(capacity),
        })?;
        room_ids.push(room.id);
    }

    let mut events = Vec::new();
    for (lesson, teacher, room, days, begin, end) in SAMPLE_EVENTS {
        let date = today + chrono::Days::new(days);
        events.push(store.create_event(NewEvent {
            room_id: room_ids[room],
            teacher_id: teacher_ids[teacher],
            lesson_id: lesson_ids[lesson],
            start_time: local_timestamp(timezone, date, begin)?,
            end_time: local_timestamp(timezone, date, end)?,
        })?);
    }
    Ok(events)
}

/// Convert a local wall clock time at the given date into a UTC timestamp.
///
/// For ambiguous local times (end of daylight saving time), the later one is used. Local times
/// skipped by a daylight saving time switch are interpreted as UTC.
fn local_timestamp<Tz: TimeZone>(
    timezone: &Tz,
    date: NaiveDate,
    (hour, minute): (u32, u32),
) -> Result<DateTime<Utc>, StoreError> {
    let local_time = NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| {
        StoreError::InvalidInputData(format!("Invalid time of day {}:{}", hour, minute))
    })?;
    let local_datetime = date.and_time(local_time);
    Ok(timezone
        .from_local_datetime(&local_datetime)
        .latest()
        .map(|dt| dt.to_utc())
        .unwrap_or(local_datetime.and_utc()))
}
