use crate::cli_error::CliError;
use crate::data_store::models::{Event, Lesson, Room, Teacher};
use crate::data_store::{get_store_from_env, EventFilterBuilder, RoomId, SchoolPlanStore};
use std::collections::BTreeMap;

/// Print the timetable of a single room as a table to stdout.
pub fn print_room_schedule(room_id: RoomId) -> Result<(), CliError> {
    let data_store_pool = get_store_from_env()?;
    let mut data_store = data_store_pool.get_facade()?;

    let room = data_store.get_room(room_id)?;
    let events = data_store.get_events(EventFilterBuilder::new().in_room(room_id).build())?;
    let teachers = data_store.get_teachers()?;
    let lessons = data_store.get_lessons()?;

    println!("{}", room_schedule_title(&room));
    println!("{}", room_schedule_table(&events, &teachers, &lessons));
    Ok(())
}

fn room_schedule_title(room: &Room) -> String {
    match room.capacity {
        Some(capacity) => format!("{} (capacity {})", room.name, capacity),
        None => room.name.clone(),
    }
}

fn room_schedule_table(events: &[Event], teachers: &[Teacher], lessons: &[Lesson]) -> comfy_table::Table {
    let teacher_names: BTreeMap<i32, &str> =
        teachers.iter().map(|t| (t.id, t.name.as_str())).collect();
    let lesson_names: BTreeMap<i32, &str> =
        lessons.iter().map(|l| (l.id, l.name.as_str())).collect();

    let mut table = comfy_table::Table::new();
    table
        .load_preset(comfy_table::presets::ASCII_BORDERS_ONLY_CONDENSED)
        .set_header(vec!["id", "start", "end", "lesson", "teacher"])
        .add_rows(events.iter().map(|event| {
            [
                event.id.to_string(),
                event.start_time.format("%Y-%m-%d %H:%M").to_string(),
                event.end_time.format("%Y-%m-%d %H:%M").to_string(),
                lesson_names
                    .get(&event.lesson_id)
                    .copied()
                    .unwrap_or("?")
                    .to_owned(),
                teacher_names
                    .get(&event.teacher_id)
                    .copied()
                    .unwrap_or("?")
                    .to_owned(),
            ]
        }));
    table
}
