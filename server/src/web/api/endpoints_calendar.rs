use crate::data_store::models::{Event, Lesson, Room, Teacher};
use crate::data_store::{EventFilterBuilder, LessonId, RoomId, TeacherId};
use crate::web::api::APIError;
use crate::web::util::CalendarWindowQuery;
use crate::web::AppState;
use actix_web::{get, web, Responder};
use std::collections::BTreeMap;

/// Feed of all events overlapping the requested time window, for display in a calendar widget
#[get("/calendar")]
async fn calendar_feed(
    query: web::Query<CalendarWindowQuery>,
    state: web::Data<AppState>,
) -> Result<impl Responder, APIError> {
    let slot = query.into_inner().time_slot()?;
    let (events, teachers, lessons, rooms) = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        Ok((
            store.get_events(EventFilterBuilder::new().overlapping(&slot).build())?,
            store.get_teachers()?,
            store.get_lessons()?,
            store.get_rooms()?,
        ))
    })
    .await??;

    Ok(web::Json(calendar_items(events, &teachers, &lessons, &rooms)))
}

fn calendar_items(
    events: Vec<Event>,
    teachers: &[Teacher],
    lessons: &[Lesson],
    rooms: &[Room],
) -> Vec<schoolplan_api_types::CalendarItem> {
    let teachers_by_id: BTreeMap<TeacherId, &Teacher> = teachers.iter().map(|t| (t.id, t)).collect();
    let lessons_by_id: BTreeMap<LessonId, &Lesson> = lessons.iter().map(|l| (l.id, l)).collect();
    let rooms_by_id: BTreeMap<RoomId, &Room> = rooms.iter().map(|r| (r.id, r)).collect();

    events
        .into_iter()
        .map(|event| schoolplan_api_types::CalendarItem {
            id: event.id,
            title: format!(
                "{} with {}",
                lessons_by_id
                    .get(&event.lesson_id)
                    .map(|l| l.name.as_str())
                    .unwrap_or("Unknown lesson"),
                teachers_by_id
                    .get(&event.teacher_id)
                    .map(|t| t.name.as_str())
                    .unwrap_or("unknown teacher"),
            ),
            start: event.start_time,
            end: event.end_time,
            room_id: event.room_id,
            room_name: rooms_by_id
                .get(&event.room_id)
                .map(|r| r.name.clone())
                .unwrap_or_default(),
        })
        .collect()
}
