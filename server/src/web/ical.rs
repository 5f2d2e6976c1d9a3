use crate::data_store::models::{Event, Lesson, Room, Teacher};
use crate::data_store::{EventFilterBuilder, LessonId, RoomId, TeacherId};
use crate::web::api::APIError;
use crate::web::AppState;
use actix_web::http::header::DispositionParam;
use actix_web::http::StatusCode;
use actix_web::{get, web, HttpResponse, HttpResponseBuilder, Responder};
use icalendar::{Component, EventLike};
use std::collections::BTreeMap;

pub fn configure_app(cfg: &mut web::ServiceConfig) {
    cfg.service(teacher_ical).service(room_ical);
}

#[get("/teachers/{teacher_id}/ical")]
async fn teacher_ical(
    path: web::Path<TeacherId>,
    state: web::Data<AppState>,
) -> Result<impl Responder, APIError> {
    let teacher_id = path.into_inner();
    let timezone = state.timezone;
    let (teacher, events, lessons, rooms) = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        Ok((
            store.get_teacher(teacher_id)?,
            store.get_events(EventFilterBuilder::new().taught_by(teacher_id).build())?,
            store.get_lessons()?,
            store.get_rooms()?,
        ))
    })
    .await??;

    let calendar = generate_ical(
        &format!("Schedule of {}", teacher.name),
        timezone,
        events,
        std::slice::from_ref(&teacher),
        &lessons,
        &rooms,
    );
    Ok(ical_response(calendar, &format!("teacher-{}.ics", teacher_id)))
}

#[get("/rooms/{room_id}/ical")]
async fn room_ical(
    path: web::Path<RoomId>,
    state: web::Data<AppState>,
) -> Result<impl Responder, APIError> {
    let room_id = path.into_inner();
    let timezone = state.timezone;
    let (room, events, teachers, lessons) = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        Ok((
            store.get_room(room_id)?,
            store.get_events(EventFilterBuilder::new().in_room(room_id).build())?,
            store.get_teachers()?,
            store.get_lessons()?,
        ))
    })
    .await??;

    let calendar = generate_ical(
        &format!("Schedule of {}", room.name),
        timezone,
        events,
        &teachers,
        &lessons,
        std::slice::from_ref(&room),
    );
    Ok(ical_response(calendar, &format!("room-{}.ics", room_id)))
}

fn ical_response(calendar: String, filename: &str) -> HttpResponse {
    HttpResponseBuilder::new(StatusCode::OK)
        .content_type("text/calendar; charset=utf-8")
        .append_header(actix_web::http::header::ContentDisposition {
            disposition: actix_web::http::header::DispositionType::Inline,
            parameters: vec![DispositionParam::Filename(filename.to_owned())],
        })
        .body(calendar)
}

fn generate_ical(
    name: &str,
    timezone: chrono_tz::Tz,
    events: Vec<Event>,
    teachers: &[Teacher],
    lessons: &[Lesson],
    rooms: &[Room],
) -> String {
    let mut calendar = icalendar::Calendar::new()
        .name(name)
        .timezone(timezone.name())
        .done();
    let teachers_by_id: BTreeMap<TeacherId, &Teacher> =
        teachers.iter().map(|t| (t.id, t)).collect();
    let lessons_by_id: BTreeMap<LessonId, &Lesson> = lessons.iter().map(|l| (l.id, l)).collect();
    let rooms_by_id: BTreeMap<RoomId, &Room> = rooms.iter().map(|r| (r.id, r)).collect();

    for event in events {
        let lesson = lessons_by_id.get(&event.lesson_id);
        let teacher_name = teachers_by_id
            .get(&event.teacher_id)
            .map(|t| t.name.as_str())
            .unwrap_or("unknown teacher");
        let mut ical_event = icalendar::Event::new()
            .uid(&format!("schoolplan-event-{}", event.id))
            .summary(&format!(
                "{} with {}",
                lesson.map(|l| l.name.as_str()).unwrap_or("Unknown lesson"),
                teacher_name
            ))
            .starts(event.start_time)
            .ends(event.end_time)
            .done();
        if let Some(room) = rooms_by_id.get(&event.room_id) {
            ical_event.location(&room.name);
        }
        if let Some(description) = lesson.and_then(|l| l.description.as_ref()) {
            ical_event.description(description);
        }
        calendar.push(ical_event);
    }

    calendar.to_string()
}
