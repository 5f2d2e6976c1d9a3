
use super::*;
use crate::data_store::store_mock::StoreMock;
use crate::web::AppState;
use actix_web::body::MessageBody;
use actix_web::{http, test, web, App};
use serde_json::Value;
use std::sync::Arc;

fn mock_state() -> (Arc<StoreMock>, sample_data::SampleIds, AppState) {
    let data_store_mock = Arc::new(StoreMock::default());
    let ids = sample_data::fill_sample_data(data_store_mock.as_ref());
    let state = AppState {
        store: data_store_mock.clone(),
        timezone: chrono_tz::Europe::Berlin,
    };
    (data_store_mock, ids, state)
}

#[actix_web::test]
async fn test_create_event_conflict_and_adjacent() {
    let (_store, ids, state) = mock_state();
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(state.clone())),
    )
    .await;

    // overlapping the last half hour of the mathematics lesson
    let req = test::TestRequest::post()
        .uri("/api/v1/events")
        .set_json(json!({
            "room_id": ids.room_101,
            "teacher_id": ids.teacher_sarah,
            "lesson_id": ids.lesson_chemistry,
            "start_time": "2024-01-08T10:00:00Z",
            "end_time": "2024-01-08T11:00:00Z",
        }))
        .to_request();
    let res = test::call_service(&app, req).await;
    let res_status = res.status();
    let body = res.into_body().try_into_bytes().unwrap();
    assert_eq!(res_status, http::StatusCode::CONFLICT);
    let result: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(result["httpCode"], 409);
    assert_eq!(result["conflict"]["room_id"], ids.room_101);
    assert_eq!(result["conflict"]["blocking_event"]["id"], ids.event_math);
    assert_eq!(
        result["conflict"]["blocking_event"]["end_time"],
        "2024-01-08T10:30:00Z"
    );
    assert!(result["message"].as_str().unwrap().contains("10:30"));

    // starting exactly when the mathematics lesson ends
    let req = test::TestRequest::post()
        .uri("/api/v1/events/schedule")
        .set_json(json!({
            "room_id": ids.room_101,
            "teacher_id": ids.teacher_sarah,
            "lesson_id": ids.lesson_chemistry,
            "start_time": "2024-01-08 10:30:00",
            "end_time": "2024-01-08 11:30:00",
        }))
        .to_request();
    let res = test::call_service(&app, req).await;
    let res_status = res.status();
    let body = res.into_body().try_into_bytes().unwrap();
    assert_eq!(res_status, http::StatusCode::CREATED);
    let created: schoolplan_api_types::Event = serde_json::from_slice(&body).unwrap();
    assert_eq!(created.room_id, ids.room_101);
    assert_eq!(
        created.start_time,
        chrono::DateTime::parse_from_rfc3339("2024-01-08T10:30:00Z").unwrap()
    );

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/events?room_id={}", ids.room_101))
        .to_request();
    let res = test::call_service(&app, req).await;
    let body = res.into_body().try_into_bytes().unwrap();
    let events: Vec<schoolplan_api_types::Event> = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        events.iter().map(|e| e.id).collect::<Vec<_>>(),
        vec![ids.event_math, created.id]
    );
}

#[actix_web::test]
async fn test_create_event_invalid_data() {
    let (_store, ids, state) = mock_state();
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(state.clone())),
    )
    .await;

    // end before start
    let req = test::TestRequest::post()
        .uri("/api/v1/events")
        .set_json(json!({
            "room_id": ids.room_lab_a,
            "teacher_id": ids.teacher_john,
            "lesson_id": ids.lesson_math,
            "start_time": "2024-01-09T10:00:00Z",
            "end_time": "2024-01-09T09:00:00Z",
        }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::UNPROCESSABLE_ENTITY);

    // room does not exist
    let req = test::TestRequest::post()
        .uri("/api/v1/events")
        .set_json(json!({
            "room_id": 9999,
            "teacher_id": ids.teacher_john,
            "lesson_id": ids.lesson_math,
            "start_time": "2024-01-09T09:00:00Z",
            "end_time": "2024-01-09T10:00:00Z",
        }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::UNPROCESSABLE_ENTITY);

    // missing lesson
    let req = test::TestRequest::post()
        .uri("/api/v1/events")
        .set_json(json!({
            "room_id": ids.room_lab_a,
            "teacher_id": ids.teacher_john,
            "start_time": "2024-01-09T09:00:00Z",
            "end_time": "2024-01-09T10:00:00Z",
        }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::UNPROCESSABLE_ENTITY);

    // unparsable timestamp
    let req = test::TestRequest::post()
        .uri("/api/v1/events")
        .set_json(json!({
            "room_id": ids.room_lab_a,
            "teacher_id": ids.teacher_john,
            "lesson_id": ids.lesson_math,
            "start_time": "tomorrow",
            "end_time": "2024-01-09T10:00:00Z",
        }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn test_update_event_shrink_and_conflict() {
    let (store, ids, state) = mock_state();
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(state.clone())),
    )
    .await;

    // Shrinking an event must not conflict with the event itself
    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/events/{}", ids.event_math))
        .set_json(json!({"end_time": "2024-01-08T10:00:00Z"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    let res_status = res.status();
    let body = res.into_body().try_into_bytes().unwrap();
    assert_eq!(res_status, http::StatusCode::OK);
    let updated: schoolplan_api_types::Event = serde_json::from_slice(&body).unwrap();
    assert_eq!(updated.id, ids.event_math);
    assert_eq!(updated.teacher_id, ids.teacher_john);
    assert_eq!(
        updated.end_time,
        chrono::DateTime::parse_from_rfc3339("2024-01-08T10:00:00Z").unwrap()
    );

    // Moving the mathematics lesson into Laboratory A overlaps the chemistry lesson
    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/events/{}", ids.event_math))
        .set_json(json!({
            "room_id": ids.room_lab_a,
            "start_time": "2024-01-08T10:00:00Z",
            "end_time": "2024-01-08T11:30:00Z",
        }))
        .to_request();
    let res = test::call_service(&app, req).await;
    let res_status = res.status();
    let body = res.into_body().try_into_bytes().unwrap();
    assert_eq!(res_status, http::StatusCode::CONFLICT);
    let result: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        result["conflict"]["blocking_event"]["id"],
        ids.event_chemistry
    );

    // Nothing has been written
    {
        let data = store.data.lock().unwrap();
        let event = data
            .events
            .iter()
            .find(|e| e.id == ids.event_math)
            .unwrap();
        assert_eq!(event.room_id, ids.room_101);
    }

    let req = test::TestRequest::patch()
        .uri("/api/v1/events/4242")
        .set_json(json!({"end_time": "2024-01-08T10:00:00Z"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_reschedule_event() {
    let (_store, ids, state) = mock_state();
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(state.clone())),
    )
    .await;

    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/events/{}/reschedule", ids.event_math))
        .set_json(json!({
            "room_id": ids.room_lab_a,
            "start_time": "2024-01-08T11:30:00Z",
            "end_time": "2024-01-08T12:00:00Z",
        }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::CONFLICT);

    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/events/{}/reschedule", ids.event_math))
        .set_json(json!({
            "room_id": ids.room_lab_a,
            "start_time": "2024-01-08T12:30:00Z",
            "end_time": "2024-01-08T14:00:00Z",
        }))
        .to_request();
    let res = test::call_service(&app, req).await;
    let res_status = res.status();
    let body = res.into_body().try_into_bytes().unwrap();
    assert_eq!(res_status, http::StatusCode::OK);
    let updated: schoolplan_api_types::Event = serde_json::from_slice(&body).unwrap();
    assert_eq!(updated.room_id, ids.room_lab_a);
    assert_eq!(updated.lesson_id, ids.lesson_math);

    // Rescheduling an event onto its own time slot is fine
    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/events/{}/reschedule", ids.event_math))
        .set_json(json!({
            "room_id": ids.room_lab_a,
            "start_time": "2024-01-08T12:30:00Z",
            "end_time": "2024-01-08T14:00:00Z",
        }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::OK);

    // room_id is mandatory
    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/events/{}/reschedule", ids.event_math))
        .set_json(json!({
            "start_time": "2024-01-08T15:00:00Z",
            "end_time": "2024-01-08T16:00:00Z",
        }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn test_check_availability() {
    let (_store, ids, state) = mock_state();
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(state.clone())),
    )
    .await;

    // adjacent to the mathematics lesson
    let req = test::TestRequest::get()
        .uri(&format!(
            "/api/v1/rooms/check-availability?room_id={}&start_time=2024-01-08T10:30:00Z&end_time=2024-01-08T11:00:00Z",
            ids.room_101
        ))
        .to_request();
    let res = test::call_service(&app, req).await;
    let res_status = res.status();
    let body = res.into_body().try_into_bytes().unwrap();
    assert_eq!(res_status, http::StatusCode::OK);
    let result: schoolplan_api_types::Availability = serde_json::from_slice(&body).unwrap();
    assert!(result.is_available);
    assert_eq!(result.conflicting_events_count, 0);
    assert_eq!(result.room_id, ids.room_101);

    let req = test::TestRequest::get()
        .uri(&format!(
            "/api/v1/rooms/{}/availability?start_time=2024-01-08T10:00:00Z&end_time=2024-01-08T11:00:00Z",
            ids.room_101
        ))
        .to_request();
    let res = test::call_service(&app, req).await;
    let res_status = res.status();
    let body = res.into_body().try_into_bytes().unwrap();
    assert_eq!(res_status, http::StatusCode::OK);
    let result: schoolplan_api_types::Availability = serde_json::from_slice(&body).unwrap();
    assert!(!result.is_available);
    assert_eq!(result.conflicting_events_count, 1);
    assert_eq!(result.conflicting_events[0].id, ids.event_math);

    let req = test::TestRequest::get()
        .uri("/api/v1/rooms/check-availability?room_id=9999&start_time=2024-01-08T10:00:00Z&end_time=2024-01-08T11:00:00Z")
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::NOT_FOUND);

    let req = test::TestRequest::get()
        .uri(&format!(
            "/api/v1/rooms/check-availability?room_id={}&start_time=2024-01-08T11:00:00Z&end_time=2024-01-08T11:00:00Z",
            ids.room_101
        ))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::UNPROCESSABLE_ENTITY);

    let req = test::TestRequest::get()
        .uri("/api/v1/rooms/check-availability?start_time=2024-01-08T10:00:00Z")
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn test_teacher_events() {
    let (_store, ids, state) = mock_state();
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(state.clone())),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/events")
        .set_json(json!({
            "room_id": ids.room_lab_a,
            "teacher_id": ids.teacher_john,
            "lesson_id": ids.lesson_math,
            "start_time": "2024-01-08T07:00:00Z",
            "end_time": "2024-01-08T08:00:00Z",
        }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::CREATED);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/teachers/{}/events", ids.teacher_john))
        .to_request();
    let res = test::call_service(&app, req).await;
    let res_status = res.status();
    let body = res.into_body().try_into_bytes().unwrap();
    assert_eq!(res_status, http::StatusCode::OK);
    let result: schoolplan_api_types::TeacherEvents = serde_json::from_slice(&body).unwrap();
    assert_eq!(result.teacher.name, "John Smith");
    assert_eq!(result.events.len(), 2);
    assert!(result.events[0].start_time < result.events[1].start_time);
    assert!(result.events.iter().all(|e| e.teacher_id == ids.teacher_john));

    let req = test::TestRequest::get()
        .uri("/api/v1/teachers/4242/events")
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_calendar_feed() {
    let (_store, ids, state) = mock_state();
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(state.clone())),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/v1/calendar?start=2024-01-08T00:00:00Z&end=2024-01-09T00:00:00Z")
        .to_request();
    let res = test::call_service(&app, req).await;
    let res_status = res.status();
    let body = res.into_body().try_into_bytes().unwrap();
    assert_eq!(res_status, http::StatusCode::OK);
    let result: Vec<schoolplan_api_types::CalendarItem> = serde_json::from_slice(&body).unwrap();
    assert_eq!(result.len(), 2);
    assert_eq!(result[0].id, ids.event_math);
    assert_eq!(result[0].title, "Mathematics with John Smith");
    assert_eq!(result[0].room_name, "Room 101");
    assert_eq!(result[1].title, "Chemistry with Sarah Johnson");

    // The window ends exactly when the mathematics lesson begins
    let req = test::TestRequest::get()
        .uri("/api/v1/calendar?start=2024-01-08T00:00:00Z&end=2024-01-08T09:00:00Z")
        .to_request();
    let res = test::call_service(&app, req).await;
    let body = res.into_body().try_into_bytes().unwrap();
    let result: Vec<schoolplan_api_types::CalendarItem> = serde_json::from_slice(&body).unwrap();
    assert!(result.is_empty());
}

#[actix_web::test]
async fn test_room_crud() {
    let (_store, ids, state) = mock_state();
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(state.clone())),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/rooms")
        .set_json(json!({"name": "Room 101", "capacity": 12}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::CONFLICT);

    let req = test::TestRequest::post()
        .uri("/api/v1/rooms")
        .set_json(json!({"name": "Laboratory B", "capacity": 0}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::UNPROCESSABLE_ENTITY);

    let req = test::TestRequest::post()
        .uri("/api/v1/rooms")
        .set_json(json!({"name": "Laboratory B", "capacity": 20}))
        .to_request();
    let res = test::call_service(&app, req).await;
    let res_status = res.status();
    let body = res.into_body().try_into_bytes().unwrap();
    assert_eq!(res_status, http::StatusCode::CREATED);
    let created: schoolplan_api_types::Room = serde_json::from_slice(&body).unwrap();

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/rooms/{}", created.id))
        .set_json(json!({"capacity": null}))
        .to_request();
    let res = test::call_service(&app, req).await;
    let res_status = res.status();
    let body = res.into_body().try_into_bytes().unwrap();
    assert_eq!(res_status, http::StatusCode::OK);
    let updated: schoolplan_api_types::Room = serde_json::from_slice(&body).unwrap();
    assert_eq!(updated.name, "Laboratory B");
    assert_eq!(updated.capacity, None);

    let req = test::TestRequest::get().uri("/api/v1/rooms").to_request();
    let res = test::call_service(&app, req).await;
    let body = res.into_body().try_into_bytes().unwrap();
    let rooms: Vec<schoolplan_api_types::Room> = serde_json::from_slice(&body).unwrap();
    assert_eq!(rooms.len(), 3);

    // Rooms with events cannot be deleted
    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/rooms/{}", ids.room_101))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::UNPROCESSABLE_ENTITY);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/rooms/{}", created.id))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::NO_CONTENT);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/rooms/{}", created.id))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_teacher_and_lesson_crud() {
    let (_store, ids, state) = mock_state();
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(state.clone())),
    )
    .await;

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/teachers/{}", ids.teacher_sarah))
        .set_json(json!({"email": null}))
        .to_request();
    let res = test::call_service(&app, req).await;
    let res_status = res.status();
    let body = res.into_body().try_into_bytes().unwrap();
    assert_eq!(res_status, http::StatusCode::OK);
    let updated: schoolplan_api_types::Teacher = serde_json::from_slice(&body).unwrap();
    assert_eq!(updated.name, "Sarah Johnson");
    assert_eq!(updated.email, None);

    let req = test::TestRequest::post()
        .uri("/api/v1/teachers")
        .set_json(json!({"name": "Other John", "email": "john.smith@school.com"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::CONFLICT);

    let req = test::TestRequest::post()
        .uri("/api/v1/lessons")
        .set_json(json!({"name": "History"}))
        .to_request();
    let res = test::call_service(&app, req).await;
    let res_status = res.status();
    let body = res.into_body().try_into_bytes().unwrap();
    assert_eq!(res_status, http::StatusCode::CREATED);
    let created: schoolplan_api_types::Lesson = serde_json::from_slice(&body).unwrap();
    assert_eq!(created.description, None);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/lessons/{}", created.id))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::NO_CONTENT);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/teachers/{}", ids.teacher_john))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::UNPROCESSABLE_ENTITY);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/lessons/{}", ids.lesson_math))
        .to_request();
    let res = test::call_service(&app, req).await;
    let body = res.into_body().try_into_bytes().unwrap();
    let lesson: schoolplan_api_types::Lesson = serde_json::from_slice(&body).unwrap();
    assert_eq!(lesson.name, "Mathematics");
}

#[actix_web::test]
async fn test_delete_event() {
    let (_store, ids, state) = mock_state();
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(state.clone())),
    )
    .await;

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/events/{}", ids.event_math))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::NO_CONTENT);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/events/{}", ids.event_math))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::NOT_FOUND);

    // The room is free again
    let req = test::TestRequest::post()
        .uri("/api/v1/events")
        .set_json(json!({
            "room_id": ids.room_101,
            "teacher_id": ids.teacher_sarah,
            "lesson_id": ids.lesson_chemistry,
            "start_time": "2024-01-08T09:00:00Z",
            "end_time": "2024-01-08T10:30:00Z",
        }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::CREATED);
}

#[actix_web::test]
async fn test_transaction_conflict() {
    let (store, _ids, state) = mock_state();
    let app = test::init_service(
        App::new()
            .configure(configure_app)
            .app_data(web::Data::new(state.clone())),
    )
    .await;

    store.data.lock().unwrap().next_error = Some(StoreError::TransactionConflict);
    let req = test::TestRequest::get().uri("/api/v1/events").to_request();
    let res = test::call_service(&app, req).await;
    let res_status = res.status();
    let body = res.into_body().try_into_bytes().unwrap();
    assert_eq!(res_status, http::StatusCode::SERVICE_UNAVAILABLE);
    let result: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(result["httpCode"], 503);
    assert!(result.get("conflict").is_none());
}

#[actix_web::test]
async fn test_room_ical() {
    let (_store, ids, state) = mock_state();
    let app = test::init_service(
        App::new()
            .configure(crate::web::ical::configure_app)
            .app_data(web::Data::new(state.clone())),
    )
    .await;

    let req = test::TestRequest::get()
        .uri(&format!("/rooms/{}/ical", ids.room_101))
        .to_request();
    let res = test::call_service(&app, req).await;
    let res_status = res.status();
    let content_type = res
        .headers()
        .get(http::header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_owned();
    let body = res.into_body().try_into_bytes().unwrap();
    assert_eq!(res_status, http::StatusCode::OK);
    assert!(content_type.starts_with("text/calendar"));
    let body = String::from_utf8(body.to_vec()).unwrap();
    assert!(body.contains("SUMMARY:Mathematics with John Smith"));
    assert!(!body.contains("Chemistry"));

    let req = test::TestRequest::get()
        .uri("/teachers/4242/ical")
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), http::StatusCode::NOT_FOUND);
}
