use crate::data_store::models::Event;
use crate::data_store::RoomId;
use crate::scheduling::TimeSlot;
use crate::web::api::APIError;
use crate::web::util::{AvailabilityQuery, TimeSlotQuery};
use crate::web::AppState;
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};

#[get("/rooms")]
async fn list_rooms(state: web::Data<AppState>) -> Result<impl Responder, APIError> {
    let rooms: Vec<schoolplan_api_types::Room> = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        Ok(store.get_rooms()?)
    })
    .await??
    .into_iter()
    .map(|r| r.into())
    .collect();
    Ok(web::Json(rooms))
}

#[get("/rooms/{room_id}")]
async fn get_room(
    path: web::Path<RoomId>,
    state: web::Data<AppState>,
) -> Result<impl Responder, APIError> {
    let room_id = path.into_inner();
    let room: schoolplan_api_types::Room = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        Ok(store.get_room(room_id)?)
    })
    .await??
    .into();
    Ok(web::Json(room))
}

#[post("/rooms")]
async fn create_room(
    data: web::Json<schoolplan_api_types::NewRoom>,
    state: web::Data<AppState>,
) -> Result<impl Responder, APIError> {
    let room = data.into_inner();
    let created: schoolplan_api_types::Room = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        Ok(store.create_room(room.into())?)
    })
    .await??
    .into();
    Ok(HttpResponse::Created().json(created))
}

#[put("/rooms/{room_id}")]
async fn update_room(
    path: web::Path<RoomId>,
    data: web::Json<schoolplan_api_types::RoomPatch>,
    state: web::Data<AppState>,
) -> Result<impl Responder, APIError> {
    let room_id = path.into_inner();
    let patch = data.into_inner();
    let updated: schoolplan_api_types::Room = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        Ok(store.update_room(room_id, patch.into())?)
    })
    .await??
    .into();
    Ok(web::Json(updated))
}

#[delete("/rooms/{room_id}")]
async fn delete_room(
    path: web::Path<RoomId>,
    state: web::Data<AppState>,
) -> Result<impl Responder, APIError> {
    let room_id = path.into_inner();
    web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        store.delete_room(room_id)?;
        Ok(())
    })
    .await??;

    Ok(HttpResponse::NoContent())
}

#[get("/rooms/check-availability")]
async fn check_availability(
    query: web::Query<AvailabilityQuery>,
    state: web::Data<AppState>,
) -> Result<impl Responder, APIError> {
    let query = query.into_inner();
    let slot = query.time_slot()?;
    let availability = query_availability(state, query.room_id, slot).await?;
    Ok(web::Json(availability))
}

#[get("/rooms/{room_id}/availability")]
async fn get_room_availability(
    path: web::Path<RoomId>,
    query: web::Query<TimeSlotQuery>,
    state: web::Data<AppState>,
) -> Result<impl Responder, APIError> {
    let room_id = path.into_inner();
    let slot = query.into_inner().time_slot()?;
    let availability = query_availability(state, room_id, slot).await?;
    Ok(web::Json(availability))
}

async fn query_availability(
    state: web::Data<AppState>,
    room_id: RoomId,
    slot: TimeSlot,
) -> Result<schoolplan_api_types::Availability, APIError> {
    let conflicting_events = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        Ok(store.check_room_availability(room_id, slot)?)
    })
    .await??;
    Ok(availability_response(room_id, slot, conflicting_events))
}

fn availability_response(
    room_id: RoomId,
    slot: TimeSlot,
    conflicting_events: Vec<Event>,
) -> schoolplan_api_types::Availability {
    schoolplan_api_types::Availability {
        room_id,
        start_time: slot.start(),
        end_time: slot.end(),
        is_available: conflicting_events.is_empty(),
        conflicting_events_count: conflicting_events.len(),
        conflicting_events: conflicting_events.into_iter().map(|e| e.into()).collect(),
    }
}
