use crate::data_store::EventId;
use crate::scheduling::TimeSlot;
use crate::web::api::APIError;
use crate::web::util::EventFilterAsQuery;
use crate::web::AppState;
use actix_web::{delete, get, patch, post, put, web, HttpResponse, Responder};

#[get("/events")]
async fn list_events(
    query: web::Query<EventFilterAsQuery>,
    state: web::Data<AppState>,
) -> Result<impl Responder, APIError> {
    let events: Vec<schoolplan_api_types::Event> = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        Ok(store.get_events(query.into_inner().into())?)
    })
    .await??
    .into_iter()
    .map(|e| e.into())
    .collect();
    Ok(web::Json(events))
}

#[get("/events/{event_id}")]
async fn get_event(
    path: web::Path<EventId>,
    state: web::Data<AppState>,
) -> Result<impl Responder, APIError> {
    let event_id = path.into_inner();
    let event: schoolplan_api_types::Event = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        Ok(store.get_event(event_id)?)
    })
    .await??
    .into();
    Ok(web::Json(event))
}

#[post("/events")]
async fn create_event(
    data: web::Json<schoolplan_api_types::NewEvent>,
    state: web::Data<AppState>,
) -> Result<impl Responder, APIError> {
    insert_event(data.into_inner(), state).await
}

#[post("/events/schedule")]
async fn schedule_event(
    data: web::Json<schoolplan_api_types::NewEvent>,
    state: web::Data<AppState>,
) -> Result<impl Responder, APIError> {
    insert_event(data.into_inner(), state).await
}

async fn insert_event(
    event: schoolplan_api_types::NewEvent,
    state: web::Data<AppState>,
) -> Result<HttpResponse, APIError> {
    let created: schoolplan_api_types::Event = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        Ok(store.create_event(event.into())?)
    })
    .await??
    .into();
    Ok(HttpResponse::Created().json(created))
}

#[patch("/events/{event_id}")]
async fn change_event(
    path: web::Path<EventId>,
    data: web::Json<schoolplan_api_types::EventPatch>,
    state: web::Data<AppState>,
) -> Result<impl Responder, APIError> {
    apply_event_patch(path.into_inner(), data.into_inner(), state).await
}

/// Same as [change_event]: fields missing in the request body keep their stored value.
#[put("/events/{event_id}")]
async fn replace_event(
    path: web::Path<EventId>,
    data: web::Json<schoolplan_api_types::EventPatch>,
    state: web::Data<AppState>,
) -> Result<impl Responder, APIError> {
    apply_event_patch(path.into_inner(), data.into_inner(), state).await
}

async fn apply_event_patch(
    event_id: EventId,
    patch: schoolplan_api_types::EventPatch,
    state: web::Data<AppState>,
) -> Result<web::Json<schoolplan_api_types::Event>, APIError> {
    let updated: schoolplan_api_types::Event = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        Ok(store.update_event(event_id, patch.into())?)
    })
    .await??
    .into();
    Ok(web::Json(updated))
}

#[patch("/events/{event_id}/reschedule")]
async fn reschedule_event(
    path: web::Path<EventId>,
    data: web::Json<schoolplan_api_types::Reschedule>,
    state: web::Data<AppState>,
) -> Result<impl Responder, APIError> {
    let event_id = path.into_inner();
    let reschedule = data.into_inner();
    let slot = TimeSlot::new(reschedule.start_time, reschedule.end_time)?;
    let updated: schoolplan_api_types::Event = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        Ok(store.reschedule_event(event_id, reschedule.room_id, slot)?)
    })
    .await??
    .into();
    Ok(web::Json(updated))
}

#[delete("/events/{event_id}")]
async fn delete_event(
    path: web::Path<EventId>,
    state: web::Data<AppState>,
) -> Result<impl Responder, APIError> {
    let event_id = path.into_inner();
    web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        store.delete_event(event_id)?;
        Ok(())
    })
    .await??;

    Ok(HttpResponse::NoContent())
}
