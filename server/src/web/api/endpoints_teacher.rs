use crate::data_store::{EventFilterBuilder, TeacherId};
use crate::web::api::APIError;
use crate::web::AppState;
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};

#[get("/teachers")]
async fn list_teachers(state: web::Data<AppState>) -> Result<impl Responder, APIError> {
    let teachers: Vec<schoolplan_api_types::Teacher> =
        web::block(move || -> Result<_, APIError> {
            let mut store = state.store.get_facade()?;
            Ok(store.get_teachers()?)
        })
        .await??
        .into_iter()
        .map(|t| t.into())
        .collect();
    Ok(web::Json(teachers))
}

#[get("/teachers/{teacher_id}")]
async fn get_teacher(
    path: web::Path<TeacherId>,
    state: web::Data<AppState>,
) -> Result<impl Responder, APIError> {
    let teacher_id = path.into_inner();
    let teacher: schoolplan_api_types::Teacher = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        Ok(store.get_teacher(teacher_id)?)
    })
    .await??
    .into();
    Ok(web::Json(teacher))
}

#[post("/teachers")]
async fn create_teacher(
    data: web::Json<schoolplan_api_types::NewTeacher>,
    state: web::Data<AppState>,
) -> Result<impl Responder, APIError> {
    let teacher = data.into_inner();
    let created: schoolplan_api_types::Teacher = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        Ok(store.create_teacher(teacher.into())?)
    })
    .await??
    .into();
    Ok(HttpResponse::Created().json(created))
}

#[put("/teachers/{teacher_id}")]
async fn update_teacher(
    path: web::Path<TeacherId>,
    data: web::Json<schoolplan_api_types::TeacherPatch>,
    state: web::Data<AppState>,
) -> Result<impl Responder, APIError> {
    let teacher_id = path.into_inner();
    let patch = data.into_inner();
    let updated: schoolplan_api_types::Teacher = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        Ok(store.update_teacher(teacher_id, patch.into())?)
    })
    .await??
    .into();
    Ok(web::Json(updated))
}

#[delete("/teachers/{teacher_id}")]
async fn delete_teacher(
    path: web::Path<TeacherId>,
    state: web::Data<AppState>,
) -> Result<impl Responder, APIError> {
    let teacher_id = path.into_inner();
    web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        store.delete_teacher(teacher_id)?;
        Ok(())
    })
    .await??;

    Ok(HttpResponse::NoContent())
}

/// The teacher together with all of their events, in chronological order
#[get("/teachers/{teacher_id}/events")]
async fn list_teacher_events(
    path: web::Path<TeacherId>,
    state: web::Data<AppState>,
) -> Result<impl Responder, APIError> {
    let teacher_id = path.into_inner();
    let (teacher, events) = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        let teacher = store.get_teacher(teacher_id)?;
        let events =
            store.get_events(EventFilterBuilder::new().taught_by(teacher_id).build())?;
        Ok((teacher, events))
    })
    .await??;

    Ok(web::Json(schoolplan_api_types::TeacherEvents {
        teacher: teacher.into(),
        events: events.into_iter().map(|e| e.into()).collect(),
    }))
}
