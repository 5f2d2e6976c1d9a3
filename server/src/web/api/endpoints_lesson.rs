use crate::data_store::LessonId;
use crate::web::api::APIError;
use crate::web::AppState;
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};

#[get("/lessons")]
async fn list_lessons(state: web::Data<AppState>) -> Result<impl Responder, APIError> {
    let lessons: Vec<schoolplan_api_types::Lesson> = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        Ok(store.get_lessons()?)
    })
    .await??
    .into_iter()
    .map(|l| l.into())
    .collect();
    Ok(web::Json(lessons))
}

#[get("/lessons/{lesson_id}")]
async fn get_lesson(
    path: web::Path<LessonId>,
    state: web::Data<AppState>,
) -> Result<impl Responder, APIError> {
    let lesson_id = path.into_inner();
    let lesson: schoolplan_api_types::Lesson = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        Ok(store.get_lesson(lesson_id)?)
    })
    .await??
    .into();
    Ok(web::Json(lesson))
}

#[post("/lessons")]
async fn create_lesson(
    data: web::Json<schoolplan_api_types::NewLesson>,
    state: web::Data<AppState>,
) -> Result<impl Responder, APIError> {
    let lesson = data.into_inner();
    let created: schoolplan_api_types::Lesson = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        Ok(store.create_lesson(lesson.into())?)
    })
    .await??
    .into();
    Ok(HttpResponse::Created().json(created))
}

#[put("/lessons/{lesson_id}")]
async fn update_lesson(
    path: web::Path<LessonId>,
    data: web::Json<schoolplan_api_types::LessonPatch>,
    state: web::Data<AppState>,
) -> Result<impl Responder, APIError> {
    let lesson_id = path.into_inner();
    let patch = data.into_inner();
    let updated: schoolplan_api_types::Lesson = web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        Ok(store.update_lesson(lesson_id, patch.into())?)
    })
    .await??
    .into();
    Ok(web::Json(updated))
}

#[delete("/lessons/{lesson_id}")]
async fn delete_lesson(
    path: web::Path<LessonId>,
    state: web::Data<AppState>,
) -> Result<impl Responder, APIError> {
    let lesson_id = path.into_inner();
    web::block(move || -> Result<_, APIError> {
        let mut store = state.store.get_facade()?;
        store.delete_lesson(lesson_id)?;
        Ok(())
    })
    .await??;

    Ok(HttpResponse::NoContent())
}
