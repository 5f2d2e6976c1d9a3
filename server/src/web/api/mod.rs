use std::fmt::Display;

mod endpoints_calendar;
mod endpoints_event;
mod endpoints_lesson;
mod endpoints_room;
mod endpoints_teacher;
#[cfg(test)]
mod tests;

use crate::data_store::StoreError;
use actix_web::error::{JsonPayloadError, QueryPayloadError};
use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    web, HttpResponse,
};
use serde_json::json;

pub fn configure_app(cfg: &mut web::ServiceConfig) {
    cfg.service(get_api_service());
}

fn get_api_service() -> actix_web::Scope {
    let json_config =
        web::JsonConfig::default().error_handler(|err, _req| APIError::InvalidJson(err).into());
    let query_config =
        web::QueryConfig::default().error_handler(|err, _req| APIError::InvalidQuery(err).into());
    web::scope("/api/v1")
        .app_data(json_config)
        .app_data(query_config)
        .service(endpoints_teacher::list_teachers)
        .service(endpoints_teacher::get_teacher)
        .service(endpoints_teacher::create_teacher)
        .service(endpoints_teacher::update_teacher)
        .service(endpoints_teacher::delete_teacher)
        .service(endpoints_teacher::list_teacher_events)
        .service(endpoints_lesson::list_lessons)
        .service(endpoints_lesson::get_lesson)
        .service(endpoints_lesson::create_lesson)
        .service(endpoints_lesson::update_lesson)
        .service(endpoints_lesson::delete_lesson)
        // must be registered before `/rooms/{room_id}`
        .service(endpoints_room::check_availability)
        .service(endpoints_room::list_rooms)
        .service(endpoints_room::get_room)
        .service(endpoints_room::create_room)
        .service(endpoints_room::update_room)
        .service(endpoints_room::delete_room)
        .service(endpoints_room::get_room_availability)
        .service(endpoints_event::list_events)
        .service(endpoints_event::create_event)
        .service(endpoints_event::schedule_event)
        .service(endpoints_event::get_event)
        .service(endpoints_event::change_event)
        .service(endpoints_event::replace_event)
        .service(endpoints_event::reschedule_event)
        .service(endpoints_event::delete_event)
        .service(endpoints_calendar::calendar_feed)
}

#[derive(Debug)]
pub enum APIError {
    NotExisting,
    AlreadyExisting,
    InvalidJson(JsonPayloadError),
    InvalidQuery(QueryPayloadError),
    InvalidData(String),
    RoomConflict(schoolplan_api_types::RoomConflict, String),
    TransactionConflict,
    InternalError(String),
}

impl Display for APIError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotExisting => f.write_str("Element does not exist")?,
            Self::AlreadyExisting => {
                f.write_str("Element already exists")?;
            }
            Self::InternalError(s) => {
                f.write_str("Internal error: ")?;
                f.write_str(s)?;
            }
            Self::InvalidJson(e) => {
                write!(f, "Invalid JSON request data: {}", e)?;
            }
            Self::InvalidQuery(e) => {
                write!(f, "Invalid query parameters: {}", e)?;
            }
            Self::InvalidData(e) => {
                write!(f, "Invalid request data: {}", e)?;
            }
            Self::RoomConflict(_, message) => {
                f.write_str(message)?;
            }
            Self::TransactionConflict => {
                f.write_str("Concurrent database transaction conflict. Please retry request.")?;
            }
        };
        Ok(())
    }
}

impl ResponseError for APIError {
    fn error_response(&self) -> HttpResponse {
        let message = format!("{}", self);

        let mut body = json!({
            "httpCode": self.status_code().as_u16(),
            "message": message
        });
        if let Self::RoomConflict(conflict, _) = self {
            body["conflict"] = serde_json::to_value(conflict).unwrap_or_default();
        }
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(body)
    }
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotExisting => StatusCode::NOT_FOUND,
            Self::AlreadyExisting => StatusCode::CONFLICT,
            Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidJson(e) => match e {
                JsonPayloadError::ContentType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                JsonPayloadError::Deserialize(json_error) if json_error.is_data() => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                _ => StatusCode::BAD_REQUEST,
            },
            Self::InvalidQuery(e) => match e {
                QueryPayloadError::Deserialize(_) => StatusCode::UNPROCESSABLE_ENTITY,
                _ => StatusCode::BAD_REQUEST,
            },
            Self::InvalidData(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::RoomConflict(..) => StatusCode::CONFLICT,
            Self::TransactionConflict => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<StoreError> for APIError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::ConnectionError(error) => {
                Self::InternalError(format!("Could not connect to database: {}", error))
            }
            StoreError::QueryError(diesel_error) => Self::InternalError(format!(
                "Error while executing database query: {}",
                diesel_error
            )),
            StoreError::TransactionConflict => Self::TransactionConflict,
            StoreError::NotExisting => Self::NotExisting,
            StoreError::ConflictEntityExists => Self::AlreadyExisting,
            StoreError::RoomConflict(conflict) => {
                let message = conflict.to_string();
                Self::RoomConflict(conflict.into(), message)
            }
            StoreError::InvalidInputData(e) => Self::InvalidData(e),
            StoreError::InvalidDataInDatabase(e) => Self::InternalError(format!(
                "Data queried from database could not be deserialized: {}",
                e
            )),
        }
    }
}

impl From<crate::scheduling::InvalidTimeSlot> for APIError {
    fn from(e: crate::scheduling::InvalidTimeSlot) -> Self {
        APIError::InvalidData(e.to_string())
    }
}

impl From<actix_web::error::BlockingError> for APIError {
    fn from(_e: actix_web::error::BlockingError) -> Self {
        APIError::InternalError(
            "Could not get thread from thread pool for synchronous database operation.".to_owned(),
        )
    }
}
