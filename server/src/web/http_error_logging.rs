use crate::web::api::APIError;
use log::{error, info, warn};

pub async fn error_logging_middleware<B: actix_web::body::MessageBody>(
    req: actix_web::dev::ServiceRequest,
    next: actix_web::middleware::Next<B>,
) -> Result<actix_web::dev::ServiceResponse<B>, actix_web::Error> {
    let response = next.call(req).await?;

    if let Some(error) = response.response().error() {
        if let Some(api_error) = error.as_error::<APIError>() {
            match api_error {
                APIError::RoomConflict(conflict, _) => {
                    info!(
                        "HTTP {} room conflict at <{}>: room {} is occupied{}",
                        response.response().status(),
                        response.request().uri(),
                        conflict.room_id,
                        conflict
                            .blocking_event
                            .as_ref()
                            .map(|e| format!(" by event {}", e.id))
                            .unwrap_or_default()
                    );
                }
                APIError::InvalidData(e) => {
                    warn!(
                        "HTTP {} invalid data at <{}>: {}",
                        response.response().status(),
                        response.request().uri(),
                        e
                    );
                }
                APIError::InvalidJson(e) => {
                    warn!(
                        "HTTP {} invalid JSON at <{}>: {}",
                        response.response().status(),
                        response.request().uri(),
                        e
                    );
                }
                APIError::InvalidQuery(e) => {
                    warn!(
                        "HTTP {} invalid query at <{}>: {}",
                        response.response().status(),
                        response.request().uri(),
                        e
                    );
                }
                APIError::TransactionConflict => {
                    warn!(
                        "HTTP {} database transaction conflict at <{}>",
                        response.response().status(),
                        response.request().uri(),
                    );
                }
                APIError::NotExisting | APIError::AlreadyExisting => {}
                APIError::InternalError(e) => {
                    error!(
                        "HTTP {} internal server error at <{}>: {}",
                        response.response().status(),
                        response.request().uri(),
                        e
                    );
                }
            }
        } else {
            error!(
                "HTTP {} unexpected error at <{}>: {:?}",
                response.response().status(),
                response.request().uri(),
                error
            );
        }
    }
    Ok(response)
}
