use actix_web::{error::JsonPayloadError, web};

use crate::errors::{AppError, FieldError};

/// Malformed bodies come back in the same shape as validation failures.
pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .limit(1 << 20)
            .error_handler(|err, _req| json_payload_error(err).into()),
    );
}

fn json_payload_error(err: JsonPayloadError) -> AppError {
    match err {
        JsonPayloadError::Deserialize(e) => AppError::ValidationError(vec![FieldError {
            field: "body".to_string(),
            message: e.to_string(),
        }]),
        JsonPayloadError::ContentType => {
            AppError::BadRequest("Content-Type must be application/json".to_string())
        }
        other => AppError::BadRequest(format!("JSON payload error: {}", other)),
    }
}
