use std::borrow::Cow;
use std::fmt;

use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse
};
use derive_more::Display;
use serde::Serialize;
use uuid::Uuid;
use validator::{ValidationError, ValidationErrors};

#[derive(Debug)]
pub enum AppError {
    ValidationError(Vec<FieldError>),
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    BadGateway(String),
    InternalError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::ValidationError(errors) => {
                let messages = errors.iter()
                    .map(|e| format!("{}:{}", e.field, e.message))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "validation error: {}", messages)
            }
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::BadGateway(msg) => write!(f, "Upstream error: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal server error: {}", msg)
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::ValidationError(errors) => {
                serde_json::json!({
                    "error": "Validation failed",
                    "details": errors
                })
            }
            _ => {
                serde_json::json!({"error": self.to_string()})
            }
        };
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let field_errors = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(|e| FieldError {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "Invalid value".to_string()),
                })
            })
            .collect();

        AppError::ValidationError(field_errors)
    }
}

impl From<ParameterError> for AppError {
    fn from(err: ParameterError) -> Self {
        AppError::ValidationError(vec![FieldError {
            field: err.field().to_string(),
            message: err.to_string(),
        }])
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        AppError::NotFound(err.to_string())
    }
}

impl From<ExportError> for AppError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::Busy
            | ExportError::NothingSelected
            | ExportError::Discarded => AppError::Conflict(err.to_string()),
            ExportError::DownloadFailed(_) => AppError::BadGateway(err.to_string()),
            ExportError::ArchiveCreationFailed(_) => AppError::InternalError(err.to_string()),
        }
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::InternalError(format!("Delivery URL error: {}", err))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalError(err.to_string())
    }
}

/// Rejected display options. Raised before anything reaches a session.
#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum ParameterError {
    #[display("Invalid color: {_0}")]
    InvalidColor(String),

    #[display("Invalid aspect ratio: {_0}")]
    InvalidAspectRatio(String),
}

impl ParameterError {
    pub fn field(&self) -> &'static str {
        match self {
            ParameterError::InvalidColor(_) => "background_color",
            ParameterError::InvalidAspectRatio(_) => "aspect_ratio",
        }
    }
}

#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[display("Unknown record: {_0}")]
    UnknownRecord(String),

    #[display("Session not found: {_0}")]
    SessionNotFound(Uuid),
}

#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum ExportError {
    #[display("An export is already in progress")]
    Busy,

    #[display("No image is selected")]
    NothingSelected,

    #[display("Download failed: {_0}")]
    DownloadFailed(String),

    #[display("Failed to create archive: {_0}")]
    ArchiveCreationFailed(String),

    #[display("Session changed while exporting; results discarded")]
    Discarded,
}

#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum SaveError {
    #[display("Too many pending downloads (limit {_0})")]
    CapacityExceeded(usize),

    #[display("Refusing to save an empty file: {_0}")]
    EmptyPayload(String),
}

#[derive(Debug, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

pub fn new_validation_error(code: &'static str, msg: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(msg));
    err
}
