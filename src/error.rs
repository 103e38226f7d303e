use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{error, warn};

use crate::{
    pagination::PaginationError,
    users::UserError,
    validate::{validate_data, FieldRule, ValidationError},
};

/// Error returned by handlers and extractors, rendered as `{"message": ...}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        error!(error = %err, "internal error");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "message": self.message }))).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::bad_request(err.to_string())
    }
}

/// Checks a JSON body against `rules` before deserializing it into `T`.
pub fn parse_payload<T: DeserializeOwned>(
    body: Result<Json<Value>, JsonRejection>,
    rules: &[FieldRule],
) -> Result<T, ApiError> {
    let Json(data) = body.map_err(|rejection| {
        warn!(error = %rejection.body_text(), "unreadable request body");
        ApiError::bad_request(rejection.body_text())
    })?;
    validate_data(&data, rules)?;
    serde_json::from_value(data).map_err(|e| ApiError::bad_request(e.to_string()))
}

impl From<PaginationError> for ApiError {
    fn from(err: PaginationError) -> Self {
        match err {
            PaginationError::Validation(message) => {
                warn!(%message, "rejected page request");
                Self::bad_request(message)
            }
            PaginationError::Storage(e) => {
                error!(error = %e, "storage failure while paginating");
                Self::new(StatusCode::SERVICE_UNAVAILABLE, "Storage error occurred.")
            }
            PaginationError::Internal(e) => Self::internal(e),
        }
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound => Self::not_found(err.to_string()),
            UserError::Conflict => Self::new(StatusCode::CONFLICT, err.to_string()),
            UserError::InvalidCredentials => Self::unauthorized(err.to_string()),
            UserError::IncorrectPassword | UserError::Validation(_) => {
                Self::bad_request(err.to_string())
            }
            UserError::Pagination(e) => e.into(),
            UserError::Storage(e) => Self::internal(e),
            UserError::Internal(e) => Self::internal(e),
        }
    }
}
