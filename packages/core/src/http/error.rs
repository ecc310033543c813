//! HTTP error responses
//!
//! Every failed request serializes as `{"ok":false,"message":...,"code":...}`
//! with the status derived from the machine-readable code.

use crate::services::ServiceError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub ok: bool,
    pub message: String,
    pub code: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
            code: code.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(message, "UNAUTHORIZED")
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(message, "FORBIDDEN")
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(message, "VALIDATION_ERROR")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.code.as_str() {
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "CYCLE" | "CONFLICT" => StatusCode::CONFLICT,
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        let code = match &err {
            ServiceError::NotFound { .. } => "NOT_FOUND",
            ServiceError::Validation(_) => "VALIDATION_ERROR",
            ServiceError::Cycle { .. } => "CYCLE",
            ServiceError::Conflict(_) => "CONFLICT",
            ServiceError::Transaction { .. } | ServiceError::Database(_) => "INTERNAL_ERROR",
        };
        ApiError::new(err.to_string(), code)
    }
}
