use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::services::{GateError, PhotoStoreError};

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    DatabaseError(String),

    ValidationError(String),

    InternalError(String),

    Unauthorized(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            ApiError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            ApiError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
        };

        let body = ApiResponse::<()>::error(error_message);
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::DatabaseError(err.to_string())
    }
}

impl From<GateError> for ApiError {
    fn from(err: GateError) -> Self {
        match err {
            GateError::Denied => ApiError::Unauthorized(err.to_string()),
            GateError::Validation(msg) => ApiError::ValidationError(msg),
            GateError::Database(msg) => ApiError::DatabaseError(msg),
            GateError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<PhotoStoreError> for ApiError {
    fn from(err: PhotoStoreError) -> Self {
        match err {
            PhotoStoreError::UnsupportedType(_) => ApiError::ValidationError(err.to_string()),
            PhotoStoreError::ForeignUrl(_) | PhotoStoreError::Io(_) => {
                ApiError::InternalError(err.to_string())
            }
            PhotoStoreError::RemoveFailed { .. } => ApiError::InternalError(err.to_string()),
        }
    }
}

impl ApiError {
    pub fn gallo_not_found(id: &str) -> Self {
        ApiError::NotFound(format!("Gallo {} not found", id))
    }

    pub fn encaste_not_found(id: &str) -> Self {
        ApiError::NotFound(format!("Encaste {} not found", id))
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::ValidationError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::InternalError(msg.into())
    }

    pub fn clave_incorrecta() -> Self {
        ApiError::Unauthorized("Clave de edición incorrecta".to_string())
    }
}
