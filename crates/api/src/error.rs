//! HTTP error type shared by every handler.
//!
//! Every failure is rendered as `{ "success": false, "error": "<message>" }`
//! with a matching status code.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use db::DbError;
use monitor::MonitorError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("missing or invalid credentials")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("database error")]
    Database(#[source] DbError),

    #[error("internal error")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound => ApiError::NotFound("record"),
            DbError::Conflict(msg) => ApiError::Conflict(msg),
            other => ApiError::Database(other),
        }
    }
}

/// Name the missing record instead of the generic "record not found".
pub trait OrNotFound<T> {
    fn or_not_found(self, entity: &'static str) -> Result<T, ApiError>;
}

impl<T> OrNotFound<T> for Result<T, DbError> {
    fn or_not_found(self, entity: &'static str) -> Result<T, ApiError> {
        self.map_err(|e| match e {
            DbError::NotFound => ApiError::NotFound(entity),
            other => other.into(),
        })
    }
}

impl From<MonitorError> for ApiError {
    fn from(err: MonitorError) -> Self {
        match err {
            MonitorError::InvalidTransition { .. } => ApiError::Conflict(err.to_string()),
            MonitorError::UnknownStatus { .. }
            | MonitorError::UnknownFallCode(_)
            | MonitorError::InvalidCoordinate { .. }
            | MonitorError::InvalidPolicy(_) => ApiError::Validation(err.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            ApiError::Database(e) => error!("database failure: {e}"),
            ApiError::Internal(detail) => error!("internal failure: {detail}"),
            _ => {}
        }

        (status, Json(json!({ "success": false, "error": self.to_string() }))).into_response()
    }
}
