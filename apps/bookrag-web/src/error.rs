use axum::extract::rejection::JsonRejection;
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

use bookrag_core::error::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("upstream error: {0}")]
    BadGateway(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let message = err.to_string();
        match err {
            Error::InvalidInput(_) => ApiError::BadRequest(message),
            Error::MissingApiKey | Error::StoreNotFound(_) => ApiError::ServiceUnavailable(message),
            Error::EmbedderMismatch { .. } => ApiError::Conflict(message),
            Error::Embedding(_) | Error::Chat(_) => ApiError::BadGateway(message),
            Error::Store(_) | Error::InvalidConfig(_) | Error::Io(_) => ApiError::Internal(message),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        if status.is_server_error() {
            tracing::error!(%status, "{}", message);
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}
