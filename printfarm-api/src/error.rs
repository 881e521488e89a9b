use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use printfarm_catalog::{LogisticsError, ValidationError};
use printfarm_core::{SessionError, StoreError};
use printfarm_store::CopywriterError;
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    Unauthorized(String),
    Validation(String),
    NotFound(String),
    Conflict(String),
    /// The AI provider failed or rejected the call.
    Upstream(String),
    Anyhow(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Upstream(msg) => {
                tracing::warn!("Upstream failure: {}", msg);
                (StatusCode::BAD_GATEWAY, msg)
            }
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {:#}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => AppError::NotFound(err.to_string()),
            StoreError::Conflict(msg) => AppError::Conflict(msg),
            StoreError::InUse { .. } => AppError::Conflict(err.to_string()),
            StoreError::Invalid(e) => AppError::Validation(e.to_string()),
            StoreError::Backend(_) => AppError::Anyhow(err.into()),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<LogisticsError> for AppError {
    fn from(err: LogisticsError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<CopywriterError> for AppError {
    fn from(err: CopywriterError) -> Self {
        match err {
            CopywriterError::MissingApiKey => AppError::Validation(err.to_string()),
            CopywriterError::Api(_) | CopywriterError::Http(_) => AppError::Upstream(err.to_string()),
        }
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        AppError::Anyhow(err.into())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Anyhow(err)
    }
}
