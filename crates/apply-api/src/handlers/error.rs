//! API error type: maps `OrchestratorError`/`PipelineError`/`DomainError`
//! onto HTTP statuses. Grounded on the teacher's `handlers/error.rs`
//! `ApiError` + `ErrorResponse` + `IntoResponse` shape, narrowed to the
//! variants this domain's `From` impls actually produce.

use apply_adapters::{OrchestratorError, PipelineError};
use apply_domain::DomainError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug)]
pub enum ApiError {
    NotFound { resource: String, id: String },
    BadRequest { message: String },
    Conflict { message: String },
    Busy,
    Internal { message: String },
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: u16,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            ApiError::NotFound { resource, id } => {
                (StatusCode::NOT_FOUND, format!("{resource} not found: {id}"))
            }
            ApiError::BadRequest { message } => (StatusCode::BAD_REQUEST, message.clone()),
            ApiError::Conflict { message } => (StatusCode::CONFLICT, message.clone()),
            ApiError::Busy => (
                StatusCode::SERVICE_UNAVAILABLE,
                "apply-serialization lease unavailable, try again shortly".to_string(),
            ),
            ApiError::Internal { message } => {
                tracing::error!(error = %message, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_string())
            }
        };

        let body = ErrorResponse {
            error,
            code: status.as_u16(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<OrchestratorError> for ApiError {
    fn from(err: OrchestratorError) -> Self {
        match err {
            OrchestratorError::EmptyJobKey => ApiError::BadRequest {
                message: err.to_string(),
            },
            OrchestratorError::JobNotFound { job_key } => ApiError::NotFound {
                resource: "job".to_string(),
                id: job_key,
            },
            OrchestratorError::SessionNotFound { job_key } => ApiError::NotFound {
                resource: "apply session".to_string(),
                id: job_key,
            },
            OrchestratorError::AlreadyInProgress { .. } => ApiError::Conflict {
                message: err.to_string(),
            },
            OrchestratorError::Busy => ApiError::Busy,
            OrchestratorError::JobStore(_) | OrchestratorError::Worker(_) => ApiError::Internal {
                message: err.to_string(),
            },
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::EmptyJobKey => ApiError::BadRequest {
                message: err.to_string(),
            },
            PipelineError::JobNotFound { job_key } => ApiError::NotFound {
                resource: "job".to_string(),
                id: job_key,
            },
            PipelineError::AlreadyInProgress { .. } => ApiError::Conflict {
                message: err.to_string(),
            },
            PipelineError::JobStore(_) => ApiError::Internal {
                message: err.to_string(),
            },
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::SessionNotFound { job_key } => ApiError::NotFound {
                resource: "apply session".to_string(),
                id: job_key,
            },
            DomainError::ConfirmationTimedOut { .. } | DomainError::ConfirmationCancelled => {
                ApiError::Conflict {
                    message: err.to_string(),
                }
            }
            other => ApiError::BadRequest {
                message: other.to_string(),
            },
        }
    }
}
