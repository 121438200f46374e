use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::{
    dao::storage::StorageError,
    state::{
        ledger::LedgerError,
        lifecycle::InvalidTransition,
        rounds::InvalidRound,
    },
};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Party, participant or song reference does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Starting a competition whose song pool is empty.
    #[error("party `{0}` has no songs to play")]
    NoSongs(String),
    /// Owners requested before their reveal step ran.
    #[error("not revealed yet: {0}")]
    NotRevealed(String),
    /// Admin-gated operation with a missing or mismatching token.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Operation cannot be performed in the current lifecycle phase.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Storage backend failed or rejected the write.
    #[error("storage failure")]
    Storage(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
}

impl ServiceError {
    pub(crate) fn party_not_found(party_id: &str) -> Self {
        ServiceError::NotFound(format!("party `{party_id}` does not exist"))
    }
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Storage(err)
    }
}

impl From<InvalidTransition> for ServiceError {
    fn from(err: InvalidTransition) -> Self {
        ServiceError::InvalidState(err.to_string())
    }
}

impl From<InvalidRound> for ServiceError {
    fn from(err: InvalidRound) -> Self {
        ServiceError::InvalidInput(err.to_string())
    }
}

impl From<LedgerError> for ServiceError {
    fn from(err: LedgerError) -> Self {
        ServiceError::NotFound(err.to_string())
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Unauthorized access attempt.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Resource exists but is not visible yet.
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            err @ ServiceError::NoSongs(_) => AppError::Conflict(err.to_string()),
            ServiceError::NotRevealed(message) => AppError::Forbidden(message),
            ServiceError::Unauthorized(message) => AppError::Unauthorized(message),
            ServiceError::InvalidState(message) => AppError::Conflict(message),
            ServiceError::Storage(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}
