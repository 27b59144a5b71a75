use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::{
    dao::storage::StorageError,
    state::{roster::RosterError, setup::SetupError, tracking::TrackingError},
};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Operation cannot be performed in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

impl From<RosterError> for ServiceError {
    fn from(err: RosterError) -> Self {
        match err {
            RosterError::UnknownPlayer(_) => ServiceError::NotFound(err.to_string()),
            RosterError::InvalidNumber(_) | RosterError::BlankName => {
                ServiceError::InvalidInput(err.to_string())
            }
        }
    }
}

impl From<SetupError> for ServiceError {
    fn from(err: SetupError) -> Self {
        let SetupError::Incomplete { message, missing } = err;
        ServiceError::InvalidInput(format!("{message} (missing: {})", missing.join(", ")))
    }
}

impl From<TrackingError> for ServiceError {
    fn from(err: TrackingError) -> Self {
        match err {
            TrackingError::Roster(inner) => inner.into(),
            TrackingError::UnknownEvent(_) => ServiceError::NotFound(err.to_string()),
            TrackingError::PlayerHasEvents { .. } => ServiceError::InvalidState(err.to_string()),
            TrackingError::UnknownEventType(_)
            | TrackingError::InvalidTimeString(_)
            | TrackingError::InvalidTimestamp
            | TrackingError::AmbiguousTimeEdit => ServiceError::InvalidInput(err.to_string()),
        }
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
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::InvalidState(message) => AppError::Conflict(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
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

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn tracking_errors_map_to_http_statuses() {
        let cases = [
            (TrackingError::UnknownEvent(Uuid::nil()), StatusCode::NOT_FOUND),
            (
                TrackingError::Roster(RosterError::UnknownPlayer(Uuid::nil())),
                StatusCode::NOT_FOUND,
            ),
            (
                TrackingError::InvalidTimeString("123:45".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                TrackingError::PlayerHasEvents {
                    player_id: Uuid::nil(),
                    events: 1,
                },
                StatusCode::CONFLICT,
            ),
        ];

        for (err, status) in cases {
            let response = AppError::from(ServiceError::from(err)).into_response();
            assert_eq!(response.status(), status);
        }
    }

    #[test]
    fn incomplete_setup_lists_missing_fields() {
        let err = ServiceError::from(SetupError::Incomplete {
            message: "incomplete",
            missing: vec!["youtube_id", "players"],
        });
        assert_eq!(
            err.to_string(),
            "invalid input: incomplete (missing: youtube_id, players)"
        );
    }
}
