//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use autopost_domain::usecases::AutomationError;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

/// Failures surfaced by the trigger endpoints
#[derive(Debug)]
pub enum ApiError {
    Unauthorized,
    BadRequest(String),
    Automation(AutomationError),
}

impl From<AutomationError> for ApiError {
    fn from(err: AutomationError) -> Self {
        Self::Automation(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_string()),
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            Self::Automation(err) => match &err {
                AutomationError::InvalidInterval(_) => (StatusCode::BAD_REQUEST, err.to_string()),
                AutomationError::Busy | AutomationError::LeaseHeld => {
                    (StatusCode::CONFLICT, err.to_string())
                }
                AutomationError::Generation(_) | AutomationError::InvalidDraft(_) => {
                    (StatusCode::BAD_GATEWAY, err.to_string())
                }
                AutomationError::Status(_)
                | AutomationError::Persistence(_)
                | AutomationError::Task(_) => {
                    tracing::error!(error = %err, "storage error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "internal server error".to_string(),
                    )
                }
            },
        };

        (
            status,
            Json(ErrorBody {
                success: false,
                error: message,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autopost_domain::{GenerateError, RepositoryError, StatusError};

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(status_of(ApiError::Unauthorized), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status_of(ApiError::BadRequest("bad".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AutomationError::Busy.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(AutomationError::Generation(GenerateError::Timeout).into()),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(AutomationError::Status(StatusError::Database("x".to_string())).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(
                AutomationError::Persistence(RepositoryError::Conflict("x".to_string())).into()
            ),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
