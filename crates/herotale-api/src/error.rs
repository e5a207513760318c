//! Herotale play API error types.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use herotale_core::error::GatewayError;
use herotale_core::ids::ScenarioId;
use herotale_story::application::auth::AuthError;
use herotale_story::domain::errors::{ActionError, StoryFault};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The backend client could not be set up.
    #[error("backend client error: {0}")]
    Backend(#[from] GatewayError),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// Everything a handler can fail with.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Action(#[from] ActionError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("play not found: {0}")]
    PlayNotFound(Uuid),

    #[error("scenario not found: {0}")]
    ScenarioNotFound(ScenarioId),

    #[error("authentication required")]
    Unauthenticated,

    #[error("invalid request body: {}", .0.body_text())]
    InvalidBody(#[from] JsonRejection),
}

fn gateway_status(err: &GatewayError) -> (StatusCode, &'static str) {
    match err {
        GatewayError::Transport(_) => (StatusCode::BAD_GATEWAY, "backend_unavailable"),
        GatewayError::Backend(_) => (StatusCode::BAD_GATEWAY, "backend_error"),
        GatewayError::Decode(_) => (StatusCode::BAD_GATEWAY, "backend_decode_error"),
        GatewayError::Unauthenticated => (StatusCode::UNAUTHORIZED, "unauthenticated"),
    }
}

impl ApiError {
    fn status(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Action(ActionError::InvalidState { .. }) => {
                (StatusCode::CONFLICT, "invalid_state")
            }
            Self::Action(ActionError::UnknownChoice(_)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "unknown_choice")
            }
            Self::Action(ActionError::ChoicesNotReady) => {
                (StatusCode::CONFLICT, "choices_not_ready")
            }
            Self::Action(ActionError::Fault(fault)) => match fault {
                StoryFault::ScenarioNotFound(_) => (StatusCode::NOT_FOUND, fault.code()),
                _ => (StatusCode::BAD_GATEWAY, fault.code()),
            },
            Self::Auth(AuthError::Rejected(_)) => (StatusCode::UNAUTHORIZED, "auth_rejected"),
            Self::Auth(AuthError::Gateway(err)) | Self::Gateway(err) => gateway_status(err),
            Self::PlayNotFound(_) => (StatusCode::NOT_FOUND, "play_not_found"),
            Self::ScenarioNotFound(_) => (StatusCode::NOT_FOUND, "scenario_not_found"),
            Self::Unauthenticated => (StatusCode::UNAUTHORIZED, "unauthenticated"),
            Self::InvalidBody(rejection) => (rejection.status(), "invalid_body"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status();

        let body = ErrorBody {
            error: error_code,
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use herotale_story::domain::progression::Status;

    fn status_of(err: impl Into<ApiError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn test_invalid_state_maps_to_409() {
        assert_eq!(
            status_of(ActionError::InvalidState {
                action: "choose",
                status: Status::Loading,
            }),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_unknown_choice_maps_to_422() {
        assert_eq!(
            status_of(ActionError::UnknownChoice("west".into())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_dangling_choice_maps_to_502() {
        assert_eq!(
            status_of(ActionError::Fault(StoryFault::DanglingChoice {
                choice_id: "c".into(),
                to_scene_id: "Z".into(),
            })),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_rejected_login_maps_to_401() {
        assert_eq!(
            status_of(AuthError::Rejected("Invalid credentials".into())),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_transport_failure_maps_to_502() {
        assert_eq!(
            status_of(GatewayError::Transport("connection refused".into())),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_missing_play_maps_to_404() {
        assert_eq!(
            status_of(ApiError::PlayNotFound(Uuid::new_v4())),
            StatusCode::NOT_FOUND
        );
    }
}
