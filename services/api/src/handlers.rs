//! Axum Handlers for the JSON API
//!
//! The polling surface of the voice page: read the navigation state and inject
//! the same commands the voice session understands. Handlers only take the
//! short state lock and never wait on speech.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{debug, error};

use crate::{
    models::{ErrorResponse, NavigatePayload, NavigateResponse, StateResponse},
    state::AppState,
};

pub enum ApiError {
    NotFound(String),
    InternalServerError(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(ErrorResponse { message })).into_response()
            }
            ApiError::InternalServerError(err) => {
                error!("Internal Server Error: {:?}", err);
                let message = "An internal server error occurred.".to_string();
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse { message }),
                )
                    .into_response()
            }
        }
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::InternalServerError(err.into())
    }
}

/// Current voice navigation state.
#[utoipa::path(
    get,
    path = "/api/state",
    responses(
        (status = 200, description = "Current course, position and topic", body = StateResponse)
    )
)]
pub async fn get_state(State(state): State<Arc<AppState>>) -> Json<StateResponse> {
    Json(state.navigation.snapshot().await.into())
}

/// Apply a navigation command as if it had been spoken.
///
/// Selection and navigation errors are reported in the body with status 200.
#[utoipa::path(
    post,
    path = "/api/navigate",
    request_body = NavigatePayload,
    responses(
        (status = 200, description = "New state, stop acknowledgement or error", body = NavigateResponse)
    )
)]
pub async fn navigate(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NavigatePayload>,
) -> Json<NavigateResponse> {
    debug!(command = %payload.command, "Navigation command received");
    let reply = state
        .navigation
        .apply_command(&state.visual_catalog, &payload.command)
        .await;
    Json(reply.into())
}
