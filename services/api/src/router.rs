//! Axum Router Configuration
//!
//! This module defines the complete HTTP routing for the application,
//! including the HTML pages, the JSON API, video serving and the OpenAPI
//! documentation.

use crate::{
    handlers, media,
    models::{ErrorResponse, NavigatePayload, NavigateResponse, StateResponse, TopicView},
    pages,
    state::AppState,
};

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(handlers::get_state, handlers::navigate, media::video),
    components(
        schemas(StateResponse, TopicView, NavigatePayload, NavigateResponse, ErrorResponse)
    ),
    tags(
        (name = "ClearPath API", description = "Voice navigation state and captioned course media")
    )
)]
pub struct ApiDoc;

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let app_router = Router::new()
        .route("/", get(pages::index))
        .route("/visually", get(pages::visually))
        .route("/hearing", get(pages::hearing_index))
        .route("/hearing/course/{course_name}", get(pages::hearing_course))
        .route("/api/state", get(handlers::get_state))
        .route("/api/navigate", post(handlers::navigate))
        .route("/video/{course_name}/{topic_index}", get(media::video))
        .with_state(app_state);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(app_router)
}
