//! Main Entrypoint for the ClearPath API Service
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment.
//! 2. Loading the visual and hearing course catalogs.
//! 3. Initializing the remote speech adapter.
//! 4. Constructing the Axum router and applying middleware.
//! 5. Starting the web server and handling graceful shutdown.

use anyhow::Context;
use clearpath_api::{
    config::Config, router::create_router, speech::RemoteSpeech, state::AppState,
};
use clearpath_core::Catalog;
use std::{net::SocketAddr, sync::Arc};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

/// Listens for the `Ctrl+C` signal to gracefully shut down the server.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl+C");
        return;
    }
    info!("Received shutdown signal. Shutting down gracefully...");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .init();
    info!("Configuration loaded. Loading course catalogs...");

    // --- 3. Load Catalogs ---
    let visual_catalog = Catalog::load(&config.visual_catalog_path).with_context(|| {
        format!(
            "Failed to load visual catalog from {}",
            config.visual_catalog_path.display()
        )
    })?;
    let hearing_catalog = Catalog::load(&config.hearing_catalog_path).with_context(|| {
        format!(
            "Failed to load hearing catalog from {}",
            config.hearing_catalog_path.display()
        )
    })?;

    // --- 4. Initialize Shared Services ---
    let speech = Arc::new(RemoteSpeech::new(config.speech.clone()));
    let app_state = Arc::new(AppState::new(
        visual_catalog,
        hearing_catalog,
        speech,
        config.clone(),
    ));

    // --- 5. Create Router and Apply Middleware ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(app_state.clone()).layer(cors);

    // --- 6. Start Server ---
    info!(
        bind_address = %config.bind_address,
        video_dir = %config.video_dir.display(),
        voice_greeting = config.voice_greeting,
        "Service configured. Starting server..."
    );
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    app_state.sessions.shutdown().await;
    info!("Server has shut down.");
    Ok(())
}
