//! Lil M - a small voiced chat front-end for an OpenAI assistant
//!
//! Serves a single chat page. Each turn posts the user's text to a
//! persisted assistant thread, waits for the run to finish, and speaks the
//! reply back through a synthesized audio clip.

mod api;
mod artifact;
mod assistant;
mod config;
mod poller;
mod session;
mod thread_store;
mod turn;

use api::{create_router, AppState};
use artifact::ArtifactPipeline;
use assistant::OpenAIAssistant;
use config::Config;
use std::net::SocketAddr;
use std::sync::Arc;
use thread_store::{resolve_thread, FileThreadStore};
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use turn::TurnHandler;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lil_m=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = Config::from_env().map_err(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        e
    })?;

    let Config {
        api_key,
        assistant_id,
        base_url,
        port,
        thread_file,
        audio_dir,
        voice,
        poll,
        lifecycle,
    } = config;

    let openai = Arc::new(OpenAIAssistant::new(api_key, assistant_id, &base_url)?);

    // Resolve the conversation thread before serving anything
    let store = FileThreadStore::new(&thread_file);
    let thread_id = resolve_thread(&store, openai.as_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to create assistant thread");
            e
        })?;
    tracing::info!(
        thread_id = %thread_id,
        thread_file = %store.path().display(),
        "Thread ready"
    );

    let artifacts = ArtifactPipeline::new(openai.clone(), voice, audio_dir);
    let audio_dir = artifacts.dir().to_path_buf();
    let handler = TurnHandler::new(openai, artifacts, poll, lifecycle);
    let state = AppState::new(handler, thread_id);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(compression),
    );

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(
        audio_dir = %audio_dir.display(),
        "Lil M listening on {}",
        addr
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
