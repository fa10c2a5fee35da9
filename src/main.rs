//! SoftSell - software license resale site
//!
//! Serves the marketing pages, the lead form endpoint, and the chat
//! assistant backed by a per-conversation state machine.

mod api;
mod lead;
mod llm;
mod message;
mod resolver;
mod runtime;
mod settings;
mod state_machine;
mod system_prompt;

use api::{create_router, AppState};
use llm::ResolverConfig;
use resolver::{KeywordTable, ResponseResolver};
use runtime::{ReplyDelay, RuntimeManager};
use settings::ServerSettings;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "softsell_site=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let settings = ServerSettings::from_env();
    let reply_delay = ReplyDelay::from_env();
    let resolver_config = ResolverConfig::from_env();
    let keywords = KeywordTable::brokerage()?;
    tracing::info!(keywords = keywords.len(), "Keyword table loaded");
    let resolver = ResponseResolver::from_config(&resolver_config, keywords)?;

    if resolver.has_remote() {
        tracing::info!(
            model = %resolver_config.model,
            endpoint = %resolver_config.endpoint,
            "Chat replies use remote completions with keyword fallback"
        );
    } else {
        tracing::warn!("OPENAI_API_KEY not set. Chat replies use the keyword table only.");
    }

    // Create application state
    let runtime = Arc::new(RuntimeManager::new(Arc::new(resolver), reply_delay));
    runtime.spawn_idle_sweeper(settings.conversation_idle);
    let state = AppState::new(runtime);

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(compression);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    tracing::info!(
        min_delay_ms = %reply_delay.min().as_millis(),
        max_delay_ms = %reply_delay.max().as_millis(),
        idle_secs = settings.conversation_idle.as_secs(),
        "SoftSell server listening on {}",
        addr
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
