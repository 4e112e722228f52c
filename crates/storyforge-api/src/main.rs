//! Storyforge API server entry point.

use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use storyforge_api::routes;
use storyforge_api::state::AppState;
use storyforge_core::gateway::{AiGateway, PersistenceGateway};
use storyforge_remote::{HttpAiGateway, HttpPersistenceGateway};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting Storyforge API server");

    // Read configuration from environment.
    let persistence_url = std::env::var("PERSISTENCE_URL")
        .map_err(|_| "PERSISTENCE_URL environment variable must be set")?;
    let ai_url =
        std::env::var("AI_URL").map_err(|_| "AI_URL environment variable must be set")?;
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse()
        .map_err(|e| format!("PORT must be a valid u16: {e}"))?;

    // Build the collaborator gateways over a shared HTTP client.
    let client = reqwest::Client::new();
    let persistence: Arc<dyn PersistenceGateway> =
        Arc::new(HttpPersistenceGateway::new(client.clone(), &persistence_url));
    let ai: Arc<dyn AiGateway> = Arc::new(HttpAiGateway::new(client, &ai_url));

    // Build application state and router.
    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    let app = routes::app(AppState::new(persistence, ai))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server.
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|e| format!("invalid HOST:PORT combination: {e}"))?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
