//! posfra Embed Dev Server
//!
//! Local stand-in for the hosted payment surface and the status API, so
//! the loader can be exercised end to end without the real backend.

mod error;
mod handlers;
mod state;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::handlers::{complete_reference, embed_page, health_check, reference_status};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let static_dir = std::env::var("STATIC_DIR").unwrap_or_else(|_| "static".into());
    let app = router(AppState::default(), &static_dir);

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("posfra embed dev server running on http://{}", addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                        - Health check");
    tracing::info!("  GET  /embed/{{payload}}               - Hosted surface stand-in");
    tracing::info!("  GET  /api/ref/{{reference}}           - Status (embedtoken header)");
    tracing::info!("  POST /api/ref/{{reference}}/complete  - Mark complete");
    tracing::info!("  GET  /static/*                      - Files from {}", static_dir);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Application router
fn router(state: AppState, static_dir: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/embed/{*payload}", get(embed_page))
        .route("/api/ref/{reference}", get(reference_status))
        .route("/api/ref/{reference}/complete", post(complete_reference))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
