//! Vigil API server binary entrypoint.

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use vigil_common::config::AppConfig;
use vigil_common::db::create_pool;
use vigil_engine::store::PgStore;
use vigil_push::fcm::FcmClient;

use vigil_api::routes::create_router;
use vigil_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("vigil_api=debug,vigil_engine=debug,tower_http=debug")
        }))
        .init();

    tracing::info!("Starting Vigil API server...");

    // Load configuration
    let config = AppConfig::from_env()?;

    // Create database connection pool
    let pool = create_pool(&config.database_url, config.db_max_connections).await?;
    tracing::info!("Database pool created");

    // Push gateway client shared by all handlers
    let push = FcmClient::new(
        config.push_gateway_url.clone(),
        config.push_server_key.clone(),
    )?;

    // Build application state
    let state = AppState::new(Arc::new(PgStore::new(pool)), Arc::new(push), config);

    // Build router
    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    tracing::info!("API server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
