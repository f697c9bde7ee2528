// Server module - HTTP server setup and routing
pub mod handlers;
pub mod identity;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::cors::CorsLayer;
use tracing::info;
use votes_service::VoteService;

use self::state::AppState;
use crate::errors::ApiError;

/// Create the CORS layer admitting the web client at `origin`
///
/// Browsers may not send `x-user-id` cross-origin; only the proxy in front of
/// this server sets it.
pub fn create_cors_layer(origin: &str) -> Result<CorsLayer, ApiError> {
    let origin = origin
        .parse::<HeaderValue>()
        .map_err(|e| ApiError::config(format!("invalid CORS origin {}: {}", origin, e)))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]))
}

/// Create the Axum application router with all routes and middleware
pub fn create_app(service: Arc<VoteService>, cors_origin: &str) -> Result<Router, ApiError> {
    let state = AppState { service };

    Ok(Router::new()
        .route(
            "/posts/:post_id/vote",
            get(handlers::vote_status)
                .post(handlers::apply_vote)
                .delete(handlers::retract_vote),
        )
        .route("/posts/:post_id/points", get(handlers::points))
        .route("/health", get(handlers::health_check))
        .layer(create_cors_layer(cors_origin)?)
        .with_state(state))
}

/// Run the server on the specified address until ctrl-c
pub async fn run_server(app: Router, addr: SocketAddr) -> Result<(), ApiError> {
    info!("Server listening on {}", addr);
    info!("- Vote endpoint: http://{}/posts/:post_id/vote", addr);
    info!("- Health endpoint: http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
