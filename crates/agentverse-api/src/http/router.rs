//! Axum router configuration with middleware.
//!
//! All routes are under `/api/v1/`.
//! Middleware: CORS, tracing.

use axum::Router;
use axum::routing::{delete, get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Roster
        .route("/agents", get(handlers::agents::list_agents))
        .route("/agents/{id}", get(handlers::agents::get_agent))
        // Content events
        .route("/events", post(handlers::events::submit_event))
        .route("/events/evaluate", post(handlers::events::evaluate_event))
        // Scheduled replies
        .route("/replies/pending", get(handlers::replies::list_pending))
        .route("/replies/{id}", delete(handlers::replies::cancel_reply))
        // Session keep-alive
        .route("/session/signal", post(handlers::session::post_signal));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Simple health check endpoint (no auth required).
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
