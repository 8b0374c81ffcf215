use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Session control
        .route("/session", get(handlers::get_session))
        .route("/session/start", post(handlers::start_call))
        .route("/session/end", post(handlers::end_call))
        .route("/session/config", put(handlers::update_config))
        // Session queries
        .route("/session/transcript", get(handlers::get_transcript))
        // Feedback
        .route("/session/feedback", post(handlers::send_feedback))
        // Request logging, and the browser front-end runs on another origin
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
