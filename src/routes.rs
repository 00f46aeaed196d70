use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

pub fn create_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        // Health check
        .route("/api/python", get(handlers::hello_world))
        .route("/api/health", get(handlers::health_check))

        // Speech
        .route("/api/t2s", post(handlers::text_to_speech))
        .route("/api/s2t", post(handlers::speech_to_text))

        // Script conversion
        .route("/api/convert", post(handlers::convert_script))

        // Static file serving
        .nest_service("/sound_files", ServeDir::new(state.sound_files.dir()))
}

/// Full application: routes plus body limit, CORS and request tracing.
pub fn build_app(state: AppState) -> Router {
    let max_upload_bytes = state.config.server.max_upload_bytes;

    Router::new()
        .merge(create_routes(&state))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
