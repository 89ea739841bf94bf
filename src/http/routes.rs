use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    let downloads_dir = state.downloads_dir.clone();

    let router = Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Side state
        .route("/sides/:side", get(handlers::get_side))
        .route("/sides/:side/caption", get(handlers::get_caption))
        // Side actions
        .route(
            "/sides/:side/devices/:kind/toggle",
            post(handlers::toggle_device),
        )
        .route("/sides/:side/mute", post(handlers::toggle_mute))
        .route("/sides/:side/record/start", post(handlers::start_recording))
        .route("/sides/:side/record/stop", post(handlers::stop_recording))
        .route("/sides/:side/uploads/:media", post(handlers::upload_file))
        // Session event log
        .route("/logs", get(handlers::get_logs))
        .route("/logs/latest", get(handlers::get_latest_log))
        // Invite links
        .route("/invite", post(handlers::generate_invite))
        .route("/invite/copy", post(handlers::copy_invite))
        // Standalone player
        .route("/player", get(handlers::get_player))
        .route("/player/upload", post(handlers::player_upload))
        .route("/player/toggle", post(handlers::player_toggle))
        .route("/player/reset", post(handlers::player_reset));

    let router = match downloads_dir {
        Some(dir) => router.nest_service("/downloads", ServeDir::new(dir)),
        None => router,
    };

    router
        .layer(
            ServiceBuilder::new()
                // Add tracing middleware for request logging
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
