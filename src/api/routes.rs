use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let upload_limit = state.config.upload_body_limit();

    let mut router = Router::new()
        // Session
        .route("/api/login", post(handlers::login))
        .route("/api/logout", post(handlers::logout))
        .route("/api/auth/user", get(handlers::current_user))
        // Files
        .route("/api/files", get(handlers::list_files))
        .route("/api/files/deleted", get(handlers::list_deleted_files))
        .route(
            "/api/files/upload",
            post(handlers::upload_files).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/files/trash/empty", delete(handlers::empty_trash))
        .route("/api/files/:id", get(handlers::get_file))
        .route("/api/files/:id", patch(handlers::update_file))
        .route("/api/files/:id", delete(handlers::delete_file))
        .route("/api/files/:id/content", get(handlers::serve_content))
        .route("/api/files/:id/restore", post(handlers::restore_file))
        .route(
            "/api/files/:id/permanent",
            delete(handlers::permanent_delete_file),
        )
        .route("/api/files/:id/share", post(handlers::share_file))
        // Sharing
        .route("/api/share/:token", get(handlers::get_shared_file))
        .route("/api/share/:token/add", post(handlers::add_shared_file))
        // Settings
        .route("/api/settings", get(handlers::get_settings))
        .route("/api/settings", patch(handlers::update_settings))
        // Internal
        .route("/_internal/health", get(handlers::health));

    // Test-only routes
    if state.config.test_mode {
        tracing::warn!("Test mode enabled: purge route is available.");
        router = router.route("/admin/purge", delete(handlers::admin_purge));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}
