use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::AppState;

/// Room for multipart boundaries and headers on top of the file itself
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

pub fn create_router(state: Arc<AppState>) -> Router {
    let upload_limit = state.config.max_upload_size as usize + MULTIPART_OVERHEAD;

    Router::new()
        // Session
        .route("/api/session", get(handlers::get_session))
        .route("/api/auth/sign-in", post(handlers::sign_in))
        .route("/api/auth/sign-up", post(handlers::sign_up))
        .route("/api/auth/sign-out", post(handlers::sign_out))
        // Shell
        .route("/api/shell", get(handlers::get_shell))
        .route("/api/shell/tab", put(handlers::select_tab))
        .route(
            "/api/shell/auth-modal",
            post(handlers::open_auth_modal).delete(handlers::close_auth_modal),
        )
        // Listing
        .route("/api/submissions", get(handlers::list_submissions))
        .route("/api/submissions/:id/vote", post(handlers::toggle_vote))
        .route("/api/submissions/:id/share", get(handlers::share_submission))
        // Submission form
        .route("/api/form", get(handlers::get_form).put(handlers::update_form))
        .route(
            "/api/form/file",
            post(handlers::select_file).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/form/submit", post(handlers::submit_form))
        // Local object store downloads
        .route("/media/*key", get(handlers::serve_media))
        // Internal
        .route("/_internal/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
