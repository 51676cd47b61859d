pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::review::handlers::{self, MAX_UPLOAD_BYTES};
use crate::state::AppState;

/// Room for the text fields and multipart framing around the largest upload.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Review API
        .route(
            "/api/v1/resumes",
            post(handlers::handle_submit)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + FORM_OVERHEAD_BYTES)),
        )
        .route("/api/v1/resumes/:id", get(handlers::handle_get_review))
        .route("/api/v1/resumes/:id/pdf", get(handlers::handle_get_pdf))
        .route("/api/v1/resumes/:id/image", get(handlers::handle_get_image))
        .with_state(state)
}
