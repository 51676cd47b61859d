use std::sync::Arc;

use crate::review::pipeline::ReviewPipeline;
use crate::store::RecordStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ReviewPipeline>,
    /// Same store the pipeline persists into; read by the review routes.
    pub store: Arc<dyn RecordStore>,
}
