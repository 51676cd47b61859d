use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::review::pipeline::ReviewError;
use crate::store::StoreError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Review failed: {0}")]
    Review(#[from] ReviewError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Unexpected error")]
    Unexpected,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, stage) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone(), None),
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                msg.clone(),
                None,
            ),
            AppError::Review(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                e.stage.error_code(),
                e.to_string(),
                Some(e.stage),
            ),
            AppError::Store(e) => {
                tracing::error!("Storage error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "A storage error occurred".to_string(),
                    None,
                )
            }
            AppError::Unexpected => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "UNEXPECTED_ERROR",
                "Unexpected error occurred".to_string(),
                None,
            ),
        };

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let Some(stage) = stage {
            error["stage"] = json!(stage);
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use serde_json::Value;

    use super::*;
    use crate::review::pipeline::Stage;

    async fn body_of(error: AppError) -> (StatusCode, Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_review_error_maps_to_stage_code() {
        let (status, body) = body_of(AppError::Review(ReviewError {
            stage: Stage::RequestFeedback,
            detail: "HTTP 529".to_string(),
        }))
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "ANALYSIS_FAILED");
        assert_eq!(body["error"]["message"], "Failed to analyze resume");
        assert_eq!(body["error"]["stage"], "request_feedback");
    }

    #[tokio::test]
    async fn test_store_error_hides_details() {
        let (status, body) = body_of(AppError::Store(StoreError::Corrupt {
            key: "resume_1".to_string(),
            field: "pdf",
        }))
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["message"], "A storage error occurred");
        assert!(body["error"].get("stage").is_none());
    }
}
