//! Axum route handlers for the Review API.

use std::sync::Arc;

use axum::{
    extract::{multipart::Field, Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::resume::{JobContext, StoredResume};
use crate::review::pipeline::{StatusLog, StatusUpdate, Submission};
use crate::review::view::{format_size, ReviewView};
use crate::state::AppState;

/// Largest résumé accepted by the upload form.
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

const PDF_MIME: &str = "application/pdf";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub id: String,
    pub statuses: Vec<StatusUpdate>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/resumes
///
/// Multipart form: `company-name`, `job-title`, `job-description`, `resume` (PDF).
/// Runs the full review pipeline and returns the new record id with the
/// status trail. The pipeline runs in its own task so a panic inside it is
/// reported as an unexpected error instead of tearing down the connection.
pub async fn handle_submit(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<SubmitResponse>), AppError> {
    let submission = read_submission(multipart).await?;
    info!(
        file_name = %submission.file_name,
        size = %format_size(submission.pdf.len() as u64),
        "Received resume for review"
    );

    let log = Arc::new(StatusLog::new());
    let pipeline = Arc::clone(&state.pipeline);
    let task_log = Arc::clone(&log);

    let outcome = tokio::spawn(async move { pipeline.run(submission, task_log.as_ref()).await })
        .await
        .map_err(|e| {
            error!("Review task aborted: {e}");
            AppError::Unexpected
        })??;

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            id: outcome.id,
            statuses: log.snapshot(),
        }),
    ))
}

/// GET /api/v1/resumes/:id
pub async fn handle_get_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ReviewView>, AppError> {
    let stored = load_or_not_found(&state, &id).await?;
    Ok(Json(ReviewView::from_stored(&stored)))
}

/// GET /api/v1/resumes/:id/pdf
pub async fn handle_get_pdf(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let stored = load_or_not_found(&state, &id).await?;
    Ok(([(header::CONTENT_TYPE, PDF_MIME)], stored.pdf))
}

/// GET /api/v1/resumes/:id/image
pub async fn handle_get_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let stored = load_or_not_found(&state, &id).await?;
    Ok(([(header::CONTENT_TYPE, "image/png")], stored.image))
}

async fn load_or_not_found(state: &AppState, id: &str) -> Result<StoredResume, AppError> {
    state
        .store
        .load(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))
}

// ────────────────────────────────────────────────────────────────────────────
// Form parsing
// ────────────────────────────────────────────────────────────────────────────

struct UploadedFile {
    name: String,
    content_type: Option<String>,
    data: Bytes,
}

async fn read_submission(mut multipart: Multipart) -> Result<Submission, AppError> {
    let mut job = JobContext::default();
    let mut file: Option<UploadedFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid form data: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "company-name" => job.company_name = read_text(field).await?,
            "job-title" => job.job_title = read_text(field).await?,
            "job-description" => job.job_description = read_text(field).await?,
            "resume" => {
                let name = field.file_name().unwrap_or("resume.pdf").to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Could not read resume: {e}")))?;
                file = Some(UploadedFile {
                    name,
                    content_type,
                    data,
                });
            }
            _ => {}
        }
    }

    let file = file.ok_or_else(|| AppError::Validation("A resume PDF is required".to_string()))?;
    validate_upload(&file)?;

    Ok(Submission {
        job,
        file_name: file.name,
        pdf: file.data,
    })
}

async fn read_text(field: Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid form field: {e}")))
}

fn validate_upload(file: &UploadedFile) -> Result<(), AppError> {
    if file.data.is_empty() {
        return Err(AppError::Validation("Resume file is empty".to_string()));
    }
    if file.data.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::Validation(format!(
            "Resume must be at most {}",
            format_size(MAX_UPLOAD_BYTES as u64)
        )));
    }

    let pdf_name = file.name.to_ascii_lowercase().ends_with(".pdf");
    let pdf_type = file.content_type.as_deref() == Some(PDF_MIME);
    if !pdf_name && !pdf_type {
        return Err(AppError::Validation("Resume must be a PDF".to_string()));
    }

    Ok(())
}
