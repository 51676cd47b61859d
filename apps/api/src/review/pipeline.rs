//! Review Pipeline: runs one submission through a fixed sequence of stages.
//!
//! Flow: rasterize → scaffold record → build prompt → request feedback →
//!       parse feedback → persist → complete.
//!
//! Stages run strictly in `Stage::ALL` order, one at a time. The driver stops
//! at the first failing stage and reports it; nothing is persisted unless
//! every stage before `Persist` succeeded. No stage is retried.

use std::fmt;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::llm_client::FeedbackRequester;
use crate::models::resume::{JobContext, ResumeRecord};
use crate::rasterize::{RasterizedPage, Rasterizer};
use crate::review::parse::parse_feedback;
use crate::review::prompts::prepare_instructions;
use crate::store::RecordStore;

/// Status shown once every stage has succeeded.
pub const COMPLETE_STATUS: &str = "Analysis complete, redirecting...";

// ────────────────────────────────────────────────────────────────────────────
// Stages
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Rasterize,
    Scaffold,
    BuildPrompt,
    RequestFeedback,
    ParseFeedback,
    Persist,
}

impl Stage {
    /// Execution order. The driver walks this list and nothing else.
    pub const ALL: [Stage; 6] = [
        Stage::Rasterize,
        Stage::Scaffold,
        Stage::BuildPrompt,
        Stage::RequestFeedback,
        Stage::ParseFeedback,
        Stage::Persist,
    ];

    /// Status text while the stage runs.
    pub fn label(self) -> &'static str {
        match self {
            Stage::Rasterize => "Converting to image...",
            Stage::Scaffold => "Preparing data...",
            Stage::BuildPrompt => "Preparing instructions...",
            Stage::RequestFeedback => "Analyzing...",
            Stage::ParseFeedback => "Reading feedback...",
            Stage::Persist => "Saving resume...",
        }
    }

    /// User-facing status when the stage fails.
    pub fn failure_message(self) -> &'static str {
        match self {
            Stage::Rasterize => "Failed to convert PDF to image",
            Stage::Scaffold => "Failed to prepare data",
            Stage::BuildPrompt => "Failed to prepare instructions",
            Stage::RequestFeedback => "Failed to analyze resume",
            Stage::ParseFeedback => "Failed to parse AI response",
            Stage::Persist => "Failed to save resume",
        }
    }

    /// Machine-readable error code for API responses.
    pub fn error_code(self) -> &'static str {
        match self {
            Stage::Rasterize => "RASTERIZE_FAILED",
            Stage::Scaffold => "PREPARE_FAILED",
            Stage::BuildPrompt => "PROMPT_FAILED",
            Stage::RequestFeedback => "ANALYSIS_FAILED",
            Stage::ParseFeedback => "PARSE_FAILED",
            Stage::Persist => "SAVE_FAILED",
        }
    }
}

/// A stage failure. `Display` is the user-facing status text; `detail` is
/// for logs, except for `Persist` where the store's reason is shown too.
#[derive(Debug)]
pub struct ReviewError {
    pub stage: Stage,
    pub detail: String,
}

impl fmt::Display for ReviewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.stage {
            Stage::Persist => write!(f, "{}: {}", self.stage.failure_message(), self.detail),
            stage => f.write_str(stage.failure_message()),
        }
    }
}

impl std::error::Error for ReviewError {}

// ────────────────────────────────────────────────────────────────────────────
// Status reporting
// ────────────────────────────────────────────────────────────────────────────

/// Receives status text as the pipeline moves through its stages.
pub trait StatusSink: Send + Sync {
    fn update(&self, status: &str);
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusUpdate {
    pub at: DateTime<Utc>,
    pub text: String,
}

/// Keeps every status in arrival order.
#[derive(Debug, Default)]
pub struct StatusLog {
    updates: Mutex<Vec<StatusUpdate>>,
}

impl StatusLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<StatusUpdate> {
        self.updates
            .lock()
            .map(|updates| updates.clone())
            .unwrap_or_default()
    }

    pub fn texts(&self) -> Vec<String> {
        self.snapshot().into_iter().map(|u| u.text).collect()
    }
}

impl StatusSink for StatusLog {
    fn update(&self, status: &str) {
        if let Ok(mut updates) = self.updates.lock() {
            updates.push(StatusUpdate {
                at: Utc::now(),
                text: status.to_string(),
            });
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pipeline
// ────────────────────────────────────────────────────────────────────────────

/// One upload as received from the form.
#[derive(Debug, Clone)]
pub struct Submission {
    pub job: JobContext,
    pub file_name: String,
    pub pdf: Bytes,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewOutcome {
    pub id: String,
}

/// Outputs accumulated as stages complete. Each stage reads what earlier
/// stages left here and writes its own result.
struct ReviewContext {
    submission: Submission,
    page: Option<RasterizedPage>,
    record: Option<ResumeRecord>,
    prompt: Option<String>,
    raw_response: Option<String>,
}

impl ReviewContext {
    fn new(submission: Submission) -> Self {
        Self {
            submission,
            page: None,
            record: None,
            prompt: None,
            raw_response: None,
        }
    }
}

fn require<'a, T>(slot: &'a Option<T>, what: &str) -> Result<&'a T, String> {
    slot.as_ref()
        .ok_or_else(|| format!("{what} not available from an earlier stage"))
}

/// Generates record ids. Fixed in tests so failed runs can be looked up.
pub type IdSource = Arc<dyn Fn() -> String + Send + Sync>;

pub struct ReviewPipeline {
    rasterizer: Arc<dyn Rasterizer>,
    requester: Arc<dyn FeedbackRequester>,
    store: Arc<dyn RecordStore>,
    next_id: IdSource,
}

impl ReviewPipeline {
    pub fn new(
        rasterizer: Arc<dyn Rasterizer>,
        requester: Arc<dyn FeedbackRequester>,
        store: Arc<dyn RecordStore>,
    ) -> Self {
        Self {
            rasterizer,
            requester,
            store,
            next_id: Arc::new(|| Uuid::new_v4().to_string()),
        }
    }

    pub fn with_id_source(mut self, next_id: IdSource) -> Self {
        self.next_id = next_id;
        self
    }

    /// Runs every stage in order. On failure the failure text is the last
    /// status reported and nothing has been persisted.
    pub async fn run(
        &self,
        submission: Submission,
        status: &dyn StatusSink,
    ) -> Result<ReviewOutcome, ReviewError> {
        let mut ctx = ReviewContext::new(submission);

        for stage in Stage::ALL {
            status.update(stage.label());
            info!(stage = ?stage, "Review stage started");

            if let Err(detail) = self.run_stage(stage, &mut ctx).await {
                let error = ReviewError { stage, detail };
                warn!(stage = ?stage, detail = %error.detail, "Review stage failed");
                status.update(&error.to_string());
                return Err(error);
            }
        }

        let id = ctx
            .record
            .map(|record| record.id)
            .ok_or_else(|| ReviewError {
                stage: Stage::Persist,
                detail: "no record was saved".to_string(),
            })?;

        status.update(COMPLETE_STATUS);
        info!(review_id = %id, "Review complete");

        Ok(ReviewOutcome { id })
    }

    async fn run_stage(&self, stage: Stage, ctx: &mut ReviewContext) -> Result<(), String> {
        match stage {
            Stage::Rasterize => {
                let page = self
                    .rasterizer
                    .rasterize_first_page(ctx.submission.pdf.clone(), &ctx.submission.file_name)
                    .await
                    .map_err(|e| e.to_string())?;
                if page.png.is_empty() {
                    return Err("renderer produced no output".to_string());
                }
                ctx.page = Some(page);
            }

            Stage::Scaffold => {
                let id = (self.next_id)();
                if id.trim().is_empty() {
                    return Err("generated an empty record id".to_string());
                }
                ctx.record = Some(ResumeRecord::scaffold(id, &ctx.submission.job));
            }

            Stage::BuildPrompt => {
                let prompt = prepare_instructions(&ctx.submission.job);
                if prompt.trim().is_empty() {
                    return Err("instructions came out empty".to_string());
                }
                ctx.prompt = Some(prompt);
            }

            Stage::RequestFeedback => {
                let page = require(&ctx.page, "rendered page")?;
                let prompt = require(&ctx.prompt, "instructions")?;
                let raw = self
                    .requester
                    .request_feedback(page, prompt)
                    .await
                    .map_err(|e| e.to_string())?;
                if raw.trim().is_empty() {
                    return Err("model returned an empty response".to_string());
                }
                ctx.raw_response = Some(raw);
            }

            Stage::ParseFeedback => {
                let raw = require(&ctx.raw_response, "model response")?;
                let feedback = parse_feedback(raw).map_err(|e| e.to_string())?;
                let record = ctx
                    .record
                    .as_mut()
                    .ok_or_else(|| "record not available from an earlier stage".to_string())?;
                record.feedback = Some(feedback);
            }

            Stage::Persist => {
                let record = require(&ctx.record, "record")?;
                if record.feedback.is_none() {
                    return Err("record has no feedback".to_string());
                }
                let image = require(&ctx.page, "rendered page")?.png.clone();
                self.store
                    .save(record, ctx.submission.pdf.clone(), image)
                    .await
                    .map_err(|e| e.to_string())?;
                info!(review_id = %record.id, "Resume record saved");
            }
        }

        Ok(())
    }
}
