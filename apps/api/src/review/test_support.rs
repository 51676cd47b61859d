//! Fakes and fixtures shared by the review tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::llm_client::{FeedbackRequester, LlmError};
use crate::models::resume::{JobContext, ResumeRecord, StoredResume};
use crate::rasterize::{png_file_name, RasterizeError, RasterizedPage, Rasterizer};
use crate::review::pipeline::{IdSource, Submission};
use crate::store::{RecordStore, StoreError};

pub const VALID_FEEDBACK: &str = r#"{
    "ATS": {"score": 74, "tips": [{"type": "good", "tip": "Standard headings"}, {"type": "improve", "tip": "Add keywords"}]},
    "toneAndStyle": {"score": 81, "tips": [{"type": "good", "tip": "Confident voice", "explanation": "Strong verbs"}]},
    "content": {"score": 63, "tips": [{"type": "improve", "tip": "Quantify impact", "explanation": "Add metrics"}]},
    "structure": {"score": 88, "tips": [{"type": "good", "tip": "Clean layout", "explanation": "Easy to scan"}]},
    "skills": {"score": 49, "tips": [{"type": "improve", "tip": "Missing Kubernetes", "explanation": "JD asks for it"}]}
}"#;

pub fn submission(company: &str, title: &str, description: &str) -> Submission {
    Submission {
        job: JobContext {
            company_name: company.to_string(),
            job_title: title.to_string(),
            job_description: description.to_string(),
        },
        file_name: "resume.pdf".to_string(),
        pdf: Bytes::from_static(b"%PDF-1.7 stub"),
    }
}

pub fn fixed_id(id: &'static str) -> IdSource {
    Arc::new(move || id.to_string())
}

#[derive(Clone, Copy)]
enum RasterMode {
    Ok,
    Fail,
    Panic,
}

pub struct StubRasterizer {
    mode: RasterMode,
    pub calls: AtomicUsize,
}

impl StubRasterizer {
    pub const PNG: &'static [u8] = b"\x89PNG stub";

    pub fn ok() -> Self {
        Self::with_mode(RasterMode::Ok)
    }

    pub fn failing() -> Self {
        Self::with_mode(RasterMode::Fail)
    }

    pub fn panicking() -> Self {
        Self::with_mode(RasterMode::Panic)
    }

    fn with_mode(mode: RasterMode) -> Self {
        Self {
            mode,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Rasterizer for StubRasterizer {
    async fn rasterize_first_page(
        &self,
        _pdf: Bytes,
        file_name: &str,
    ) -> Result<RasterizedPage, RasterizeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.mode {
            RasterMode::Ok => Ok(RasterizedPage {
                png: Bytes::from_static(Self::PNG),
                width: 2448,
                height: 3168,
                page_count: 1,
                file_name: png_file_name(file_name),
            }),
            RasterMode::Fail => Err(RasterizeError::Load("Format error".to_string())),
            RasterMode::Panic => panic!("renderer crashed"),
        }
    }
}

pub struct StubRequester {
    reply: Option<String>,
    pub calls: AtomicUsize,
}

impl StubRequester {
    pub fn replying(reply: String) -> Self {
        Self {
            reply: Some(reply),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl FeedbackRequester for StubRequester {
    async fn request_feedback(
        &self,
        _page: &RasterizedPage,
        _prompt: &str,
    ) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone().ok_or(LlmError::Api {
            status: 529,
            message: "Overloaded".to_string(),
        })
    }
}

/// A store whose backend is always unreachable.
pub struct FailingStore;

#[async_trait]
impl RecordStore for FailingStore {
    async fn save(
        &self,
        _record: &ResumeRecord,
        _pdf: Bytes,
        _image: Bytes,
    ) -> Result<(), StoreError> {
        Err(StoreError::Unavailable(redis::RedisError::from((
            redis::ErrorKind::IoError,
            "quota exceeded",
        ))))
    }

    async fn load(&self, _id: &str) -> Result<Option<StoredResume>, StoreError> {
        Ok(None)
    }
}
