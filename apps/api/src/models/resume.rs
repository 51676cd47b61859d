use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A résumé submission together with the AI feedback produced for it.
///
/// Blobs are not part of the record itself: the PDF and the rendered page are
/// attached only when the record is handed to a `RecordStore`, and come back
/// alongside it as a `StoredResume`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeRecord {
    pub id: String,
    pub company_name: String,
    pub job_title: String,
    pub job_description: String,
    pub feedback: Option<Feedback>,
}

impl ResumeRecord {
    /// A fresh record with no feedback yet.
    pub fn scaffold(id: String, job: &JobContext) -> Self {
        Self {
            id,
            company_name: job.company_name.clone(),
            job_title: job.job_title.clone(),
            job_description: job.job_description.clone(),
            feedback: None,
        }
    }
}

/// A record as returned by `RecordStore::load`, with both blobs.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredResume {
    pub record: ResumeRecord,
    pub pdf: Bytes,
    pub image: Bytes,
}

/// User-supplied job context. Every field may be empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobContext {
    pub company_name: String,
    pub job_title: String,
    pub job_description: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Feedback
// ────────────────────────────────────────────────────────────────────────────

/// Structured feedback for the five fixed review categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    #[serde(rename = "ATS")]
    pub ats: AtsFeedback,
    pub tone_and_style: CategoryFeedback,
    pub content: CategoryFeedback,
    pub structure: CategoryFeedback,
    pub skills: CategoryFeedback,
}

impl Feedback {
    /// The four explained categories in display order, with their headings.
    pub fn sections(&self) -> [(&'static str, &CategoryFeedback); 4] {
        [
            ("CONTENT", &self.content),
            ("SKILLS", &self.skills),
            ("STRUCTURE", &self.structure),
            ("TONE & STYLE", &self.tone_and_style),
        ]
    }

    /// Name of the first category whose tip list is empty, if any.
    pub fn first_empty_category(&self) -> Option<&'static str> {
        if self.ats.tips.is_empty() {
            return Some("ATS");
        }
        [
            ("toneAndStyle", &self.tone_and_style),
            ("content", &self.content),
            ("structure", &self.structure),
            ("skills", &self.skills),
        ]
        .into_iter()
        .find(|(_, category)| category.tips.is_empty())
        .map(|(name, _)| name)
    }
}

/// ATS suitability. Its tips carry no explanation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtsFeedback {
    /// Intended 0 – 100, not enforced.
    pub score: f64,
    pub tips: Vec<AtsTip>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryFeedback {
    /// Intended 0 – 100, not enforced.
    pub score: f64,
    pub tips: Vec<Tip>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TipKind {
    Good,
    Improve,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtsTip {
    #[serde(rename = "type")]
    pub kind: TipKind,
    pub tip: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tip {
    #[serde(rename = "type")]
    pub kind: TipKind,
    pub tip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}
