//! Review view model: everything the review page needs to draw the score
//! gauge, category badges and tip cards, derived from a stored record.

use std::f64::consts::PI;

use serde::Serialize;

use crate::models::resume::{CategoryFeedback, Feedback, StoredResume, TipKind};

/// Colour band for the headline score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    Low,
    Medium,
    High,
}

impl ScoreBand {
    /// `< 50` low, `50..80` medium, `>= 80` high.
    pub fn for_score(score: f64) -> Self {
        if score >= 80.0 {
            ScoreBand::High
        } else if score >= 50.0 {
            ScoreBand::Medium
        } else {
            ScoreBand::Low
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            ScoreBand::Low => "#ef4444",
            ScoreBand::Medium => "#f59e0b",
            ScoreBand::High => "#22c55e",
        }
    }
}

/// Tone of a per-category score badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeTone {
    Good,
    Fair,
    Poor,
}

impl BadgeTone {
    pub fn for_score(score: f64) -> Self {
        if score > 70.0 {
            BadgeTone::Good
        } else if score > 49.0 {
            BadgeTone::Fair
        } else {
            BadgeTone::Poor
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBadge {
    pub tone: BadgeTone,
    pub label: String,
}

impl ScoreBadge {
    pub fn new(score: f64) -> Self {
        Self {
            tone: BadgeTone::for_score(score),
            label: format!("{}%", score.round()),
        }
    }
}

/// Half-circle gauge drawn as a dashed circle stroke.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GaugeGeometry {
    pub size: f64,
    pub stroke_width: f64,
    pub radius: f64,
    pub circumference: f64,
    pub dash_offset: f64,
    pub color: &'static str,
}

impl GaugeGeometry {
    pub const DEFAULT_SIZE: f64 = 130.0;
    pub const DEFAULT_STROKE: f64 = 16.0;

    pub fn new(score: f64, size: f64, stroke_width: f64) -> Self {
        let clamped = score.clamp(0.0, 100.0);
        let radius = (size - stroke_width) / 2.0;
        let circumference = PI * radius;
        Self {
            size,
            stroke_width,
            radius,
            circumference,
            dash_offset: circumference - circumference * clamped / 100.0,
            color: ScoreBand::for_score(clamped).color(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryView {
    pub score: f64,
    pub label: String,
    pub band: ScoreBand,
    pub color: &'static str,
    pub gauge: GaugeGeometry,
}

impl SummaryView {
    pub fn new(score: f64) -> Self {
        let band = ScoreBand::for_score(score);
        Self {
            score,
            label: format!("{score}/100"),
            band,
            color: band.color(),
            gauge: GaugeGeometry::new(
                score,
                GaugeGeometry::DEFAULT_SIZE,
                GaugeGeometry::DEFAULT_STROKE,
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TipCard {
    pub kind: TipKind,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionView {
    pub heading: &'static str,
    pub badge: ScoreBadge,
    pub tips: Vec<TipCard>,
}

impl SectionView {
    fn new(heading: &'static str, category: &CategoryFeedback) -> Self {
        Self {
            heading,
            badge: ScoreBadge::new(category.score),
            tips: category
                .tips
                .iter()
                .map(|t| TipCard {
                    kind: t.kind,
                    title: t.tip.clone(),
                    explanation: t.explanation.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewView {
    pub id: String,
    pub company_name: String,
    pub job_title: String,
    pub job_description: String,
    pub pdf_url: String,
    pub image_url: String,
    /// `None` when the record carries no feedback; the page then shows nothing.
    pub feedback: Option<FeedbackView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackView {
    pub summary: SummaryView,
    pub ats: SectionView,
    pub sections: Vec<SectionView>,
}

impl FeedbackView {
    fn new(feedback: &Feedback) -> Self {
        let ats = SectionView {
            heading: "ATS",
            badge: ScoreBadge::new(feedback.ats.score),
            tips: feedback
                .ats
                .tips
                .iter()
                .map(|t| TipCard {
                    kind: t.kind,
                    title: t.tip.clone(),
                    explanation: None,
                })
                .collect(),
        };

        Self {
            summary: SummaryView::new(feedback.ats.score),
            ats,
            sections: feedback
                .sections()
                .into_iter()
                .map(|(heading, category)| SectionView::new(heading, category))
                .collect(),
        }
    }
}

impl ReviewView {
    pub fn from_stored(stored: &StoredResume) -> Self {
        let record = &stored.record;
        Self {
            id: record.id.clone(),
            company_name: record.company_name.clone(),
            job_title: record.job_title.clone(),
            job_description: record.job_description.clone(),
            pdf_url: format!("/api/v1/resumes/{}/pdf", record.id),
            image_url: format!("/api/v1/resumes/{}/image", record.id),
            feedback: record.feedback.as_ref().map(FeedbackView::new),
        }
    }
}

/// Human-readable byte count: `0 Bytes`, `1.5 KB`, `20 MB`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = (value * 100.0).round() / 100.0;
    format!("{rounded} {}", UNITS[unit])
}
