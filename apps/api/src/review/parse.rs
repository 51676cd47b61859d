//! Turns the model's raw answer into `Feedback`.
//!
//! At most one enclosing code fence is removed. Anything that is not then a
//! complete five-category document with tips in every category is rejected;
//! nothing is repaired or guessed.

use thiserror::Error;

use crate::llm_client::strip_json_fences;
use crate::models::resume::Feedback;

#[derive(Debug, Error)]
pub enum FeedbackParseError {
    #[error("response is not valid feedback JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("category '{0}' has no tips")]
    EmptyTips(&'static str),
}

pub fn parse_feedback(raw: &str) -> Result<Feedback, FeedbackParseError> {
    let body = strip_json_fences(raw);
    let feedback: Feedback = serde_json::from_str(body)?;

    if let Some(category) = feedback.first_empty_category() {
        return Err(FeedbackParseError::EmptyTips(category));
    }

    Ok(feedback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::test_support::VALID_FEEDBACK;

    #[test]
    fn test_parse_unfenced_feedback() {
        let feedback = parse_feedback(VALID_FEEDBACK).unwrap();
        assert_eq!(feedback.ats.score, 74.0);
        assert_eq!(feedback.ats.tips.len(), 2);
        assert_eq!(feedback.skills.score, 49.0);
    }

    #[test]
    fn test_fenced_parse_matches_unfenced_parse() {
        let plain = parse_feedback(VALID_FEEDBACK).unwrap();
        let tagged = parse_feedback(&format!("```json\n{VALID_FEEDBACK}\n```")).unwrap();
        let untagged = parse_feedback(&format!("```\n{VALID_FEEDBACK}\n```")).unwrap();
        let padded = parse_feedback(&format!("  \n```json{VALID_FEEDBACK}```\n\n")).unwrap();
        assert_eq!(plain, tagged);
        assert_eq!(plain, untagged);
        assert_eq!(plain, padded);
    }

    #[test]
    fn test_not_json_is_rejected() {
        let result = parse_feedback("not json");
        assert!(matches!(result, Err(FeedbackParseError::Json(_))));
    }

    #[test]
    fn test_missing_category_is_rejected() {
        let mut value: serde_json::Value = serde_json::from_str(VALID_FEEDBACK).unwrap();
        value.as_object_mut().unwrap().remove("structure");
        let result = parse_feedback(&value.to_string());
        assert!(matches!(result, Err(FeedbackParseError::Json(_))));
    }

    #[test]
    fn test_empty_tips_are_rejected() {
        let mut value: serde_json::Value = serde_json::from_str(VALID_FEEDBACK).unwrap();
        value["content"]["tips"] = serde_json::json!([]);
        let result = parse_feedback(&value.to_string());
        assert!(matches!(result, Err(FeedbackParseError::EmptyTips("content"))));
    }

    #[test]
    fn test_multiply_fenced_response_is_rejected() {
        let raw = format!("```json\n{VALID_FEEDBACK}\n```\n```json\n{VALID_FEEDBACK}\n```");
        assert!(parse_feedback(&raw).is_err());
    }

    #[test]
    fn test_partially_fenced_response_is_rejected() {
        let raw = format!("Here you go:\n```json\n{VALID_FEEDBACK}\n```");
        assert!(parse_feedback(&raw).is_err());
    }

    #[test]
    fn test_extra_top_level_keys_are_ignored() {
        let mut value: serde_json::Value = serde_json::from_str(VALID_FEEDBACK).unwrap();
        value["overallScore"] = serde_json::json!(70);
        assert!(parse_feedback(&value.to_string()).is_ok());
    }
}
