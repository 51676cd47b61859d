//! LLM Client: the only module that talks to the Anthropic API.
//!
//! A review is one vision request: the rendered page as a base64 PNG image
//! block followed by the instructions as a text block.
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::rasterize::RasterizedPage;

pub mod prompts;

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
/// Model used for every review. Not configurable.
pub const MODEL: &str = "claude-sonnet-4-5";
const MAX_OUTPUT_TOKENS: u32 = 4096;
const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("request to model failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model API answered {status}: {message}")]
    Api { status: u16, message: String },

    #[error("model answered without any text")]
    EmptyContent,
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'static str,
    max_tokens: u32,
    system: &'a str,
    messages: [UserMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct UserMessage<'a> {
    role: &'static str,
    content: [ContentPart<'a>; 2],
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Image { source: ImageSource },
    Text { text: &'a str },
}

#[derive(Debug, Serialize)]
struct ImageSource {
    #[serde(rename = "type")]
    encoding: &'static str,
    media_type: &'static str,
    data: String,
}

/// Image first, then the instructions.
fn vision_request<'a>(page: &RasterizedPage, prompt: &'a str, system: &'a str) -> MessagesRequest<'a> {
    MessagesRequest {
        model: MODEL,
        max_tokens: MAX_OUTPUT_TOKENS,
        system,
        messages: [UserMessage {
            role: "user",
            content: [
                ContentPart::Image {
                    source: ImageSource {
                        encoding: "base64",
                        media_type: RasterizedPage::MIME_TYPE,
                        data: BASE64.encode(&page.png),
                    },
                },
                ContentPart::Text { text: prompt },
            ],
        }],
    }
}

#[derive(Debug, Deserialize)]
pub struct MessagesResponse {
    pub content: Vec<ResponseBlock>,
    pub usage: TokenUsage,
}

#[derive(Debug, Deserialize)]
pub struct ResponseBlock {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl MessagesResponse {
    /// Text of the first `text` block.
    pub fn first_text(&self) -> Option<&str> {
        self.content
            .iter()
            .filter(|block| block.kind == "text")
            .find_map(|block| block.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

/// Sends a rendered résumé page plus instructions to a model and returns its
/// raw text answer. Single shot: no retries, no streaming.
#[async_trait]
pub trait FeedbackRequester: Send + Sync {
    async fn request_feedback(&self, page: &RasterizedPage, prompt: &str)
        -> Result<String, LlmError>;
}

#[derive(Clone)]
pub struct LlmClient {
    http: Client,
    api_key: String,
}

impl LlmClient {
    pub fn new(api_key: String) -> Result<Self, LlmError> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self { http, api_key })
    }

    /// One Messages API call carrying the page image and the prompt.
    pub async fn call_with_image(
        &self,
        page: &RasterizedPage,
        prompt: &str,
        system: &str,
    ) -> Result<MessagesResponse, LlmError> {
        let response = self
            .http
            .post(MESSAGES_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&vision_request(page, prompt, system))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %body, "Model API call rejected");
            let message = match serde_json::from_str::<ApiErrorEnvelope>(&body) {
                Ok(envelope) => envelope.error.message,
                Err(_) => body,
            };
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: MessagesResponse = response.json().await?;
        debug!(
            input_tokens = parsed.usage.input_tokens,
            output_tokens = parsed.usage.output_tokens,
            image_bytes = page.png.len(),
            "Model call finished"
        );

        Ok(parsed)
    }
}

#[async_trait]
impl FeedbackRequester for LlmClient {
    async fn request_feedback(
        &self,
        page: &RasterizedPage,
        prompt: &str,
    ) -> Result<String, LlmError> {
        let response = self
            .call_with_image(page, prompt, prompts::JSON_ONLY_SYSTEM)
            .await?;

        response
            .first_text()
            .filter(|text| !text.trim().is_empty())
            .map(str::to_string)
            .ok_or(LlmError::EmptyContent)
    }
}

/// Removes one enclosing ```` ``` ```` or ```` ```json ```` fence. Text that
/// does not start with a fence is returned trimmed and otherwise untouched.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest).trim_start();
    match rest.strip_suffix("```") {
        Some(inner) => inner.trim(),
        None => rest,
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    #[test]
    fn test_strip_fence_with_language_tag() {
        assert_eq!(strip_json_fences("```json\n{\"score\": 1}\n```"), "{\"score\": 1}");
    }

    #[test]
    fn test_strip_bare_fence() {
        assert_eq!(strip_json_fences("\n```\n[1, 2]\n```  "), "[1, 2]");
    }

    #[test]
    fn test_unfenced_text_is_only_trimmed() {
        assert_eq!(strip_json_fences("  {\"a\": true}\n"), "{\"a\": true}");
        assert_eq!(strip_json_fences("Sure! ```json {}```"), "Sure! ```json {}```");
    }

    #[test]
    fn test_strip_removes_only_outer_fence() {
        let input = "```json\n{}\n```\n```json\n{}\n```";
        assert_eq!(strip_json_fences(input), "{}\n```\n```json\n{}");
    }

    #[test]
    fn test_request_body_has_image_then_text() {
        let page = RasterizedPage {
            png: Bytes::from_static(b"\x89PNG"),
            width: 4,
            height: 4,
            page_count: 1,
            file_name: "cv.png".to_string(),
        };

        let value =
            serde_json::to_value(vision_request(&page, "Review this", prompts::JSON_ONLY_SYSTEM))
                .unwrap();

        assert_eq!(value["model"], MODEL);
        assert_eq!(value["system"], prompts::JSON_ONLY_SYSTEM);
        assert_eq!(value["messages"][0]["role"], "user");
        let content = &value["messages"][0]["content"];
        assert_eq!(content[0]["type"], "image");
        assert_eq!(content[0]["source"]["type"], "base64");
        assert_eq!(content[0]["source"]["media_type"], "image/png");
        assert_eq!(content[0]["source"]["data"], "iVBORw==");
        assert_eq!(content[1]["type"], "text");
        assert_eq!(content[1]["text"], "Review this");
    }

    #[test]
    fn test_first_text_skips_non_text_blocks() {
        let json = r#"{
            "content": [
                {"type": "thinking", "thinking": "..."},
                {"type": "text", "text": "{\"ok\": true}"}
            ],
            "usage": {"input_tokens": 1200, "output_tokens": 80}
        }"#;
        let response: MessagesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.first_text(), Some("{\"ok\": true}"));
    }

    #[test]
    fn test_first_text_absent_without_text_block() {
        let json = r#"{"content": [], "usage": {"input_tokens": 1, "output_tokens": 0}}"#;
        let response: MessagesResponse = serde_json::from_str(json).unwrap();
        assert!(response.first_text().is_none());
    }
}
