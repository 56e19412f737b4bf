//! Production [`TextGenerator`] backed by the Gemini REST API.
//!
//! One `reqwest` client is built at construction time with the configured
//! timeout and reused for every call — no per-call client setup, no ambient
//! globals. Request and response bodies are typed; anything the service
//! sends that fails to decode or carries no text becomes a
//! [`ReasoningError`] for the pipeline stages to absorb.

use super::TextGenerator;
use crate::config::QuizConfig;
use crate::error::{QuizError, ReasoningError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Longest error-body excerpt kept in a [`ReasoningError::Status`] detail.
const STATUS_DETAIL_MAX: usize = 300;

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Deserialize)]
struct ResponseCandidate {
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

/// Gemini `generateContent` client.
#[derive(Debug)]
pub struct GeminiClient {
    http: reqwest::Client,
    model: String,
    api_base: String,
    api_key: String,
    temperature: f32,
    max_tokens: usize,
    timeout_secs: u64,
}

impl GeminiClient {
    /// Build the client from a validated config.
    ///
    /// Fails fast on a missing API key so misconfiguration surfaces at
    /// process start, not on the first pipeline run.
    pub fn new(config: &QuizConfig) -> Result<Self, QuizError> {
        if config.api_key.trim().is_empty() {
            return Err(QuizError::InvalidConfig(
                "Reasoning API key must not be empty (set GEMINI_API_KEY)".into(),
            ));
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .map_err(|e| QuizError::InvalidConfig(format!("HTTP client: {e}")))?;

        Ok(Self {
            http,
            model: config.model.clone(),
            api_base: config.api_base.clone(),
            api_key: config.api_key.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout_secs: config.api_timeout_secs,
        })
    }

    fn endpoint_url(&self) -> String {
        format!(
            "{}/{}:generateContent?key={}",
            self.api_base.trim_end_matches('/'),
            self.model,
            self.api_key
        )
    }

    fn request_body(&self, prompt: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_tokens as u32,
            },
        }
    }
}

/// Cap an error body at [`STATUS_DETAIL_MAX`] bytes on a char boundary.
fn truncate_detail(mut body: String) -> String {
    if body.len() > STATUS_DETAIL_MAX {
        let mut end = STATUS_DETAIL_MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
        body.push('\u{2026}');
    }
    body
}

/// Pull the first candidate's first text part out of a decoded response.
fn first_text(response: GenerateContentResponse) -> Option<String> {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|content| content.parts.into_iter().next())
        .map(|part| part.text)
        .filter(|text| !text.trim().is_empty())
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, ReasoningError> {
        let response = self
            .http
            .post(self.endpoint_url())
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ReasoningError::Timeout {
                        secs: self.timeout_secs,
                    }
                } else {
                    ReasoningError::Http {
                        detail: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReasoningError::Status {
                code: status.as_u16(),
                detail: truncate_detail(body),
            });
        }

        let decoded: GenerateContentResponse = response.json().await.map_err(|e| {
            ReasoningError::Http {
                detail: format!("response decode: {e}"),
            }
        })?;

        first_text(decoded).ok_or(ReasoningError::EmptyReply)
    }
}
