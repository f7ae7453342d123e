//! Google Gemini `generateContent` provider.

use async_trait::async_trait;
use serde_json::json;

use super::prompt::image_prompt;
use super::{AnswerError, AnswerProvider, ImageRef};
use crate::config::{ProviderKind, ProvidersConfig};
use crate::http;

const TEMPERATURE: f32 = 0.4;
const TOP_K: u32 = 32;
const TOP_P: f32 = 1.0;

pub struct GeminiProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    max_tokens: u32,
    api_key: String,
}

impl GeminiProvider {
    /// `None` when no Gemini key is configured.
    pub fn from_config(config: &ProvidersConfig) -> Option<Self> {
        let api_key = config.gemini_key()?;
        Some(Self {
            client: http::client_with_timeout(config.timeout_secs),
            base_url: config.gemini_base_url.trim_end_matches('/').to_string(),
            model: config.gemini_model.clone(),
            max_tokens: config.max_tokens,
            api_key: api_key.to_string(),
        })
    }
}

/// Build the `generateContent` request body.
///
/// Hosted images go in a `file_data` part, inline ones in `inline_data`.
pub fn request_body(max_tokens: u32, prompt: &str, image: Option<&ImageRef>) -> serde_json::Value {
    let mut parts = Vec::new();
    match image {
        Some(image) => {
            parts.push(json!({ "text": image_prompt(prompt) }));
            parts.push(match image {
                ImageRef::Url { url, mime_type } => json!({
                    "file_data": { "mime_type": mime_type, "file_uri": url }
                }),
                ImageRef::Inline(payload) => json!({
                    "inline_data": { "mime_type": payload.mime_type, "data": payload.to_base64() }
                }),
            });
        }
        None => parts.push(json!({ "text": prompt })),
    }

    json!({
        "contents": [ { "parts": parts } ],
        "generationConfig": {
            "temperature": TEMPERATURE,
            "topK": TOP_K,
            "topP": TOP_P,
            "maxOutputTokens": max_tokens,
        }
    })
}

/// Extract `candidates[0].content.parts[0].text`.
pub fn answer_from_response(json: &serde_json::Value) -> Result<String, AnswerError> {
    let answer = json["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .ok_or(AnswerError::EmptyResponse)?
        .trim();
    if answer.is_empty() {
        return Err(AnswerError::EmptyResponse);
    }
    Ok(answer.to_string())
}

#[async_trait]
impl AnswerProvider for GeminiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    fn supports_inline_images(&self) -> bool {
        true
    }

    async fn complete(
        &self,
        prompt: &str,
        image: Option<&ImageRef>,
    ) -> Result<String, AnswerError> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model);
        let body = request_body(self.max_tokens, prompt, image);
        log::debug!("llm: gemini {} (image: {})", self.model, image.is_some());

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(AnswerError::Service {
                provider: ProviderKind::Gemini,
                status: status.as_u16(),
                message: http::error_message(status, &text),
            });
        }

        let json: serde_json::Value =
            serde_json::from_str(&text).map_err(|e| AnswerError::Parse(e.to_string()))?;
        answer_from_response(&json)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
