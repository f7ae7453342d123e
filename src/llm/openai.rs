//! OpenAI `/v1/chat/completions` provider.
//!
//! One user message whose content is a list of parts: the prompt as a `text`
//! part and, when present, the image as an `image_url` part (a public URL or
//! a `data:` URL).

use async_trait::async_trait;
use serde_json::json;

use super::{AnswerError, AnswerProvider, ImageRef};
use crate::config::{ProviderKind, ProvidersConfig};
use crate::http;

pub struct OpenAiProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    max_tokens: u32,
    api_key: String,
}

impl OpenAiProvider {
    /// `None` when no OpenAI key is configured.
    pub fn from_config(config: &ProvidersConfig) -> Option<Self> {
        let api_key = config.openai_key()?;
        Some(Self {
            client: http::client_with_timeout(config.timeout_secs),
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            model: config.openai_model.clone(),
            max_tokens: config.max_tokens,
            api_key: api_key.to_string(),
        })
    }
}

/// Build the chat-completions request body.
pub fn request_body(model: &str, max_tokens: u32, prompt: &str, image: Option<&ImageRef>) -> serde_json::Value {
    let mut content = Vec::new();
    if !prompt.trim().is_empty() || image.is_none() {
        content.push(json!({ "type": "text", "text": prompt }));
    }
    if let Some(image) = image {
        let url = match image {
            ImageRef::Url { url, .. } => url.clone(),
            ImageRef::Inline(payload) => payload.to_data_url(),
        };
        content.push(json!({ "type": "image_url", "image_url": { "url": url } }));
    }

    json!({
        "model": model,
        "messages": [ { "role": "user", "content": content } ],
        "max_tokens": max_tokens,
    })
}

/// Extract `choices[0].message.content`.
pub fn answer_from_response(json: &serde_json::Value) -> Result<String, AnswerError> {
    let answer = json["choices"][0]["message"]["content"]
        .as_str()
        .ok_or(AnswerError::EmptyResponse)?
        .trim();
    if answer.is_empty() {
        return Err(AnswerError::EmptyResponse);
    }
    Ok(answer.to_string())
}

#[async_trait]
impl AnswerProvider for OpenAiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    fn supports_inline_images(&self) -> bool {
        true
    }

    async fn complete(
        &self,
        prompt: &str,
        image: Option<&ImageRef>,
    ) -> Result<String, AnswerError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = request_body(&self.model, self.max_tokens, prompt, image);
        log::debug!(
            "llm: openai {} (image: {})",
            self.model,
            image.is_some()
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(AnswerError::Service {
                provider: ProviderKind::OpenAi,
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
