//! OpenAI-compatible `/v1/audio/transcriptions` client.

use async_trait::async_trait;
use reqwest::multipart;

use super::{Transcriber, Transcript, TranscriptionError};
use crate::audio::AudioPayload;
use crate::config::TranscriptionConfig;
use crate::http;

/// Uploads recordings as multipart (`file`, `model`, `language`) with bearer
/// auth and reads `{"text": ...}` back.
pub struct WhisperApiTranscriber {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl WhisperApiTranscriber {
    pub fn from_config(
        config: &TranscriptionConfig,
        api_key: Option<&str>,
        timeout_secs: u64,
    ) -> Self {
        Self {
            client: http::client_with_timeout(timeout_secs),
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: api_key.map(str::to_string),
        }
    }

    fn form(&self, audio: &AudioPayload, language: &str) -> Result<multipart::Form, TranscriptionError> {
        let file = multipart::Part::bytes(audio.bytes.clone())
            .file_name(audio.file_name.clone())
            .mime_str(&audio.mime_type)?;

        let mut form = multipart::Form::new()
            .part("file", file)
            .text("model", self.model.clone());
        if !language.trim().is_empty() {
            form = form.text("language", language.trim().to_string());
        }
        Ok(form)
    }
}

/// Read the transcript out of a response body. A missing `text` field is
/// treated like empty text.
pub fn transcript_from_response(json: &serde_json::Value) -> Transcript {
    Transcript::from_text(json["text"].as_str().unwrap_or(""))
}

#[async_trait]
impl Transcriber for WhisperApiTranscriber {
    async fn transcribe(
        &self,
        audio: &AudioPayload,
        language: &str,
    ) -> Result<Transcript, TranscriptionError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| TranscriptionError::MissingConfiguration("OpenAI API key".into()))?;

        log::debug!(
            "stt: uploading {} bytes ({:.1}s) to {}",
            audio.len(),
            audio.duration_secs,
            self.endpoint
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(key)
            .multipart(self.form(audio, language)?)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(TranscriptionError::Service {
                status: status.as_u16(),
                message: http::error_message(status, &body),
            });
        }

        let json: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| TranscriptionError::Parse(e.to_string()))?;
        let transcript = transcript_from_response(&json);
        log::info!(
            "stt: transcript received ({} chars)",
            transcript.text().map(str::len).unwrap_or(0)
        );
        Ok(transcript)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
