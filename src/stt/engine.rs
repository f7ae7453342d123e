//! Core transcription trait.
//!
//! [`Transcriber`] is what the pipeline calls. It is object-safe and
//! `Send + Sync` so it can be held behind an `Arc<dyn Transcriber>`.
//!
//! [`MockTranscriber`] (under `#[cfg(test)]`) returns a canned result so the
//! pipeline can be tested without network access.

use async_trait::async_trait;
use thiserror::Error;

use crate::audio::AudioPayload;

// ---------------------------------------------------------------------------
// TranscriptionError
// ---------------------------------------------------------------------------

/// Errors from the transcription stage.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TranscriptionError {
    /// A required setting (e.g. the API key) is not configured.
    #[error("{0} is not configured")]
    MissingConfiguration(String),

    /// The service answered with a non-success status.
    #[error("transcription service error {status}: {message}")]
    Service { status: u16, message: String },

    /// Transport failure (connection, timeout, TLS).
    #[error("transcription request failed: {0}")]
    Request(String),

    #[error("failed to parse transcription response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for TranscriptionError {
    fn from(e: reqwest::Error) -> Self {
        TranscriptionError::Request(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Transcript
// ---------------------------------------------------------------------------

/// Outcome of a successful transcription call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transcript {
    /// Trimmed, non-empty text.
    Text(String),
    /// The service heard nothing. Not a failure.
    Empty,
}

impl Transcript {
    /// Wrap service output, trimming it; blank text becomes [`Transcript::Empty`].
    pub fn from_text(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            Transcript::Empty
        } else {
            Transcript::Text(trimmed.to_string())
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Transcript::Text(t) => Some(t),
            Transcript::Empty => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Transcriber trait
// ---------------------------------------------------------------------------

/// Audio payload in, transcript out. Single attempt, no retry.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(
        &self,
        audio: &AudioPayload,
        language: &str,
    ) -> Result<Transcript, TranscriptionError>;
}

// ---------------------------------------------------------------------------
// MockTranscriber
// ---------------------------------------------------------------------------

#[cfg(test)]
pub use mock::MockTranscriber;
