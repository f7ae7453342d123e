//! Pipeline-level errors.
//!
//! Every stage error is converted into a [`PipelineError`] at the
//! coordinator, which turns it into an [`ErrorRecord`](super::ErrorRecord)
//! for the UI. Nothing is retried.

use thiserror::Error;

use crate::audio::RecordingError;
use crate::capture::CaptureError;
use crate::llm::AnswerError;
use crate::stt::TranscriptionError;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PipelineError {
    /// The microphone could not be acquired.
    #[error("microphone unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("no screen available to capture")]
    NoSourceAvailable,

    /// A stage ran and failed (network, service, encoding).
    #[error("{stage} failed: {message}")]
    ServiceError { stage: String, message: String },

    /// A key or account the request needs is not set.
    #[error("{0} is not configured; add it in settings")]
    MissingConfiguration(String),

    #[error("image host is not configured; add a Cloudflare account in settings")]
    MissingImageHost,

    /// Soft: the transcription was empty; the run continues.
    #[error("transcription was empty")]
    EmptyTranscription,
}

impl PipelineError {
    /// `true` when trying again unchanged may succeed.
    pub fn recoverable(&self) -> bool {
        matches!(
            self,
            PipelineError::ServiceError { .. } | PipelineError::EmptyTranscription
        )
    }

    fn service(stage: &str, message: impl ToString) -> Self {
        PipelineError::ServiceError {
            stage: stage.to_string(),
            message: message.to_string(),
        }
    }
}

impl From<CaptureError> for PipelineError {
    fn from(e: CaptureError) -> Self {
        match e {
            CaptureError::NoSourceAvailable => PipelineError::NoSourceAvailable,
            other => PipelineError::service("screen capture", other),
        }
    }
}

impl From<RecordingError> for PipelineError {
    fn from(e: RecordingError) -> Self {
        match e {
            RecordingError::DeviceUnavailable(msg) => PipelineError::DeviceUnavailable(msg),
            other => PipelineError::service("recording", other),
        }
    }
}

impl From<TranscriptionError> for PipelineError {
    fn from(e: TranscriptionError) -> Self {
        match e {
            TranscriptionError::MissingConfiguration(what) => {
                PipelineError::MissingConfiguration(what)
            }
            other => PipelineError::service("transcription", other),
        }
    }
}

impl From<AnswerError> for PipelineError {
    fn from(e: AnswerError) -> Self {
        match e {
            AnswerError::MissingConfiguration(what) => PipelineError::MissingConfiguration(what),
            AnswerError::MissingImageHost => PipelineError::MissingImageHost,
            AnswerError::Upload(msg) => PipelineError::service("image upload", msg),
            other => PipelineError::service("answer", other),
        }
    }
}
