//! The `AnswerProvider` trait, its error type and provider selection.

use async_trait::async_trait;
use thiserror::Error;

use crate::capture::ImagePayload;
use crate::config::ProviderKind;

// ---------------------------------------------------------------------------
// AnswerError
// ---------------------------------------------------------------------------

/// Errors from the answer stage (image upload included).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AnswerError {
    /// A required key or setting is absent.
    #[error("{0} is not configured")]
    MissingConfiguration(String),

    /// The image has no URL yet and it cannot be uploaded or inlined.
    #[error("image host is not configured")]
    MissingImageHost,

    #[error("image upload failed: {0}")]
    Upload(String),

    /// The provider answered with a non-success status.
    #[error("{provider} error {status}: {message}")]
    Service {
        provider: ProviderKind,
        status: u16,
        message: String,
    },

    /// Transport failure (connection, timeout, TLS).
    #[error("request failed: {0}")]
    Request(String),

    #[error("failed to parse response: {0}")]
    Parse(String),

    #[error("provider returned an empty answer")]
    EmptyResponse,
}

impl From<reqwest::Error> for AnswerError {
    fn from(e: reqwest::Error) -> Self {
        AnswerError::Request(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// ImageRef
// ---------------------------------------------------------------------------

/// How an image is handed to a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    /// Fetched by the provider from a public URL.
    Url { url: String, mime_type: String },
    /// Sent inline as base64.
    Inline(ImagePayload),
}

// ---------------------------------------------------------------------------
// AnswerProvider trait
// ---------------------------------------------------------------------------

/// Prompt (+ optional image) in, answer text out. Single attempt.
#[async_trait]
pub trait AnswerProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Whether base64 image data is accepted when no URL is available.
    fn supports_inline_images(&self) -> bool;

    async fn complete(&self, prompt: &str, image: Option<&ImageRef>)
        -> Result<String, AnswerError>;
}

// ---------------------------------------------------------------------------
// Provider selection
// ---------------------------------------------------------------------------

/// What kind of request is being answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// A transcribed voice prompt.
    Voice,
    /// Typed text with no image.
    TextOnly,
    /// Anything with an image attached.
    Image,
}

/// Pick the provider for `route`.
///
/// | route | OpenAI | Gemini | result |
/// |-------|--------|--------|--------|
/// | Voice / TextOnly | yes | any | OpenAI |
/// | Voice / TextOnly | no | any | `MissingConfiguration` |
/// | Image | yes | yes | `preferred` |
/// | Image | one of them | | that one |
/// | Image | no | no | `MissingConfiguration` |
pub fn select_provider(
    route: Route,
    openai_configured: bool,
    gemini_configured: bool,
    preferred: ProviderKind,
) -> Result<ProviderKind, AnswerError> {
    match route {
        Route::Voice | Route::TextOnly => {
            if openai_configured {
                Ok(ProviderKind::OpenAi)
            } else {
                Err(AnswerError::MissingConfiguration("OpenAI API key".into()))
            }
        }
        Route::Image => match (openai_configured, gemini_configured) {
            (true, true) => Ok(preferred),
            (true, false) => Ok(ProviderKind::OpenAi),
            (false, true) => Ok(ProviderKind::Gemini),
            (false, false) => Err(AnswerError::MissingConfiguration(
                "OpenAI or Gemini API key".into(),
            )),
        },
    }
}
