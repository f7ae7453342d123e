//! Answer stage: prompt (+ optional image) → answer text.
//!
//! This module provides:
//! * [`AnswerProvider`]: async trait implemented by every provider.
//! * [`OpenAiProvider`] / [`GeminiProvider`]: the two HTTP backends.
//! * [`ImageHost`] / [`CloudflareImageHost`]: image upload for URL delivery.
//! * [`select_provider`]: the route × keys × toggle decision table.
//! * [`AnswerStage`]: ties the above together for the pipeline.
//! * Prompt helpers ([`voice_prompt`], [`empty_transcription_text`]).
//!
//! # Quick start
//!
//! ```rust,no_run
//! use capture_answer::config::AppConfig;
//! use capture_answer::llm::{AnswerStage, Route};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::load().unwrap_or_default();
//!     let stage = AnswerStage::from_config(&config);
//!     let answer = stage
//!         .answer(Route::TextOnly, config.providers.preferred, "What is a monad?", None)
//!         .await;
//!     println!("{answer:?}");
//! }
//! ```

pub mod gemini;
pub mod image_host;
pub mod openai;
pub mod prompt;
pub mod provider;
pub mod stage;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use gemini::GeminiProvider;
pub use image_host::{CloudflareImageHost, ImageHost};
pub use openai::OpenAiProvider;
pub use prompt::{empty_transcription_text, image_prompt, voice_prompt, DEFAULT_IMAGE_PROMPT};
pub use provider::{select_provider, AnswerError, AnswerProvider, ImageRef, Route};
pub use stage::AnswerStage;

#[cfg(test)]
pub(crate) use stage::mock::{MockHost, MockProvider};
