//! Speech-to-text stage.
//!
//! # Architecture
//!
//! ```text
//! AudioPayload (16 kHz WAV) ──▶ Transcriber (trait) ──▶ Transcript
//!                                    │
//!                                    └─ WhisperApiTranscriber
//!                                       multipart POST, bearer auth
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use capture_answer::config::AppConfig;
//! use capture_answer::stt::{Transcriber, WhisperApiTranscriber};
//! # async fn run(audio: capture_answer::audio::AudioPayload) {
//! let config = AppConfig::default();
//! let stt = WhisperApiTranscriber::from_config(
//!     &config.transcription,
//!     config.providers.openai_key(),
//!     config.providers.timeout_secs,
//! );
//! let transcript = stt.transcribe(&audio, &config.transcription.language).await;
//! # }
//! ```

pub mod engine;
pub mod whisper_api;

pub use engine::{Transcriber, Transcript, TranscriptionError};
pub use whisper_api::{transcript_from_response, WhisperApiTranscriber};

#[cfg(test)]
pub use engine::MockTranscriber;
