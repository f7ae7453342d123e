//! Audio pipeline: microphone capture → downmix/resample → WAV payload.
//!
//! # Pipeline
//!
//! ```text
//! Microphone → cpal callback → sample buffer ─finish─▶ downmix → 16 kHz
//!           → 16-bit WAV (hound) → AudioPayload
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use capture_answer::audio::{CpalDevice, RecordingSession, StartOutcome};
//! use capture_answer::config::RecordingConfig;
//!
//! let device = Arc::new(CpalDevice::new(None, 300.0));
//! let mut session = RecordingSession::new(device, RecordingConfig::default());
//! session.start().unwrap();
//! // ... later, the same toggle stops it:
//! if let StartOutcome::Stopped(payload) = session.start().unwrap() {
//!     println!("{} bytes of {}", payload.len(), payload.mime_type);
//! }
//! ```

pub mod capture;
pub mod encode;
pub mod resample;
pub mod session;
pub mod storage;

pub use capture::{ActiveRecording, AudioDevice, CpalDevice, RecordedAudio};
pub use encode::{build_payload, encode_wav, AudioPayload};
pub use resample::{downmix, resample_linear, to_speech_format, TARGET_SAMPLE_RATE};
pub use session::{RecordingSession, RecordingState, StartOutcome};
pub use storage::save_temporary_audio;

use thiserror::Error;

/// Errors raised by the recording session.
#[derive(Debug, Error)]
pub enum RecordingError {
    /// The microphone could not be opened (missing, busy or not permitted).
    #[error("audio device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("not recording")]
    NotRecording,

    #[error("audio encoding failed: {0}")]
    Encode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
