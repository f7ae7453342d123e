//! Pipeline coordinator module.
//!
//! This module serializes every trigger into runs of
//! capture → [upload] → transcribe → answer → format and exposes the view
//! snapshot the UI reads every frame.
//!
//! # Architecture
//!
//! ```text
//! ShortcutBridge / UI  ── PipelineCommand (mpsc) ──┐
//!                                                  ▼
//!                            PipelineCoordinator::run()  ← async tokio task
//!                                                  │
//!          ┌──────────────┬───────────────┬────────┴───────┐
//!          ▼              ▼               ▼                ▼
//!     capture_screen  RecordingSession  Transcriber    AnswerStage
//!     (spawn_blocking)                  (spawned)      (spawned)
//!          └──────── (run id, StageOutcome) ◀──────────────┘
//!
//! StatusWriter ──publish──▶ PipelineView ◀── StatusReader (egui update())
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//! use capture_answer::audio::{CpalDevice, RecordingSession};
//! use capture_answer::capture::XcapHost;
//! use capture_answer::config::{AppConfig, AppPaths};
//! use capture_answer::llm::AnswerStage;
//! use capture_answer::pipeline::{
//!     CaptureTrigger, PipelineCommand, PipelineCoordinator, PipelineSettings, PipelineStages,
//! };
//! use capture_answer::shortcut::SurfaceHandle;
//! use capture_answer::stt::WhisperApiTranscriber;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = AppConfig::default();
//!     let stages = PipelineStages {
//!         screen: Arc::new(XcapHost),
//!         surface: Arc::new(SurfaceHandle::new()),
//!         recorder: RecordingSession::new(
//!             Arc::new(CpalDevice::new(None, config.recording.max_recording_secs)),
//!             config.recording.clone(),
//!         ),
//!         transcriber: Arc::new(WhisperApiTranscriber::from_config(
//!             &config.transcription,
//!             config.providers.openai_key(),
//!             config.providers.timeout_secs,
//!         )),
//!         answers: AnswerStage::from_config(&config),
//!     };
//!     let settings = PipelineSettings::from_config(&config, &AppPaths::new());
//!     let (coordinator, status) = PipelineCoordinator::new(stages, settings);
//!
//!     let (tx, rx) = mpsc::channel(32);
//!     let task = tokio::spawn(coordinator.run(rx));
//!
//!     tx.send(PipelineCommand::Trigger(CaptureTrigger::TextSubmit("What is a monad?".into())))
//!         .await
//!         .unwrap();
//!     drop(tx);
//!     task.await.unwrap();
//!     println!("{:?}", status.snapshot().answer);
//! }
//! ```

pub mod command;
pub mod coordinator;
pub mod error;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use command::{CaptureTrigger, PipelineCommand};
pub use coordinator::{PipelineCoordinator, PipelineSettings, PipelineStages};
pub use error::PipelineError;
pub use state::{
    status_channel, ErrorRecord, PipelineRun, PipelineStage, PipelineView, RunKind, StatusReader,
    StatusWriter,
};
