//! Pipeline coordinator: drives capture → [upload] → answer and
//! record → transcribe → answer, one run at a time.
//!
//! [`PipelineCoordinator`] consumes [`PipelineCommand`]s from a
//! `tokio::sync::mpsc` channel in arrival order. Slow stages run on spawned
//! tasks and report back over an internal channel tagged with their run id,
//! so the command loop never waits on the network.
//!
//! # Run flow
//!
//! ```text
//! Trigger(Screenshot)
//!   └─▶ spawn_blocking(capture_screen)                  [Capturing]
//!         └─▶ resolve_image (upload unless hosted)      [Uploading]
//!               └─▶ complete(prompt, image)             [Answering]
//!
//! Trigger(VoiceToggle) ×2
//!   └─▶ open device                                     [Recording]
//!         └─▶ stop, encode, transcribe                  [Transcribing]
//!               └─▶ complete(voice prompt)              [Answering]
//!
//! Trigger(TextSubmit)
//!   └─▶ complete(prompt [, current image])              [Answering]
//! ```
//!
//! While a run is in flight, every other trigger is dropped and reported as
//! a notice. The only thing that can interrupt a run is stopping or
//! cancelling a recording.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;

use crate::audio::{save_temporary_audio, AudioPayload, RecordingSession, StartOutcome};
use crate::capture::{capture_screen, CaptureError, ImagePayload, ScreenHost};
use crate::config::{AppConfig, AppPaths, ProviderKind};
use crate::format;
use crate::llm::{
    empty_transcription_text, voice_prompt, AnswerError, AnswerProvider, AnswerStage, ImageRef,
    Route,
};
use crate::shortcut::UiSurface;
use crate::stt::{Transcriber, Transcript, TranscriptionError};

use super::command::{CaptureTrigger, PipelineCommand};
use super::error::PipelineError;
use super::state::{
    status_channel, ErrorRecord, PipelineRun, PipelineStage, PipelineView, RunKind, StatusReader,
    StatusWriter,
};

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

/// The stage implementations the coordinator drives.
pub struct PipelineStages {
    pub screen: Arc<dyn ScreenHost>,
    /// Used only for the window bounds when choosing a screen.
    pub surface: Arc<dyn UiSurface>,
    pub recorder: RecordingSession,
    pub transcriber: Arc<dyn Transcriber>,
    pub answers: AnswerStage,
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Prompt shown when the session starts.
    pub initial_prompt: String,
    /// Prompt restored by Reset.
    pub default_prompt: String,
    pub preferred: ProviderKind,
    pub language: String,
    pub keep_recordings: bool,
    pub recordings_dir: PathBuf,
}

impl PipelineSettings {
    pub fn from_config(config: &AppConfig, paths: &AppPaths) -> Self {
        Self {
            initial_prompt: config.prompt.initial_prompt().to_string(),
            default_prompt: config.prompt.default_prompt.clone(),
            preferred: config.providers.preferred,
            language: config.transcription.language.clone(),
            keep_recordings: config.recording.keep_recordings,
            recordings_dir: paths.recordings_dir.clone(),
        }
    }
}

/// Result of a spawned stage, delivered back to the command loop.
enum StageOutcome {
    Captured(Result<ImagePayload, CaptureError>),
    Uploaded(Result<ImageRef, AnswerError>),
    Transcribed(Result<Transcript, TranscriptionError>),
    Answered(Result<String, AnswerError>),
    /// The stage task panicked or was cancelled.
    Crashed(String),
}

// ---------------------------------------------------------------------------
// PipelineCoordinator
// ---------------------------------------------------------------------------

pub struct PipelineCoordinator {
    stages: PipelineStages,
    settings: PipelineSettings,
    view: PipelineView,
    status: StatusWriter,
    /// Provider chosen when the current run was planned.
    provider: Option<Arc<dyn AnswerProvider>>,
    next_run_id: u64,
    outcome_tx: mpsc::UnboundedSender<(u64, StageOutcome)>,
    outcome_rx: mpsc::UnboundedReceiver<(u64, StageOutcome)>,
}

impl PipelineCoordinator {
    /// Build the coordinator and the reader the UI renders from.
    pub fn new(stages: PipelineStages, settings: PipelineSettings) -> (Self, StatusReader) {
        let view = PipelineView::new(settings.initial_prompt.clone(), settings.preferred);
        let (status, reader) = status_channel(view.clone());
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        let coordinator = Self {
            stages,
            settings,
            view,
            status,
            provider: None,
            next_run_id: 1,
            outcome_tx,
            outcome_rx,
        };
        (coordinator, reader)
    }

    /// Run until the command channel closes and the last run has finished.
    ///
    /// A recording still open when the channel closes is cancelled.
    pub async fn run(mut self, mut commands: mpsc::Receiver<PipelineCommand>) {
        log::info!("pipeline: coordinator started");
        let mut accepting = true;

        while accepting || self.view.run.is_some() {
            tokio::select! {
                command = commands.recv(), if accepting => match command {
                    Some(command) => self.handle_command(command),
                    None => {
                        accepting = false;
                        self.cancel_recording();
                        self.publish();
                    }
                },
                Some((id, outcome)) = self.outcome_rx.recv() => self.handle_outcome(id, outcome),
                else => break,
            }
        }

        log::info!("pipeline: command channel closed, coordinator stopping");
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    fn handle_command(&mut self, command: PipelineCommand) {
        match command {
            PipelineCommand::Trigger(trigger) => self.handle_trigger(trigger),
            PipelineCommand::SetPrompt(prompt) => self.view.prompt = prompt,
            PipelineCommand::SelectProvider(kind) => {
                log::info!("pipeline: image provider set to {kind}");
                self.view.provider = kind;
            }
            PipelineCommand::ClearImage => {
                if self.view.is_busy() {
                    self.drop_busy("clear image");
                } else {
                    self.view.image = None;
                }
            }
            PipelineCommand::Reset => self.reset(),
        }
        self.publish();
    }

    fn handle_trigger(&mut self, trigger: CaptureTrigger) {
        log::debug!("pipeline: trigger {}", trigger.name());
        match trigger {
            CaptureTrigger::VoiceToggle if self.view.is_recording() => self.stop_recording(),
            other if self.view.is_busy() => self.drop_busy(other.name()),
            CaptureTrigger::Screenshot => self.start_screenshot(),
            CaptureTrigger::ClipboardImage { bytes, mime_type } => {
                log::info!("pipeline: pasted {mime_type} image ({} bytes)", bytes.len());
                self.view.image = Some(Arc::new(ImagePayload::new(bytes, mime_type)));
                self.view.notice = None;
            }
            CaptureTrigger::VoiceToggle => self.start_recording(),
            CaptureTrigger::TextSubmit(prompt) => self.submit_text(prompt),
        }
    }

    fn drop_busy(&mut self, what: &str) {
        let stage = self.view.stage();
        log::info!("pipeline: {what} ignored while {}", stage.label());
        self.view.notice = Some(format!(
            "Busy ({}), {what} ignored",
            stage.label().to_lowercase()
        ));
    }

    fn reset(&mut self) {
        if self.view.is_recording() {
            self.cancel_recording();
        } else if self.view.is_busy() {
            self.drop_busy("reset");
            return;
        }

        self.view.prompt = self.settings.default_prompt.clone();
        self.view.image = None;
        self.view.transcript = None;
        self.view.answer = None;
        self.view.segments.clear();
        self.view.error = None;
        self.view.notice = None;
        self.view.status = "Ready".into();
        log::info!("pipeline: reset");
    }

    // -----------------------------------------------------------------------
    // Run bookkeeping
    // -----------------------------------------------------------------------

    fn begin_run(&mut self, kind: RunKind, stage: PipelineStage) {
        let id = self.next_run_id;
        self.next_run_id += 1;
        log::info!("pipeline: run {id} ({kind:?}) started");

        self.view.run = Some(PipelineRun {
            id,
            kind,
            stage: PipelineStage::Idle,
            started_at: Instant::now(),
        });
        self.view.error = None;
        self.view.notice = None;
        self.set_stage(stage);
    }

    fn current_run_id(&self) -> Option<u64> {
        self.view.run.as_ref().map(|run| run.id)
    }

    fn set_stage(&mut self, stage: PipelineStage) {
        self.view.status = match &stage {
            PipelineStage::Idle => "Ready".into(),
            PipelineStage::Capturing => "Capturing screen...".into(),
            PipelineStage::Recording => {
                "Recording... press the voice shortcut again to stop".into()
            }
            PipelineStage::Uploading => "Uploading image...".into(),
            PipelineStage::Transcribing => "Transcribing...".into(),
            PipelineStage::Answering => match &self.provider {
                Some(provider) => format!("Asking {}...", provider.kind()),
                None => "Asking...".into(),
            },
            PipelineStage::Done => "Done".into(),
            PipelineStage::Failed(message) => format!("Error: {message}"),
        };

        if let Some(run) = self.view.run.as_mut() {
            log::debug!(
                "pipeline: run {} {} -> {}",
                run.id,
                run.stage.label(),
                stage.label()
            );
            run.stage = stage;
        }
    }

    /// Leave the terminal stage and return to `Idle`.
    fn end_run(&mut self) {
        if let Some(run) = self.view.run.take() {
            log::info!(
                "pipeline: run {} finished in {:.1}s",
                run.id,
                run.started_at.elapsed().as_secs_f32()
            );
        }
        self.provider = None;
    }

    fn fail(&mut self, error: PipelineError) {
        let stage = self.view.stage();
        log::error!("pipeline: {} failed: {error}", stage.label());

        self.stages.recorder.cancel();
        self.view.error = Some(ErrorRecord {
            stage: stage.label().to_string(),
            message: error.to_string(),
            recoverable: error.recoverable(),
        });
        self.set_stage(PipelineStage::Failed(error.to_string()));
        self.end_run();
    }

    fn cancel_recording(&mut self) {
        if self.view.is_recording() {
            self.stages.recorder.cancel();
            self.end_run();
            self.view.status = "Recording cancelled".into();
        }
    }

    /// Run `stage` on the runtime and feed its outcome back to the loop.
    fn spawn_stage<F>(&self, stage: F)
    where
        F: Future<Output = StageOutcome> + Send + 'static,
    {
        let Some(id) = self.current_run_id() else {
            return;
        };
        let tx = self.outcome_tx.clone();
        let task = tokio::spawn(stage);
        tokio::spawn(async move {
            let outcome = task
                .await
                .unwrap_or_else(|e| StageOutcome::Crashed(e.to_string()));
            // The coordinator is gone; nothing to report to.
            let _ = tx.send((id, outcome));
        });
    }

    fn publish(&self) {
        self.status.publish(&self.view);
    }

    // -----------------------------------------------------------------------
    // Stage outcomes
    // -----------------------------------------------------------------------

    fn handle_outcome(&mut self, id: u64, outcome: StageOutcome) {
        if self.current_run_id() != Some(id) {
            log::debug!("pipeline: dropping stale outcome for run {id}");
            return;
        }

        match outcome {
            StageOutcome::Captured(Ok(image)) => {
                log::info!("pipeline: captured {} byte screenshot", image.bytes.len());
                self.view.image = Some(Arc::new(image));
                self.ask_about_image();
            }
            StageOutcome::Uploaded(Ok(image)) => {
                if let ImageRef::Url { url, .. } = &image {
                    self.remember_hosted_url(url);
                }
                let prompt = self.view.prompt.clone();
                self.ask(prompt, Some(image));
            }
            StageOutcome::Transcribed(Ok(transcript)) => self.answer_transcript(transcript),
            StageOutcome::Answered(Ok(answer)) => {
                self.view.segments = format::parse(&answer);
                self.view.answer = Some(answer);
                self.set_stage(PipelineStage::Done);
                self.end_run();
            }
            StageOutcome::Captured(Err(e)) => self.fail(e.into()),
            StageOutcome::Uploaded(Err(e)) | StageOutcome::Answered(Err(e)) => self.fail(e.into()),
            StageOutcome::Transcribed(Err(e)) => self.fail(e.into()),
            StageOutcome::Crashed(message) => {
                let stage = self.view.stage().label().to_lowercase();
                self.fail(PipelineError::ServiceError { stage, message });
            }
        }
        self.publish();
    }

    fn remember_hosted_url(&mut self, url: &str) {
        if let Some(image) = &self.view.image {
            if !image.is_hosted() {
                let hosted = image.as_ref().clone().with_source_url(url);
                self.view.image = Some(Arc::new(hosted));
            }
        }
    }

    // -----------------------------------------------------------------------
    // Flows
    // -----------------------------------------------------------------------

    fn start_screenshot(&mut self) {
        self.begin_run(RunKind::Screenshot, PipelineStage::Capturing);

        let screen = Arc::clone(&self.stages.screen);
        let bounds = self.stages.surface.bounds();
        self.spawn_stage(async move {
            let result = tokio::task::spawn_blocking(move || capture_screen(screen.as_ref(), bounds))
                .await
                .unwrap_or_else(|e| Err(CaptureError::Host(e.to_string())));
            StageOutcome::Captured(result)
        });
    }

    fn submit_text(&mut self, prompt: String) {
        self.view.prompt = prompt;

        if self.view.image.is_some() {
            self.begin_run(RunKind::Text, PipelineStage::Answering);
            self.ask_about_image();
            return;
        }

        if self.view.prompt.trim().is_empty() {
            log::debug!("pipeline: blank prompt without image ignored");
            self.view.notice = Some("Type a question or capture an image first".into());
            return;
        }

        self.begin_run(RunKind::Text, PipelineStage::Answering);
        match self
            .stages
            .answers
            .plan(Route::TextOnly, self.view.provider, None)
        {
            Ok(provider) => {
                self.provider = Some(provider);
                let prompt = self.view.prompt.clone();
                self.ask(prompt, None);
            }
            Err(e) => self.fail(e.into()),
        }
    }

    /// Plan the image route, then upload (if needed) and ask.
    fn ask_about_image(&mut self) {
        let Some(image) = self.view.image.clone() else {
            self.fail(PipelineError::NoSourceAvailable);
            return;
        };

        let provider = match self
            .stages
            .answers
            .plan(Route::Image, self.view.provider, Some(image.as_ref()))
        {
            Ok(provider) => provider,
            Err(e) => {
                self.fail(e.into());
                return;
            }
        };
        self.provider = Some(Arc::clone(&provider));

        if let Some(url) = &image.source_url {
            let image_ref = ImageRef::Url {
                url: url.clone(),
                mime_type: image.mime_type.clone(),
            };
            let prompt = self.view.prompt.clone();
            self.ask(prompt, Some(image_ref));
            return;
        }

        self.set_stage(PipelineStage::Uploading);
        let answers = self.stages.answers.clone();
        self.spawn_stage(async move {
            StageOutcome::Uploaded(answers.resolve_image(&image, provider.as_ref()).await)
        });
    }

    fn ask(&mut self, prompt: String, image: Option<ImageRef>) {
        let Some(provider) = self.provider.clone() else {
            self.fail(PipelineError::MissingConfiguration("answer provider".into()));
            return;
        };

        self.set_stage(PipelineStage::Answering);
        let answers = self.stages.answers.clone();
        self.spawn_stage(async move {
            StageOutcome::Answered(
                answers
                    .complete(provider.as_ref(), &prompt, image.as_ref())
                    .await,
            )
        });
    }

    fn start_recording(&mut self) {
        self.begin_run(RunKind::Voice, PipelineStage::Recording);

        // Fail on a missing key before the microphone is touched.
        match self
            .stages
            .answers
            .plan(Route::Voice, self.view.provider, None)
        {
            Ok(provider) => self.provider = Some(provider),
            Err(e) => {
                self.fail(e.into());
                return;
            }
        }

        match self.stages.recorder.start() {
            Ok(StartOutcome::Started) => {}
            Ok(StartOutcome::Stopped(audio)) => self.transcribe(audio),
            Err(e) => self.fail(e.into()),
        }
    }

    fn stop_recording(&mut self) {
        match self.stages.recorder.stop() {
            Ok(audio) => self.transcribe(audio),
            Err(e) => self.fail(e.into()),
        }
    }

    fn transcribe(&mut self, audio: AudioPayload) {
        log::info!(
            "pipeline: {:.1}s of audio, {} bytes",
            audio.duration_secs,
            audio.len()
        );
        if audio.low_confidence {
            self.view.notice =
                Some("Recording was very short or quiet; the transcript may be off".into());
        }
        if let Err(e) = save_temporary_audio(
            &audio,
            &self.settings.recordings_dir,
            self.settings.keep_recordings,
        ) {
            log::warn!("pipeline: could not keep recording: {e}");
        }

        self.set_stage(PipelineStage::Transcribing);
        let transcriber = Arc::clone(&self.stages.transcriber);
        let language = self.settings.language.clone();
        self.spawn_stage(async move {
            StageOutcome::Transcribed(transcriber.transcribe(&audio, &language).await)
        });
    }

    fn answer_transcript(&mut self, transcript: Transcript) {
        let heard = match transcript {
            Transcript::Text(text) => {
                self.view.transcript = Some(text.clone());
                text
            }
            Transcript::Empty => {
                log::warn!("pipeline: transcription came back empty");
                self.view.transcript = None;
                self.view.notice = Some(PipelineError::EmptyTranscription.to_string());
                empty_transcription_text().to_string()
            }
        };
        let prompt = voice_prompt(&self.view.prompt, &heard);
        self.ask(prompt, None);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
