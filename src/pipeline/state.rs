//! Run state and the view snapshot shared with the UI.
//!
//! The coordinator is the only writer. It mutates its own [`PipelineView`]
//! and publishes a copy through a [`StatusWriter`]; the egui loop reads it
//! through a [`StatusReader`] every frame. A reader never blocks the
//! coordinator for longer than one clone.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use crate::capture::ImagePayload;
use crate::config::ProviderKind;
use crate::format::FormattedSegment;

// ---------------------------------------------------------------------------
// PipelineStage
// ---------------------------------------------------------------------------

/// Where a run currently is.
///
/// ```text
/// Screenshot: Capturing ─▶ [Uploading] ─▶ Answering ─▶ Done
/// Voice:      Recording ─▶ Transcribing ─▶ Answering ─▶ Done
/// Text:       [Uploading] ─▶ Answering ─▶ Done
/// any stage ──error──▶ Failed
/// Done / Failed ──▶ Idle
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PipelineStage {
    #[default]
    Idle,
    Capturing,
    Recording,
    Uploading,
    Transcribing,
    Answering,
    Done,
    Failed(String),
}

impl PipelineStage {
    /// `true` while a run holds the pipeline.
    ///
    /// ```
    /// use capture_answer::pipeline::PipelineStage;
    ///
    /// assert!(!PipelineStage::Idle.is_busy());
    /// assert!(PipelineStage::Recording.is_busy());
    /// assert!(PipelineStage::Answering.is_busy());
    /// assert!(!PipelineStage::Done.is_busy());
    /// assert!(!PipelineStage::Failed("x".into()).is_busy());
    /// ```
    pub fn is_busy(&self) -> bool {
        !matches!(
            self,
            PipelineStage::Idle | PipelineStage::Done | PipelineStage::Failed(_)
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            PipelineStage::Idle => "Idle",
            PipelineStage::Capturing => "Capturing",
            PipelineStage::Recording => "Recording",
            PipelineStage::Uploading => "Uploading",
            PipelineStage::Transcribing => "Transcribing",
            PipelineStage::Answering => "Answering",
            PipelineStage::Done => "Done",
            PipelineStage::Failed(_) => "Failed",
        }
    }
}

// ---------------------------------------------------------------------------
// PipelineRun
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunKind {
    Screenshot,
    Voice,
    Text,
}

/// One trigger's journey through the stages. At most one exists at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineRun {
    pub id: u64,
    pub kind: RunKind,
    pub stage: PipelineStage,
    pub started_at: Instant,
}

/// A failure as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    /// Label of the stage the run was in when it failed.
    pub stage: String,
    pub message: String,
    /// `true` when trying again unchanged may succeed.
    pub recoverable: bool,
}

// ---------------------------------------------------------------------------
// PipelineView
// ---------------------------------------------------------------------------

/// Everything the UI renders.
#[derive(Debug, Clone)]
pub struct PipelineView {
    /// The run in flight, if any.
    pub run: Option<PipelineRun>,
    /// Current image; shared so per-frame snapshots stay cheap.
    pub image: Option<Arc<ImagePayload>>,
    pub prompt: String,
    pub provider: ProviderKind,
    /// One-line status for the status bar.
    pub status: String,
    pub transcript: Option<String>,
    /// The last answer, raw.
    pub answer: Option<String>,
    /// The last answer, split into prose and code blocks.
    pub segments: Vec<FormattedSegment>,
    pub error: Option<ErrorRecord>,
    /// Transient message, such as a dropped trigger or a quiet recording.
    pub notice: Option<String>,
}

impl PipelineView {
    pub fn new(prompt: impl Into<String>, provider: ProviderKind) -> Self {
        Self {
            run: None,
            image: None,
            prompt: prompt.into(),
            provider,
            status: "Ready".into(),
            transcript: None,
            answer: None,
            segments: Vec::new(),
            error: None,
            notice: None,
        }
    }

    /// Stage of the run in flight, or `Idle`.
    pub fn stage(&self) -> PipelineStage {
        self.run
            .as_ref()
            .map(|run| run.stage.clone())
            .unwrap_or_default()
    }

    pub fn is_busy(&self) -> bool {
        self.run.as_ref().is_some_and(|run| run.stage.is_busy())
    }

    pub fn is_recording(&self) -> bool {
        self.run
            .as_ref()
            .is_some_and(|run| run.stage == PipelineStage::Recording)
    }
}

impl Default for PipelineView {
    fn default() -> Self {
        Self::new(String::new(), ProviderKind::default())
    }
}

// ---------------------------------------------------------------------------
// StatusWriter / StatusReader
// ---------------------------------------------------------------------------

type SharedView = Arc<Mutex<PipelineView>>;

fn lock(view: &SharedView) -> MutexGuard<'_, PipelineView> {
    view.lock().unwrap_or_else(|e| e.into_inner())
}

/// Write side; owned by the coordinator.
pub struct StatusWriter {
    inner: SharedView,
}

impl StatusWriter {
    pub fn publish(&self, view: &PipelineView) {
        *lock(&self.inner) = view.clone();
    }
}

/// Read side; cheap to clone.
#[derive(Clone)]
pub struct StatusReader {
    inner: SharedView,
}

impl StatusReader {
    pub fn snapshot(&self) -> PipelineView {
        lock(&self.inner).clone()
    }

    /// Borrow the current view without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&PipelineView) -> R) -> R {
        f(&lock(&self.inner))
    }
}

/// Create a linked writer/reader pair seeded with `initial`.
pub fn status_channel(initial: PipelineView) -> (StatusWriter, StatusReader) {
    let inner = Arc::new(Mutex::new(initial));
    (
        StatusWriter {
            inner: Arc::clone(&inner),
        },
        StatusReader { inner },
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn run(stage: PipelineStage) -> PipelineRun {
        PipelineRun {
            id: 1,
            kind: RunKind::Voice,
            stage,
            started_at: Instant::now(),
        }
    }

    #[test]
    fn terminal_stages_are_not_busy() {
        assert!(!PipelineStage::Done.is_busy());
        assert!(!PipelineStage::Failed("boom".into()).is_busy());
        assert!(PipelineStage::Uploading.is_busy());
        assert!(PipelineStage::Transcribing.is_busy());
        assert_eq!(PipelineStage::default(), PipelineStage::Idle);
    }

    #[test]
    fn labels() {
        assert_eq!(PipelineStage::Capturing.label(), "Capturing");
        assert_eq!(PipelineStage::Failed("x".into()).label(), "Failed");
    }

    #[test]
    fn view_stage_follows_run() {
        let mut view = PipelineView::new("prompt", ProviderKind::Gemini);
        assert_eq!(view.stage(), PipelineStage::Idle);
        assert!(!view.is_busy());

        view.run = Some(run(PipelineStage::Recording));
        assert!(view.is_busy());
        assert!(view.is_recording());

        view.run = Some(run(PipelineStage::Answering));
        assert!(!view.is_recording());
        assert_eq!(view.stage(), PipelineStage::Answering);
    }

    #[test]
    fn reader_sees_published_view() {
        let (writer, reader) = status_channel(PipelineView::default());
        assert_eq!(reader.snapshot().status, "Ready");

        let mut view = PipelineView::new("p", ProviderKind::OpenAi);
        view.status = "Answering".into();
        writer.publish(&view);

        assert_eq!(reader.snapshot().status, "Answering");
        assert_eq!(reader.with(|v| v.prompt.clone()), "p");
    }

    #[test]
    fn reader_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<StatusReader>();
    }
}
