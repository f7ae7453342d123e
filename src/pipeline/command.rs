//! Commands sent to the coordinator by the UI and the shortcut bridge.

use crate::config::ProviderKind;

/// An external event that can start or affect a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureTrigger {
    /// Capture the screen the window is on and ask about it.
    Screenshot,
    /// An image pasted into the window. Replaces the current image.
    ClipboardImage { bytes: Vec<u8>, mime_type: String },
    /// Start recording, or stop the running recording.
    VoiceToggle,
    /// Ask with the given prompt (and the current image, if any).
    TextSubmit(String),
}

impl CaptureTrigger {
    pub fn name(&self) -> &'static str {
        match self {
            CaptureTrigger::Screenshot => "screenshot",
            CaptureTrigger::ClipboardImage { .. } => "clipboard image",
            CaptureTrigger::VoiceToggle => "voice",
            CaptureTrigger::TextSubmit(_) => "text prompt",
        }
    }
}

/// Everything the coordinator accepts, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineCommand {
    Trigger(CaptureTrigger),
    /// Replace the prompt text. Always accepted.
    SetPrompt(String),
    /// Provider used for image prompts from the next run on. Always accepted.
    SelectProvider(ProviderKind),
    /// Drop the current image. Idle only.
    ClearImage,
    /// Restore the default prompt and clear image, transcript, answer and
    /// error. Idle only, except that it also cancels a recording.
    Reset,
}

impl From<CaptureTrigger> for PipelineCommand {
    fn from(trigger: CaptureTrigger) -> Self {
        PipelineCommand::Trigger(trigger)
    }
}
