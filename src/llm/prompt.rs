//! Prompt text sent to the answer providers.
//!
//! * [`voice_prompt`] wraps a transcript in the user's prompt.
//! * [`empty_transcription_text`] stands in for a transcript when the service
//!   heard nothing, so the user still gets an explanation back.
//! * [`image_prompt`] fills in a prompt for providers that need one.

/// Sent with an image when the prompt box is empty.
pub const DEFAULT_IMAGE_PROMPT: &str = "Analyze this image and explain what's in it.";

const EMPTY_TRANSCRIPTION: &str = "\
The audio transcription came back empty. Please explain the likely reasons the \
speech-to-text service could not transcribe my recording (for example the volume \
was too low, the recording was too short, or there was a connectivity problem) \
and give tips to improve the recording quality.";

/// Combine the prompt box with a transcript.
///
/// ```
/// use capture_answer::llm::voice_prompt;
///
/// assert_eq!(
///     voice_prompt("Be brief.", "what is rust"),
///     "Be brief.\n\nAudio transcription: \"what is rust\""
/// );
/// assert_eq!(
///     voice_prompt("  ", "what is rust"),
///     "Please answer the following: \"what is rust\""
/// );
/// ```
pub fn voice_prompt(prompt: &str, transcription: &str) -> String {
    if prompt.trim().is_empty() {
        format!("Please answer the following: \"{transcription}\"")
    } else {
        format!("{prompt}\n\nAudio transcription: \"{transcription}\"")
    }
}

/// Synthetic transcript used when transcription returns nothing.
pub fn empty_transcription_text() -> &'static str {
    EMPTY_TRANSCRIPTION
}

/// The prompt to send alongside an image.
pub fn image_prompt(prompt: &str) -> &str {
    if prompt.trim().is_empty() {
        DEFAULT_IMAGE_PROMPT
    } else {
        prompt
    }
}
