//! Capture sources: how an image enters the pipeline.
//!
//! | Source | Mediated by | Entry point |
//! |--------|-------------|-------------|
//! | Screen | host (`xcap`) | [`capture_screen`] |
//! | Clipboard paste | UI (`arboard`) | [`capture_clipboard`] |
//!
//! Both produce a single [`ImagePayload`].

pub mod clipboard;
pub mod payload;
pub mod screen;

pub use clipboard::{capture_clipboard, read_system_clipboard, ClipboardItem};
pub use payload::ImagePayload;
pub use screen::{
    capture_screen, nearest_display, select_source, DisplayInfo, DisplaySource, Rect, ScreenHost,
    XcapHost,
};

use thiserror::Error;

/// Errors raised while producing an [`ImagePayload`].
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The host reported zero capturable screens.
    #[error("no screen source available")]
    NoSourceAvailable,

    /// The OS screen API failed.
    #[error("screen capture failed: {0}")]
    Host(String),

    /// The captured frame could not be encoded.
    #[error("image encoding failed: {0}")]
    Encode(String),

    /// The OS clipboard could not be opened.
    #[error("cannot access clipboard: {0}")]
    Clipboard(String),
}
