//! Global keyboard shortcuts, relayed from an OS key hook into the pipeline.
//!
//! # Design
//!
//! `rdev::listen()` runs on a dedicated OS thread ([`ShortcutListener`]). The
//! thread tracks modifiers, turns fresh key presses into [`Accelerator`]s and
//! hands them to the [`ShortcutBridge`], which looks the accelerator up and
//! checks that the window is still there. Capture shortcuts focus the window
//! and send a
//! [`PipelineCommand::Trigger`](crate::pipeline::PipelineCommand::Trigger);
//! paste and move shortcuts leave a request on the [`UiSurface`].
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//! use capture_answer::shortcut::{ShortcutBridge, ShortcutKind, ShortcutListener, SurfaceHandle};
//!
//! let (tx, _rx) = mpsc::channel(16);
//! let bridge = Arc::new(ShortcutBridge::new(Arc::new(SurfaceHandle::new()), tx));
//! bridge.register_str("CommandOrControl+S", ShortcutKind::Screenshot).unwrap();
//! let _listener = ShortcutListener::start(bridge).unwrap();
//! ```

pub mod accelerator;
pub mod bridge;
pub mod listener;
pub mod surface;

pub use accelerator::{parse_key, Accelerator, AcceleratorError, Modifiers};
pub use bridge::ShortcutBridge;
pub use listener::{KeyTracker, ShortcutListener};
pub use surface::{SurfaceHandle, UiSurface};

use crate::pipeline::CaptureTrigger;

/// What a shortcut asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShortcutKind {
    Screenshot,
    VoiceToggle,
    /// Cmd/Ctrl+V; only honoured while the window has focus.
    PasteImage,
    Move(MoveDirection),
}

impl ShortcutKind {
    /// The pipeline trigger, for kinds that start a capture.
    pub fn trigger(self) -> Option<CaptureTrigger> {
        match self {
            ShortcutKind::Screenshot => Some(CaptureTrigger::Screenshot),
            ShortcutKind::VoiceToggle => Some(CaptureTrigger::VoiceToggle),
            ShortcutKind::PasteImage | ShortcutKind::Move(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveDirection {
    Up,
    Down,
    Left,
    Right,
}

impl MoveDirection {
    pub const ALL: [MoveDirection; 4] = [
        MoveDirection::Up,
        MoveDirection::Down,
        MoveDirection::Left,
        MoveDirection::Right,
    ];

    /// Window offset for one press; screen y grows downwards.
    pub fn offset(self, step: i32) -> (i32, i32) {
        match self {
            MoveDirection::Up => (0, -step),
            MoveDirection::Down => (0, step),
            MoveDirection::Left => (-step, 0),
            MoveDirection::Right => (step, 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_capture_kinds_have_triggers() {
        assert!(matches!(
            ShortcutKind::Screenshot.trigger(),
            Some(CaptureTrigger::Screenshot)
        ));
        assert!(ShortcutKind::PasteImage.trigger().is_none());
        assert!(ShortcutKind::Move(MoveDirection::Up).trigger().is_none());
    }

    #[test]
    fn move_offsets() {
        assert_eq!(MoveDirection::Up.offset(50), (0, -50));
        assert_eq!(MoveDirection::Right.offset(50), (50, 0));
        assert_eq!(MoveDirection::Left.offset(10), (-10, 0));
    }
}
