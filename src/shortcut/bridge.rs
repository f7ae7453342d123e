//! Accelerator → [`ShortcutKind`] registry and delivery into the pipeline.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;

use super::{Accelerator, AcceleratorError, ShortcutKind, UiSurface};
use crate::pipeline::PipelineCommand;

/// Relays global shortcuts to the pipeline as typed commands.
///
/// Owns only the accelerator→kind table; each accelerator maps to one kind
/// and each kind has at most one accelerator.
pub struct ShortcutBridge {
    bindings: Mutex<Vec<(Accelerator, ShortcutKind)>>,
    surface: Arc<dyn UiSurface>,
    commands: mpsc::Sender<PipelineCommand>,
    move_step: i32,
}

impl ShortcutBridge {
    pub fn new(surface: Arc<dyn UiSurface>, commands: mpsc::Sender<PipelineCommand>) -> Self {
        Self {
            bindings: Mutex::new(Vec::new()),
            surface,
            commands,
            move_step: 50,
        }
    }

    /// Pixels the window moves per move shortcut.
    pub fn with_move_step(mut self, step: i32) -> Self {
        self.move_step = step;
        self
    }

    fn table(&self) -> MutexGuard<'_, Vec<(Accelerator, ShortcutKind)>> {
        self.bindings.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Bind `accelerator` to `kind`, replacing any earlier binding of either.
    pub fn register(&self, accelerator: Accelerator, kind: ShortcutKind) {
        let mut table = self.table();
        table.retain(|(a, k)| *a != accelerator && *k != kind);
        table.push((accelerator, kind));
        log::info!("shortcut: {:?} bound to {:?}", accelerator, kind);
    }

    /// Parse and register an accelerator string from config.
    pub fn register_str(
        &self,
        accelerator: &str,
        kind: ShortcutKind,
    ) -> Result<Accelerator, AcceleratorError> {
        let parsed = Accelerator::parse(accelerator)?;
        self.register(parsed, kind);
        Ok(parsed)
    }

    pub fn unregister_all(&self) {
        self.table().clear();
        log::debug!("shortcut: all bindings cleared");
    }

    pub fn lookup(&self, accelerator: &Accelerator) -> Option<ShortcutKind> {
        self.table()
            .iter()
            .find(|(a, _)| a == accelerator)
            .map(|(_, k)| *k)
    }

    pub fn len(&self) -> usize {
        self.table().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table().is_empty()
    }

    /// Act on the shortcut bound to `accelerator`.
    ///
    /// Returns `true` if a command was sent or a surface request was left.
    /// Called from the non-async listener thread, hence `blocking_send`.
    pub fn dispatch(&self, accelerator: &Accelerator) -> bool {
        let Some(kind) = self.lookup(accelerator) else {
            return false;
        };

        if !self.surface.is_alive() {
            log::info!("shortcut: {:?} ignored, window not available", kind);
            return false;
        }

        match kind {
            ShortcutKind::PasteImage => {
                // Cmd/Ctrl+V in another application is not ours.
                if !self.surface.is_focused() {
                    return false;
                }
                self.surface.request_paste();
                true
            }
            ShortcutKind::Move(direction) => {
                let (dx, dy) = direction.offset(self.move_step);
                self.surface.move_by(dx, dy);
                true
            }
            ShortcutKind::Screenshot | ShortcutKind::VoiceToggle => {
                let Some(trigger) = kind.trigger() else {
                    return false;
                };
                self.surface.focus();
                match self.commands.blocking_send(PipelineCommand::Trigger(trigger)) {
                    Ok(()) => true,
                    Err(_) => {
                        log::warn!("shortcut: pipeline closed, dropping {:?}", kind);
                        false
                    }
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
