//! The UI surface as seen from the host side.
//!
//! The bridge asks the window whether it is alive or focused and where it is,
//! and leaves requests (focus, paste, move) for the UI thread to apply.
//! [`SurfaceHandle`] is the shared record the egui app keeps up to date every
//! frame.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::capture::Rect;

/// Host-side view of the UI window.
pub trait UiSurface: Send + Sync {
    /// `true` while the window exists and is visible.
    fn is_alive(&self) -> bool;

    /// Bring the window to the front.
    fn focus(&self);

    /// Window position and size in global coordinates, if known.
    fn bounds(&self) -> Option<Rect>;

    /// `true` while the window has keyboard focus.
    fn is_focused(&self) -> bool;

    /// Ask the UI to read the clipboard for an image.
    fn request_paste(&self);

    /// Ask the UI to move the window by `dx`, `dy` logical pixels.
    fn move_by(&self, dx: i32, dy: i32);
}

#[derive(Debug, Default)]
struct SurfaceState {
    visible: bool,
    focused: bool,
    bounds: Option<Rect>,
    focus_requested: bool,
    paste_requested: bool,
    pending_move: Option<(i32, i32)>,
    ctx: Option<egui::Context>,
}

impl SurfaceState {
    fn wake(&self) {
        if let Some(ctx) = &self.ctx {
            ctx.request_repaint();
        }
    }
}

/// Shared window record; cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct SurfaceHandle {
    inner: Arc<Mutex<SurfaceState>>,
}

impl SurfaceHandle {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, SurfaceState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Called once the egui context exists so focus requests can wake the UI.
    pub fn attach(&self, ctx: egui::Context) {
        let mut state = self.state();
        state.ctx = Some(ctx);
        state.visible = true;
    }

    /// Per-frame update from the UI thread.
    pub fn update(&self, visible: bool, bounds: Option<Rect>) {
        let mut state = self.state();
        state.visible = visible;
        if bounds.is_some() {
            state.bounds = bounds;
        }
    }

    pub fn set_focused(&self, focused: bool) {
        self.state().focused = focused;
    }

    /// The window is gone; later shortcuts are dropped.
    pub fn close(&self) {
        let mut state = self.state();
        state.visible = false;
        state.focused = false;
        state.ctx = None;
    }

    /// Consume a pending focus request, if any.
    pub fn take_focus_request(&self) -> bool {
        std::mem::take(&mut self.state().focus_requested)
    }

    pub fn take_paste_request(&self) -> bool {
        std::mem::take(&mut self.state().paste_requested)
    }

    /// Consume the accumulated move offset, if any.
    pub fn take_move(&self) -> Option<(i32, i32)> {
        self.state().pending_move.take()
    }
}

impl UiSurface for SurfaceHandle {
    fn is_alive(&self) -> bool {
        self.state().visible
    }

    fn focus(&self) {
        let mut state = self.state();
        state.focus_requested = true;
        state.wake();
    }

    fn bounds(&self) -> Option<Rect> {
        self.state().bounds
    }

    fn is_focused(&self) -> bool {
        let state = self.state();
        state.visible && state.focused
    }

    fn request_paste(&self) {
        let mut state = self.state();
        state.paste_requested = true;
        state.wake();
    }

    fn move_by(&self, dx: i32, dy: i32) {
        let mut state = self.state();
        let (x, y) = state.pending_move.unwrap_or((0, 0));
        state.pending_move = Some((x + dx, y + dy));
        state.wake();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_handle_is_not_alive() {
        let handle = SurfaceHandle::new();
        assert!(!handle.is_alive());
        assert!(handle.bounds().is_none());
    }

    #[test]
    fn update_and_close() {
        let handle = SurfaceHandle::new();
        let bounds = Rect {
            x: 10,
            y: 20,
            width: 300,
            height: 200,
        };
        handle.update(true, Some(bounds));
        assert!(handle.is_alive());
        assert_eq!(handle.bounds(), Some(bounds));

        // Unknown bounds keep the last known position.
        handle.update(true, None);
        assert_eq!(handle.bounds(), Some(bounds));

        handle.close();
        assert!(!handle.is_alive());
    }

    #[test]
    fn focus_request_is_consumed_once() {
        let handle = SurfaceHandle::new();
        let clone = handle.clone();
        clone.focus();
        assert!(handle.take_focus_request());
        assert!(!handle.take_focus_request());
    }

    #[test]
    fn focus_follows_window_and_close() {
        let handle = SurfaceHandle::new();
        handle.set_focused(true);
        assert!(!handle.is_focused(), "hidden window is never focused");

        handle.update(true, None);
        assert!(handle.is_focused());

        handle.close();
        assert!(!handle.is_focused());
    }

    #[test]
    fn paste_request_is_consumed_once() {
        let handle = SurfaceHandle::new();
        handle.clone().request_paste();
        assert!(handle.take_paste_request());
        assert!(!handle.take_paste_request());
    }

    #[test]
    fn moves_accumulate_until_taken() {
        let handle = SurfaceHandle::new();
        assert_eq!(handle.take_move(), None);

        handle.move_by(0, -50);
        handle.move_by(50, -50);
        assert_eq!(handle.take_move(), Some((50, -100)));
        assert_eq!(handle.take_move(), None);
    }
}
