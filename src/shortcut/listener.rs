//! Dedicated OS-thread key hook using `rdev::listen`.
//!
//! `rdev::listen` blocks forever and has no shutdown API, so the thread lives
//! until the process exits. Dropping [`ShortcutListener`] sets a stop flag and
//! the callback discards everything after that.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use super::{Accelerator, Modifiers, ShortcutBridge};

// ---------------------------------------------------------------------------
// KeyTracker
// ---------------------------------------------------------------------------

/// Turns raw press/release events into accelerator presses.
///
/// Holds the set of keys that are down. Modifier state is derived from it,
/// and an OS auto-repeat press of a held key yields nothing.
#[derive(Debug, Default)]
pub struct KeyTracker {
    held: Vec<rdev::Key>,
}

impl KeyTracker {
    /// Feed one event; returns the accelerator completed by a fresh key press.
    pub fn handle(&mut self, event: &rdev::EventType) -> Option<Accelerator> {
        match *event {
            rdev::EventType::KeyPress(key) => {
                if self.held.contains(&key) {
                    return None;
                }
                self.held.push(key);
                if Modifiers::is_modifier(key) {
                    return None;
                }
                Some(Accelerator::new(Modifiers::from_held(&self.held), key))
            }
            rdev::EventType::KeyRelease(key) => {
                self.held.retain(|k| *k != key);
                None
            }
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// ShortcutListener
// ---------------------------------------------------------------------------

/// Handle to the running listener thread.
pub struct ShortcutListener {
    stop: Arc<AtomicBool>,
    _thread: std::thread::JoinHandle<()>,
}

impl ShortcutListener {
    /// Spawn the hook thread; every accelerator press goes to
    /// [`ShortcutBridge::dispatch`].
    pub fn start(bridge: Arc<ShortcutBridge>) -> std::io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_clone = Arc::clone(&stop);

        let thread = std::thread::Builder::new()
            .name("shortcut-listener".into())
            .spawn(move || {
                let mut tracker = KeyTracker::default();
                let result = rdev::listen(move |event| {
                    if stop_clone.load(Ordering::Relaxed) {
                        return;
                    }
                    if let Some(accel) = tracker.handle(&event.event_type) {
                        bridge.dispatch(&accel);
                    }
                });

                if let Err(e) = result {
                    log::error!("shortcut: rdev::listen exited with error: {:?}", e);
                }
            })?;

        Ok(Self {
            stop,
            _thread: thread,
        })
    }
}

impl Drop for ShortcutListener {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}
