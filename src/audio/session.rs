//! Toggle-based recording session.
//!
//! ```text
//! Idle ──start──▶ Recording ──stop / start──▶ Finalizing ──▶ Idle
//!                     └──────cancel──────────────────────────▶ Idle
//! ```
//!
//! The session owns the device for exactly as long as it is `Recording`.

use std::sync::Arc;
use std::time::Instant;

use super::capture::{ActiveRecording, AudioDevice};
use super::encode::{build_payload, AudioPayload};
use super::RecordingError;
use crate::config::RecordingConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingState {
    Idle,
    Recording { started_at: Instant },
    Finalizing,
}

/// What [`RecordingSession::start`] did.
#[derive(Debug)]
pub enum StartOutcome {
    /// The device was acquired and capture began.
    Started,
    /// A recording was already running; it was stopped instead.
    Stopped(AudioPayload),
}

pub struct RecordingSession {
    device: Arc<dyn AudioDevice>,
    config: RecordingConfig,
    state: RecordingState,
    active: Option<Box<dyn ActiveRecording>>,
}

impl RecordingSession {
    pub fn new(device: Arc<dyn AudioDevice>, config: RecordingConfig) -> Self {
        Self {
            device,
            config,
            state: RecordingState::Idle,
            active: None,
        }
    }

    pub fn state(&self) -> RecordingState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.state, RecordingState::Recording { .. })
    }

    /// Start recording, or stop the running recording (toggle).
    ///
    /// # Errors
    ///
    /// [`RecordingError::DeviceUnavailable`] if the device cannot be
    /// acquired; the session stays `Idle`.
    pub fn start(&mut self) -> Result<StartOutcome, RecordingError> {
        if self.is_recording() {
            log::debug!("audio: start while recording, stopping instead");
            return self.stop().map(StartOutcome::Stopped);
        }

        let active = self.device.open()?;
        self.active = Some(active);
        self.state = RecordingState::Recording {
            started_at: Instant::now(),
        };
        log::info!("audio: recording started");
        Ok(StartOutcome::Started)
    }

    /// Finish the recording and encode it.
    ///
    /// The device is released before encoding, and the session is back to
    /// `Idle` whether or not encoding succeeds.
    pub fn stop(&mut self) -> Result<AudioPayload, RecordingError> {
        let RecordingState::Recording { started_at } = self.state else {
            return Err(RecordingError::NotRecording);
        };
        self.state = RecordingState::Finalizing;

        let result = match self.active.take() {
            Some(active) => build_payload(active.finish(), &self.config),
            None => Err(RecordingError::DeviceUnavailable(
                "recording handle missing".into(),
            )),
        };
        self.state = RecordingState::Idle;

        log::info!(
            "audio: recording stopped after {:.1}s",
            started_at.elapsed().as_secs_f32()
        );
        result
    }

    /// Drop the running recording, if any. Returns `true` if one was running.
    pub fn cancel(&mut self) -> bool {
        let was_recording = self.is_recording();
        // Dropping the handle releases the device.
        self.active = None;
        self.state = RecordingState::Idle;
        if was_recording {
            log::info!("audio: recording cancelled");
        }
        was_recording
    }
}

// ---------------------------------------------------------------------------
// Test doubles
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod fake {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::super::capture::{ActiveRecording, AudioDevice, RecordedAudio};
    use super::super::RecordingError;

    /// Counts acquisitions and releases; yields a fixed buffer.
    #[derive(Default)]
    pub struct FakeDevice {
        pub opened: AtomicUsize,
        pub released: Arc<AtomicUsize>,
        pub fail: AtomicBool,
        pub samples: usize,
    }

    impl FakeDevice {
        pub fn with_samples(samples: usize) -> Self {
            Self {
                samples,
                ..Self::default()
            }
        }

        pub fn held(&self) -> usize {
            self.opened.load(Ordering::SeqCst) - self.released.load(Ordering::SeqCst)
        }
    }

    struct FakeRecording {
        samples: usize,
        released: Arc<AtomicUsize>,
    }

    impl ActiveRecording for FakeRecording {
        fn finish(self: Box<Self>) -> RecordedAudio {
            RecordedAudio {
                samples: vec![0.2; self.samples],
                sample_rate: 16_000,
                channels: 1,
            }
        }
    }

    impl Drop for FakeRecording {
        fn drop(&mut self) {
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl AudioDevice for FakeDevice {
        fn open(&self) -> Result<Box<dyn ActiveRecording>, RecordingError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(RecordingError::DeviceUnavailable("permission denied".into()));
            }
            self.opened.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakeRecording {
                samples: self.samples,
                released: Arc::clone(&self.released),
            }))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
