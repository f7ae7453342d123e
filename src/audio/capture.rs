//! Microphone access via `cpal`.
//!
//! [`AudioDevice::open`] starts capturing and returns an [`ActiveRecording`];
//! finishing or dropping the recording releases the device. `cpal::Stream`
//! is not `Send`, so [`CpalDevice`] keeps each stream on its own thread and
//! talks to it over channels.

use std::sync::{mpsc, Arc, Mutex};
use std::thread::JoinHandle;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};

use super::RecordingError;

// ---------------------------------------------------------------------------
// RecordedAudio
// ---------------------------------------------------------------------------

/// Raw audio as delivered by the device.
///
/// Samples are interleaved `f32` in `[-1.0, 1.0]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Something that can be recorded from.
pub trait AudioDevice: Send + Sync {
    /// Acquire the device and start capturing.
    fn open(&self) -> Result<Box<dyn ActiveRecording>, RecordingError>;
}

/// A running capture. Dropping it releases the device and discards audio.
pub trait ActiveRecording: Send {
    /// Stop capturing, release the device and hand back what was recorded.
    fn finish(self: Box<Self>) -> RecordedAudio;
}

// ---------------------------------------------------------------------------
// CpalDevice
// ---------------------------------------------------------------------------

/// The system microphone (or a named input device).
#[derive(Debug, Clone, Default)]
pub struct CpalDevice {
    device_name: Option<String>,
    max_recording_secs: f32,
}

impl CpalDevice {
    pub fn new(device_name: Option<String>, max_recording_secs: f32) -> Self {
        Self {
            device_name,
            max_recording_secs,
        }
    }

    /// Names of every input device on the default host.
    pub fn input_device_names() -> Vec<String> {
        cpal::default_host()
            .input_devices()
            .map(|devices| devices.filter_map(|d| d.name().ok()).collect())
            .unwrap_or_default()
    }
}

impl AudioDevice for CpalDevice {
    fn open(&self) -> Result<Box<dyn ActiveRecording>, RecordingError> {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let (ready_tx, ready_rx) = mpsc::channel();
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let name = self.device_name.clone();
        let max_secs = self.max_recording_secs;
        let stream_buffer = Arc::clone(&buffer);

        let thread = std::thread::Builder::new()
            .name("audio-capture".into())
            .spawn(move || match start_stream(name.as_deref(), max_secs, stream_buffer) {
                Ok((stream, format)) => {
                    let _ = ready_tx.send(Ok(format));
                    // Park until finished or dropped; either closes the channel.
                    let _ = stop_rx.recv();
                    drop(stream);
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                }
            })
            .map_err(|e| RecordingError::DeviceUnavailable(e.to_string()))?;

        let (sample_rate, channels) = ready_rx
            .recv()
            .map_err(|_| RecordingError::DeviceUnavailable("capture thread exited".into()))??;

        log::info!("audio: recording at {sample_rate} Hz, {channels} channel(s)");
        Ok(Box::new(CpalRecording {
            buffer,
            sample_rate,
            channels,
            stop: Some(stop_tx),
            thread: Some(thread),
        }))
    }
}

fn start_stream(
    name: Option<&str>,
    max_secs: f32,
    buffer: Arc<Mutex<Vec<f32>>>,
) -> Result<(cpal::Stream, (u32, u16)), RecordingError> {
    let unavailable = |e: &dyn std::fmt::Display| RecordingError::DeviceUnavailable(e.to_string());

    let host = cpal::default_host();
    let device = match name {
        Some(wanted) => host
            .input_devices()
            .map_err(|e| unavailable(&e))?
            .find(|d| d.name().map(|n| n == wanted).unwrap_or(false)),
        None => host.default_input_device(),
    }
    .ok_or_else(|| RecordingError::DeviceUnavailable("no input device found".into()))?;

    let supported = device.default_input_config().map_err(|e| unavailable(&e))?;
    let channels = supported.channels();
    let sample_rate = supported.sample_rate().0;
    let format = supported.sample_format();
    let config: cpal::StreamConfig = supported.into();

    let limit = (max_secs.max(0.0) as f64 * sample_rate as f64 * channels as f64) as usize;

    let stream = match format {
        cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, buffer, limit),
        cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, buffer, limit),
        cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, buffer, limit),
        cpal::SampleFormat::I32 => build_stream::<i32>(&device, &config, buffer, limit),
        other => {
            return Err(RecordingError::DeviceUnavailable(format!(
                "unsupported sample format {other:?}"
            )))
        }
    }
    .map_err(|e| unavailable(&e))?;

    stream.play().map_err(|e| unavailable(&e))?;
    Ok((stream, (sample_rate, channels)))
}

/// Input stream for samples of type `T`, stored as `f32`.
fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    buffer: Arc<Mutex<Vec<f32>>>,
    limit: usize,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            if let Ok(mut buf) = buffer.lock() {
                append_samples(&mut buf, data, limit);
            }
        },
        |err: cpal::StreamError| {
            log::error!("audio: cpal stream error: {err}");
        },
        None,
    )
}

/// Convert `data` to `f32` and append it, keeping `buf` within `limit`.
fn append_samples<T>(buf: &mut Vec<f32>, data: &[T], limit: usize)
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let room = limit.saturating_sub(buf.len());
    buf.extend(data.iter().take(room).map(|&s| f32::from_sample(s)));
}

struct CpalRecording {
    buffer: Arc<Mutex<Vec<f32>>>,
    sample_rate: u32,
    channels: u16,
    stop: Option<mpsc::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl CpalRecording {
    fn release(&mut self) {
        // Closing the channel wakes the capture thread, which drops the stream.
        self.stop.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("audio: capture thread panicked");
            }
        }
    }
}

impl ActiveRecording for CpalRecording {
    fn finish(mut self: Box<Self>) -> RecordedAudio {
        self.release();
        let samples = match self.buffer.lock() {
            Ok(mut buf) => std::mem::take(&mut *buf),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        RecordedAudio {
            samples,
            sample_rate: self.sample_rate,
            channels: self.channels,
        }
    }
}

impl Drop for CpalRecording {
    fn drop(&mut self) {
        self.release();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorded_audio_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<RecordedAudio>();
        assert_send::<Box<dyn ActiveRecording>>();
    }

    #[test]
    fn integer_samples_are_scaled_to_unit_range() {
        let mut buf = Vec::new();
        append_samples(&mut buf, &[0i16, i16::MIN, i16::MAX / 2], 10);
        assert_eq!(buf[0], 0.0);
        assert_eq!(buf[1], -1.0);
        assert!((buf[2] - 0.5).abs() < 1e-3);

        // u16 is offset binary: the midpoint is silence.
        let mut buf = Vec::new();
        append_samples(&mut buf, &[32_768u16, 0], 10);
        assert_eq!(buf, vec![0.0, -1.0]);
    }

    #[test]
    fn appending_stops_at_limit() {
        let mut buf = vec![0.0; 3];
        append_samples(&mut buf, &[0.5f32, 0.5, 0.5], 4);
        assert_eq!(buf.len(), 4);

        append_samples(&mut buf, &[0.5f32], 4);
        assert_eq!(buf.len(), 4);
    }

    #[test]
    fn cpal_device_keeps_settings() {
        let device = CpalDevice::new(Some("USB Mic".into()), 30.0);
        assert_eq!(device.device_name.as_deref(), Some("USB Mic"));
        assert_eq!(device.max_recording_secs, 30.0);
    }
}
