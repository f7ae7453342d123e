//! Finalised recordings: 16-bit PCM WAV via `hound`.

use std::io::Cursor;

use hound::{SampleFormat, WavSpec, WavWriter};

use super::capture::RecordedAudio;
use super::resample::{to_speech_format, TARGET_SAMPLE_RATE};
use super::RecordingError;
use crate::config::RecordingConfig;

/// One finished recording, ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioPayload {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub file_name: String,
    pub duration_secs: f32,
    /// Set when the payload is so small the transcription is likely empty.
    pub low_confidence: bool,
}

impl AudioPayload {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Encode mono `samples` in `[-1.0, 1.0]` as a 16-bit WAV file in memory.
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, RecordingError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    let mut writer =
        WavWriter::new(&mut cursor, spec).map_err(|e| RecordingError::Encode(e.to_string()))?;
    for &sample in samples {
        let amplitude = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer
            .write_sample(amplitude)
            .map_err(|e| RecordingError::Encode(e.to_string()))?;
    }
    writer
        .finalize()
        .map_err(|e| RecordingError::Encode(e.to_string()))?;

    Ok(cursor.into_inner())
}

/// Convert raw device audio into an [`AudioPayload`].
///
/// Audio beyond `max_recording_secs` is discarded.
pub fn build_payload(
    recorded: RecordedAudio,
    config: &RecordingConfig,
) -> Result<AudioPayload, RecordingError> {
    let mut samples = to_speech_format(&recorded.samples, recorded.sample_rate, recorded.channels);

    let max_samples = (config.max_recording_secs.max(0.0) * TARGET_SAMPLE_RATE as f32) as usize;
    if samples.len() > max_samples {
        log::warn!(
            "audio: recording truncated to {:.0}s",
            config.max_recording_secs
        );
        samples.truncate(max_samples);
    }

    let bytes = encode_wav(&samples, TARGET_SAMPLE_RATE)?;
    let low_confidence = bytes.len() < config.min_payload_bytes;
    if low_confidence {
        log::warn!(
            "audio: recording is only {} bytes, transcription may be empty",
            bytes.len()
        );
    }

    Ok(AudioPayload {
        duration_secs: samples.len() as f32 / TARGET_SAMPLE_RATE as f32,
        bytes,
        mime_type: "audio/wav".into(),
        file_name: "audio.wav".into(),
        low_confidence,
    })
}
