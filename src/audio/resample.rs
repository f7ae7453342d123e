//! Channel mixing and sample-rate conversion.
//!
//! The transcription service is fed **16 kHz mono** audio:
//!
//! 1. [`downmix`] averages interleaved channels into one.
//! 2. [`resample_linear`] converts between rates with linear interpolation.

/// Sample rate of every encoded recording.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

// ---------------------------------------------------------------------------
// downmix
// ---------------------------------------------------------------------------

/// Fold each interleaved frame of `channels` samples into its mean.
///
/// Mono input comes back unchanged. An incomplete last frame is ignored, as
/// is everything when `channels` is zero.
///
/// ```rust
/// use capture_answer::audio::downmix;
///
/// // Two full frames of three channels, plus one stray sample.
/// let frames = [0.3_f32, 0.0, -0.3, 0.9, 0.6, 0.0, 1.0];
/// let mono = downmix(&frames, 3);
/// assert_eq!(mono.len(), 2);
/// assert!(mono[0].abs() < 1e-6);
/// ```
pub fn downmix(samples: &[f32], channels: u16) -> Vec<f32> {
    let width = usize::from(channels);
    if width == 0 {
        return Vec::new();
    }
    if width == 1 {
        return samples.to_vec();
    }

    let scale = (width as f32).recip();
    let mut mono = Vec::with_capacity(samples.len() / width);
    for frame in samples.chunks_exact(width) {
        mono.push(frame.iter().fold(0.0, |acc, s| acc + s * scale));
    }
    mono
}

// ---------------------------------------------------------------------------
// resample_linear
// ---------------------------------------------------------------------------

/// Resample mono `samples` from `from_rate` to `to_rate` Hz.
///
/// Output length is `ceil(len * to_rate / from_rate)`. Equal rates return a
/// copy; a zero rate yields nothing.
pub fn resample_linear(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate {
        return samples.to_vec();
    }
    if samples.is_empty() || from_rate == 0 || to_rate == 0 {
        return Vec::new();
    }

    let ratio = to_rate as f64 / from_rate as f64;
    let output_len = (samples.len() as f64 * ratio).ceil() as usize;
    let last = samples.len() - 1;

    (0..output_len)
        .map(|i| {
            let pos = i as f64 / ratio;
            let idx = (pos as usize).min(last);
            let frac = (pos - idx as f64) as f32;
            match samples.get(idx + 1) {
                Some(next) => samples[idx] * (1.0 - frac) + next * frac,
                None => samples[idx],
            }
        })
        .collect()
}

/// Downmix and resample raw device audio to 16 kHz mono.
pub fn to_speech_format(samples: &[f32], sample_rate: u32, channels: u16) -> Vec<f32> {
    resample_linear(&downmix(samples, channels), sample_rate, TARGET_SAMPLE_RATE)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
