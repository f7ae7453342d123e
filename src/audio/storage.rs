//! Optional on-disk copies of recordings, for debugging transcription.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use super::{AudioPayload, RecordingError};

/// Write `payload` into `dir` when `enabled`; returns the file path.
pub fn save_temporary_audio(
    payload: &AudioPayload,
    dir: &Path,
    enabled: bool,
) -> Result<Option<PathBuf>, RecordingError> {
    if !enabled {
        return Ok(None);
    }

    let ext = payload
        .mime_type
        .split('/')
        .nth(1)
        .filter(|e| !e.is_empty())
        .unwrap_or("wav");
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();

    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("recording_{millis}.{ext}"));
    std::fs::write(&path, &payload.bytes)?;
    log::info!("audio: saved recording to {}", path.display());
    Ok(Some(path))
}
