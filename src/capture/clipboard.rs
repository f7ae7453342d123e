//! Clipboard image paste backed by the `arboard` crate.
//!
//! The OS clipboard is read into a list of [`ClipboardItem`]s; the first item
//! with an image MIME type wins. A clipboard without an image is not an
//! error, it simply yields `None`.

use arboard::Clipboard;

use super::{CaptureError, ImagePayload};

/// One representation currently held by the clipboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardItem {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ClipboardItem {
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

/// The first image on the clipboard, if any. Further images are ignored.
pub fn capture_clipboard(items: &[ClipboardItem]) -> Option<ImagePayload> {
    items
        .iter()
        .find(|item| item.is_image())
        .map(|item| ImagePayload::new(item.bytes.clone(), item.mime_type.clone()))
}

/// Snapshot the system clipboard.
///
/// Images come back as `image/png`; text as `text/plain`.
///
/// # Errors
///
/// [`CaptureError::Clipboard`] if the OS clipboard cannot be opened.
pub fn read_system_clipboard() -> Result<Vec<ClipboardItem>, CaptureError> {
    let mut clipboard = Clipboard::new().map_err(|e| CaptureError::Clipboard(e.to_string()))?;
    let mut items = Vec::new();

    // `get_image` / `get_text` error when that representation is absent.
    if let Ok(image) = clipboard.get_image() {
        let frame = image::RgbaImage::from_raw(
            image.width as u32,
            image.height as u32,
            image.bytes.into_owned(),
        )
        .ok_or_else(|| CaptureError::Encode("clipboard image has unexpected size".into()))?;
        let png = ImagePayload::from_rgba(&frame)?;
        items.push(ClipboardItem {
            mime_type: png.mime_type,
            bytes: png.bytes,
        });
    }

    if let Ok(text) = clipboard.get_text() {
        items.push(ClipboardItem {
            mime_type: "text/plain".into(),
            bytes: text.into_bytes(),
        });
    }

    Ok(items)
}
