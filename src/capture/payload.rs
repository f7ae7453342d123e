//! The normalised image payload every capture path produces.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use super::CaptureError;

/// An image ready to be attached to an answer request.
///
/// `source_url` is set once the image has been uploaded to an image host (or
/// when the image arrived as a remote URL in the first place); providers then
/// reference the URL instead of the bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub source_url: Option<String>,
}

impl ImagePayload {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
            source_url: None,
        }
    }

    /// Encode an RGBA frame (screen or clipboard) as PNG.
    pub fn from_rgba(image: &image::RgbaImage) -> Result<Self, CaptureError> {
        let mut buf = std::io::Cursor::new(Vec::new());
        image
            .write_to(&mut buf, image::ImageFormat::Png)
            .map_err(|e| CaptureError::Encode(e.to_string()))?;
        Ok(Self::new(buf.into_inner(), "image/png"))
    }

    /// The same image, now also reachable at `url`.
    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    pub fn is_hosted(&self) -> bool {
        self.source_url.is_some()
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_url_carries_mime_type_and_base64() {
        let payload = ImagePayload::new(vec![0x89, b'P', b'N', b'G'], "image/png");
        assert_eq!(payload.to_base64(), "iVBORw==");
        assert_eq!(payload.to_data_url(), "data:image/png;base64,iVBORw==");
    }

    #[test]
    fn rgba_frame_encodes_as_png() {
        let frame = image::RgbaImage::from_pixel(2, 2, image::Rgba([255, 0, 0, 255]));
        let payload = ImagePayload::from_rgba(&frame).unwrap();
        assert_eq!(payload.mime_type, "image/png");
        assert_eq!(&payload.bytes[1..4], b"PNG");
        assert!(!payload.is_hosted());
    }

    #[test]
    fn with_source_url_marks_hosted() {
        let payload = ImagePayload::new(vec![1], "image/png").with_source_url("https://cdn/x");
        assert!(payload.is_hosted());
        assert_eq!(payload.source_url.as_deref(), Some("https://cdn/x"));
    }
}
