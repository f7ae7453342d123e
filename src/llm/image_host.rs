//! Image hosting, so providers can fetch screenshots by URL.

use async_trait::async_trait;
use reqwest::multipart;

use super::AnswerError;
use crate::capture::ImagePayload;
use crate::config::ImageHostConfig;
use crate::http;

/// Uploads an image and returns a URL the providers can fetch.
#[async_trait]
pub trait ImageHost: Send + Sync {
    async fn upload(&self, image: &ImagePayload) -> Result<String, AnswerError>;
}

/// Cloudflare Images direct upload (`<upload_base_url>/<account>`).
pub struct CloudflareImageHost {
    client: reqwest::Client,
    upload_url: String,
}

impl CloudflareImageHost {
    /// `None` when no account hash is configured.
    pub fn from_config(config: &ImageHostConfig, timeout_secs: u64) -> Option<Self> {
        let account = config.account()?;
        Some(Self {
            client: http::client_with_timeout(timeout_secs),
            upload_url: format!("{}/{}", config.upload_base_url.trim_end_matches('/'), account),
        })
    }
}

/// Extract `result.variants[0]` from an upload response.
pub fn url_from_upload_response(json: &serde_json::Value) -> Result<String, AnswerError> {
    json["result"]["variants"][0]
        .as_str()
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AnswerError::Upload("response has no image URL".into()))
}

fn file_name(mime_type: &str) -> String {
    let ext = mime_type.split('/').nth(1).unwrap_or("png");
    format!("capture.{ext}")
}

#[async_trait]
impl ImageHost for CloudflareImageHost {
    async fn upload(&self, image: &ImagePayload) -> Result<String, AnswerError> {
        let part = multipart::Part::bytes(image.bytes.clone())
            .file_name(file_name(&image.mime_type))
            .mime_str(&image.mime_type)
            .map_err(|e| AnswerError::Upload(e.to_string()))?;
        let form = multipart::Form::new().part("file", part);

        log::debug!("llm: uploading {} byte image", image.bytes.len());
        let response = self
            .client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AnswerError::Upload(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AnswerError::Upload(e.to_string()))?;
        if !status.is_success() {
            return Err(AnswerError::Upload(http::error_message(status, &body)));
        }

        let json: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| AnswerError::Upload(e.to_string()))?;
        let url = url_from_upload_response(&json)?;
        log::info!("llm: image hosted at {url}");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_first_variant() {
        let json = json!({
            "success": true,
            "result": { "id": "x", "variants": [
                "https://imagedelivery.net/acc/x/public",
                "https://imagedelivery.net/acc/x/thumb"
            ] }
        });
        assert_eq!(
            url_from_upload_response(&json).unwrap(),
            "https://imagedelivery.net/acc/x/public"
        );
    }

    #[test]
    fn missing_variants_is_upload_error() {
        assert!(matches!(
            url_from_upload_response(&json!({ "result": { "variants": [] } })),
            Err(AnswerError::Upload(_))
        ));
        assert!(url_from_upload_response(&json!({ "success": false })).is_err());
    }

    #[test]
    fn from_config_builds_upload_url() {
        assert!(CloudflareImageHost::from_config(&ImageHostConfig::default(), 10).is_none());
        let host = CloudflareImageHost::from_config(
            &ImageHostConfig {
                cloudflare_account: Some("acc123".into()),
                ..ImageHostConfig::default()
            },
            10,
        )
        .unwrap();
        assert_eq!(host.upload_url, "https://upload.imagedelivery.net/acc123");
    }

    #[test]
    fn file_name_follows_mime() {
        assert_eq!(file_name("image/jpeg"), "capture.jpeg");
        assert_eq!(file_name("image"), "capture.png");
    }
}
