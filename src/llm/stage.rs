//! The answer stage: provider selection, image hosting and completion.

use std::sync::Arc;

use super::image_host::{CloudflareImageHost, ImageHost};
use super::{
    select_provider, AnswerError, AnswerProvider, GeminiProvider, ImageRef, OpenAiProvider, Route,
};
use crate::capture::ImagePayload;
use crate::config::{AppConfig, ProviderKind};

/// Holds whichever providers and image host are configured.
#[derive(Clone, Default)]
pub struct AnswerStage {
    openai: Option<Arc<dyn AnswerProvider>>,
    gemini: Option<Arc<dyn AnswerProvider>>,
    image_host: Option<Arc<dyn ImageHost>>,
}

impl AnswerStage {
    pub fn new(
        openai: Option<Arc<dyn AnswerProvider>>,
        gemini: Option<Arc<dyn AnswerProvider>>,
        image_host: Option<Arc<dyn ImageHost>>,
    ) -> Self {
        Self {
            openai,
            gemini,
            image_host,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let openai = OpenAiProvider::from_config(&config.providers)
            .map(|p| Arc::new(p) as Arc<dyn AnswerProvider>);
        let gemini = GeminiProvider::from_config(&config.providers)
            .map(|p| Arc::new(p) as Arc<dyn AnswerProvider>);
        let image_host =
            CloudflareImageHost::from_config(&config.image_host, config.providers.timeout_secs)
                .map(|h| Arc::new(h) as Arc<dyn ImageHost>);

        log::info!(
            "llm: openai={} gemini={} image_host={}",
            openai.is_some(),
            gemini.is_some(),
            image_host.is_some()
        );
        Self::new(openai, gemini, image_host)
    }

    /// Resolve the provider for `route` and check the image can be delivered.
    ///
    /// Fails with [`AnswerError::MissingImageHost`] before any network call
    /// when the image has no URL and there is nowhere to upload it.
    pub fn plan(
        &self,
        route: Route,
        preferred: ProviderKind,
        image: Option<&ImagePayload>,
    ) -> Result<Arc<dyn AnswerProvider>, AnswerError> {
        let kind = select_provider(
            route,
            self.openai.is_some(),
            self.gemini.is_some(),
            preferred,
        )?;
        let provider = match kind {
            ProviderKind::OpenAi => self.openai.clone(),
            ProviderKind::Gemini => self.gemini.clone(),
        }
        .ok_or_else(|| AnswerError::MissingConfiguration(format!("{kind} API key")))?;

        if let Some(image) = image {
            if !image.is_hosted() && self.image_host.is_none() {
                return Err(AnswerError::MissingImageHost);
            }
        }
        Ok(provider)
    }

    /// Turn the image into something `provider` can consume, uploading it
    /// when it has no URL yet.
    ///
    /// A failed upload falls back to inline data if the provider accepts it.
    pub async fn resolve_image(
        &self,
        image: &ImagePayload,
        provider: &dyn AnswerProvider,
    ) -> Result<ImageRef, AnswerError> {
        if let Some(url) = &image.source_url {
            return Ok(ImageRef::Url {
                url: url.clone(),
                mime_type: image.mime_type.clone(),
            });
        }

        let host = self
            .image_host
            .as_ref()
            .ok_or(AnswerError::MissingImageHost)?;

        match host.upload(image).await {
            Ok(url) => Ok(ImageRef::Url {
                url,
                mime_type: image.mime_type.clone(),
            }),
            Err(e) if provider.supports_inline_images() => {
                log::warn!("llm: upload failed ({e}), sending image inline");
                Ok(ImageRef::Inline(image.clone()))
            }
            Err(e) => {
                log::warn!("llm: upload failed ({e}) and {} needs a URL", provider.kind());
                Err(AnswerError::MissingImageHost)
            }
        }
    }

    /// Ask `provider` once. No retry, no fallback to the other provider.
    pub async fn complete(
        &self,
        provider: &dyn AnswerProvider,
        prompt: &str,
        image: Option<&ImageRef>,
    ) -> Result<String, AnswerError> {
        log::info!("llm: asking {}", provider.kind());
        provider.complete(prompt, image).await
    }
}

// ---------------------------------------------------------------------------
// Test doubles
// ---------------------------------------------------------------------------


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::mock::{MockHost, MockProvider};
    use super::*;

    fn png() -> ImagePayload {
        ImagePayload::new(vec![1, 2, 3], "image/png")
    }

    fn stage(
        openai: Option<&Arc<MockProvider>>,
        gemini: Option<&Arc<MockProvider>>,
        host: Option<&Arc<MockHost>>,
    ) -> AnswerStage {
        AnswerStage::new(
            openai.map(|p| p.clone() as Arc<dyn AnswerProvider>),
            gemini.map(|p| p.clone() as Arc<dyn AnswerProvider>),
            host.map(|h| h.clone() as Arc<dyn ImageHost>),
        )
    }

    #[test]
    fn image_without_host_fails_at_plan() {
        let openai = Arc::new(MockProvider::answering(ProviderKind::OpenAi, "x"));
        let stage = stage(Some(&openai), None, None);

        let err = stage
            .plan(Route::Image, ProviderKind::OpenAi, Some(&png()))
            .err()
            .unwrap();
        assert_eq!(err, AnswerError::MissingImageHost);
        assert_eq!(openai.calls(), 0);
    }

    #[tokio::test]
    async fn hosted_image_needs_no_host() {
        let openai = Arc::new(MockProvider::answering(ProviderKind::OpenAi, "ok"));
        let stage = stage(Some(&openai), None, None);
        let image = png().with_source_url("https://cdn.example/a.png");

        let provider = stage
            .plan(Route::Image, ProviderKind::OpenAi, Some(&image))
            .unwrap();
        let image_ref = stage.resolve_image(&image, provider.as_ref()).await.unwrap();
        assert!(matches!(
            image_ref,
            ImageRef::Url { ref url, .. } if url == "https://cdn.example/a.png"
        ));

        let answer = stage
            .complete(provider.as_ref(), "what", Some(&image_ref))
            .await
            .unwrap();
        assert_eq!(answer, "ok");
        assert_eq!(openai.images.lock().unwrap()[0], Some(image_ref));
    }

    #[tokio::test]
    async fn upload_yields_hosted_url() {
        let gemini = Arc::new(MockProvider::answering(ProviderKind::Gemini, "a cat"));
        let host = Arc::new(MockHost::ok("https://imagedelivery.net/acc/1/public"));
        let stage = stage(None, Some(&gemini), Some(&host));

        // Only Gemini is configured, so it serves the image even when
        // OpenAI is preferred.
        let provider = stage
            .plan(Route::Image, ProviderKind::OpenAi, Some(&png()))
            .unwrap();
        assert_eq!(provider.kind(), ProviderKind::Gemini);

        let image_ref = stage.resolve_image(&png(), provider.as_ref()).await.unwrap();
        assert_eq!(host.uploads(), 1);
        assert!(matches!(
            image_ref,
            ImageRef::Url { ref url, .. } if url == "https://imagedelivery.net/acc/1/public"
        ));
    }

    #[tokio::test]
    async fn upload_failure_falls_back_to_inline() {
        let openai = Arc::new(MockProvider::answering(ProviderKind::OpenAi, "ok"));
        let host = Arc::new(MockHost::failing());
        let stage = stage(Some(&openai), None, Some(&host));

        let provider = stage
            .plan(Route::Image, ProviderKind::OpenAi, Some(&png()))
            .unwrap();
        let image_ref = stage.resolve_image(&png(), provider.as_ref()).await.unwrap();
        assert!(matches!(image_ref, ImageRef::Inline(_)));
        assert_eq!(host.uploads(), 1);
    }

    #[tokio::test]
    async fn upload_failure_without_inline_support_is_missing_host() {
        let openai = Arc::new(MockProvider::answering(ProviderKind::OpenAi, "ok").without_inline());
        let host = Arc::new(MockHost::failing());
        let stage = stage(Some(&openai), None, Some(&host));

        let provider = stage
            .plan(Route::Image, ProviderKind::OpenAi, Some(&png()))
            .unwrap();
        let err = stage
            .resolve_image(&png(), provider.as_ref())
            .await
            .unwrap_err();
        assert_eq!(err, AnswerError::MissingImageHost);
        assert_eq!(openai.calls(), 0);
    }

    #[tokio::test]
    async fn preferred_failure_does_not_fall_back() {
        let openai = Arc::new(MockProvider::answering(ProviderKind::OpenAi, "fallback"));
        let gemini = Arc::new(MockProvider::failing(
            ProviderKind::Gemini,
            AnswerError::Request("timed out".into()),
        ));
        let host = Arc::new(MockHost::ok("https://cdn/x"));
        let stage = stage(Some(&openai), Some(&gemini), Some(&host));

        let provider = stage
            .plan(Route::Image, ProviderKind::Gemini, Some(&png()))
            .unwrap();
        let image_ref = stage.resolve_image(&png(), provider.as_ref()).await.unwrap();
        let err = stage
            .complete(provider.as_ref(), "", Some(&image_ref))
            .await
            .unwrap_err();
        assert_eq!(err, AnswerError::Request("timed out".into()));
        assert_eq!(gemini.calls(), 1);
        assert_eq!(openai.calls(), 0);
    }

    #[tokio::test]
    async fn voice_route_uses_openai_even_when_gemini_preferred() {
        let openai = Arc::new(MockProvider::answering(ProviderKind::OpenAi, "answer"));
        let gemini = Arc::new(MockProvider::answering(ProviderKind::Gemini, "wrong"));
        let stage = stage(Some(&openai), Some(&gemini), None);

        let provider = stage.plan(Route::Voice, ProviderKind::Gemini, None).unwrap();
        assert_eq!(provider.kind(), ProviderKind::OpenAi);

        let answer = stage.complete(provider.as_ref(), "prompt", None).await.unwrap();
        assert_eq!(answer, "answer");
        assert_eq!(gemini.calls(), 0);
        assert_eq!(openai.last_prompt().as_deref(), Some("prompt"));
    }

    #[test]
    fn from_config_without_keys_cannot_plan() {
        let stage = AnswerStage::from_config(&AppConfig::default());
        for route in [Route::TextOnly, Route::Voice, Route::Image] {
            assert!(matches!(
                stage.plan(route, ProviderKind::OpenAi, None),
                Err(AnswerError::MissingConfiguration(_))
            ));
        }
    }
}
