//! Core `Captioner` trait and `ApiCaptioner` implementation.
//!
//! `ApiCaptioner` sends the image as a base64 PNG `image_url` content part
//! to any OpenAI-compatible `/v1/chat/completions` endpoint that serves a
//! vision model.  All connection details come from [`CaptionConfig`].

use async_trait::async_trait;
use thiserror::Error;

use crate::config::CaptionConfig;
use crate::http::authorize;
use crate::image_input::{ImageError, InputImage};

/// Upper bound on caption length requested from the provider.
const CAPTION_MAX_TOKENS: u32 = 64;

// ---------------------------------------------------------------------------
// CaptionError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum CaptionError {
    /// The image could not be prepared for upload.
    #[error(transparent)]
    Image(#[from] ImageError),

    /// HTTP transport, connection or status error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    #[error("caption request timed out")]
    Timeout,

    /// The HTTP response could not be parsed as expected JSON.
    #[error("failed to parse caption response: {0}")]
    Parse(String),

    /// The provider answered without any caption text.
    #[error("captioning provider returned an empty caption")]
    EmptyResponse,

    /// Background encoding task failed (join error).
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for CaptionError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            CaptionError::Timeout
        } else {
            CaptionError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Captioner trait
// ---------------------------------------------------------------------------

/// Produces a short natural-language description of an image.
///
/// Implementations never return an empty caption on success.
#[async_trait]
pub trait Captioner: Send + Sync {
    async fn caption(&self, image: &InputImage) -> Result<String, CaptionError>;
}

// ---------------------------------------------------------------------------
// ApiCaptioner
// ---------------------------------------------------------------------------

pub struct ApiCaptioner {
    client: reqwest::Client,
    config: CaptionConfig,
}

impl ApiCaptioner {
    /// Build an `ApiCaptioner` from application config.
    pub fn from_config(config: &CaptionConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    fn request_body(&self, data_url: &str) -> serde_json::Value {
        serde_json::json!({
            "model": self.config.model,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": self.config.instruction },
                    { "type": "image_url", "image_url": { "url": data_url } }
                ]
            }],
            "stream": false,
            "max_tokens": CAPTION_MAX_TOKENS
        })
    }
}

#[async_trait]
impl Captioner for ApiCaptioner {
    async fn caption(&self, image: &InputImage) -> Result<String, CaptionError> {
        // PNG + base64 encoding is CPU-bound; keep it off the async workers.
        let owned = image.clone();
        let data_url = tokio::task::spawn_blocking(move || owned.to_data_url())
            .await
            .map_err(|e| CaptionError::Internal(e.to_string()))??;

        let url = format!("{}/v1/chat/completions", self.config.base_url);
        let req = self.client.post(&url).json(&self.request_body(&data_url));

        let response = authorize(req, self.config.api_key.as_deref())
            .send()
            .await?
            .error_for_status()?;

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| CaptionError::Parse(e.to_string()))?;

        let caption = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or(CaptionError::EmptyResponse)?
            .trim()
            .to_string();

        if caption.is_empty() {
            return Err(CaptionError::EmptyResponse);
        }

        log::debug!("caption: {caption:?}");
        Ok(caption)
    }
}

// ---------------------------------------------------------------------------
// MockCaptioner  (test-only)
// ---------------------------------------------------------------------------

/// Returns a fixed caption, or fails, without any network access.
#[cfg(test)]
pub struct MockCaptioner {
    response: Option<String>,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockCaptioner {
    pub fn ok(caption: impl Into<String>) -> Self {
        Self {
            response: Some(caption.into()),
            calls: Default::default(),
        }
    }

    pub fn failing() -> Self {
        Self {
            response: None,
            calls: Default::default(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait]
impl Captioner for MockCaptioner {
    async fn caption(&self, _image: &InputImage) -> Result<String, CaptionError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.response
            .clone()
            .ok_or_else(|| CaptionError::Request("connection refused".into()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{serve, Canned};
    use image::{Rgb, RgbImage};

    fn tiny_image() -> InputImage {
        InputImage::from_rgb("dog.png", RgbImage::from_pixel(2, 2, Rgb([200, 180, 90])))
    }

    fn config_for(base_url: &str, api_key: Option<&str>) -> CaptionConfig {
        CaptionConfig {
            base_url: base_url.into(),
            api_key: api_key.map(str::to_string),
            ..CaptionConfig::default()
        }
    }

    #[test]
    fn request_body_embeds_instruction_and_image() {
        let captioner = ApiCaptioner::from_config(&CaptionConfig::default());
        let body = captioner.request_body("data:image/png;base64,AAAA");

        let parts = &body["messages"][0]["content"];
        assert_eq!(parts[0]["text"], CaptionConfig::default().instruction);
        assert_eq!(parts[1]["image_url"]["url"], "data:image/png;base64,AAAA");
        assert_eq!(body["model"], "llava:7b");
    }

    #[tokio::test]
    async fn caption_is_trimmed_from_chat_response() {
        let (base, requests) = serve(vec![Canned::json(serde_json::json!({
            "choices": [{ "message": { "content": "  a dog running on a beach \n" } }]
        }))])
        .await;

        let captioner = ApiCaptioner::from_config(&config_for(&base, Some("sk-test")));
        let caption = captioner.caption(&tiny_image()).await.unwrap();
        assert_eq!(caption, "a dog running on a beach");

        let raw = requests.await.unwrap().remove(0);
        assert!(raw.starts_with("POST /v1/chat/completions"));
        assert!(raw.to_ascii_lowercase().contains("authorization: bearer sk-test"));
        assert!(raw.contains("data:image/png;base64,"));
    }

    #[tokio::test]
    async fn blank_caption_is_empty_response() {
        let (base, _requests) = serve(vec![Canned::json(serde_json::json!({
            "choices": [{ "message": { "content": "   " } }]
        }))])
        .await;

        let captioner = ApiCaptioner::from_config(&config_for(&base, None));
        let err = captioner.caption(&tiny_image()).await.unwrap_err();
        assert!(matches!(err, CaptionError::EmptyResponse));
    }

    #[tokio::test]
    async fn server_error_is_request_error() {
        let (base, _requests) = serve(vec![Canned::status(500)]).await;

        let captioner = ApiCaptioner::from_config(&config_for(&base, None));
        let err = captioner.caption(&tiny_image()).await.unwrap_err();
        assert!(matches!(err, CaptionError::Request(_)));
    }

    #[test]
    fn captioner_is_object_safe() {
        let captioner: Box<dyn Captioner> = Box::new(MockCaptioner::ok("x"));
        drop(captioner);
    }
}
