//! Core `Translator` trait and `GoogleTranslator` implementation.
//!
//! `GoogleTranslator` uses the unauthenticated `translate_a/single` endpoint
//! (`client=gtx`).  The response is a nested JSON array whose first element
//! lists `[translated, original, …]` pairs, one per source sentence.

use async_trait::async_trait;
use thiserror::Error;

use crate::catalog::Language;
use crate::config::TranslationConfig;

// ---------------------------------------------------------------------------
// TranslatedStory
// ---------------------------------------------------------------------------

/// Story text tagged with the language it is written in.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedStory {
    pub text: String,
    pub language: Language,
}

impl TranslatedStory {
    /// Language code tag, e.g. `"fr"`.
    pub fn code(&self) -> &'static str {
        self.language.code()
    }
}

// ---------------------------------------------------------------------------
// TranslationError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("HTTP request failed: {0}")]
    Request(String),

    #[error("translation request timed out")]
    Timeout,

    #[error("failed to parse translation response: {0}")]
    Parse(String),

    #[error("translation provider returned no text")]
    EmptyResponse,
}

impl From<reqwest::Error> for TranslationError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TranslationError::Timeout
        } else {
            TranslationError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Translator trait
// ---------------------------------------------------------------------------

#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` into the language identified by `target_code`.
    async fn translate(&self, text: &str, target_code: &str) -> Result<String, TranslationError>;
}

/// Join the translated segments of a `translate_a/single` response.
///
/// ```
/// use image_story::translate::parse_translation;
///
/// let json = serde_json::json!([[["Bonjour. ", "Hello. "], ["Au revoir.", "Goodbye."]], null, "en"]);
/// assert_eq!(parse_translation(&json).unwrap(), "Bonjour. Au revoir.");
/// ```
pub fn parse_translation(json: &serde_json::Value) -> Result<String, TranslationError> {
    let segments = json
        .get(0)
        .and_then(|s| s.as_array())
        .ok_or_else(|| TranslationError::Parse("missing segment list".into()))?;

    let text: String = segments
        .iter()
        .filter_map(|seg| seg.get(0).and_then(|t| t.as_str()))
        .collect();

    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(TranslationError::EmptyResponse);
    }
    Ok(text)
}

// ---------------------------------------------------------------------------
// GoogleTranslator
// ---------------------------------------------------------------------------

/// Stateless per-call client; no pooled session is kept between runs.
pub struct GoogleTranslator {
    client: reqwest::Client,
    config: TranslationConfig,
}

impl GoogleTranslator {
    pub fn from_config(config: &TranslationConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(&self, text: &str, target_code: &str) -> Result<String, TranslationError> {
        let url = format!("{}/translate_a/single", self.config.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("client", "gtx"),
                ("sl", "auto"),
                ("tl", target_code),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await?
            .error_for_status()?;

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| TranslationError::Parse(e.to_string()))?;

        parse_translation(&json)
    }
}

// ---------------------------------------------------------------------------
// MockTranslator  (test-only)
// ---------------------------------------------------------------------------

/// Prefixes the text with `[code]`, or fails; counts calls.
#[cfg(test)]
pub struct MockTranslator {
    fail: bool,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockTranslator {
    pub fn ok() -> Self {
        Self {
            fail: false,
            calls: Default::default(),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: Default::default(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait]
impl Translator for MockTranslator {
    async fn translate(&self, text: &str, target_code: &str) -> Result<String, TranslationError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if self.fail {
            return Err(TranslationError::Request("429 Too Many Requests".into()));
        }
        Ok(format!("[{target_code}] {text}"))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
