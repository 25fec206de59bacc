//! Core `StoryGenerator` trait and `ApiGenerator` implementation.
//!
//! `ApiGenerator` calls an OpenAI-compatible `/v1/completions` endpoint —
//! the GPT4All local API server by default, but llama.cpp server, LM Studio,
//! vLLM or Ollama (OpenAI mode) work the same way.

use async_trait::async_trait;
use thiserror::Error;

use crate::config::GenerationConfig;
use crate::http::authorize;

// ---------------------------------------------------------------------------
// GenerationError
// ---------------------------------------------------------------------------

/// Errors that can occur while loading the model or generating a story.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The server is reachable but does not serve the configured model.
    #[error("model '{0}' is not available on the generation server")]
    ModelUnavailable(String),

    /// HTTP transport, connection or status error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    #[error("generation request timed out")]
    Timeout,

    #[error("failed to parse generation response: {0}")]
    Parse(String),

    #[error("generation provider returned an empty story")]
    EmptyResponse,
}

impl From<reqwest::Error> for GenerationError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GenerationError::Timeout
        } else {
            GenerationError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// StoryGenerator trait
// ---------------------------------------------------------------------------

/// Text-to-text generation from a prompt with a bounded token budget.
///
/// Output is non-deterministic across calls.
#[async_trait]
pub trait StoryGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, GenerationError>;
}

// ---------------------------------------------------------------------------
// ApiGenerator
// ---------------------------------------------------------------------------

pub struct ApiGenerator {
    client: reqwest::Client,
    config: GenerationConfig,
}

impl ApiGenerator {
    /// Build the client and confirm the configured model is served.
    ///
    /// This is the one-time model-load barrier: the application refuses to
    /// open its upload view when it fails.
    pub async fn load(config: &GenerationConfig) -> Result<Self, GenerationError> {
        let generator = Self::from_config(config);
        let served = generator.served_models().await?;

        if !served.iter().any(|id| id == &config.model) {
            log::error!(
                "generation server at {} serves {:?}, not '{}'",
                config.base_url,
                served,
                config.model
            );
            return Err(GenerationError::ModelUnavailable(config.model.clone()));
        }

        log::info!("generation model ready: {}", config.model);
        Ok(generator)
    }

    /// Build without contacting the server.
    pub fn from_config(config: &GenerationConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    /// Model identifiers listed by `GET /v1/models`.
    pub async fn served_models(&self) -> Result<Vec<String>, GenerationError> {
        let url = format!("{}/v1/models", self.config.base_url);
        let response = authorize(self.client.get(&url), self.config.api_key.as_deref())
            .send()
            .await?
            .error_for_status()?;

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GenerationError::Parse(e.to_string()))?;

        let models = json["data"]
            .as_array()
            .ok_or_else(|| GenerationError::Parse("missing `data` array".into()))?
            .iter()
            .filter_map(|m| m["id"].as_str().map(str::to_string))
            .collect();

        Ok(models)
    }
}

#[async_trait]
impl StoryGenerator for ApiGenerator {
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, GenerationError> {
        let url = format!("{}/v1/completions", self.config.base_url);

        let body = serde_json::json!({
            "model":       self.config.model,
            "prompt":      prompt,
            "max_tokens":  max_tokens,
            "temperature": self.config.temperature,
            "stream":      false
        });

        let req = self.client.post(&url).json(&body);
        let response = authorize(req, self.config.api_key.as_deref())
            .send()
            .await?
            .error_for_status()?;

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GenerationError::Parse(e.to_string()))?;

        let story = json["choices"][0]["text"]
            .as_str()
            .ok_or(GenerationError::EmptyResponse)?
            .trim()
            .to_string();

        if story.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }

        Ok(story)
    }
}

// ---------------------------------------------------------------------------
// MockGenerator  (test-only)
// ---------------------------------------------------------------------------

/// Echoes a fixed story (or fails) and records the prompts it was given.
#[cfg(test)]
pub struct MockGenerator {
    response: Option<String>,
    prompts: std::sync::Mutex<Vec<(String, u32)>>,
}

#[cfg(test)]
impl MockGenerator {
    pub fn ok(story: impl Into<String>) -> Self {
        Self {
            response: Some(story.into()),
            prompts: Default::default(),
        }
    }

    pub fn failing() -> Self {
        Self {
            response: None,
            prompts: Default::default(),
        }
    }

    /// `(prompt, max_tokens)` for every call so far.
    pub fn prompts(&self) -> Vec<(String, u32)> {
        self.prompts.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl StoryGenerator for MockGenerator {
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, GenerationError> {
        self.prompts
            .lock()
            .unwrap()
            .push((prompt.to_string(), max_tokens));
        self.response.clone().ok_or(GenerationError::Timeout)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{serve, Canned};

    fn config_for(base_url: &str) -> GenerationConfig {
        GenerationConfig {
            base_url: base_url.into(),
            ..GenerationConfig::default()
        }
    }

    #[tokio::test]
    async fn load_succeeds_when_model_is_listed() {
        let (base, requests) = serve(vec![Canned::json(serde_json::json!({
            "object": "list",
            "data": [
                { "id": "orca-mini-3b-gguf2-q4_0.gguf" },
                { "id": "mistral-7b-instruct-v0.1.Q4_0.gguf" }
            ]
        }))])
        .await;

        assert!(ApiGenerator::load(&config_for(&base)).await.is_ok());
        let raw = requests.await.unwrap().remove(0);
        assert!(raw.starts_with("GET /v1/models"));
    }

    #[tokio::test]
    async fn load_fails_when_model_is_missing() {
        let (base, _requests) = serve(vec![Canned::json(serde_json::json!({
            "data": [{ "id": "some-other-model.gguf" }]
        }))])
        .await;

        let err = ApiGenerator::load(&config_for(&base)).await.err().unwrap();
        assert!(
            matches!(err, GenerationError::ModelUnavailable(ref m) if m == "mistral-7b-instruct-v0.1.Q4_0.gguf")
        );
    }

    #[tokio::test]
    async fn load_fails_when_server_is_unreachable() {
        // Bind then drop to obtain a port nobody listens on.
        let port = {
            let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            l.local_addr().unwrap().port()
        };
        let err = ApiGenerator::load(&config_for(&format!("http://127.0.0.1:{port}")))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, GenerationError::Request(_)));
    }

    #[tokio::test]
    async fn generate_sends_budget_and_trims_text() {
        let (base, requests) = serve(vec![Canned::json(serde_json::json!({
            "choices": [{ "text": "\n\nOnce upon a time a dog found the sea.\n" }]
        }))])
        .await;

        let generator = ApiGenerator::from_config(&config_for(&base));
        let story = generator.generate("prompt text", 42).await.unwrap();
        assert_eq!(story, "Once upon a time a dog found the sea.");

        let raw = requests.await.unwrap().remove(0);
        assert!(raw.starts_with("POST /v1/completions"));
        assert!(raw.contains("\"max_tokens\":42"));
        assert!(raw.contains("\"prompt\":\"prompt text\""));
    }

    #[tokio::test]
    async fn generate_without_text_is_empty_response() {
        let (base, _requests) =
            serve(vec![Canned::json(serde_json::json!({ "choices": [] }))]).await;

        let generator = ApiGenerator::from_config(&config_for(&base));
        let err = generator.generate("p", 10).await.unwrap_err();
        assert!(matches!(err, GenerationError::EmptyResponse));
    }

    #[test]
    fn generator_is_object_safe() {
        let generator: Box<dyn StoryGenerator> =
            Box::new(ApiGenerator::from_config(&GenerationConfig::default()));
        drop(generator);
    }
}
