//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;
use crate::catalog::{Language, Voice};

// ---------------------------------------------------------------------------
// CaptionConfig
// ---------------------------------------------------------------------------

/// Settings for the image-captioning provider.
///
/// Any OpenAI-compatible `/v1/chat/completions` endpoint that accepts
/// `image_url` content parts works (Ollama with a vision model, LM Studio,
/// OpenAI, vLLM …).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionConfig {
    /// Base URL of the API endpoint.
    pub base_url: String,
    /// API key — `None` for local providers.
    pub api_key: Option<String>,
    /// Vision model identifier sent to the API.
    pub model: String,
    /// Instruction sent alongside the image.
    pub instruction: String,
    /// Maximum seconds to wait for a caption.
    pub timeout_secs: u64,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".into(),
            api_key: None,
            model: "llava:7b".into(),
            instruction: "Describe this image in one short sentence.".into(),
            timeout_secs: 60,
        }
    }
}

// ---------------------------------------------------------------------------
// GenerationConfig
// ---------------------------------------------------------------------------

/// Settings for the story-generation provider.
///
/// The default points at the GPT4All local API server, which serves GGUF
/// model files by their artifact name over `/v1/completions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Base URL of the API endpoint.
    pub base_url: String,
    /// API key — `None` for local providers.
    pub api_key: Option<String>,
    /// Model artifact name; startup fails if the server does not list it.
    pub model: String,
    /// Upper bound on generated tokens per story.
    pub max_tokens: u32,
    /// Sampling temperature (0.0 – 1.0).
    pub temperature: f32,
    /// Maximum seconds to wait for a story; local inference is slow.
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:4891".into(),
            api_key: None,
            model: "mistral-7b-instruct-v0.1.Q4_0.gguf".into(),
            max_tokens: 300,
            temperature: 0.7,
            timeout_secs: 180,
        }
    }
}

// ---------------------------------------------------------------------------
// TranslationConfig
// ---------------------------------------------------------------------------

/// Settings for the translation provider (Google Translate web endpoint).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationConfig {
    /// Base URL; `/translate_a/single` is appended.
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            base_url: "https://translate.googleapis.com".into(),
            timeout_secs: 15,
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechConfig
// ---------------------------------------------------------------------------

/// Settings for the speech-synthesis provider (Google Translate TTS).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// Base URL; `/translate_tts` is appended.
    pub base_url: String,
    /// Request the slower speaking rate.
    pub slow: bool,
    pub timeout_secs: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            base_url: "https://translate.google.com".into(),
            slow: false,
            timeout_secs: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// UiConfig
// ---------------------------------------------------------------------------

/// Window appearance and initial selections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Language pre-selected in the output-language box.
    pub default_language: Language,
    /// Voice pre-selected in the voice box.
    pub default_voice: Voice,
    /// Initial window size `(width, height)` in logical pixels.
    pub window_size: (f32, f32),
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            default_language: Language::NATIVE,
            default_voice: Voice::Male,
            window_size: (960.0, 760.0),
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use image_story::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Captioning provider.
    pub caption: CaptionConfig,
    /// Story-generation provider.
    pub generation: GenerationConfig,
    /// Translation provider.
    pub translation: TranslationConfig,
    /// Speech-synthesis provider.
    pub speech: SpeechConfig,
    /// Window settings.
    pub ui: UiConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// so callers never need to special-case a missing file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
