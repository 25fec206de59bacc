//! Core `SpeechSynthesizer` trait and `GoogleTts` implementation.
//!
//! The Google Translate TTS endpoint accepts at most [`MAX_CHUNK_CHARS`]
//! characters per request, so longer text is split on sentence and word
//! boundaries, each chunk is fetched in order, and the MP3 frames are
//! concatenated into one stream.

use async_trait::async_trait;
use thiserror::Error;

use crate::config::SpeechConfig;

/// Per-request character limit of the TTS endpoint.
pub const MAX_CHUNK_CHARS: usize = 100;

// ---------------------------------------------------------------------------
// SpeechError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("nothing to speak")]
    EmptyText,

    #[error("HTTP request failed: {0}")]
    Request(String),

    #[error("speech request timed out")]
    Timeout,

    #[error("speech provider returned no audio")]
    EmptyAudio,

    /// Writing the audio file failed.
    #[error("failed to write audio: {0}")]
    Io(#[from] std::io::Error),

    #[error("audio playback failed: {0}")]
    Playback(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for SpeechError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SpeechError::Timeout
        } else {
            SpeechError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechSynthesizer trait
// ---------------------------------------------------------------------------

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Speak `text` in the language identified by `language_code`; returns
    /// an MP3 byte stream.
    async fn synthesize(&self, text: &str, language_code: &str) -> Result<Vec<u8>, SpeechError>;
}

// ---------------------------------------------------------------------------
// Chunking
// ---------------------------------------------------------------------------

fn ends_sentence(word: &str) -> bool {
    word.ends_with(['.', '!', '?', '。', '।', '؟', '！', '？'])
}

/// Split `text` into chunks of at most `max_chars` characters.
///
/// Words are packed greedily; a chunk is closed early after a word that ends
/// a sentence.  A single word longer than `max_chars` is hard-split.
///
/// ```
/// use image_story::speech::split_chunks;
///
/// let chunks = split_chunks("The dog ran. It was happy!", 100);
/// assert_eq!(chunks, vec!["The dog ran.", "It was happy!"]);
/// ```
pub fn split_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            for piece in chars.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        let needed = if current.is_empty() {
            word_len
        } else {
            current_len + 1 + word_len
        };

        if needed > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;

        if ends_sentence(word) {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Map a catalog language code to the code the TTS endpoint expects.
fn tts_language(code: &str) -> String {
    match code.split_once('-') {
        Some((lang, region)) => format!("{lang}-{}", region.to_ascii_uppercase()),
        None => code.to_string(),
    }
}

// ---------------------------------------------------------------------------
// GoogleTts
// ---------------------------------------------------------------------------

pub struct GoogleTts {
    client: reqwest::Client,
    config: SpeechConfig,
}

impl GoogleTts {
    pub fn from_config(config: &SpeechConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    async fn fetch_chunk(
        &self,
        chunk: &str,
        lang: &str,
        idx: usize,
        total: usize,
    ) -> Result<Vec<u8>, SpeechError> {
        let url = format!("{}/translate_tts", self.config.base_url);
        let speed = if self.config.slow { "0.3" } else { "1" };
        let total = total.to_string();
        let idx = idx.to_string();
        let textlen = chunk.chars().count().to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", lang),
                ("ttsspeed", speed),
                ("total", total.as_str()),
                ("idx", idx.as_str()),
                ("textlen", textlen.as_str()),
                ("q", chunk),
            ])
            .send()
            .await?
            .error_for_status()?;

        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleTts {
    async fn synthesize(&self, text: &str, language_code: &str) -> Result<Vec<u8>, SpeechError> {
        let chunks = split_chunks(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(SpeechError::EmptyText);
        }

        let lang = tts_language(language_code);
        let mut audio = Vec::new();

        for (idx, chunk) in chunks.iter().enumerate() {
            let bytes = self.fetch_chunk(chunk, &lang, idx, chunks.len()).await?;
            log::debug!("tts chunk {}/{}: {} bytes", idx + 1, chunks.len(), bytes.len());
            audio.extend_from_slice(&bytes);
        }

        if audio.is_empty() {
            return Err(SpeechError::EmptyAudio);
        }
        Ok(audio)
    }
}

// ---------------------------------------------------------------------------
// MockSynthesizer  (test-only)
// ---------------------------------------------------------------------------

/// Returns `ID3` + the language code as fake audio, or fails.
#[cfg(test)]
pub struct MockSynthesizer {
    fail: bool,
}

#[cfg(test)]
impl MockSynthesizer {
    pub fn ok() -> Self {
        Self { fail: false }
    }

    pub fn failing() -> Self {
        Self { fail: true }
    }
}

#[cfg(test)]
#[async_trait]
impl SpeechSynthesizer for MockSynthesizer {
    async fn synthesize(&self, text: &str, language_code: &str) -> Result<Vec<u8>, SpeechError> {
        if self.fail {
            return Err(SpeechError::Request("503 Service Unavailable".into()));
        }
        if text.trim().is_empty() {
            return Err(SpeechError::EmptyText);
        }
        Ok(format!("ID3{language_code}").into_bytes())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
