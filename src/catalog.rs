//! Fixed catalog of output languages and narration voices.
//!
//! The pipeline's native language is English: stories are generated in
//! English and only translated when another [`Language`] is selected.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Language
// ---------------------------------------------------------------------------

/// Output languages offered in the language box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    English,
    Hindi,
    Spanish,
    French,
    German,
    Arabic,
    Chinese,
    Tamil,
    Bengali,
}

impl Language {
    /// The language stories are generated in.
    pub const NATIVE: Language = Language::English;

    /// Every language, in display order.
    pub const ALL: [Language; 9] = [
        Language::English,
        Language::Hindi,
        Language::Spanish,
        Language::French,
        Language::German,
        Language::Arabic,
        Language::Chinese,
        Language::Tamil,
        Language::Bengali,
    ];

    /// ISO-like code understood by the translation and speech providers.
    ///
    /// ```
    /// use image_story::catalog::Language;
    ///
    /// assert_eq!(Language::English.code(), "en");
    /// assert_eq!(Language::Chinese.code(), "zh-cn");
    /// ```
    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Hindi => "hi",
            Language::Spanish => "es",
            Language::French => "fr",
            Language::German => "de",
            Language::Arabic => "ar",
            Language::Chinese => "zh-cn",
            Language::Tamil => "ta",
            Language::Bengali => "bn",
        }
    }

    /// Human-readable name shown in the UI.
    pub fn label(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Hindi => "Hindi",
            Language::Spanish => "Spanish",
            Language::French => "French",
            Language::German => "German",
            Language::Arabic => "Arabic",
            Language::Chinese => "Chinese",
            Language::Tamil => "Tamil",
            Language::Bengali => "Bengali",
        }
    }

    /// Look up a language by its code (case-insensitive).
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|lang| lang.code().eq_ignore_ascii_case(code))
    }

    /// `true` when no translation step is needed for this language.
    pub fn is_native(self) -> bool {
        self == Self::NATIVE
    }
}

impl Default for Language {
    fn default() -> Self {
        Self::NATIVE
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Voice
// ---------------------------------------------------------------------------

/// Narration voices offered in the voice box.
///
/// The speech provider has no voice parameter, so the selection travels with
/// the audio artifact but does not change the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Voice {
    Male,
    Female,
    Child,
}

impl Voice {
    pub const ALL: [Voice; 3] = [Voice::Male, Voice::Female, Voice::Child];

    pub fn label(self) -> &'static str {
        match self {
            Voice::Male => "Male Voice",
            Voice::Female => "Female Voice",
            Voice::Child => "Child Voice",
        }
    }

    /// Provider-style voice identifier.
    pub fn id(self) -> &'static str {
        match self {
            Voice::Male => "en-US-Michael",
            Voice::Female => "en-US-Jenny",
            Voice::Child => "en-US-Kevin",
        }
    }
}

impl Default for Voice {
    fn default() -> Self {
        Voice::Male
    }
}

impl std::fmt::Display for Voice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
