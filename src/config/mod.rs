//! Configuration module for the image story generator.
//!
//! Provides `AppConfig` (top-level settings), one sub-config per capability
//! provider, `AppPaths` for cross-platform directories, and TOML persistence
//! via `AppConfig::load` / `AppConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{
    AppConfig, CaptionConfig, GenerationConfig, SpeechConfig, TranslationConfig, UiConfig,
};
