//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout:
//!
//! Config dir (settings):
//!   Windows: %APPDATA%\image-story\
//!   macOS:   ~/Library/Application Support/image-story/
//!   Linux:   ~/.config/image-story/
//!
//! Audio dir (per-run MP3 files, removed with their run):
//!   Windows: %LOCALAPPDATA%\image-story\audio\
//!   macOS:   ~/Library/Caches/image-story/audio/
//!   Linux:   ~/.cache/image-story/audio/

use std::path::PathBuf;

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory for `settings.toml`.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    /// Directory where synthesized audio is written for playback.
    pub audio_dir: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "image-story";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory (config) or the system temp
    /// directory (audio) if the platform cannot provide a standard path.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let audio_dir = dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(Self::APP_NAME)
            .join("audio");

        let settings_file = config_dir.join("settings.toml");

        Self {
            config_dir,
            settings_file,
            audio_dir,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
