//! Per-run audio artifact.
//!
//! The MP3 is written to a fresh uniquely-named file in the audio directory.
//! The file lives exactly as long as the last clone of its [`AudioArtifact`];
//! replacing a session's results with a new run removes the old file.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use tempfile::TempPath;

use crate::catalog::{Language, Voice};

use super::synth::SpeechError;

#[derive(Debug, Clone)]
pub struct AudioArtifact {
    path: Arc<TempPath>,
    language: Language,
    voice: Voice,
    size_bytes: usize,
}

impl AudioArtifact {
    /// Write `mp3` to a new temp file under `dir` (created if missing).
    pub fn write(
        dir: &Path,
        mp3: &[u8],
        language: Language,
        voice: Voice,
    ) -> Result<Self, SpeechError> {
        std::fs::create_dir_all(dir)?;

        let mut file = tempfile::Builder::new()
            .prefix("story-")
            .suffix(".mp3")
            .tempfile_in(dir)?;
        file.write_all(mp3)?;
        file.flush()?;

        Ok(Self {
            path: Arc::new(file.into_temp_path()),
            language,
            voice,
            size_bytes: mp3.len(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Language the audio is spoken in.
    pub fn language(&self) -> Language {
        self.language
    }

    /// Voice selected when the audio was requested.
    pub fn voice(&self) -> Voice {
        self.voice
    }

    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn write_creates_mp3_file_with_contents() {
        let dir = tempdir().unwrap();
        let audio_dir = dir.path().join("nested").join("audio");

        let artifact =
            AudioArtifact::write(&audio_dir, b"ID3fake", Language::French, Voice::Female).unwrap();

        assert!(artifact.path().starts_with(&audio_dir));
        assert_eq!(artifact.path().extension().unwrap(), "mp3");
        assert_eq!(std::fs::read(artifact.path()).unwrap(), b"ID3fake");
        assert_eq!(artifact.language(), Language::French);
        assert_eq!(artifact.voice(), Voice::Female);
        assert_eq!(artifact.size_bytes(), 7);
    }

    #[test]
    fn each_run_gets_a_fresh_file() {
        let dir = tempdir().unwrap();
        let a = AudioArtifact::write(dir.path(), b"a", Language::English, Voice::Male).unwrap();
        let b = AudioArtifact::write(dir.path(), b"b", Language::English, Voice::Male).unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn file_is_removed_when_last_clone_drops() {
        let dir = tempdir().unwrap();
        let artifact =
            AudioArtifact::write(dir.path(), b"x", Language::English, Voice::Child).unwrap();
        let path = artifact.path().to_path_buf();
        let clone = artifact.clone();

        drop(artifact);
        assert!(path.exists());
        drop(clone);
        assert!(!path.exists());
    }
}
