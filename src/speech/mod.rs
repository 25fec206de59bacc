//! Speech-synthesis provider, audio artifact and playback.
//!
//! * [`SpeechSynthesizer`] — async trait: text + language code → MP3 bytes.
//! * [`GoogleTts`] — Google Translate TTS client (chunked requests).
//! * [`AudioArtifact`] — per-run MP3 temp file, removed when dropped.
//! * [`AudioPlayer`] — `rodio` playback of an artifact.

pub mod artifact;
pub mod player;
pub mod synth;

pub use artifact::AudioArtifact;
pub use player::AudioPlayer;
pub use synth::{split_chunks, GoogleTts, SpeechError, SpeechSynthesizer, MAX_CHUNK_CHARS};

#[cfg(test)]
pub use synth::MockSynthesizer;
