//! Audio playback via `rodio`.
//!
//! `rodio::OutputStream` is not `Send`, so an [`AudioPlayer`] must be created
//! and used on the UI thread.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};

use super::synth::SpeechError;

pub struct AudioPlayer {
    // Dropping the stream silences every sink; keep it alive.
    _stream: OutputStream,
    handle: OutputStreamHandle,
    sink: Option<Sink>,
}

impl AudioPlayer {
    /// Open the default output device.
    pub fn new() -> Result<Self, SpeechError> {
        let (stream, handle) =
            OutputStream::try_default().map_err(|e| SpeechError::Playback(e.to_string()))?;

        Ok(Self {
            _stream: stream,
            handle,
            sink: None,
        })
    }

    /// Stop anything currently playing and start `path` from the beginning.
    pub fn play(&mut self, path: &Path) -> Result<(), SpeechError> {
        self.stop();

        let file = File::open(path)?;
        let source =
            Decoder::new(BufReader::new(file)).map_err(|e| SpeechError::Playback(e.to_string()))?;
        let sink =
            Sink::try_new(&self.handle).map_err(|e| SpeechError::Playback(e.to_string()))?;
        sink.append(source);

        log::debug!("playing {}", path.display());
        self.sink = Some(sink);
        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }

    pub fn is_playing(&self) -> bool {
        self.sink.as_ref().is_some_and(|s| !s.empty())
    }
}
