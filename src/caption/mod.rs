//! Image-captioning provider.
//!
//! * [`Captioner`] — async trait implemented by every captioning backend.
//! * [`ApiCaptioner`] — OpenAI-compatible vision chat-completions client.
//! * [`CaptionError`] — error variants for captioning.

pub mod captioner;

pub use captioner::{ApiCaptioner, CaptionError, Captioner};

#[cfg(test)]
pub use captioner::MockCaptioner;
