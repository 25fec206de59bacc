//! Translation provider.
//!
//! * [`Translator`] — async trait: text + target code → translated text.
//! * [`GoogleTranslator`] — Google Translate web endpoint client.
//! * [`TranslatedStory`] — a story tagged with the language it is in.

pub mod translator;

pub use translator::{
    parse_translation, GoogleTranslator, TranslatedStory, TranslationError, Translator,
};

#[cfg(test)]
pub use translator::MockTranslator;
