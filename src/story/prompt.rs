//! Story prompt template and length budget.

/// Fixed instruction; the caption is appended in single quotes.
const STORY_INSTRUCTION: &str = "Write a short, imaginative story based on this image caption:";

/// Build the generation prompt for `caption`.
///
/// ```
/// use image_story::story::build_story_prompt;
///
/// assert_eq!(
///     build_story_prompt("a red kite"),
///     "Write a short, imaginative story based on this image caption: 'a red kite'"
/// );
/// ```
pub fn build_story_prompt(caption: &str) -> String {
    format!("{STORY_INSTRUCTION} '{caption}'")
}

/// Trim `text` and cap it at `max_tokens` whitespace-separated words.
///
/// Every word costs at least one token, so the result never exceeds the
/// budget the provider was given even if the provider ignores `max_tokens`.
/// The kept text is a prefix of the trimmed input, so line and paragraph
/// breaks survive truncation.
pub fn enforce_budget(text: &str, max_tokens: u32) -> String {
    let trimmed = text.trim();
    let budget = max_tokens as usize;

    match cut_after_words(trimmed, budget) {
        None => trimmed.to_string(),
        Some(end) => {
            log::warn!("story exceeded {budget} words; truncating");
            trimmed[..end].to_string()
        }
    }
}

/// Byte offset just past the `n`-th word, or `None` when `text` has at most
/// `n` words.
fn cut_after_words(text: &str, n: usize) -> Option<usize> {
    let mut words = 0;
    let mut word_end = 0;
    let mut in_word = false;

    for (i, c) in text.char_indices() {
        if c.is_whitespace() {
            if in_word {
                in_word = false;
                words += 1;
                if words == n {
                    word_end = i;
                }
            }
        } else if !in_word {
            if words == n {
                return Some(word_end);
            }
            in_word = true;
        }
    }
    None
}
