//! Input normalization before inference.

/// Non-ASCII letters the inference model should still see. Everything
/// outside ASCII alphanumerics, whitespace, basic punctuation and this
/// set is noise (emoji, decorative symbols, stray markup fragments).
pub const EXTENDED_ALPHABET: &str = "çğıöşüÇĞİÖŞÜ";

const BASIC_PUNCTUATION: &str = ".,;:!?'\"()-%";

/// Clean and bound a text for the embedding model: strip noise
/// characters, collapse whitespace, truncate at a word boundary.
pub fn prepare(text: &str, max_chars: usize) -> String {
    let filtered: String = text
        .chars()
        .map(|c| if keep_char(c) { c } else { ' ' })
        .collect();
    let collapsed = filtered.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_at_word_boundary(&collapsed, max_chars)
}

fn keep_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || c.is_whitespace()
        || BASIC_PUNCTUATION.contains(c)
        || EXTENDED_ALPHABET.contains(c)
}

/// Cut to at most `max_chars` characters without splitting a word. The
/// cut lands on the last whitespace before the limit; a single oversized
/// token is truncated hard as the last resort.
pub fn truncate_at_word_boundary(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let truncated: String = text.chars().take(max_chars).collect();
    match truncated.rfind(char::is_whitespace) {
        Some(idx) => truncated[..idx].trim_end().to_string(),
        None => truncated,
    }
}
