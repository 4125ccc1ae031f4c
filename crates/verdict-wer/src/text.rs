//! Transcript tokenization for WER scoring.

/// Split text into scoring tokens: lowercase, keep only `[a-z0-9' ]`
/// (apostrophes keep contractions as single tokens), collapse whitespace.
///
/// Stripped characters become spaces, so "co-op" counts as two tokens.
/// English-only by design.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut cleaned = String::with_capacity(text.len());
    for ch in text.to_lowercase().chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '\'' {
            cleaned.push(ch);
        } else {
            cleaned.push(' ');
        }
    }
    cleaned
        .split_whitespace()
        .map(str::to_string)
        .collect()
}
