//! Word tokenizer
//!
//! Splits passage text into the word forms that become corpus positions.

use tracing::debug;

/// One kept word and where it sits in the passage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordToken<'a> {
    /// Word as written
    pub text: &'a str,
    /// Index among kept words
    pub index: usize,
}

/// Split text into purely alphabetic words.
///
/// Text is split on whitespace and surrounding punctuation is trimmed.
/// Anything still containing a non-letter (digits, inner hyphens,
/// apostrophes, emoji) is dropped.
pub fn tokenize(text: &str) -> Vec<WordToken<'_>> {
    let words: Vec<WordToken<'_>> = text
        .split_whitespace()
        .map(|chunk| chunk.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|word| !word.is_empty() && word.chars().all(char::is_alphabetic))
        .enumerate()
        .map(|(index, text)| WordToken { text, index })
        .collect();

    debug!(
        input_len = text.len(),
        word_count = words.len(),
        "Text tokenized"
    );

    words
}
