//! Utility functions shared across the crate.

use std::path::PathBuf;

/// Get the user's config directory following XDG conventions.
///
/// Returns `$XDG_CONFIG_HOME` if set, otherwise `$HOME/.config`.
pub fn config_dir() -> Option<PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
}

/// Get the user's cache directory following XDG conventions.
///
/// Returns `$XDG_CACHE_HOME` if set, otherwise `$HOME/.cache`.
pub fn cache_dir() -> Option<PathBuf> {
    std::env::var_os("XDG_CACHE_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".cache")))
}

/// Get the default translation cache path.
pub fn translation_cache_path() -> PathBuf {
    cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("pdf-relayout")
}

/// Split text at sentence boundaries: after `.`, `!` or `?` followed by
/// whitespace. The terminating punctuation stays with its sentence.
///
/// Used by both the chunked translator and the layout fitter so the same
/// boundaries drive chunk packing and line wrapping.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?')
            && let Some(&(next_idx, next)) = chars.peek()
            && next.is_whitespace()
        {
            let sentence = text[start..=i].trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            start = next_idx;
        }
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }

    sentences
}

/// True if the text consists solely of ASCII digits.
pub fn is_numeric(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
}

/// Coarse "is this actually prose" gate: true if the text contains at least
/// one letter-class character in a supported script (Latin, Cyrillic,
/// Arabic, Japanese kana, CJK ideographs, Hangul).
pub fn contains_letters(text: &str) -> bool {
    text.chars().any(|c| {
        c.is_ascii_alphabetic()
            || matches!(u32::from(c),
                0x0400..=0x04FF   // Cyrillic
                | 0x0600..=0x06FF // Arabic
                | 0x3040..=0x30FF // Hiragana + Katakana
                | 0x4E00..=0x9FFF // CJK unified ideographs
                | 0xAC00..=0xD7AF // Hangul syllables
            )
    })
}
