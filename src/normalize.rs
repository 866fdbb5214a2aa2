//! Text normalization shared by phonetic encoding and similarity scoring.
//!
//! Phonetic codes are computed on ASCII-folded text so that accented and
//! non-Latin titles still produce a code. Similarity works on the raw text
//! split into lowercase words; it does not fold diacritics, so "Café" and
//! "Cafe" are different words there.

use any_ascii::any_ascii;
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

// ============================================================================
// REGEX PATTERNS
// ============================================================================

/// A word is a run of Unicode letters or digits. Everything else separates.
pub static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\p{L}\p{N}]+").unwrap());

/// Regex to collapse multiple whitespace into single space
pub static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Check if a character is a Unicode combining mark (diacritical mark).
pub fn is_combining_mark(c: char) -> bool {
    matches!(c as u32, 0x0300..=0x036F | 0x1AB0..=0x1AFF | 0x1DC0..=0x1DFF | 0x20D0..=0x20FF | 0xFE20..=0xFE2F)
}

/// Fold Unicode text to lowercase ASCII.
/// e.g., "Météo Données" → "meteo donnees", "Москва" → "moskva"
pub fn fold_to_ascii(s: &str) -> String {
    // First strip diacritics via NFKD decomposition
    let stripped: String = s.nfkd().filter(|c| !is_combining_mark(*c)).collect();
    // Then transliterate any remaining non-ASCII (Cyrillic, Greek, CJK, etc.)
    any_ascii(&stripped).to_lowercase()
}

pub fn collapse_whitespace(s: &str) -> String {
    MULTI_SPACE.replace_all(s.trim(), " ").to_string()
}

// ============================================================================
// NORMALIZATION FUNCTIONS
// ============================================================================

/// Lowercase word sequence of a text, in order.
pub fn words(text: &str) -> Vec<String> {
    WORD.find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// Prepare a title for phonetic encoding: ASCII-folded, uppercased,
/// whitespace collapsed.
pub fn phonetic_input(title: &str) -> String {
    collapse_whitespace(&fold_to_ascii(title)).to_ascii_uppercase()
}

// ============================================================================
// TESTS
// ============================================================================
