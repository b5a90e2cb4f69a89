//! Basic normalization and coarse splitting.
//!
//! Turns raw text into coarse word tokens before subword segmentation:
//! clean pass (control removal, whitespace folding), CJK ideograph
//! isolation, whitespace split, optional lowercase + accent strip, and a
//! final split on punctuation.
//!
//! The character classes follow the BERT definitions: `\t`, `\n` and `\r`
//! count as whitespace rather than control, format characters count as
//! control, and punctuation is the ASCII ranges plus the common Unicode
//! punctuation blocks.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Whitespace/punctuation-aware pre-tokenizer with optional lowercasing
/// and accent folding.
#[derive(Debug, Clone)]
pub struct BasicTokenizer {
    /// Lowercase and strip accents from each coarse token.
    pub do_lower_case: bool,
}

impl BasicTokenizer {
    pub fn new(do_lower_case: bool) -> Self {
        BasicTokenizer { do_lower_case }
    }

    /// Split `text` into coarse word tokens.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let cleaned = clean_text(text);
        let spaced = isolate_cjk_chars(&cleaned);

        let mut tokens = Vec::new();
        for word in spaced.split_whitespace() {
            if self.do_lower_case {
                let folded: String = word
                    .chars()
                    .flat_map(char::to_lowercase)
                    .nfd()
                    .filter(|c| !is_combining_mark(*c))
                    .collect();
                split_on_punctuation(&folded, &mut tokens);
            } else {
                split_on_punctuation(word, &mut tokens);
            }
        }
        tokens
    }
}

impl Default for BasicTokenizer {
    fn default() -> Self {
        BasicTokenizer::new(true)
    }
}

/// Drop NUL, U+FFFD and control characters; fold whitespace to a space.
fn clean_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '\0' || c == '\u{FFFD}' || is_control(c) {
            continue;
        }
        if is_whitespace(c) {
            out.push(' ');
        } else {
            out.push(c);
        }
    }
    out
}

/// Surround every CJK ideograph with spaces so it splits into its own
/// coarse token.
fn isolate_cjk_chars(text: &str) -> String {
    if !text.chars().any(is_cjk_char) {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        if is_cjk_char(c) {
            out.push(' ');
            out.push(c);
            out.push(' ');
        } else {
            out.push(c);
        }
    }
    out
}

/// Split `word` on punctuation characters, emitting each punctuation
/// character as its own token.
fn split_on_punctuation(word: &str, out: &mut Vec<String>) {
    let mut current = String::new();
    for c in word.chars() {
        if is_punctuation(c) {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            out.push(c.to_string());
        } else {
            current.push(c);
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
}

/// Replay the lossy normalization for one source character, appending its
/// surviving output characters to `out` and returning how many were
/// appended.
///
/// This is the exact per-character transform the offset rematcher maps
/// back through: lowercase fold + NFD + combining-mark removal when
/// `lower` is set, then NUL / U+FFFD / control removal always. Whitespace
/// folding and CJK isolation are deliberately absent: they only move token
/// boundaries, never characters inside a token.
pub(crate) fn replay_char(c: char, lower: bool, out: &mut String) -> usize {
    let mut appended = 0;
    if lower {
        for folded in c.to_lowercase().nfd() {
            if is_combining_mark(folded) {
                continue;
            }
            if folded == '\0' || folded == '\u{FFFD}' || is_control(folded) {
                continue;
            }
            out.push(folded);
            appended += 1;
        }
    } else if !(c == '\0' || c == '\u{FFFD}' || is_control(c)) {
        out.push(c);
        appended += 1;
    }
    appended
}

// ---------------------------------------------------------------------------
// Character classes
// ---------------------------------------------------------------------------

/// BERT whitespace: `\t \n \r` plus everything Unicode calls whitespace.
pub(crate) fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r') || c.is_whitespace()
}

/// BERT control: category C characters, except `\t \n \r` which are
/// treated as whitespace. Covers Cc plus the common Cf (format) ranges.
pub(crate) fn is_control(c: char) -> bool {
    if matches!(c, '\t' | '\n' | '\r') {
        return false;
    }
    if c.is_control() {
        return true;
    }
    let cp = c as u32;
    // Format characters (soft hyphen, directional marks, joiners, BOM, …).
    matches!(cp,
        0x00AD
        | 0x0600..=0x0605
        | 0x061C
        | 0x06DD
        | 0x070F
        | 0x180E
        | 0x200B..=0x200F
        | 0x202A..=0x202E
        | 0x2060..=0x2064
        | 0x2066..=0x206F
        | 0xFEFF
        | 0xFFF9..=0xFFFB
        | 0xE0001
        | 0xE0020..=0xE007F)
}

/// BERT punctuation: the four ASCII ranges plus the common Unicode
/// punctuation blocks. Treats `$`, `^`, backtick etc. as punctuation, as
/// the original does.
pub(crate) fn is_punctuation(c: char) -> bool {
    let cp = c as u32;
    if matches!(cp, 33..=47 | 58..=64 | 91..=96 | 123..=126) {
        return true;
    }
    matches!(cp,
        0x00A1..=0x00BF
        | 0x2000..=0x206F // General Punctuation
        | 0x2E00..=0x2E7F // Supplemental Punctuation
        | 0x3000..=0x303F // CJK Symbols and Punctuation
        | 0xFE30..=0xFE4F // CJK Compatibility Forms
        | 0xFE50..=0xFE6F // Small Form Variants
        | 0xFF01..=0xFF0F // Fullwidth forms
        | 0xFF1A..=0xFF20
        | 0xFF3B..=0xFF40
        | 0xFF5B..=0xFF65)
}

/// CJK ideograph blocks (the BERT set).
pub(crate) fn is_cjk_char(c: char) -> bool {
    let cp = c as u32;
    matches!(cp,
        0x4E00..=0x9FFF
        | 0x3400..=0x4DBF
        | 0x20000..=0x2A6DF
        | 0x2A700..=0x2B73F
        | 0x2B740..=0x2B81F
        | 0x2B820..=0x2CEAF
        | 0xF900..=0xFAFF
        | 0x2F800..=0x2FA1F)
}
