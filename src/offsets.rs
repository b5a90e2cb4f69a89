//! Character-offset rematching.
//!
//! The normalizer is lossy: lowercasing can change character counts, accent
//! stripping and control removal delete characters outright. To map each
//! produced token back to the span of the *original* text it came from, the
//! rematcher replays the normalization character by character, recording
//! which source character produced every normalized character, then locates
//! the tokens left-to-right inside the normalized text.

use crate::error::TokenizerError;
use crate::normalizer::replay_char;
use crate::tokenizer::Tokenizer;

/// Half-open `(start, end)` character span into the original input text.
/// Special tokens inserted by the layout get `(0, 0)`.
pub type OffsetSpan = (usize, usize);

impl Tokenizer {
    /// Compute one original-text character span per token the pipeline
    /// produces for `text`.
    ///
    /// Tokens that degenerated to the unknown marker are located as their
    /// original coarse word. A token that cannot be found in the
    /// normalized text means the normalizer and segmenter disagree; that
    /// is a fatal [`TokenizerError::OffsetRematchInconsistency`].
    pub fn rematch(&self, text: &str) -> Result<Vec<OffsetSpan>, TokenizerError> {
        let tokens = self.tokenize_preserving_unmatched(text);

        // Replay the normalization, mapping every normalized character
        // back to the source character index that produced it.
        let lower = self.do_lower_case();
        let mut normalized = String::with_capacity(text.len());
        let mut char_mapping: Vec<usize> = Vec::with_capacity(text.len());
        for (i, c) in text.chars().enumerate() {
            let appended = replay_char(c, lower, &mut normalized);
            char_mapping.extend(std::iter::repeat(i).take(appended));
        }

        // Byte offset of each normalized character, for byte → char index
        // conversion after substring search.
        let char_starts: Vec<usize> = normalized.char_indices().map(|(b, _)| b).collect();

        let prefix = self.continuing_subword_prefix();
        let mut spans = Vec::with_capacity(tokens.len());
        let mut offset = 0; // byte cursor into `normalized`

        for token in &tokens {
            let stemmed = token.strip_prefix(prefix).unwrap_or(token);
            if stemmed.is_empty() {
                // A bare continuation marker matches zero characters; give
                // it an empty span at the cursor.
                let at = char_starts.partition_point(|&b| b < offset);
                let src = char_mapping.get(at).copied().unwrap_or(0);
                spans.push((src, src));
                continue;
            }

            // Tokens are consumed in strict left-to-right order, so the
            // first occurrence at or after the cursor is the right one.
            let found = normalized[offset..].find(stemmed).ok_or_else(|| {
                TokenizerError::OffsetRematchInconsistency {
                    token: token.clone(),
                    offset,
                }
            })?;
            let start = offset + found;
            let end = start + stemmed.len();

            let char_start = char_starts.partition_point(|&b| b < start);
            let char_end = char_starts.partition_point(|&b| b < end);
            spans.push((
                char_mapping[char_start],
                char_mapping[char_end - 1] + 1,
            ));
            offset = end;
        }

        Ok(spans)
    }
}
