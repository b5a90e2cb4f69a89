//! Greedy longest-match-first WordPiece segmentation.
//!
//! One coarse word in, a sequence of vocabulary subwords out — or a single
//! unknown marker when any position in the word fails to match. Non-initial
//! pieces carry the continuation prefix (`##` by default) for vocabulary
//! lookup.

use smallvec::SmallVec;

use crate::vocab::Vocab;

/// The WordPiece segmenter.
///
/// Output is a pure function of the word and the vocabulary: the scan is
/// deterministic and keeps no state between calls.
#[derive(Debug, Clone)]
pub struct Wordpiece {
    /// Marker emitted for words that cannot be segmented.
    unk_token: String,
    /// Prefix for non-initial pieces (`##`).
    continuing_subword_prefix: String,
    /// Words longer than this many characters skip the search and map
    /// straight to the unknown marker, bounding the quadratic scan.
    max_input_chars_per_word: usize,
}

impl Wordpiece {
    pub fn new(
        unk_token: impl Into<String>,
        continuing_subword_prefix: impl Into<String>,
        max_input_chars_per_word: usize,
    ) -> Self {
        Wordpiece {
            unk_token: unk_token.into(),
            continuing_subword_prefix: continuing_subword_prefix.into(),
            max_input_chars_per_word,
        }
    }

    pub fn unk_token(&self) -> &str {
        &self.unk_token
    }

    pub fn continuing_subword_prefix(&self) -> &str {
        &self.continuing_subword_prefix
    }

    /// Segment one coarse word into subword tokens.
    pub fn segment(&self, word: &str, vocab: &Vocab) -> Vec<String> {
        let mut out = Vec::new();
        self.segment_into(word, vocab, &mut out);
        out
    }

    /// Segment one coarse word, appending the subword tokens to `out`.
    ///
    /// Empty word → nothing. A word with no viable segmentation emits
    /// exactly one unknown marker; partial matches are discarded.
    pub fn segment_into(&self, word: &str, vocab: &Vocab, out: &mut Vec<String>) {
        if word.is_empty() {
            return;
        }

        // Char-boundary byte offsets; candidate substrings are sliced by
        // boundary index, never by raw byte arithmetic.
        let boundaries: SmallVec<[usize; 32]> = word
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(word.len()))
            .collect();
        let n_chars = boundaries.len() - 1;

        if n_chars > self.max_input_chars_per_word {
            out.push(self.unk_token.clone());
            return;
        }

        let mut pieces: SmallVec<[String; 8]> = SmallVec::new();
        let mut start = 0;
        while start < n_chars {
            // Longest match first: shrink the end until the candidate is
            // in the vocabulary.
            let mut end = n_chars;
            let mut matched: Option<String> = None;
            while start < end {
                let sub = &word[boundaries[start]..boundaries[end]];
                let candidate = if start > 0 {
                    let mut s = String::with_capacity(
                        self.continuing_subword_prefix.len() + sub.len(),
                    );
                    s.push_str(&self.continuing_subword_prefix);
                    s.push_str(sub);
                    s
                } else {
                    sub.to_string()
                };
                if vocab.contains(&candidate) {
                    matched = Some(candidate);
                    break;
                }
                end -= 1;
            }

            match matched {
                Some(piece) => {
                    pieces.push(piece);
                    start = end;
                }
                None => {
                    // No substring at this cursor matches: the whole word
                    // degenerates to the unknown marker.
                    out.push(self.unk_token.clone());
                    return;
                }
            }
        }

        out.extend(pieces);
    }
}
