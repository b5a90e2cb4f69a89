//! The assembled tokenizer pipeline.
//!
//! Composition over inheritance: [`Tokenizer`] owns a vocabulary, the
//! basic normalizer/splitter, the WordPiece segmenter, and the model's
//! special-token layout. The encode path is:
//!
//! ```text
//! ┌────────────────┐    ┌───────────────┐    ┌───────────┐    ┌────────┐
//! │ special-token   │ → │ BasicTokenizer │ → │ Wordpiece │ → │ layout │
//! │ split (AhoCora- │   │ (clean, split, │   │ (greedy   │   │ (cls/  │
//! │ sick, leftmost- │   │  lower, accent)│   │  longest) │   │  sep)  │
//! │ longest)        │   └───────────────┘    └───────────┘   └────────┘
//! └────────────────┘
//! ```
//!
//! Batch encoding and sliding windows live in [`crate::encode`]; offset
//! rematching in [`crate::offsets`].

use std::fs;
use std::path::Path;

use aho_corasick::AhoCorasick;
use anyhow::{bail, Context};
use memchr::memmem;
use serde::Deserialize;
use tracing::debug;

use crate::error::TokenizerError;
use crate::normalizer::BasicTokenizer;
use crate::offsets::OffsetSpan;
use crate::vocab::{TokenId, Vocab};
use crate::wordpiece::Wordpiece;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Which end of the sequence receives padding tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaddingSide {
    Left,
    #[default]
    Right,
}

/// Immutable tokenizer configuration with documented defaults.
///
/// Deserializable from a `tokenizer_config.json` placed next to the
/// vocabulary file; absent fields take their defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    /// Lowercase and accent-fold during basic tokenization. Default `true`.
    pub do_lower_case: bool,
    /// Unknown-token string. Default `"<unk>"`.
    pub unk_token: String,
    /// Separator token string. Default `"<sep>"`.
    pub sep_token: String,
    /// Padding token string. Default `"<pad>"`.
    pub pad_token: String,
    /// Classification token string. Default `"<cls>"`.
    pub cls_token: String,
    /// Mask token string. Default `"<mask>"`.
    pub mask_token: String,
    /// Continuation prefix for non-initial subwords. Default `"##"`.
    pub wordpieces_prefix: String,
    /// Per-word character bound for the segmenter. Default `100`.
    pub max_input_chars_per_word: usize,
    /// Type id assigned to padding positions. Default `0`.
    pub pad_token_type_id: u32,
    /// Type id assigned to the leading cls token. Default `2` (the funnel
    /// layout; BERT-style models use `0`).
    pub cls_token_type_id: u32,
    /// Which side padding is applied to. Default right.
    pub padding_side: PaddingSide,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        TokenizerConfig {
            do_lower_case: true,
            unk_token: "<unk>".to_string(),
            sep_token: "<sep>".to_string(),
            pad_token: "<pad>".to_string(),
            cls_token: "<cls>".to_string(),
            mask_token: "<mask>".to_string(),
            wordpieces_prefix: "##".to_string(),
            max_input_chars_per_word: 100,
            pad_token_type_id: 0,
            cls_token_type_id: 2,
            padding_side: PaddingSide::Right,
        }
    }
}

/// Special-token strings with their ids resolved against the vocabulary.
#[derive(Debug, Clone)]
pub struct SpecialTokens {
    pub unk: String,
    pub sep: String,
    pub pad: String,
    pub cls: String,
    pub mask: String,
    pub unk_id: TokenId,
    pub sep_id: TokenId,
    pub pad_id: TokenId,
    pub cls_id: TokenId,
    pub mask_id: TokenId,
}

/// A segment produced by splitting input text on special tokens.
enum Segment<'a> {
    Text(&'a str),
    Special(&'a str),
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

/// A WordPiece tokenizer with offset rematching and sliding-window
/// encoding.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use wordpiece::Tokenizer;
///
/// let tokenizer = Tokenizer::from_dir(Path::new("model/")).unwrap();
/// let tokens = tokenizer.tokenize("unaffable");
/// let ids = tokenizer.convert_tokens_to_ids(&tokens);
/// ```
pub struct Tokenizer {
    vocab: Vocab,
    basic: BasicTokenizer,
    wordpiece: Wordpiece,
    special: SpecialTokens,

    pad_token_type_id: u32,
    cls_token_type_id: u32,
    padding_side: PaddingSide,

    // Special-token literal matcher for splitting input text.
    special_matcher: AhoCorasick,
}

impl Tokenizer {
    /// Assemble a tokenizer from a loaded vocabulary and configuration.
    ///
    /// Fails if any configured special token is missing from the
    /// vocabulary.
    pub fn new(vocab: Vocab, config: TokenizerConfig) -> anyhow::Result<Self> {
        let resolve = |token: &str| -> anyhow::Result<TokenId> {
            match vocab.token_to_id(token) {
                Some(id) => Ok(id),
                None => bail!("special token {token:?} not found in vocabulary"),
            }
        };
        let special = SpecialTokens {
            unk_id: resolve(&config.unk_token)?,
            sep_id: resolve(&config.sep_token)?,
            pad_id: resolve(&config.pad_token)?,
            cls_id: resolve(&config.cls_token)?,
            mask_id: resolve(&config.mask_token)?,
            unk: config.unk_token.clone(),
            sep: config.sep_token.clone(),
            pad: config.pad_token.clone(),
            cls: config.cls_token.clone(),
            mask: config.mask_token.clone(),
        };

        let special_matcher = AhoCorasick::builder()
            .match_kind(aho_corasick::MatchKind::LeftmostLongest)
            .build([
                &special.unk,
                &special.sep,
                &special.pad,
                &special.cls,
                &special.mask,
            ])
            .context("failed to build special-token matcher")?;

        debug!(
            vocab_size = vocab.len(),
            do_lower_case = config.do_lower_case,
            "tokenizer assembled"
        );

        Ok(Tokenizer {
            basic: BasicTokenizer::new(config.do_lower_case),
            wordpiece: Wordpiece::new(
                config.unk_token,
                config.wordpieces_prefix,
                config.max_input_chars_per_word,
            ),
            vocab,
            special,
            pad_token_type_id: config.pad_token_type_id,
            cls_token_type_id: config.cls_token_type_id,
            padding_side: config.padding_side,
            special_matcher,
        })
    }

    /// Load from a directory holding `vocab.txt` and, optionally,
    /// `tokenizer_config.json`.
    pub fn from_dir(dir: &Path) -> anyhow::Result<Self> {
        let vocab = Vocab::from_file(&dir.join("vocab.txt"))?;
        let config_path = dir.join("tokenizer_config.json");
        let config = if config_path.exists() {
            let raw = fs::read_to_string(&config_path).with_context(|| {
                format!("failed to read {}", config_path.display())
            })?;
            serde_json::from_str(&raw).with_context(|| {
                format!("failed to parse {}", config_path.display())
            })?
        } else {
            TokenizerConfig::default()
        };
        Self::new(vocab, config)
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn vocab(&self) -> &Vocab {
        &self.vocab
    }

    pub fn vocab_size(&self) -> usize {
        self.vocab.len()
    }

    pub fn special_tokens(&self) -> &SpecialTokens {
        &self.special
    }

    pub fn padding_side(&self) -> PaddingSide {
        self.padding_side
    }

    pub(crate) fn do_lower_case(&self) -> bool {
        self.basic.do_lower_case
    }

    pub(crate) fn pad_token_type_id(&self) -> u32 {
        self.pad_token_type_id
    }

    pub(crate) fn continuing_subword_prefix(&self) -> &str {
        self.wordpiece.continuing_subword_prefix()
    }

    // -----------------------------------------------------------------------
    // Tokenization
    // -----------------------------------------------------------------------

    /// Tokenize text into subword strings.
    ///
    /// Special-token literals in the input pass through atomically; the
    /// rest goes through basic splitting and WordPiece segmentation.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let mut tokens = Vec::new();
        for segment in self.split_special_tokens(text) {
            match segment {
                Segment::Text(t) => {
                    for word in self.basic.tokenize(t) {
                        self.wordpiece.segment_into(&word, &self.vocab, &mut tokens);
                    }
                }
                Segment::Special(s) => tokens.push(s.to_string()),
            }
        }
        tokens
    }

    /// Tokenize like [`tokenize`](Self::tokenize), but emit the original
    /// coarse word wherever segmentation degenerated to the unknown
    /// marker.
    ///
    /// The offset rematcher needs this: the unknown marker is not a
    /// substring of the text, the word it replaced is.
    pub(crate) fn tokenize_preserving_unmatched(&self, text: &str) -> Vec<String> {
        let mut tokens = Vec::new();
        let mut scratch = Vec::new();
        for segment in self.split_special_tokens(text) {
            match segment {
                Segment::Text(t) => {
                    for word in self.basic.tokenize(t) {
                        scratch.clear();
                        self.wordpiece.segment_into(&word, &self.vocab, &mut scratch);
                        for sub in scratch.drain(..) {
                            if sub == self.special.unk {
                                tokens.push(word.clone());
                            } else {
                                tokens.push(sub);
                            }
                        }
                    }
                }
                Segment::Special(s) => tokens.push(s.to_string()),
            }
        }
        tokens
    }

    /// Split text on special-token literals using the Aho-Corasick
    /// matcher.
    fn split_special_tokens<'a>(&self, text: &'a str) -> Vec<Segment<'a>> {
        let mut segments = Vec::new();
        let mut last_end = 0;

        for mat in self.special_matcher.find_iter(text) {
            if mat.start() > last_end {
                segments.push(Segment::Text(&text[last_end..mat.start()]));
            }
            segments.push(Segment::Special(&text[mat.start()..mat.end()]));
            last_end = mat.end();
        }

        if last_end < text.len() || segments.is_empty() {
            segments.push(Segment::Text(&text[last_end..]));
        }

        segments
    }

    /// Map token strings → ids; unknown strings map to the unk id.
    pub fn convert_tokens_to_ids(&self, tokens: &[String]) -> Vec<TokenId> {
        tokens
            .iter()
            .map(|t| self.vocab.token_to_id(t).unwrap_or(self.special.unk_id))
            .collect()
    }

    /// Map ids → token strings; out-of-range ids map to the unk string.
    pub fn convert_ids_to_tokens(&self, ids: &[TokenId]) -> Vec<String> {
        ids.iter()
            .map(|&id| {
                self.vocab
                    .id_to_token(id)
                    .unwrap_or(&self.special.unk)
                    .to_string()
            })
            .collect()
    }

    /// Join tokens back into approximate text: continuation markers are
    /// fused and a fixed table of punctuation-spacing fixups is applied.
    /// Lossy, best-effort only.
    pub fn convert_tokens_to_string(&self, tokens: &[String]) -> String {
        const FIXUPS: &[(&[u8], &[u8])] = &[
            (b" .", b"."),
            (b" ?", b"?"),
            (b" !", b"!"),
            (b" ,", b","),
            (b" ' ", b"'"),
            (b" n't", b"n't"),
            (b" 'm", b"'m"),
            (b" 's", b"'s"),
            (b" 've", b"'ve"),
            (b" 're", b"'re"),
        ];

        let mut fuse = Vec::with_capacity(self.continuing_subword_prefix().len() + 1);
        fuse.push(b' ');
        fuse.extend_from_slice(self.continuing_subword_prefix().as_bytes());

        let mut buf = tokens.join(" ").into_bytes();
        buf = replace_bytes_owned(buf, &fuse, b"");
        trim_ascii_spaces(&mut buf);
        for (pattern, replacement) in FIXUPS {
            buf = replace_bytes_owned(buf, pattern, replacement);
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    // -----------------------------------------------------------------------
    // Special-token layout
    // -----------------------------------------------------------------------

    /// `[cls] A [sep]` or `[cls] A [sep] B [sep]`.
    pub fn build_inputs_with_special_tokens(
        &self,
        ids: &[TokenId],
        pair_ids: Option<&[TokenId]>,
    ) -> Vec<TokenId> {
        let pair_len = pair_ids.map_or(0, <[TokenId]>::len);
        let mut out = Vec::with_capacity(ids.len() + pair_len + 3);
        out.push(self.special.cls_id);
        out.extend_from_slice(ids);
        out.push(self.special.sep_id);
        if let Some(pair) = pair_ids {
            out.extend_from_slice(pair);
            out.push(self.special.sep_id);
        }
        out
    }

    /// `(0,0) A (0,0)` or `(0,0) A (0,0) B (0,0)` — inserted special
    /// tokens map to no input characters.
    pub fn build_offset_mapping_with_special_tokens(
        &self,
        offsets: &[OffsetSpan],
        pair_offsets: Option<&[OffsetSpan]>,
    ) -> Vec<OffsetSpan> {
        let pair_len = pair_offsets.map_or(0, <[OffsetSpan]>::len);
        let mut out = Vec::with_capacity(offsets.len() + pair_len + 3);
        out.push((0, 0));
        out.extend_from_slice(offsets);
        out.push((0, 0));
        if let Some(pair) = pair_offsets {
            out.extend_from_slice(pair);
            out.push((0, 0));
        }
        out
    }

    /// Type ids covering the laid-out sequence: the cls token takes
    /// `cls_token_type_id`, then zeros over `A [sep]`, then ones over
    /// `B [sep]`.
    pub fn create_token_type_ids_from_sequences(
        &self,
        len: usize,
        pair_len: Option<usize>,
    ) -> Vec<u32> {
        let mut out = vec![self.cls_token_type_id];
        out.extend(std::iter::repeat(0).take(len + 1));
        if let Some(pair_len) = pair_len {
            out.extend(std::iter::repeat(1).take(pair_len + 1));
        }
        out
    }

    /// 1 for special-token positions, 0 for sequence tokens.
    ///
    /// With `already_has_special_tokens`, `ids` is scanned for cls/sep
    /// ids instead (a pair must not be supplied in that mode).
    pub fn get_special_tokens_mask(
        &self,
        ids: &[TokenId],
        pair_ids: Option<&[TokenId]>,
        already_has_special_tokens: bool,
    ) -> Result<Vec<u32>, TokenizerError> {
        if already_has_special_tokens {
            if pair_ids.is_some() {
                return Err(TokenizerError::InvalidInput(
                    "a pair sequence must not be supplied when the ids are \
                     already formatted with special tokens"
                        .to_string(),
                ));
            }
            return Ok(ids
                .iter()
                .map(|&id| {
                    u32::from(id == self.special.sep_id || id == self.special.cls_id)
                })
                .collect());
        }

        let pair_len = pair_ids.map_or(0, <[TokenId]>::len);
        let mut mask = Vec::with_capacity(ids.len() + pair_len + 3);
        mask.push(1);
        mask.extend(std::iter::repeat(0).take(ids.len()));
        mask.push(1);
        if pair_ids.is_some() {
            mask.extend(std::iter::repeat(0).take(pair_len));
            mask.push(1);
        }
        Ok(mask)
    }

    /// Number of special tokens the layout inserts, computed from the
    /// layout itself on empty sequences.
    pub fn num_special_tokens_to_add(&self, pair: bool) -> usize {
        self.build_inputs_with_special_tokens(&[], if pair { Some(&[]) } else { None })
            .len()
    }
}

/// Capability seam for model-input preparation: what a caller needs from
/// any tokenizer, independent of the segmentation algorithm behind it.
pub trait Tokenize {
    fn tokenize(&self, text: &str) -> Vec<String>;
    fn convert_tokens_to_ids(&self, tokens: &[String]) -> Vec<TokenId>;
    fn build_inputs_with_special_tokens(
        &self,
        ids: &[TokenId],
        pair_ids: Option<&[TokenId]>,
    ) -> Vec<TokenId>;
}

impl Tokenize for Tokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        Tokenizer::tokenize(self, text)
    }

    fn convert_tokens_to_ids(&self, tokens: &[String]) -> Vec<TokenId> {
        Tokenizer::convert_tokens_to_ids(self, tokens)
    }

    fn build_inputs_with_special_tokens(
        &self,
        ids: &[TokenId],
        pair_ids: Option<&[TokenId]>,
    ) -> Vec<TokenId> {
        Tokenizer::build_inputs_with_special_tokens(self, ids, pair_ids)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Replace all occurrences of `needle` with `replacement` in `haystack`.
///
/// Uses SIMD-accelerated `memchr::memmem` for searching. Returns the
/// original `haystack` untouched (no allocation) if `needle` is not found.
fn replace_bytes_owned(haystack: Vec<u8>, needle: &[u8], replacement: &[u8]) -> Vec<u8> {
    if needle.is_empty() {
        return haystack;
    }

    let finder = memmem::Finder::new(needle);
    let mut iter = finder.find_iter(&haystack).peekable();

    if iter.peek().is_none() {
        return haystack;
    }

    let mut result = Vec::with_capacity(haystack.len());
    let mut start = 0;
    for pos in iter {
        result.extend_from_slice(&haystack[start..pos]);
        result.extend_from_slice(replacement);
        start = pos + needle.len();
    }
    result.extend_from_slice(&haystack[start..]);
    result
}

/// Trim leading/trailing ASCII spaces in place.
fn trim_ascii_spaces(buf: &mut Vec<u8>) {
    let end = buf.iter().rposition(|&b| b != b' ').map_or(0, |i| i + 1);
    buf.truncate(end);
    let start = buf.iter().position(|&b| b != b' ').unwrap_or(buf.len());
    buf.drain(..start);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_tokenizer(extra: &[&str]) -> Tokenizer {
        let mut tokens = vec!["<pad>", "<unk>", "<cls>", "<sep>", "<mask>"];
        tokens.extend_from_slice(extra);
        Tokenizer::new(Vocab::from_tokens(tokens), TokenizerConfig::default()).unwrap()
    }

    #[test]
    fn test_tokenize_pipeline() {
        let tok = make_tokenizer(&["un", "##aff", "##able", "hello"]);
        assert_eq!(
            tok.tokenize("Hello unaffable"),
            vec!["hello", "un", "##aff", "##able"]
        );
        // Unknown word degenerates to the unk marker.
        assert_eq!(tok.tokenize("zzz"), vec!["<unk>"]);
    }

    #[test]
    fn test_special_tokens_pass_through() {
        let tok = make_tokenizer(&["hello"]);
        assert_eq!(
            tok.tokenize("<cls> Hello <sep>"),
            vec!["<cls>", "hello", "<sep>"]
        );
    }

    #[test]
    fn test_missing_special_token_fails_construction() {
        let vocab = Vocab::from_tokens(["<pad>", "<unk>"]);
        assert!(Tokenizer::new(vocab, TokenizerConfig::default()).is_err());
    }

    #[test]
    fn test_id_conversions() {
        let tok = make_tokenizer(&["hello"]);
        let ids = tok.convert_tokens_to_ids(&["hello".into(), "nope".into()]);
        assert_eq!(ids, vec![5, 1]); // unk id for the miss
        assert_eq!(tok.convert_ids_to_tokens(&[5, 99]), vec!["hello", "<unk>"]);
    }

    #[test]
    fn test_layout_single_and_pair() {
        let tok = make_tokenizer(&[]);
        // cls=2, sep=3
        assert_eq!(tok.build_inputs_with_special_tokens(&[9], None), vec![2, 9, 3]);
        assert_eq!(
            tok.build_inputs_with_special_tokens(&[9], Some(&[8, 7])),
            vec![2, 9, 3, 8, 7, 3]
        );
        assert_eq!(tok.num_special_tokens_to_add(false), 2);
        assert_eq!(tok.num_special_tokens_to_add(true), 3);
    }

    #[test]
    fn test_token_type_ids_use_cls_type() {
        let tok = make_tokenizer(&[]);
        assert_eq!(
            tok.create_token_type_ids_from_sequences(2, None),
            vec![2, 0, 0, 0]
        );
        assert_eq!(
            tok.create_token_type_ids_from_sequences(2, Some(3)),
            vec![2, 0, 0, 0, 1, 1, 1, 1]
        );
    }

    #[test]
    fn test_special_tokens_mask() {
        let tok = make_tokenizer(&[]);
        assert_eq!(
            tok.get_special_tokens_mask(&[9, 8], Some(&[7]), false).unwrap(),
            vec![1, 0, 0, 1, 0, 1]
        );
        // Already-formatted ids are scanned for cls/sep.
        assert_eq!(
            tok.get_special_tokens_mask(&[2, 9, 3], None, true).unwrap(),
            vec![1, 0, 1]
        );
        assert!(tok
            .get_special_tokens_mask(&[2], Some(&[7]), true)
            .is_err());
    }

    #[test]
    fn test_offset_mapping_layout() {
        let tok = make_tokenizer(&[]);
        assert_eq!(
            tok.build_offset_mapping_with_special_tokens(&[(0, 2)], Some(&[(0, 3)])),
            vec![(0, 0), (0, 2), (0, 0), (0, 3), (0, 0)]
        );
    }

    #[test]
    fn test_convert_tokens_to_string() {
        let tok = make_tokenizer(&[]);
        let tokens: Vec<String> = ["hello", "##!", "i", "'m", "here", "."]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(tok.convert_tokens_to_string(&tokens), "hello! i'm here.");
    }

    #[test]
    fn test_replace_bytes_no_match_returns_original() {
        let buf = b"hello".to_vec();
        assert_eq!(replace_bytes_owned(buf, b"xyz", b"_"), b"hello".to_vec());
        assert_eq!(
            replace_bytes_owned(b"a b c".to_vec(), b" ", b"--"),
            b"a--b--c".to_vec()
        );
    }
}
