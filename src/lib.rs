//! WordPiece tokenization with offset rematching and sliding-window
//! encoding.
//!
//! The pipeline: basic tokenization (cleaning, lowercasing, accent
//! stripping, punctuation and CJK splitting) produces coarse words,
//! greedy longest-match-first WordPiece segmentation splits them into
//! vocabulary subwords, and the encoding layer lays out sequence pairs
//! with special tokens, truncates to a length budget, and pads. Because
//! normalization is lossy, a rematcher replays it to map every token back
//! to its character span in the original text; long pairs can be encoded
//! as overlapping stride windows that each carry per-token offsets.

pub mod encode;
pub mod error;
pub mod normalizer;
pub mod offsets;
pub mod tokenizer;
pub mod truncation;
pub mod vocab;
pub mod wordpiece;

pub use encode::{EncodeInput, EncodeOptions, Encoding, TextInput};
pub use error::TokenizerError;
pub use normalizer::BasicTokenizer;
pub use offsets::OffsetSpan;
pub use tokenizer::{PaddingSide, SpecialTokens, Tokenize, Tokenizer, TokenizerConfig};
pub use truncation::{truncate_sequences, TruncationResult, TruncationStrategy};
pub use vocab::{TokenId, Vocab};
pub use wordpiece::Wordpiece;
