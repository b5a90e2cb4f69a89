//! Typed errors for the tokenizer pipeline.
//!
//! Every error here is fatal for the unit of work that produced it: the
//! pipeline is pure computation, so there are no transient failures and
//! nothing is retried. Batch encoding aborts on the first item error.

use thiserror::Error;

use crate::truncation::TruncationStrategy;

/// Errors surfaced by encoding, truncation, and offset rematching.
#[derive(Debug, Error)]
pub enum TokenizerError {
    /// The input was not one of the accepted shapes, or a requested
    /// operation is impossible for the given shape (e.g. sliding-window
    /// encoding over pre-converted ids, which carry no text to rematch).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The selected strategy cannot remove the requested number of tokens.
    ///
    /// Also raised when [`TruncationStrategy::DoNotTruncate`] is selected
    /// but the sequence exceeds the length budget.
    #[error(
        "cannot remove {num_tokens_to_remove} token(s) from a sequence of \
         length {len} with strategy {strategy:?}"
    )]
    TruncationImpossible {
        strategy: TruncationStrategy,
        num_tokens_to_remove: usize,
        len: usize,
    },

    /// A strategy string did not name a known truncation strategy.
    #[error(
        "unknown truncation strategy {0:?}; expected one of \
         \"longest_first\", \"only_first\", \"only_second\", \"do_not_truncate\""
    )]
    UnknownTruncationStrategy(String),

    /// A token produced by the segmenter could not be located in the
    /// normalized text. This indicates the normalizer and the segmenter
    /// disagree about the text and the offsets would be meaningless.
    #[error(
        "token {token:?} not found in normalized text at or after \
         byte offset {offset}"
    )]
    OffsetRematchInconsistency { token: String, offset: usize },

    /// The sliding-window length budget leaves no room to advance.
    ///
    /// The pair window moves by `max_len_for_pair - stride` tokens per
    /// step, so `max_len_for_pair` must exceed `stride`.
    #[error(
        "window of {max_len_for_pair} pair token(s) cannot advance with \
         stride {stride}; increase max_seq_len or shorten the first sequence"
    )]
    WindowTooSmall {
        max_len_for_pair: usize,
        stride: usize,
    },
}
