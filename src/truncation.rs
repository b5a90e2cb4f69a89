//! Length-budget truncation for sequence pairs.
//!
//! Shortens one or both id sequences by a removal count according to a
//! selectable strategy, returning the removed ("overflowing") tokens so a
//! caller can rebuild context around the cut.

use std::str::FromStr;

use crate::error::TokenizerError;
use crate::vocab::TokenId;

/// How to distribute removals across a sequence pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TruncationStrategy {
    /// Repeatedly drop one token from the end of whichever sequence is
    /// currently longer; ties drop from the first sequence. Only the first
    /// sequence's removals are reported as overflow.
    #[default]
    LongestFirst,
    /// Remove only from the end of the first sequence.
    OnlyFirst,
    /// Remove only from the end of the second sequence.
    OnlySecond,
    /// Never truncate; reaching this with tokens to remove is an error.
    DoNotTruncate,
}

impl FromStr for TruncationStrategy {
    type Err = TokenizerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "longest_first" => Ok(TruncationStrategy::LongestFirst),
            "only_first" => Ok(TruncationStrategy::OnlyFirst),
            "only_second" => Ok(TruncationStrategy::OnlySecond),
            "do_not_truncate" => Ok(TruncationStrategy::DoNotTruncate),
            other => Err(TokenizerError::UnknownTruncationStrategy(other.to_string())),
        }
    }
}

/// The outcome of a truncation: the kept sequences plus the overflow
/// window, in original token order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TruncationResult {
    pub ids: Vec<TokenId>,
    pub pair_ids: Option<Vec<TokenId>>,
    pub overflowing: Vec<TokenId>,
}

/// Remove `num_tokens_to_remove` tokens from `ids` / `pair_ids` per
/// `strategy`.
///
/// `stride` widens the overflow window with trailing tokens that were kept
/// (`LongestFirst`) or both removed and kept (`OnlyFirst` / `OnlySecond`),
/// so consecutive chunks can share context. A removal count of zero is a
/// no-op with empty overflow.
pub fn truncate_sequences(
    mut ids: Vec<TokenId>,
    mut pair_ids: Option<Vec<TokenId>>,
    num_tokens_to_remove: usize,
    strategy: TruncationStrategy,
    stride: usize,
) -> Result<TruncationResult, TokenizerError> {
    if num_tokens_to_remove == 0 {
        return Ok(TruncationResult {
            ids,
            pair_ids,
            overflowing: Vec::new(),
        });
    }

    let overflowing = match strategy {
        TruncationStrategy::LongestFirst => {
            let mut removed: Vec<TokenId> = Vec::new();
            for _ in 0..num_tokens_to_remove {
                let from_first = match &pair_ids {
                    None => true,
                    Some(pair) => ids.len() >= pair.len(),
                };
                if from_first {
                    if let Some(last) = ids.pop() {
                        removed.push(last);
                    }
                } else if let Some(pair) = pair_ids.as_mut() {
                    // Pair removals are dropped, not reported as overflow.
                    pair.pop();
                }
            }
            removed.reverse();

            // Look-back window: re-include up to `stride` trailing tokens
            // that were kept, ahead of the removed ones.
            let window_len = stride.min(ids.len());
            let mut overflowing = ids[ids.len() - window_len..].to_vec();
            overflowing.extend(removed);
            overflowing
        }
        TruncationStrategy::OnlyFirst => {
            if ids.len() <= num_tokens_to_remove {
                return Err(TokenizerError::TruncationImpossible {
                    strategy,
                    num_tokens_to_remove,
                    len: ids.len(),
                });
            }
            let window_len = (stride + num_tokens_to_remove).min(ids.len());
            let overflowing = ids[ids.len() - window_len..].to_vec();
            ids.truncate(ids.len() - num_tokens_to_remove);
            overflowing
        }
        TruncationStrategy::OnlySecond => {
            let pair = pair_ids.as_mut().ok_or_else(|| {
                TokenizerError::InvalidInput(
                    "only_second truncation requires a pair sequence".to_string(),
                )
            })?;
            if pair.len() <= num_tokens_to_remove {
                return Err(TokenizerError::TruncationImpossible {
                    strategy,
                    num_tokens_to_remove,
                    len: pair.len(),
                });
            }
            let window_len = (stride + num_tokens_to_remove).min(pair.len());
            let overflowing = pair[pair.len() - window_len..].to_vec();
            let keep = pair.len() - num_tokens_to_remove;
            pair.truncate(keep);
            overflowing
        }
        TruncationStrategy::DoNotTruncate => {
            return Err(TokenizerError::TruncationImpossible {
                strategy,
                num_tokens_to_remove,
                len: ids.len(),
            });
        }
    };

    Ok(TruncationResult {
        ids,
        pair_ids,
        overflowing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_when_nothing_to_remove() {
        let res = truncate_sequences(
            vec![1, 2, 3],
            Some(vec![4, 5]),
            0,
            TruncationStrategy::DoNotTruncate,
            0,
        )
        .unwrap();
        assert_eq!(res.ids, vec![1, 2, 3]);
        assert_eq!(res.pair_ids, Some(vec![4, 5]));
        assert!(res.overflowing.is_empty());
    }

    #[test]
    fn test_longest_first_single_sequence() {
        let res = truncate_sequences(
            vec![1, 2, 3, 4, 5],
            None,
            2,
            TruncationStrategy::LongestFirst,
            0,
        )
        .unwrap();
        assert_eq!(res.ids, vec![1, 2, 3]);
        assert_eq!(res.pair_ids, None);
        assert_eq!(res.overflowing, vec![4, 5]);
    }

    #[test]
    fn test_longest_first_alternates_and_ties_hit_first() {
        // Equal lengths: the tie removes from the first sequence, then the
        // pair is strictly longer and loses the next token.
        let res = truncate_sequences(
            vec![1, 2, 3],
            Some(vec![4, 5, 6]),
            2,
            TruncationStrategy::LongestFirst,
            0,
        )
        .unwrap();
        assert_eq!(res.ids, vec![1, 2]);
        assert_eq!(res.pair_ids, Some(vec![4, 5]));
        // Pair removals are not reported.
        assert_eq!(res.overflowing, vec![3]);
    }

    #[test]
    fn test_longest_first_conservation() {
        let ids: Vec<TokenId> = (0..7).collect();
        let pair: Vec<TokenId> = (10..14).collect();
        let removed = 5;
        let res = truncate_sequences(
            ids.clone(),
            Some(pair.clone()),
            removed,
            TruncationStrategy::LongestFirst,
            0,
        )
        .unwrap();
        let kept = res.ids.len() + res.pair_ids.as_ref().map_or(0, Vec::len);
        assert_eq!(kept + removed, ids.len() + pair.len());
    }

    #[test]
    fn test_longest_first_stride_reincludes_kept_tokens() {
        // Documented oddity: the stride window re-includes trailing tokens
        // that were NOT removed, ahead of the removed ones.
        let res = truncate_sequences(
            vec![1, 2, 3, 4, 5],
            None,
            2,
            TruncationStrategy::LongestFirst,
            2,
        )
        .unwrap();
        assert_eq!(res.ids, vec![1, 2, 3]);
        assert_eq!(res.overflowing, vec![2, 3, 4, 5]);
    }

    #[test]
    fn test_only_first() {
        let res = truncate_sequences(
            vec![1, 2, 3, 4, 5],
            Some(vec![9]),
            2,
            TruncationStrategy::OnlyFirst,
            1,
        )
        .unwrap();
        assert_eq!(res.ids, vec![1, 2, 3]);
        assert_eq!(res.pair_ids, Some(vec![9]));
        // Window over the ORIGINAL ids: stride + removed = 3 trailing.
        assert_eq!(res.overflowing, vec![3, 4, 5]);
    }

    #[test]
    fn test_only_first_too_short() {
        let err = truncate_sequences(
            vec![1, 2],
            None,
            2,
            TruncationStrategy::OnlyFirst,
            0,
        )
        .unwrap_err();
        assert!(matches!(err, TokenizerError::TruncationImpossible { .. }));
    }

    #[test]
    fn test_only_second() {
        let res = truncate_sequences(
            vec![1],
            Some(vec![4, 5, 6, 7]),
            2,
            TruncationStrategy::OnlySecond,
            0,
        )
        .unwrap();
        assert_eq!(res.ids, vec![1]);
        assert_eq!(res.pair_ids, Some(vec![4, 5]));
        assert_eq!(res.overflowing, vec![6, 7]);
    }

    #[test]
    fn test_only_second_requires_pair() {
        let err =
            truncate_sequences(vec![1, 2], None, 1, TruncationStrategy::OnlySecond, 0)
                .unwrap_err();
        assert!(matches!(err, TokenizerError::InvalidInput(_)));
    }

    #[test]
    fn test_do_not_truncate_is_fatal() {
        let err = truncate_sequences(
            vec![1, 2, 3],
            None,
            1,
            TruncationStrategy::DoNotTruncate,
            0,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            TokenizerError::TruncationImpossible {
                strategy: TruncationStrategy::DoNotTruncate,
                ..
            }
        ));
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!(
            "longest_first".parse::<TruncationStrategy>().unwrap(),
            TruncationStrategy::LongestFirst
        );
        assert_eq!(
            "do_not_truncate".parse::<TruncationStrategy>().unwrap(),
            TruncationStrategy::DoNotTruncate
        );
        let err = "nonsense".parse::<TruncationStrategy>().unwrap_err();
        assert!(matches!(
            err,
            TokenizerError::UnknownTruncationStrategy(_)
        ));
    }
}
