//! Single-example and batch encoding, including stride-based sliding
//! windows over long sequence pairs.
//!
//! The batch encoder resolves each item's inputs to id sequences, then
//! either emits one encoded example (truncate once, pad once) or — when a
//! stride is requested for a pair input — a run of overlapping windows
//! that each carry the full first sequence plus a slice of the pair,
//! tagged with the batch index they came from.

use crate::error::TokenizerError;
use crate::offsets::OffsetSpan;
use crate::tokenizer::{PaddingSide, Tokenizer};
use crate::truncation::{truncate_sequences, TruncationStrategy};
use crate::vocab::TokenId;

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// One text input, in any of the three accepted shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextInput {
    /// Raw text, to be tokenized.
    Raw(String),
    /// Pre-tokenized strings, to be converted to ids.
    Tokens(Vec<String>),
    /// Pre-converted ids, used as-is.
    Ids(Vec<TokenId>),
}

impl From<&str> for TextInput {
    fn from(text: &str) -> Self {
        TextInput::Raw(text.to_string())
    }
}

impl From<String> for TextInput {
    fn from(text: String) -> Self {
        TextInput::Raw(text)
    }
}

impl From<Vec<String>> for TextInput {
    fn from(tokens: Vec<String>) -> Self {
        TextInput::Tokens(tokens)
    }
}

impl From<Vec<TokenId>> for TextInput {
    fn from(ids: Vec<TokenId>) -> Self {
        TextInput::Ids(ids)
    }
}

/// One batch item: a text and an optional pair text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeInput {
    pub text: TextInput,
    pub pair: Option<TextInput>,
}

impl EncodeInput {
    pub fn single(text: impl Into<TextInput>) -> Self {
        EncodeInput {
            text: text.into(),
            pair: None,
        }
    }

    pub fn pair(text: impl Into<TextInput>, pair: impl Into<TextInput>) -> Self {
        EncodeInput {
            text: text.into(),
            pair: Some(pair.into()),
        }
    }
}

impl<T: Into<TextInput>> From<T> for EncodeInput {
    fn from(text: T) -> Self {
        EncodeInput::single(text)
    }
}

// ---------------------------------------------------------------------------
// Options and output record
// ---------------------------------------------------------------------------

/// Encoding configuration with documented defaults, passed by reference
/// and never mutated.
#[derive(Debug, Clone)]
pub struct EncodeOptions {
    /// Total length budget including special tokens. `None` disables
    /// truncation and padding. Default `Some(512)`.
    pub max_seq_len: Option<usize>,
    /// Sliding-window overlap in pair tokens; `0` disables windowing.
    /// Also widens the truncation overflow window. Default `0`.
    pub stride: usize,
    /// Pad every example up to `max_seq_len`. Default `false`.
    pub pad_to_max_seq_len: bool,
    /// How to shorten over-budget inputs. Default longest-first.
    pub truncation_strategy: TruncationStrategy,
    /// Include `position_ids`. Default `false`.
    pub return_position_ids: bool,
    /// Include `token_type_ids`. Default `true`.
    pub return_token_type_ids: bool,
    /// Include `attention_mask`. Default `true`.
    pub return_attention_mask: bool,
    /// Record the pre-padding length in `seq_len`. Default `false`.
    pub return_length: bool,
    /// Include removed tokens and the removal count. Default `false`.
    pub return_overflowing_tokens: bool,
    /// Include `special_tokens_mask`. Default `false`.
    pub return_special_tokens_mask: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        EncodeOptions {
            max_seq_len: Some(512),
            stride: 0,
            pad_to_max_seq_len: false,
            truncation_strategy: TruncationStrategy::default(),
            return_position_ids: false,
            return_token_type_ids: true,
            return_attention_mask: true,
            return_length: false,
            return_overflowing_tokens: false,
            return_special_tokens_mask: false,
        }
    }
}

/// One model-ready encoded example.
///
/// Every present sequence-valued field has the same length as `input_ids`
/// once special tokens and padding are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Encoding {
    pub input_ids: Vec<TokenId>,
    pub token_type_ids: Option<Vec<u32>>,
    pub attention_mask: Option<Vec<u32>>,
    pub special_tokens_mask: Option<Vec<u32>>,
    pub position_ids: Option<Vec<u32>>,
    /// Per-token original-text character spans; `(0, 0)` for inserted
    /// special tokens and padding.
    pub offset_mapping: Option<Vec<OffsetSpan>>,
    /// Tokens removed by truncation (plus the stride look-back window).
    pub overflowing_tokens: Option<Vec<TokenId>>,
    /// How many tokens truncation removed.
    pub num_truncated: Option<usize>,
    /// Length before padding.
    pub seq_len: Option<usize>,
    /// Index of the batch item this example came from.
    pub overflow_to_sample: Option<usize>,
}

// ---------------------------------------------------------------------------
// Encoding engine
// ---------------------------------------------------------------------------

impl Tokenizer {
    /// Encode one text (and optional pair) into a single example.
    pub fn encode(
        &self,
        input: impl Into<EncodeInput>,
        options: &EncodeOptions,
    ) -> Result<Encoding, TokenizerError> {
        let EncodeInput { text, pair } = input.into();
        let first_ids = self.resolve_ids(text)?;
        let pair_ids = pair.map(|p| self.resolve_ids(p)).transpose()?;
        self.encode_resolved(first_ids, pair_ids, options)
    }

    /// Encode a batch, producing one or more examples per item.
    ///
    /// With `stride > 0` and a pair input, an item is split into
    /// overlapping windows (see [`EncodeOptions::stride`]); each window
    /// records the item index in
    /// [`overflow_to_sample`](Encoding::overflow_to_sample). Results are
    /// in input order; the first item error aborts the whole batch.
    pub fn batch_encode(
        &self,
        items: Vec<EncodeInput>,
        options: &EncodeOptions,
    ) -> Result<Vec<Encoding>, TokenizerError> {
        let mut out = Vec::with_capacity(items.len());
        for (example_id, item) in items.into_iter().enumerate() {
            let EncodeInput { text, pair } = item;
            match pair {
                Some(pair) if options.stride > 0 => {
                    self.encode_windows(example_id, text, pair, options, &mut out)?;
                }
                pair => {
                    let first_ids = self.resolve_ids(text)?;
                    let pair_ids = pair.map(|p| self.resolve_ids(p)).transpose()?;
                    out.push(self.encode_resolved(first_ids, pair_ids, options)?);
                }
            }
        }
        Ok(out)
    }

    /// Resolve one input shape to an id sequence.
    fn resolve_ids(&self, input: TextInput) -> Result<Vec<TokenId>, TokenizerError> {
        match input {
            TextInput::Raw(text) => Ok(self.convert_tokens_to_ids(&self.tokenize(&text))),
            TextInput::Tokens(tokens) => Ok(self.convert_tokens_to_ids(&tokens)),
            TextInput::Ids(ids) => Ok(ids),
        }
    }

    /// The non-windowed path: truncate once, lay out, pad once.
    fn encode_resolved(
        &self,
        first_ids: Vec<TokenId>,
        pair_ids: Option<Vec<TokenId>>,
        options: &EncodeOptions,
    ) -> Result<Encoding, TokenizerError> {
        let mut ids = first_ids;
        let mut pair_ids = pair_ids;
        let mut encoding = Encoding::default();

        if let Some(max_seq_len) = options.max_seq_len {
            let total = ids.len()
                + pair_ids.as_ref().map_or(0, Vec::len)
                + self.num_special_tokens_to_add(pair_ids.is_some());
            if total > max_seq_len {
                let num_to_remove = total - max_seq_len;
                let result = truncate_sequences(
                    ids,
                    pair_ids,
                    num_to_remove,
                    options.truncation_strategy,
                    options.stride,
                )?;
                ids = result.ids;
                pair_ids = result.pair_ids;
                if options.return_overflowing_tokens {
                    encoding.overflowing_tokens = Some(result.overflowing);
                    encoding.num_truncated = Some(num_to_remove);
                }
            }
        }

        encoding.input_ids =
            self.build_inputs_with_special_tokens(&ids, pair_ids.as_deref());
        if options.return_token_type_ids {
            encoding.token_type_ids = Some(self.create_token_type_ids_from_sequences(
                ids.len(),
                pair_ids.as_ref().map(Vec::len),
            ));
        }
        if options.return_special_tokens_mask {
            encoding.special_tokens_mask =
                Some(self.get_special_tokens_mask(&ids, pair_ids.as_deref(), false)?);
        }
        if options.return_length {
            encoding.seq_len = Some(encoding.input_ids.len());
        }

        self.pad_and_finalize(&mut encoding, options);
        Ok(encoding)
    }

    /// The sliding-window path for one batch item.
    ///
    /// Every window shares the full first sequence; consecutive windows
    /// overlap by exactly `stride` pair tokens (the last may overlap more,
    /// taking whatever remains), and together they cover the pair with no
    /// gaps. Offsets are rematched once per item and sliced per window.
    fn encode_windows(
        &self,
        example_id: usize,
        text: TextInput,
        pair: TextInput,
        options: &EncodeOptions,
        out: &mut Vec<Encoding>,
    ) -> Result<(), TokenizerError> {
        let (text, pair_text) = match (text, pair) {
            (TextInput::Raw(text), TextInput::Raw(pair)) => (text, pair),
            _ => {
                return Err(TokenizerError::InvalidInput(
                    "sliding-window encoding requires raw text inputs; \
                     offsets cannot be derived from pre-tokenized input"
                        .to_string(),
                ))
            }
        };
        let max_seq_len = options.max_seq_len.ok_or_else(|| {
            TokenizerError::InvalidInput(
                "sliding-window encoding requires max_seq_len".to_string(),
            )
        })?;

        let first_ids = self.convert_tokens_to_ids(&self.tokenize(&text));
        let overhead = self.num_special_tokens_to_add(true);

        // The window must make forward progress: it advances by
        // `max_len_for_pair - stride` pair tokens per step.
        let max_len_for_pair = max_seq_len
            .checked_sub(first_ids.len() + overhead)
            .filter(|&budget| budget > options.stride)
            .ok_or(TokenizerError::WindowTooSmall {
                max_len_for_pair: max_seq_len
                    .saturating_sub(first_ids.len() + overhead),
                stride: options.stride,
            })?;

        // Offset tables are fixed across windows; compute them once.
        let mapping = self.rematch(&text)?;
        let pair_mapping = self.rematch(&pair_text)?;
        let second_ids = self.convert_tokens_to_ids(&self.tokenize(&pair_text));

        let mut pair_window = second_ids.as_slice();
        let mut pair_map_window = pair_mapping.as_slice();
        loop {
            let fits = pair_window.len() <= max_len_for_pair;
            let (pair_ids, pair_map) = if fits {
                (pair_window, pair_map_window)
            } else {
                (
                    &pair_window[..max_len_for_pair],
                    &pair_map_window[..max_len_for_pair],
                )
            };

            let mut encoding = Encoding {
                input_ids: self.build_inputs_with_special_tokens(&first_ids, Some(pair_ids)),
                ..Encoding::default()
            };
            if options.return_token_type_ids {
                encoding.token_type_ids = Some(self.create_token_type_ids_from_sequences(
                    first_ids.len(),
                    Some(pair_ids.len()),
                ));
            }
            if options.return_special_tokens_mask {
                encoding.special_tokens_mask =
                    Some(self.get_special_tokens_mask(&first_ids, Some(pair_ids), false)?);
            }
            if options.return_length {
                encoding.seq_len = Some(encoding.input_ids.len());
            }
            encoding.offset_mapping = Some(
                self.build_offset_mapping_with_special_tokens(&mapping, Some(pair_map)),
            );

            self.pad_and_finalize(&mut encoding, options);
            encoding.overflow_to_sample = Some(example_id);
            out.push(encoding);

            if fits {
                return Ok(());
            }
            let step = max_len_for_pair - options.stride;
            pair_window = &pair_window[step..];
            pair_map_window = &pair_map_window[step..];
        }
    }

    /// Apply padding per the configured side, then the fields that span
    /// the final (padded) length.
    fn pad_and_finalize(&self, encoding: &mut Encoding, options: &EncodeOptions) {
        let len = encoding.input_ids.len();
        let target = options.max_seq_len.filter(|&max| {
            options.pad_to_max_seq_len && len < max
        });

        if let Some(max_seq_len) = target {
            let difference = max_seq_len - len;
            let pad_id = self.special_tokens().pad_id;
            match self.padding_side() {
                PaddingSide::Right => {
                    if options.return_attention_mask {
                        let mut mask = vec![1; len];
                        mask.extend(std::iter::repeat(0).take(difference));
                        encoding.attention_mask = Some(mask);
                    }
                    if let Some(type_ids) = encoding.token_type_ids.as_mut() {
                        type_ids.extend(
                            std::iter::repeat(self.pad_token_type_id()).take(difference),
                        );
                    }
                    if let Some(mask) = encoding.special_tokens_mask.as_mut() {
                        mask.extend(std::iter::repeat(1).take(difference));
                    }
                    if let Some(offsets) = encoding.offset_mapping.as_mut() {
                        offsets.extend(std::iter::repeat((0, 0)).take(difference));
                    }
                    encoding
                        .input_ids
                        .extend(std::iter::repeat(pad_id).take(difference));
                }
                PaddingSide::Left => {
                    if options.return_attention_mask {
                        let mut mask = vec![0; difference];
                        mask.extend(std::iter::repeat(1).take(len));
                        encoding.attention_mask = Some(mask);
                    }
                    if let Some(type_ids) = encoding.token_type_ids.as_mut() {
                        prepend(type_ids, self.pad_token_type_id(), difference);
                    }
                    if let Some(mask) = encoding.special_tokens_mask.as_mut() {
                        prepend(mask, 1, difference);
                    }
                    if let Some(offsets) = encoding.offset_mapping.as_mut() {
                        prepend(offsets, (0, 0), difference);
                    }
                    prepend(&mut encoding.input_ids, pad_id, difference);
                }
            }
        } else if options.return_attention_mask {
            encoding.attention_mask = Some(vec![1; len]);
        }

        if options.return_position_ids {
            encoding.position_ids = Some((0..encoding.input_ids.len() as u32).collect());
        }
    }
}

/// Insert `count` copies of `value` at the front of `vec`.
fn prepend<T: Copy>(vec: &mut Vec<T>, value: T, count: usize) {
    vec.splice(0..0, std::iter::repeat(value).take(count));
}
