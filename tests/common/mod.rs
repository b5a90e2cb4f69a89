//! Shared fixtures for integration tests.

use wordpiece::{Tokenizer, TokenizerConfig, Vocab};

/// A small English-flavored vocabulary. Specials occupy ids 0..=4, then:
/// the=5, quick=6, brown=7, fox=8, jump=9, ##s=10, over=11, lazy=12,
/// dog=13, un=14, ##aff=15, ##able=16, cafe=17, ","=18, "."=19, "!"=20.
pub const ENGLISH_VOCAB: &[&str] = &[
    "<pad>", "<unk>", "<cls>", "<sep>", "<mask>", "the", "quick", "brown", "fox",
    "jump", "##s", "over", "lazy", "dog", "un", "##aff", "##able", "cafe", ",",
    ".", "!",
];

pub fn english_tokenizer() -> Tokenizer {
    Tokenizer::new(
        Vocab::from_tokens(ENGLISH_VOCAB.iter().copied()),
        TokenizerConfig::default(),
    )
    .expect("fixture vocabulary contains all special tokens")
}
