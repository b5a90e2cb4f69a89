//! Subword vocabulary: string ↔ id tables.
//!
//! Two tables, mirroring each other: a hash map for encode-side lookup and
//! a flat vector for decode-side lookup. Loaded once, immutable afterwards.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rustc_hash::FxHashMap;
use tracing::debug;

/// Token ID (the value returned to the caller).
pub type TokenId = u32;

/// A fixed subword vocabulary.
pub struct Vocab {
    /// Encode lookup: token string → id.
    token_to_id: FxHashMap<String, TokenId>,
    /// Decode table: id → token string (indexed by id).
    id_to_token: Vec<String>,
}

impl Vocab {
    /// Build from an ordered token list; position determines the id.
    ///
    /// Duplicate tokens keep their first id, matching the behavior of
    /// vocabulary files where later duplicates are unreachable.
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let id_to_token: Vec<String> = tokens.into_iter().map(Into::into).collect();
        let mut token_to_id =
            FxHashMap::with_capacity_and_hasher(id_to_token.len(), Default::default());
        for (id, token) in id_to_token.iter().enumerate() {
            token_to_id.entry(token.clone()).or_insert(id as TokenId);
        }
        Vocab {
            token_to_id,
            id_to_token,
        }
    }

    /// Load from a `vocab.txt` file: one token per line, line number = id.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read vocabulary file {}", path.display()))?;
        let vocab = Self::from_tokens(raw.lines().map(|line| line.trim_end_matches('\r')));
        debug!(
            path = %path.display(),
            vocab_size = vocab.len(),
            "loaded vocabulary"
        );
        Ok(vocab)
    }

    /// Look up a token string → id.
    #[inline]
    pub fn token_to_id(&self, token: &str) -> Option<TokenId> {
        self.token_to_id.get(token).copied()
    }

    /// Look up an id → token string.
    #[inline]
    pub fn id_to_token(&self, id: TokenId) -> Option<&str> {
        self.id_to_token.get(id as usize).map(String::as_str)
    }

    /// Whether the vocabulary contains `token`.
    #[inline]
    pub fn contains(&self, token: &str) -> bool {
        self.token_to_id.contains_key(token)
    }

    /// Number of distinct token strings.
    pub fn len(&self) -> usize {
        self.token_to_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.token_to_id.is_empty()
    }
}
