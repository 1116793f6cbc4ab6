//! Text normalization shared by the tokenizer adapter and the aligner.
//!
//! Character matching during alignment only works when the raw side is folded
//! exactly the way the tokenizer input was, so both go through
//! [`TextNormalizer::fold`].

use crate::error::{FeatureError, Result};
use serde::{Deserialize, Serialize};
use tokenizers::normalizers::BertNormalizer;
use tokenizers::{NormalizedString, Normalizer};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextNormalizer {
    lowercase: bool,
}

impl TextNormalizer {
    #[must_use]
    pub const fn new(lowercase: bool) -> Self {
        Self { lowercase }
    }

    #[must_use]
    pub const fn lowercase(&self) -> bool {
        self.lowercase
    }

    /// Full preprocessing applied to text before subword tokenization:
    /// whitespace runs collapse to one space, LaTeX-style quotes become `"`,
    /// then [`fold`](Self::fold).
    pub fn normalize(&self, text: &str) -> Result<String> {
        let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
        let quoted = collapsed.replace("``", "\"").replace("''", "\"");
        self.fold(&quoted)
    }

    /// Case and unicode folding only (NFKD, accent stripping, optional
    /// lowercasing). Whitespace is left untouched.
    pub fn fold(&self, text: &str) -> Result<String> {
        let mut normalized = NormalizedString::from(text);
        normalized.nfkd();
        BertNormalizer::new(false, false, Some(true), self.lowercase)
            .normalize(&mut normalized)
            .map_err(|e| FeatureError::tokenizer(format!("normalization failed: {e}")))?;
        Ok(normalized.get().to_string())
    }

    /// Fold a single character. `None` when folding removes the character or
    /// expands it into several (it can then never match a tokenized char).
    pub fn fold_char(&self, c: char) -> Result<Option<char>> {
        let mut buf = [0u8; 4];
        let folded = self.fold(c.encode_utf8(&mut buf))?;
        let mut chars = folded.chars();
        Ok(match (chars.next(), chars.next()) {
            (Some(single), None) => Some(single),
            _ => None,
        })
    }

    pub fn fold_chars(&self, chars: &[char]) -> Result<Vec<Option<char>>> {
        chars.iter().map(|&c| self.fold_char(c)).collect()
    }
}
