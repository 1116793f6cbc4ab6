use crate::error::{FeatureError, Result};
use crate::normalize::TextNormalizer;
use std::path::Path;

/// Word-boundary marker used by SentencePiece-style vocabularies
pub const WORD_BOUNDARY: char = '\u{2581}';

pub const SEP_TOKEN: &str = "<sep>";
pub const CLS_TOKEN: &str = "<cls>";
pub const PAD_TOKEN: &str = "<pad>";
pub const UNK_TOKEN: &str = "<unk>";

/// Subword tokenizer capability consumed by the converter.
///
/// Implementations must run their input through [`normalizer`](Self::normalizer)
/// so that the aligner folds raw characters the same way.
pub trait SubwordTokenizer {
    /// Split text into ordered subword tokens
    fn tokenize(&self, text: &str) -> Result<Vec<String>>;

    /// Vocabulary id of a token; unknown tokens map to the unknown id
    fn token_to_id(&self, token: &str) -> u32;

    fn id_to_token(&self, id: u32) -> Option<String>;

    /// Normalization applied by [`tokenize`](Self::tokenize)
    fn normalizer(&self) -> TextNormalizer;

    fn word_boundary(&self) -> char {
        WORD_BOUNDARY
    }

    fn encode(&self, text: &str) -> Result<Vec<u32>> {
        Ok(self.tokens_to_ids(&self.tokenize(text)?))
    }

    fn tokens_to_ids(&self, tokens: &[String]) -> Vec<u32> {
        tokens.iter().map(|t| self.token_to_id(t)).collect()
    }

    fn ids_to_tokens(&self, ids: &[u32]) -> Vec<Option<String>> {
        ids.iter().map(|&id| self.id_to_token(id)).collect()
    }
}

/// Ids of the marker tokens placed around every window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialTokens {
    pub sep: u32,
    pub cls: u32,
    pub pad: u32,
}

impl Default for SpecialTokens {
    /// XLNet vocabulary layout
    fn default() -> Self {
        Self {
            sep: 4,
            cls: 3,
            pad: 5,
        }
    }
}

impl SpecialTokens {
    /// Look the markers up in the tokenizer vocabulary.
    ///
    /// A marker counts as present only when its id maps back to the same
    /// token; vocabularies that silently map it to the unknown id are
    /// rejected.
    pub fn from_tokenizer<T: SubwordTokenizer + ?Sized>(tokenizer: &T) -> Result<Self> {
        let lookup = |token: &str| {
            let id = tokenizer.token_to_id(token);
            if tokenizer.id_to_token(id).as_deref() == Some(token) {
                Ok(id)
            } else {
                Err(FeatureError::invalid_config(format!(
                    "tokenizer vocabulary has no '{token}' marker"
                )))
            }
        };
        Ok(Self {
            sep: lookup(SEP_TOKEN)?,
            cls: lookup(CLS_TOKEN)?,
            pad: lookup(PAD_TOKEN)?,
        })
    }
}

/// [`SubwordTokenizer`] backed by a Hugging Face `tokenizer.json`
/// (SentencePiece models exported with a metaspace pre-tokenizer).
pub struct HfTokenizer {
    inner: tokenizers::Tokenizer,
    normalizer: TextNormalizer,
    unk_id: u32,
}

impl HfTokenizer {
    pub fn from_file(path: impl AsRef<Path>, lowercase: bool) -> Result<Self> {
        let path = path.as_ref();
        let inner = tokenizers::Tokenizer::from_file(path).map_err(|e| {
            FeatureError::tokenizer(format!(
                "cannot load tokenizer from '{}': {e}",
                path.display()
            ))
        })?;
        Ok(Self::from_tokenizer(inner, lowercase))
    }

    #[must_use]
    pub fn from_tokenizer(inner: tokenizers::Tokenizer, lowercase: bool) -> Self {
        let unk_id = inner.token_to_id(UNK_TOKEN).unwrap_or(0);
        Self {
            inner,
            normalizer: TextNormalizer::new(lowercase),
            unk_id,
        }
    }

    #[must_use]
    pub fn vocab_size(&self) -> usize {
        self.inner.get_vocab_size(true)
    }
}

impl SubwordTokenizer for HfTokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<String>> {
        let normalized = self.normalizer.normalize(text)?;
        if normalized.is_empty() {
            return Ok(Vec::new());
        }
        let encoding = self
            .inner
            .encode(normalized.as_str(), false)
            .map_err(|e| FeatureError::tokenizer(format!("tokenization failed: {e}")))?;
        Ok(encoding.get_tokens().to_vec())
    }

    fn token_to_id(&self, token: &str) -> u32 {
        self.inner.token_to_id(token).unwrap_or(self.unk_id)
    }

    fn id_to_token(&self, id: u32) -> Option<String> {
        self.inner.id_to_token(id)
    }

    fn normalizer(&self) -> TextNormalizer {
        self.normalizer
    }
}
