use crate::align::{AlignmentMap, CharTokenAligner};
use crate::assemble::FeatureAssembler;
use crate::config::ConverterConfig;
use crate::error::{FeatureError, Result};
use crate::resolve::IndexResolver;
use crate::tokenizer::{SpecialTokens, SubwordTokenizer};
use crate::types::{Feature, RawExample};
use crate::window::SpanWindower;
use std::sync::atomic::{AtomicU64, Ordering};

/// First id handed out by a default [`FeatureIdCounter`]
pub const DEFAULT_FEATURE_ID_BASE: u64 = 1_000_000_000;

/// Whether gold answers are turned into training labels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionMode {
    Training,
    Inference,
}

impl ConversionMode {
    #[must_use]
    pub const fn is_training(self) -> bool {
        matches!(self, Self::Training)
    }
}

/// Source of unique feature ids.
///
/// Owned by the caller and shared by reference, so independent runs never
/// interfere while parallel workers of one run still get unique ids.
#[derive(Debug)]
pub struct FeatureIdCounter {
    next: AtomicU64,
}

impl Default for FeatureIdCounter {
    fn default() -> Self {
        Self::new(DEFAULT_FEATURE_ID_BASE)
    }
}

impl FeatureIdCounter {
    #[must_use]
    pub const fn new(base: u64) -> Self {
        Self {
            next: AtomicU64::new(base),
        }
    }

    /// Take the next id
    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// Id the next call to [`next_id`](Self::next_id) returns
    #[must_use]
    pub fn peek(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

/// Features of one example
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub features: Vec<Feature>,
    /// Raw and tokenized paragraph could not be aligned reliably
    pub alignment_degraded: bool,
}

/// Paragraph tokens with their char spans in the reconstructed text
struct TokenizedParagraph {
    tokens: Vec<String>,
    /// Reconstructed char → token
    char_to_token: Vec<usize>,
    token_start: Vec<usize>,
    token_end: Vec<usize>,
    /// Tokens concatenated, word-boundary marker replaced by a space
    text: Vec<char>,
}

impl TokenizedParagraph {
    fn new(tokens: Vec<String>, boundary: char) -> Self {
        let mut char_to_token = Vec::new();
        let mut token_start = Vec::with_capacity(tokens.len());
        let mut token_end = Vec::with_capacity(tokens.len());
        let mut text = Vec::new();

        for (idx, token) in tokens.iter().enumerate() {
            token_start.push(text.len());
            for c in token.chars() {
                text.push(if c == boundary { ' ' } else { c });
                char_to_token.push(idx);
            }
            token_end.push(text.len().saturating_sub(1));
        }

        Self {
            tokens,
            char_to_token,
            token_start,
            token_end,
            text,
        }
    }
}

/// Turns one [`RawExample`] into one feature per paragraph window
pub struct ExampleConverter<T> {
    config: ConverterConfig,
    tokenizer: T,
    aligner: CharTokenAligner,
    assembler: FeatureAssembler,
}

impl<T: SubwordTokenizer> ExampleConverter<T> {
    pub fn new(config: ConverterConfig, tokenizer: T) -> Result<Self> {
        config.validate().map_err(FeatureError::invalid_config)?;
        if tokenizer.normalizer().lowercase() != config.lowercase {
            return Err(FeatureError::invalid_config(format!(
                "tokenizer lowercase={} disagrees with config lowercase={}",
                tokenizer.normalizer().lowercase(),
                config.lowercase
            )));
        }

        let special = SpecialTokens::from_tokenizer(&tokenizer)?;
        let aligner = CharTokenAligner::new(config.alignment.clone());
        let assembler =
            FeatureAssembler::new(config.max_seq_length, config.max_query_length, special);

        Ok(Self {
            config,
            tokenizer,
            aligner,
            assembler,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &ConverterConfig {
        &self.config
    }

    #[must_use]
    pub const fn tokenizer(&self) -> &T {
        &self.tokenizer
    }

    /// Convert one example; every emitted feature takes one id from `ids`
    pub fn convert(
        &self,
        example: &RawExample,
        mode: ConversionMode,
        ids: &FeatureIdCounter,
    ) -> Result<Conversion> {
        let mut query_tokens = self.tokenizer.tokenize(&example.question)?;
        query_tokens.truncate(self.config.max_query_length);
        let query_ids = self.tokenizer.tokens_to_ids(&query_tokens);

        let paragraph = TokenizedParagraph::new(
            self.tokenizer.tokenize(&example.paragraph)?,
            self.tokenizer.word_boundary(),
        );
        if paragraph.tokens.is_empty() {
            log::warn!("example '{}' has an empty paragraph, no features", example.id);
            return Ok(Conversion {
                features: Vec::new(),
                alignment_degraded: false,
            });
        }
        let paragraph_ids = self.tokenizer.tokens_to_ids(&paragraph.tokens);

        let raw_chars: Vec<char> = example.paragraph.chars().collect();
        let folded = self.tokenizer.normalizer().fold_chars(&raw_chars)?;
        let alignment = self.aligner.align(&folded, &paragraph.text);
        if alignment.is_degraded() {
            log::warn!(
                "raw and tokenized paragraph mismatch for example '{}' ({} of {} chars aligned)",
                example.id,
                alignment.matched(),
                alignment.raw_len()
            );
        }

        let (raw_starts, raw_ends) = token_raw_bounds(&paragraph, &alignment)?;

        let gold = if mode.is_training() && !example.is_impossible {
            Some(self.gold_token_span(example, &paragraph, &alignment)?)
        } else {
            None
        };

        let capacity = self.config.window_capacity(query_tokens.len());
        let plan = SpanWindower::new(capacity, self.config.doc_stride)?.plan(paragraph.tokens.len());

        let mut features = Vec::with_capacity(plan.len());
        for (span_idx, span) in plan.spans().iter().enumerate() {
            let window = self
                .assembler
                .assemble(&paragraph_ids[span.start..span.end()], &query_ids)?;

            let labels = mode.is_training().then(|| {
                self.assembler
                    .labels(span, gold, window.cls_index, example.is_impossible)
            });

            let feature = Feature {
                // numbered once every window is valid
                unique_id: 0,
                example_id: example.id.clone(),
                doc_span_index: span_idx,
                input_ids: window.input_ids,
                input_mask: window.input_mask,
                segment_ids: window.segment_ids,
                p_mask: window.p_mask,
                cls_index: window.cls_index,
                paragraph_len: window.paragraph_len,
                token_to_raw_start: raw_starts[span.start..span.end()].to_vec(),
                token_to_raw_end: raw_ends[span.start..span.end()].to_vec(),
                token_is_max_context: (span.start..span.end())
                    .map(|token| plan.is_max_context(span_idx, token))
                    .collect(),
                labels,
            };
            feature.validate_shape(self.config.max_seq_length)?;
            features.push(feature);
        }

        for feature in &mut features {
            feature.unique_id = ids.next_id();
            log::trace!(
                "feature {} of '{}': span {}, labels {:?}",
                feature.unique_id,
                example.id,
                feature.doc_span_index,
                feature.labels
            );
        }

        Ok(Conversion {
            features,
            alignment_degraded: alignment.is_degraded(),
        })
    }

    /// Gold answer in paragraph token coordinates (inclusive)
    fn gold_token_span(
        &self,
        example: &RawExample,
        paragraph: &TokenizedParagraph,
        alignment: &AlignmentMap,
    ) -> Result<(usize, usize)> {
        let answer = example.answer.as_ref().ok_or_else(|| {
            FeatureError::malformed(&example.id, "training example without a gold answer")
        })?;
        let raw_end = answer
            .end()
            .ok_or_else(|| FeatureError::malformed(&example.id, "empty gold answer text"))?;
        if raw_end >= alignment.raw_len() {
            return Err(FeatureError::malformed(
                &example.id,
                format!(
                    "answer chars {}..={raw_end} exceed paragraph length {}",
                    answer.start,
                    alignment.raw_len()
                ),
            ));
        }

        let resolver = IndexResolver::new(alignment.raw_to_tok(), None);
        let tok_start = resolver.start(answer.start)?;
        let tok_end = resolver.end(raw_end)?;
        let token_at = |pos: usize| {
            paragraph
                .char_to_token
                .get(pos)
                .copied()
                .ok_or(FeatureError::UnanchoredIndex {
                    position: pos,
                    len: paragraph.char_to_token.len(),
                })
        };
        let (start, end) = (token_at(tok_start)?, token_at(tok_end)?);

        if start > end {
            return Err(FeatureError::InvertedAnswerSpan {
                example_id: example.id.clone(),
                start,
                end,
            });
        }
        Ok((start, end))
    }
}

/// First/last raw char of every paragraph token
fn token_raw_bounds(
    paragraph: &TokenizedParagraph,
    alignment: &AlignmentMap,
) -> Result<(Vec<usize>, Vec<usize>)> {
    let resolver = IndexResolver::new(alignment.tok_to_raw(), Some(alignment.raw_len()));
    let starts = paragraph
        .token_start
        .iter()
        .map(|&pos| resolver.start(pos))
        .collect::<Result<Vec<_>>>()?;
    let ends = paragraph
        .token_end
        .iter()
        .map(|&pos| resolver.end(pos))
        .collect::<Result<Vec<_>>>()?;
    Ok((starts, ends))
}
