//! # QA Span Features
//!
//! Turns question/paragraph/answer triples into fixed-length token windows
//! for span-extraction models.
//!
//! ## Philosophy
//!
//! Subword tokenization is lossy (case folding, whitespace collapsing,
//! unicode normalization), so the raw paragraph and the text implied by its
//! tokens disagree. Every feature keeps a faithful mapping back to raw
//! characters so predicted token positions can be turned into raw answers.
//!
//! ## Architecture
//!
//! ```text
//! RawExample
//!     │
//!     ├──> Tokenize question + paragraph (shared TextNormalizer)
//!     │
//!     ├──> CharTokenAligner: banded LCS raw ↔ reconstructed chars
//!     │
//!     ├──> IndexResolver: interpolate unanchored offsets
//!     │    ├─> token → raw char bounds
//!     │    └─> gold answer chars → paragraph tokens
//!     │
//!     ├──> SpanWindower: overlapping windows + max-context ownership
//!     │
//!     └──> FeatureAssembler: one fixed-length Feature per window
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use qa_span_features::{
//!     ConversionMode, ConverterConfig, ExampleConverter, FeatureIdCounter, HfTokenizer,
//!     RawExample,
//! };
//!
//! # fn main() -> qa_span_features::Result<()> {
//! let tokenizer = HfTokenizer::from_file("spiece/tokenizer.json", false)?;
//! let converter = ExampleConverter::new(ConverterConfig::default(), tokenizer)?;
//! let ids = FeatureIdCounter::default();
//!
//! let example = RawExample::new("q1", "What did Mary have?", "Mary had a lamb")
//!     .with_answer("a lamb", 9);
//! let conversion = converter.convert(&example, ConversionMode::Training, &ids)?;
//! for feature in &conversion.features {
//!     println!("{} -> {:?}", feature.unique_id, feature.labels);
//! }
//! # Ok(())
//! # }
//! ```

mod align;
mod assemble;
mod batch;
mod config;
mod converter;
mod error;
mod normalize;
mod resolve;
mod sink;
mod tokenizer;
mod types;
mod window;

pub use align::{AlignmentMap, CharTokenAligner};
pub use assemble::{AssembledWindow, FeatureAssembler, SegmentId};
pub use batch::{BatchConverter, BatchOptions, BatchReport};
pub use config::{AlignmentConfig, ConverterConfig, RESERVED_MARKERS};
pub use converter::{
    Conversion, ConversionMode, ExampleConverter, FeatureIdCounter, DEFAULT_FEATURE_ID_BASE,
};
pub use error::{FeatureError, Result};
pub use normalize::TextNormalizer;
pub use resolve::{IndexResolver, Lookup};
pub use sink::FeatureSink;
pub use tokenizer::{
    HfTokenizer, SpecialTokens, SubwordTokenizer, CLS_TOKEN, PAD_TOKEN, SEP_TOKEN, UNK_TOKEN,
    WORD_BOUNDARY,
};
pub use types::{Feature, GoldAnswer, RawExample, TrainingLabels};
pub use window::{DocSpan, SpanWindower, WindowPlan};
