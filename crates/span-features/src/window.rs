//! Sliding-window segmentation of long paragraphs.
//!
//! ```text
//! tokens:  the man went to the store and bought a gallon of milk
//! span A:  the man went to the
//! span B:                to the store and bought
//! span C:                             and bought a gallon of
//! ```
//!
//! A token covered by several spans is owned by the span where it has the
//! most balanced context: `bought` has 4 left / 0 right tokens in B and
//! 1 left / 3 right in C, so C owns it.

use crate::error::{FeatureError, Result};
use serde::{Deserialize, Serialize};

/// Weight of the span length in the ownership score
const LENGTH_WEIGHT: f64 = 0.01;

/// Contiguous slice of paragraph tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocSpan {
    pub start: usize,
    pub length: usize,
}

impl DocSpan {
    #[must_use]
    pub const fn new(start: usize, length: usize) -> Self {
        Self { start, length }
    }

    /// Exclusive end
    #[must_use]
    pub const fn end(&self) -> usize {
        self.start + self.length
    }

    #[must_use]
    pub const fn contains(&self, token: usize) -> bool {
        token >= self.start && token < self.end()
    }

    /// `min(left, right) + 0.01 * length`, or `None` if the token lies outside
    #[must_use]
    pub fn context_score(&self, token: usize) -> Option<f64> {
        if !self.contains(token) {
            return None;
        }
        let left = token - self.start;
        let right = self.end() - 1 - token;
        Some(left.min(right) as f64 + LENGTH_WEIGHT * self.length as f64)
    }
}

/// Splits a paragraph token count into overlapping fixed-capacity spans
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpanWindower {
    capacity: usize,
    stride: usize,
}

impl SpanWindower {
    pub fn new(capacity: usize, stride: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(FeatureError::invalid_config("window capacity must be > 0"));
        }
        if stride == 0 {
            return Err(FeatureError::invalid_config("doc_stride must be > 0"));
        }
        Ok(Self { capacity, stride })
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub const fn stride(&self) -> usize {
        self.stride
    }

    /// Ordered spans covering `[0, total)`; empty when `total == 0`
    #[must_use]
    pub fn spans(&self, total: usize) -> Vec<DocSpan> {
        let mut spans = Vec::new();
        let mut start = 0;
        while start < total {
            let length = (total - start).min(self.capacity);
            spans.push(DocSpan::new(start, length));
            if start + length == total {
                break;
            }
            start += length.min(self.stride);
        }
        spans
    }

    /// Spans plus their max-context ownership
    #[must_use]
    pub fn plan(&self, total: usize) -> WindowPlan {
        WindowPlan::new(total, self.spans(total))
    }
}

/// Spans of one paragraph with the owning span of every token.
///
/// Ownership needs the complete span list, so it is computed once up front.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowPlan {
    spans: Vec<DocSpan>,
    /// Owning span of every token, `None` when no span covers it
    owners: Vec<Option<usize>>,
}

impl WindowPlan {
    #[must_use]
    pub fn new(total: usize, spans: Vec<DocSpan>) -> Self {
        let owners = (0..total)
            .map(|token| {
                let mut best: Option<(usize, f64)> = None;
                for (idx, span) in spans.iter().enumerate() {
                    let Some(score) = span.context_score(token) else {
                        continue;
                    };
                    if best.map_or(true, |(_, best_score)| score > best_score) {
                        best = Some((idx, score));
                    }
                }
                best.map(|(idx, _)| idx)
            })
            .collect();
        Self { spans, owners }
    }

    #[must_use]
    pub fn spans(&self) -> &[DocSpan] {
        &self.spans
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Index of the span owning `token`, if any span covers it
    #[must_use]
    pub fn owner(&self, token: usize) -> Option<usize> {
        self.owners.get(token).copied().flatten()
    }

    #[must_use]
    pub fn is_max_context(&self, span_idx: usize, token: usize) -> bool {
        self.owner(token) == Some(span_idx)
    }
}
