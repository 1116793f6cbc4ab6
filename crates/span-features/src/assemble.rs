//! Fixed-length model input for one paragraph window.
//!
//! ```text
//! | paragraph window | <sep> | question | <sep> | <cls> | <pad> ... |
//!   P                  P       Q          Q       CLS     PAD
//! ```
//!
//! The paragraph comes first; the classification marker closes the real
//! tokens and doubles as the "no answer" position.

use crate::config::RESERVED_MARKERS;
use crate::error::{FeatureError, Result};
use crate::tokenizer::SpecialTokens;
use crate::types::TrainingLabels;
use crate::window::DocSpan;
use serde::{Deserialize, Serialize};

/// Segment vocabulary of the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u32)]
pub enum SegmentId {
    Paragraph = 0,
    Question = 1,
    Classification = 2,
    /// Reserved by the segment vocabulary; separators take the segment of
    /// the part they close.
    Separator = 3,
    Padding = 4,
}

impl SegmentId {
    #[must_use]
    pub const fn id(self) -> u32 {
        self as u32
    }
}

/// Parallel arrays of one window, all `max_seq_length` long
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledWindow {
    pub input_ids: Vec<u32>,
    /// 0 attend, 1 padding. Inverted on purpose: downstream arithmetic
    /// relies on this polarity.
    pub input_mask: Vec<u8>,
    pub segment_ids: Vec<u32>,
    /// 1 excluded from span prediction, 0 eligible paragraph token
    pub p_mask: Vec<u8>,
    pub cls_index: usize,
    pub paragraph_len: usize,
}

#[derive(Debug, Clone)]
pub struct FeatureAssembler {
    max_seq_length: usize,
    max_query_length: usize,
    special: SpecialTokens,
}

impl FeatureAssembler {
    #[must_use]
    pub const fn new(max_seq_length: usize, max_query_length: usize, special: SpecialTokens) -> Self {
        Self {
            max_seq_length,
            max_query_length,
            special,
        }
    }

    #[must_use]
    pub const fn max_seq_length(&self) -> usize {
        self.max_seq_length
    }

    /// Lay out one window. Fails when the real tokens do not fit.
    pub fn assemble(&self, paragraph: &[u32], query: &[u32]) -> Result<AssembledWindow> {
        let query = &query[..query.len().min(self.max_query_length)];
        let real_len = paragraph.len() + query.len() + RESERVED_MARKERS;
        if real_len > self.max_seq_length {
            return Err(FeatureError::shape("input_ids", self.max_seq_length, real_len));
        }

        let mut window = AssembledWindow {
            input_ids: Vec::with_capacity(self.max_seq_length),
            input_mask: Vec::with_capacity(self.max_seq_length),
            segment_ids: Vec::with_capacity(self.max_seq_length),
            p_mask: Vec::with_capacity(self.max_seq_length),
            cls_index: 0,
            paragraph_len: paragraph.len(),
        };

        for &id in paragraph {
            window.push(id, SegmentId::Paragraph, 0, 0);
        }
        window.push(self.special.sep, SegmentId::Paragraph, 0, 1);

        for &id in query {
            window.push(id, SegmentId::Question, 0, 1);
        }
        window.push(self.special.sep, SegmentId::Question, 0, 1);

        window.cls_index = window.input_ids.len();
        window.push(self.special.cls, SegmentId::Classification, 0, 1);

        while window.input_ids.len() < self.max_seq_length {
            window.push(self.special.pad, SegmentId::Padding, 1, 1);
        }

        window.check_shape(self.max_seq_length)?;
        Ok(window)
    }

    /// Training labels of `span` for a gold answer given in paragraph token
    /// coordinates (inclusive).
    #[must_use]
    pub fn labels(
        &self,
        span: &DocSpan,
        gold: Option<(usize, usize)>,
        cls_index: usize,
        example_impossible: bool,
    ) -> TrainingLabels {
        let no_answer = TrainingLabels {
            start_position: cls_index,
            end_position: cls_index,
            is_impossible: true,
        };
        if example_impossible {
            return no_answer;
        }

        match gold {
            Some((start, end)) if span.contains(start) && span.contains(end) => TrainingLabels {
                start_position: start - span.start,
                end_position: end - span.start,
                is_impossible: false,
            },
            _ => no_answer,
        }
    }
}

impl AssembledWindow {
    fn push(&mut self, id: u32, segment: SegmentId, mask: u8, p_mask: u8) {
        self.input_ids.push(id);
        self.segment_ids.push(segment.id());
        self.input_mask.push(mask);
        self.p_mask.push(p_mask);
    }

    fn check_shape(&self, expected: usize) -> Result<()> {
        let lens = [
            ("input_ids", self.input_ids.len()),
            ("input_mask", self.input_mask.len()),
            ("segment_ids", self.segment_ids.len()),
            ("p_mask", self.p_mask.len()),
        ];
        for (field, len) in lens {
            if len != expected {
                return Err(FeatureError::shape(field, expected, len));
            }
        }
        Ok(())
    }
}
