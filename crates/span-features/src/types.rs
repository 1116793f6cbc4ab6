use crate::error::{FeatureError, Result};
use serde::{Deserialize, Serialize};

/// Gold answer of a training example
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoldAnswer {
    /// Answer text as it appears in the paragraph
    pub text: String,

    /// Char offset of the answer in the raw paragraph
    pub start: usize,
}

impl GoldAnswer {
    /// Inclusive char offset of the last answer character
    #[must_use]
    pub fn end(&self) -> Option<usize> {
        let len = self.text.chars().count();
        (len > 0).then(|| self.start + len - 1)
    }
}

/// One question over one paragraph, as read from the corpus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawExample {
    pub id: String,
    pub question: String,
    pub paragraph: String,
    pub answer: Option<GoldAnswer>,
    pub is_impossible: bool,
}

impl RawExample {
    pub fn new(
        id: impl Into<String>,
        question: impl Into<String>,
        paragraph: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            question: question.into(),
            paragraph: paragraph.into(),
            answer: None,
            is_impossible: false,
        }
    }

    /// Builder: attach the gold answer
    #[must_use]
    pub fn with_answer(mut self, text: impl Into<String>, start: usize) -> Self {
        self.answer = Some(GoldAnswer {
            text: text.into(),
            start,
        });
        self
    }

    /// Builder: mark the question as unanswerable from the paragraph
    #[must_use]
    pub fn impossible(mut self) -> Self {
        self.is_impossible = true;
        self.answer = None;
        self
    }
}

/// Training targets of one window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingLabels {
    /// Window-relative start token
    pub start_position: usize,

    /// Window-relative end token (inclusive)
    pub end_position: usize,

    /// The answer is not inside this window. This differs from the example
    /// flag: a possible example is impossible in every window that misses
    /// its answer.
    pub is_impossible: bool,
}

/// Fixed-length model input for one window of one example
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub unique_id: u64,
    pub example_id: String,
    pub doc_span_index: usize,

    pub input_ids: Vec<u32>,

    /// 0 for real tokens, 1 for padding
    pub input_mask: Vec<u8>,

    pub segment_ids: Vec<u32>,

    /// 1 for positions that can never be part of an answer
    pub p_mask: Vec<u8>,

    pub cls_index: usize,

    /// Paragraph tokens at the head of the window
    pub paragraph_len: usize,

    /// Window position → first raw char of the token
    pub token_to_raw_start: Vec<usize>,

    /// Window position → last raw char of the token
    pub token_to_raw_end: Vec<usize>,

    /// Window position → this window is the token's max-context owner
    pub token_is_max_context: Vec<bool>,

    /// Present only for training features
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<TrainingLabels>,
}

impl Feature {
    /// Raw char range (inclusive) covered by window positions `start..=end`
    #[must_use]
    pub fn raw_char_span(&self, start: usize, end: usize) -> Option<(usize, usize)> {
        if start > end || end >= self.paragraph_len {
            return None;
        }
        let raw_start = *self.token_to_raw_start.get(start)?;
        let raw_end = *self.token_to_raw_end.get(end)?;
        (raw_start <= raw_end).then_some((raw_start, raw_end))
    }

    /// Raw paragraph text predicted by window positions `start..=end`,
    /// trimmed of the whitespace word-boundary tokens carry along.
    #[must_use]
    pub fn answer_text(&self, paragraph: &str, start: usize, end: usize) -> Option<String> {
        let (raw_start, raw_end) = self.raw_char_span(start, end)?;
        let text: String = paragraph
            .chars()
            .skip(raw_start)
            .take(raw_end + 1 - raw_start)
            .collect();
        Some(text.trim().to_string())
    }

    /// Check that every parallel array has the expected length
    pub fn validate_shape(&self, max_seq_length: usize) -> Result<()> {
        let sequence = [
            ("input_ids", self.input_ids.len()),
            ("input_mask", self.input_mask.len()),
            ("segment_ids", self.segment_ids.len()),
            ("p_mask", self.p_mask.len()),
        ];
        for (field, len) in sequence {
            if len != max_seq_length {
                return Err(FeatureError::shape(field, max_seq_length, len));
            }
        }

        let back_refs = [
            ("token_to_raw_start", self.token_to_raw_start.len()),
            ("token_to_raw_end", self.token_to_raw_end.len()),
            ("token_is_max_context", self.token_is_max_context.len()),
        ];
        for (field, len) in back_refs {
            if len != self.paragraph_len {
                return Err(FeatureError::shape(field, self.paragraph_len, len));
            }
        }

        Ok(())
    }
}
