use crate::error::{FeatureError, Result};

/// Which end of a span a looked-up index belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Start,
    End,
}

/// Interpolates indices at unanchored positions of a partial alignment map.
///
/// Between two anchors the narrowest span consistent with them is chosen, so
/// characters the tokenizer inserted or dropped never widen a span.
#[derive(Debug, Clone, Copy)]
pub struct IndexResolver<'a> {
    index: &'a [Option<usize>],
    bound: Option<usize>,
}

impl<'a> IndexResolver<'a> {
    /// `bound` is the length of the target sequence, when known
    #[must_use]
    pub const fn new(index: &'a [Option<usize>], bound: Option<usize>) -> Self {
        Self { index, bound }
    }

    pub fn start(&self, position: usize) -> Result<usize> {
        self.resolve(position, Lookup::Start)
    }

    pub fn end(&self, position: usize) -> Result<usize> {
        self.resolve(position, Lookup::End)
    }

    pub fn resolve(&self, position: usize, lookup: Lookup) -> Result<usize> {
        let len = self.index.len();
        let unanchored = || FeatureError::UnanchoredIndex { position, len };
        let value = *self.index.get(position).ok_or_else(unanchored)?;
        if let Some(value) = value {
            return Ok(value);
        }

        let mut rear = position;
        while rear < len - 1 && self.index[rear].is_none() {
            rear += 1;
        }
        let mut front = position;
        while front > 0 && self.index[front].is_none() {
            front -= 1;
        }

        let resolved = match (self.index[front], self.index[rear]) {
            (None, None) => return Err(unanchored()),
            (None, Some(rear)) => match lookup {
                Lookup::Start if rear >= 1 => 0,
                Lookup::End if rear >= 1 => rear - 1,
                _ => rear,
            },
            (Some(front), None) => match self.bound {
                Some(bound) if front + 1 < bound => match lookup {
                    Lookup::Start => front + 1,
                    Lookup::End => bound - 1,
                },
                _ => front,
            },
            (Some(front), Some(rear)) => {
                let gap = rear > front + 1;
                match lookup {
                    Lookup::Start if gap => front + 1,
                    Lookup::Start => rear,
                    Lookup::End if gap => rear - 1,
                    Lookup::End => front,
                }
            }
        };

        Ok(resolved)
    }
}
