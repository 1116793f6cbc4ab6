//! Banded longest-common-subsequence alignment between a raw paragraph and
//! the text reconstructed from its subword tokens.
//!
//! ```text
//! f[i, j] = max(f[i-1, j], f[i, j-1], f[i-1, j-1] + match(i, j))
//! ```
//!
//! Tokenization only perturbs the text slightly (case, whitespace, unicode
//! folding), so the table is only filled inside a diagonal band. The band is
//! widened when too few raw characters end up matched.

use crate::config::AlignmentConfig;

/// Partial raw ↔ tokenized character correspondence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentMap {
    raw_to_tok: Vec<Option<usize>>,
    tok_to_raw: Vec<Option<usize>>,
    degraded: bool,
}

impl AlignmentMap {
    /// Map with no pairs at all
    #[must_use]
    pub fn unset(raw_len: usize, tokenized_len: usize, degraded: bool) -> Self {
        Self {
            raw_to_tok: vec![None; raw_len],
            tok_to_raw: vec![None; tokenized_len],
            degraded,
        }
    }

    /// Raw char index → tokenized char index
    #[must_use]
    pub fn raw_to_tok(&self) -> &[Option<usize>] {
        &self.raw_to_tok
    }

    /// Tokenized char index → raw char index
    #[must_use]
    pub fn tok_to_raw(&self) -> &[Option<usize>] {
        &self.tok_to_raw
    }

    /// Coverage stayed below the threshold after every retry
    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        self.degraded
    }

    #[must_use]
    pub fn raw_len(&self) -> usize {
        self.raw_to_tok.len()
    }

    #[must_use]
    pub fn tokenized_len(&self) -> usize {
        self.tok_to_raw.len()
    }

    /// Number of matched character pairs
    #[must_use]
    pub fn matched(&self) -> usize {
        self.raw_to_tok.iter().filter(|v| v.is_some()).count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    None,
    Up,
    Left,
    Match,
}

/// DP scores and backpointers for one band width.
///
/// Row `i` stores columns `[i - hw, i + hw)` at offsets `j + hw - i`; cells
/// outside the band score 0 and have no backpointer.
struct BandTable {
    rows: usize,
    cols: usize,
    half_width: usize,
    scores: Vec<u32>,
    steps: Vec<Step>,
}

impl BandTable {
    fn fill(raw: &[Option<char>], tokenized: &[char], half_width: usize) -> Self {
        let width = 2 * half_width;
        let mut table = Self {
            rows: raw.len(),
            cols: tokenized.len(),
            half_width,
            scores: vec![0; raw.len() * width],
            steps: vec![Step::None; raw.len() * width],
        };

        for (i, raw_char) in raw.iter().enumerate() {
            let lo = i.saturating_sub(half_width);
            let hi = (i + half_width).min(table.cols);
            for j in lo..hi {
                let mut best = 0;
                let mut step = Step::None;

                if i > 0 {
                    best = table.score(i - 1, j);
                    step = Step::Up;
                }

                if j > 0 {
                    let left = table.score(i, j - 1);
                    if left > best {
                        best = left;
                        step = Step::Left;
                    }
                }

                let diagonal = if i > 0 && j > 0 {
                    table.score(i - 1, j - 1)
                } else {
                    0
                };
                if *raw_char == Some(tokenized[j]) && diagonal + 1 > best {
                    best = diagonal + 1;
                    step = Step::Match;
                }

                let slot = i * width + (j + half_width - i);
                table.scores[slot] = best;
                table.steps[slot] = step;
            }
        }

        table
    }

    fn slot(&self, i: usize, j: usize) -> Option<usize> {
        if i >= self.rows || j >= self.cols {
            return None;
        }
        let offset = (j + self.half_width).checked_sub(i)?;
        (offset < 2 * self.half_width).then(|| i * 2 * self.half_width + offset)
    }

    fn score(&self, i: usize, j: usize) -> u32 {
        self.slot(i, j).map_or(0, |slot| self.scores[slot])
    }

    fn step(&self, i: usize, j: usize) -> Step {
        self.slot(i, j).map_or(Step::None, |slot| self.steps[slot])
    }

    fn final_score(&self) -> u32 {
        self.score(self.rows - 1, self.cols - 1)
    }

    /// Walk backpointers from the bottom-right cell, pairing matched chars
    fn backtrace(&self) -> (Vec<Option<usize>>, Vec<Option<usize>>) {
        let mut raw_to_tok = vec![None; self.rows];
        let mut tok_to_raw = vec![None; self.cols];
        let (mut i, mut j) = (self.rows - 1, self.cols - 1);

        loop {
            match self.step(i, j) {
                Step::None => break,
                Step::Match => {
                    raw_to_tok[i] = Some(j);
                    tok_to_raw[j] = Some(i);
                    if i == 0 || j == 0 {
                        break;
                    }
                    i -= 1;
                    j -= 1;
                }
                Step::Left => j -= 1,
                Step::Up => i -= 1,
            }
        }

        (raw_to_tok, tok_to_raw)
    }
}

/// Best-effort character aligner; never fails, at worst reports `degraded`
#[derive(Debug, Clone, Default)]
pub struct CharTokenAligner {
    config: AlignmentConfig,
}

impl CharTokenAligner {
    #[must_use]
    pub const fn new(config: AlignmentConfig) -> Self {
        Self { config }
    }

    /// Align folded raw chars (see `TextNormalizer::fold_chars`) against the
    /// reconstructed tokenized chars.
    #[must_use]
    pub fn align(&self, raw: &[Option<char>], tokenized: &[char]) -> AlignmentMap {
        let (n, m) = (raw.len(), tokenized.len());
        if n == 0 || m == 0 {
            return AlignmentMap::unset(n, m, n > 0);
        }

        // A band this wide already covers the whole table
        let covering = n.max(m);
        let mut half_width = (n.abs_diff(m) + self.config.band_slack).min(covering);
        let required = self.config.min_coverage * n as f64;

        let mut best: Option<BandTable> = None;
        let mut accepted = false;
        for attempt in 0..=self.config.max_retries {
            let table = BandTable::fill(raw, tokenized, half_width);
            let score = table.final_score();
            if best.as_ref().map_or(true, |b| score > b.final_score()) {
                best = Some(table);
            }

            if f64::from(score) >= required {
                accepted = true;
                break;
            }

            log::debug!(
                "alignment attempt {attempt} matched {score}/{n} chars (half-width {half_width})"
            );
            if half_width >= covering {
                break;
            }
            half_width = (half_width * 2).min(covering);
        }

        let Some(table) = best else {
            return AlignmentMap::unset(n, m, true);
        };
        let (raw_to_tok, tok_to_raw) = table.backtrace();
        let anchored = raw_to_tok.iter().any(Option::is_some);

        AlignmentMap {
            raw_to_tok,
            tok_to_raw,
            degraded: !accepted || !anchored,
        }
    }
}
