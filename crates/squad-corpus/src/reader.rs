use crate::error::{CorpusError, Result};
use qa_span_features::{ConversionMode, GoldAnswer, RawExample};
use serde::Deserialize;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct SquadFile {
    data: Vec<SquadArticle>,
}

#[derive(Debug, Deserialize)]
struct SquadArticle {
    paragraphs: Vec<SquadParagraph>,
}

#[derive(Debug, Deserialize)]
struct SquadParagraph {
    context: String,
    qas: Vec<SquadQuestion>,
}

#[derive(Debug, Deserialize)]
struct SquadQuestion {
    id: String,
    question: String,
    #[serde(default)]
    answers: Vec<SquadAnswer>,
    #[serde(default)]
    is_impossible: bool,
}

#[derive(Debug, Deserialize)]
struct SquadAnswer {
    text: String,
    /// Char offset into the paragraph
    answer_start: usize,
}

/// Reads SQuAD v1.1 / v2.0 JSON into [`RawExample`]s.
///
/// In training mode every answerable question must carry exactly one answer;
/// in inference mode answers and the impossibility flag are ignored.
#[derive(Debug, Clone, Copy)]
pub struct SquadReader {
    mode: ConversionMode,
}

impl SquadReader {
    #[must_use]
    pub const fn new(mode: ConversionMode) -> Self {
        Self { mode }
    }

    pub fn read_file(&self, path: impl AsRef<Path>) -> Result<Vec<RawExample>> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(CorpusError::NotFound(path.to_path_buf()));
        }
        let file: SquadFile = serde_json::from_reader(BufReader::new(File::open(path)?))?;
        let examples = self.collect(file)?;
        log::info!("Read {} examples from {}", examples.len(), path.display());
        Ok(examples)
    }

    pub fn read_str(&self, json: &str) -> Result<Vec<RawExample>> {
        self.collect(serde_json::from_str(json)?)
    }

    fn collect(&self, file: SquadFile) -> Result<Vec<RawExample>> {
        let mut examples = Vec::new();
        for article in file.data {
            for paragraph in article.paragraphs {
                for qa in paragraph.qas {
                    examples.push(self.example(&paragraph.context, qa)?);
                }
            }
        }
        Ok(examples)
    }

    fn example(&self, context: &str, qa: SquadQuestion) -> Result<RawExample> {
        let example = RawExample::new(qa.id, qa.question, context);
        if !self.mode.is_training() {
            return Ok(example);
        }
        if qa.is_impossible {
            return Ok(example.impossible());
        }

        let [answer]: [SquadAnswer; 1] = qa.answers.try_into().map_err(|answers: Vec<_>| {
            CorpusError::malformed(
                &example.id,
                format!(
                    "training questions need exactly one answer, found {}",
                    answers.len()
                ),
            )
        })?;
        Ok(RawExample {
            answer: Some(GoldAnswer {
                text: answer.text,
                start: answer.answer_start,
            }),
            ..example
        })
    }
}

/// Corpus split, named by the `<split>-<task>` directory convention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SquadSplit {
    Train,
    Dev,
    Test,
}

impl SquadSplit {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Dev => "dev",
            Self::Test => "test",
        }
    }

    /// Only the training split carries labels
    #[must_use]
    pub const fn default_mode(self) -> ConversionMode {
        match self {
            Self::Train => ConversionMode::Training,
            Self::Dev | Self::Test => ConversionMode::Inference,
        }
    }
}

impl fmt::Display for SquadSplit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A data directory holding `<split>-<task>/<split>-<task>.json` files
#[derive(Debug, Clone)]
pub struct SquadDataset {
    data_dir: PathBuf,
    task: String,
}

impl SquadDataset {
    pub fn new(data_dir: impl Into<PathBuf>, task: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            task: task.into(),
        }
    }

    #[must_use]
    pub fn path(&self, split: SquadSplit) -> PathBuf {
        let name = format!("{split}-{}", self.task);
        self.data_dir.join(&name).join(format!("{name}.json"))
    }

    /// Read a split in its default mode
    pub fn examples(&self, split: SquadSplit) -> Result<Vec<RawExample>> {
        self.examples_with_mode(split, split.default_mode())
    }

    pub fn examples_with_mode(
        &self,
        split: SquadSplit,
        mode: ConversionMode,
    ) -> Result<Vec<RawExample>> {
        SquadReader::new(mode).read_file(self.path(split))
    }
}
