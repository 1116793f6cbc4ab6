use crate::error::Result;
use qa_span_features::{Feature, FeatureSink};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Writes one JSON-encoded feature per line
pub struct JsonLinesSink<W: Write> {
    writer: W,
    written: usize,
}

impl<W: Write> JsonLinesSink<W> {
    pub const fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    /// Features accepted so far
    #[must_use]
    pub const fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl JsonLinesSink<BufWriter<File>> {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> FeatureSink for JsonLinesSink<W> {
    fn accept(&mut self, feature: Feature) -> qa_span_features::Result<()> {
        serde_json::to_writer(&mut self.writer, &feature)?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> qa_span_features::Result<()> {
        self.writer.flush()?;
        log::debug!("Wrote {} features", self.written);
        Ok(())
    }
}

/// Read features back from a JSON-lines file, skipping blank lines
pub fn read_features(path: impl AsRef<Path>) -> Result<Vec<Feature>> {
    let reader = BufReader::new(File::open(path)?);
    let mut features = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        features.push(serde_json::from_str(&line)?);
    }
    Ok(features)
}
