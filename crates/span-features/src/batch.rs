use crate::converter::{Conversion, ConversionMode, ExampleConverter, FeatureIdCounter};
use crate::error::Result;
use crate::sink::FeatureSink;
use crate::tokenizer::SubwordTokenizer;
use crate::types::{Feature, RawExample};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Log progress every this many examples (0 disables)
    pub log_every: usize,
    /// Log the full features of this many leading examples at debug level
    pub detail_examples: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            log_every: 1000,
            detail_examples: 20,
        }
    }
}

/// Summary of one batch run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Examples actually converted
    pub examples: usize,
    pub features: usize,
    /// Ids of examples whose paragraph alignment was degraded
    pub degraded_examples: Vec<String>,
    /// The run stopped early because cancellation was requested
    pub cancelled: bool,
}

impl BatchReport {
    fn record(&mut self, example: &RawExample, conversion: &Conversion) {
        self.examples += 1;
        self.features += conversion.features.len();
        if conversion.alignment_degraded {
            self.degraded_examples.push(example.id.clone());
        }
    }
}

/// Drives an [`ExampleConverter`] over many examples
pub struct BatchConverter<'a, T> {
    converter: &'a ExampleConverter<T>,
    options: BatchOptions,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'a, T: SubwordTokenizer> BatchConverter<'a, T> {
    #[must_use]
    pub fn new(converter: &'a ExampleConverter<T>) -> Self {
        Self {
            converter,
            options: BatchOptions::default(),
            cancel: None,
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: BatchOptions) -> Self {
        self.options = options;
        self
    }

    /// Stop scheduling further examples once `flag` is set
    #[must_use]
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    fn convert_one(
        &self,
        idx: usize,
        total: usize,
        example: &RawExample,
        mode: ConversionMode,
        ids: &FeatureIdCounter,
    ) -> Result<Conversion> {
        if self.options.log_every > 0 && idx % self.options.log_every == 0 {
            log::info!("Converting example {idx} of {total}");
        }

        let conversion = self.converter.convert(example, mode, ids)?;

        if idx < self.options.detail_examples {
            for feature in &conversion.features {
                log::debug!(
                    "example '{}' span {} (unique_id {}): input_ids {:?} p_mask {:?} labels {:?}",
                    feature.example_id,
                    feature.doc_span_index,
                    feature.unique_id,
                    feature.input_ids,
                    feature.p_mask,
                    feature.labels
                );
            }
        }

        Ok(conversion)
    }

    /// Convert sequentially, streaming every feature into `sink`
    pub fn convert_into<S: FeatureSink + ?Sized>(
        &self,
        examples: &[RawExample],
        mode: ConversionMode,
        ids: &FeatureIdCounter,
        sink: &mut S,
    ) -> Result<BatchReport> {
        let mut report = BatchReport::default();
        for (idx, example) in examples.iter().enumerate() {
            if self.is_cancelled() {
                log::info!("Conversion cancelled after {idx} of {} examples", examples.len());
                report.cancelled = true;
                break;
            }

            let conversion = self.convert_one(idx, examples.len(), example, mode, ids)?;
            report.record(example, &conversion);
            for feature in conversion.features {
                sink.accept(feature)?;
            }
        }
        sink.finish()?;
        Ok(report)
    }

    /// Convert sequentially into memory
    pub fn convert_all(
        &self,
        examples: &[RawExample],
        mode: ConversionMode,
        ids: &FeatureIdCounter,
    ) -> Result<(Vec<Feature>, BatchReport)> {
        let mut features = Vec::new();
        let report = self.convert_into(examples, mode, ids, &mut features)?;
        Ok((features, report))
    }
}

#[cfg(feature = "parallel")]
impl<'a, T: SubwordTokenizer + Sync> BatchConverter<'a, T> {
    /// Convert examples on the rayon pool. Ids stay unique through the shared
    /// counter; features come back in example order.
    pub fn convert_parallel(
        &self,
        examples: &[RawExample],
        mode: ConversionMode,
        ids: &FeatureIdCounter,
    ) -> Result<(Vec<Feature>, BatchReport)> {
        use rayon::prelude::*;

        let total = examples.len();
        let conversions = examples
            .par_iter()
            .enumerate()
            .map(|(idx, example)| {
                if self.is_cancelled() {
                    return Ok(None);
                }
                self.convert_one(idx, total, example, mode, ids).map(Some)
            })
            .collect::<Result<Vec<_>>>()?;

        let mut report = BatchReport::default();
        let mut features = Vec::new();
        for (example, conversion) in examples.iter().zip(conversions) {
            let Some(conversion) = conversion else {
                report.cancelled = true;
                continue;
            };
            report.record(example, &conversion);
            features.extend(conversion.features);
        }
        Ok((features, report))
    }
}
