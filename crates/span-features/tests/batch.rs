mod common;

use common::{converter, numbered_paragraph, small_config};
use pretty_assertions::assert_eq;
use qa_span_features::{
    BatchConverter, BatchOptions, ConversionMode, ConverterConfig, Feature, FeatureIdCounter,
    FeatureSink, RawExample, Result,
};
use std::collections::HashSet;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

fn examples() -> Vec<RawExample> {
    vec![
        RawExample::new("a", "What did Mary have?", "Mary had a lamb").with_answer("a lamb", 9),
        RawExample::new("b", "Who had it?", "Mary had a lamb").with_answer("Mary", 0),
        RawExample::new("c", "which word?", numbered_paragraph(12)).impossible(),
    ]
}

fn windowed_config() -> ConverterConfig {
    ConverterConfig {
        max_seq_length: 16,
        max_query_length: 4,
        doc_stride: 3,
        ..small_config()
    }
}

#[derive(Default)]
struct CountingSink {
    ids: Vec<u64>,
    finished: bool,
}

impl FeatureSink for CountingSink {
    fn accept(&mut self, feature: Feature) -> Result<()> {
        self.ids.push(feature.unique_id);
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}

#[test]
fn sequential_batch_reports_counts() -> anyhow::Result<()> {
    let converter = converter(windowed_config());
    let ids = FeatureIdCounter::new(0);
    let (features, report) =
        BatchConverter::new(&converter).convert_all(&examples(), ConversionMode::Training, &ids)?;

    assert_eq!(report.examples, 3);
    assert_eq!(report.features, features.len());
    assert!(report.degraded_examples.is_empty());
    assert!(!report.cancelled);
    // example c: 12 tokens, capacity 16 - 2 - 3 = 11, stride 3
    assert_eq!(features.iter().filter(|f| f.example_id == "c").count(), 2);

    let ids: Vec<u64> = features.iter().map(|f| f.unique_id).collect();
    assert_eq!(ids, (0..features.len() as u64).collect::<Vec<_>>());
    Ok(())
}

#[test]
fn sink_receives_every_feature_then_finish() -> anyhow::Result<()> {
    let converter = converter(windowed_config());
    let ids = FeatureIdCounter::default();
    let mut sink = CountingSink::default();
    let report = BatchConverter::new(&converter)
        .with_options(BatchOptions {
            log_every: 1,
            detail_examples: 0,
        })
        .convert_into(&examples(), ConversionMode::Inference, &ids, &mut sink)?;

    assert_eq!(sink.ids.len(), report.features);
    assert!(sink.finished);
    Ok(())
}

#[test]
fn degraded_examples_are_reported_without_stopping() -> anyhow::Result<()> {
    let converter = converter(windowed_config());
    let ids = FeatureIdCounter::default();
    let mut examples = examples();
    examples.insert(
        1,
        RawExample::new(
            "ligatures",
            "Which pair?",
            "\u{FB01}\u{FB01}\u{FB01}\u{FB01}\u{FB01} ab cd",
        )
        .with_answer("cd", 9),
    );

    let (features, report) =
        BatchConverter::new(&converter).convert_all(&examples, ConversionMode::Training, &ids)?;
    assert_eq!(report.examples, 4);
    assert_eq!(report.degraded_examples, vec!["ligatures".to_string()]);
    assert!(features.iter().any(|f| f.example_id == "ligatures"));
    assert!(features.iter().any(|f| f.example_id == "c"));
    Ok(())
}

#[test]
fn cancellation_before_start_produces_nothing() -> anyhow::Result<()> {
    let converter = converter(windowed_config());
    let ids = FeatureIdCounter::default();
    let flag = Arc::new(AtomicBool::new(true));
    let (features, report) = BatchConverter::new(&converter)
        .with_cancellation(flag)
        .convert_all(&examples(), ConversionMode::Training, &ids)?;

    assert!(features.is_empty());
    assert_eq!(report.examples, 0);
    assert!(report.cancelled);
    Ok(())
}

#[test]
fn malformed_example_aborts_the_batch() {
    let converter = converter(windowed_config());
    let ids = FeatureIdCounter::default();
    let mut examples = examples();
    examples.push(RawExample::new("d", "What?", "Mary had a lamb"));

    let result =
        BatchConverter::new(&converter).convert_all(&examples, ConversionMode::Training, &ids);
    assert!(result.is_err());
}

#[cfg(feature = "parallel")]
#[test]
fn parallel_batch_keeps_order_and_unique_ids() -> anyhow::Result<()> {
    let converter = converter(windowed_config());
    let examples: Vec<RawExample> = (0..32)
        .map(|i| {
            RawExample::new(format!("q{i}"), "which word?", numbered_paragraph(10 + i % 7))
                .impossible()
        })
        .collect();

    let ids = FeatureIdCounter::default();
    let (parallel, report) = BatchConverter::new(&converter).convert_parallel(
        &examples,
        ConversionMode::Training,
        &ids,
    )?;

    let sequential_ids = FeatureIdCounter::default();
    let (sequential, _) = BatchConverter::new(&converter).convert_all(
        &examples,
        ConversionMode::Training,
        &sequential_ids,
    )?;

    assert_eq!(report.examples, examples.len());
    assert_eq!(parallel.len(), sequential.len());
    let unique: HashSet<u64> = parallel.iter().map(|f| f.unique_id).collect();
    assert_eq!(unique.len(), parallel.len());

    let order = |features: &[Feature]| {
        features
            .iter()
            .map(|f| (f.example_id.clone(), f.doc_span_index))
            .collect::<Vec<_>>()
    };
    assert_eq!(order(&parallel), order(&sequential));
    Ok(())
}
