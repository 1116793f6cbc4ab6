use pretty_assertions::assert_eq;
use qa_span_features::{
    BatchConverter, ConversionMode, ConverterConfig, ExampleConverter, FeatureIdCounter,
    SubwordTokenizer, TextNormalizer, WORD_BOUNDARY,
};
use qa_squad_corpus::{
    read_features, CorpusError, JsonLinesSink, SquadDataset, SquadReader, SquadSplit,
};
use std::collections::HashMap;
use std::fs;
use std::sync::Mutex;
use tempfile::TempDir;

/// One token per whitespace-separated word
struct WordTokenizer {
    vocab: Mutex<HashMap<String, u32>>,
}

impl WordTokenizer {
    fn new() -> Self {
        let vocab = ["<unk>", "<s>", "</s>", "<cls>", "<sep>", "<pad>"]
            .iter()
            .enumerate()
            .map(|(id, t)| (t.to_string(), id as u32))
            .collect();
        Self {
            vocab: Mutex::new(vocab),
        }
    }
}

impl SubwordTokenizer for WordTokenizer {
    fn tokenize(&self, text: &str) -> qa_span_features::Result<Vec<String>> {
        Ok(self
            .normalizer()
            .normalize(text)?
            .split(' ')
            .filter(|w| !w.is_empty())
            .map(|w| format!("{WORD_BOUNDARY}{w}"))
            .collect())
    }

    fn token_to_id(&self, token: &str) -> u32 {
        let mut vocab = self.vocab.lock().unwrap();
        let next = vocab.len() as u32;
        *vocab.entry(token.to_string()).or_insert(next)
    }

    fn id_to_token(&self, id: u32) -> Option<String> {
        let vocab = self.vocab.lock().unwrap();
        vocab.iter().find(|(_, &v)| v == id).map(|(t, _)| t.clone())
    }

    fn normalizer(&self) -> TextNormalizer {
        TextNormalizer::new(false)
    }
}

const TRAIN: &str = r#"{
    "version": "v2.0",
    "data": [{
        "title": "Nursery",
        "paragraphs": [
            {"context": "Mary had a lamb",
             "qas": [
                {"id": "q1", "question": "What did Mary have?",
                 "answers": [{"text": "a lamb", "answer_start": 9}], "is_impossible": false},
                {"id": "q2", "question": "Who had a goat?", "answers": [], "is_impossible": true}
             ]},
            {"context": "Its fleece was white as snow",
             "qas": [
                {"id": "q3", "question": "What color was the fleece?",
                 "answers": [{"text": "white", "answer_start": 15}]}
             ]}
        ]
    }]
}"#;

fn write_split(dir: &TempDir, split: &str, task: &str, json: &str) {
    let name = format!("{split}-{task}");
    let split_dir = dir.path().join(&name);
    fs::create_dir_all(&split_dir).unwrap();
    fs::write(split_dir.join(format!("{name}.json")), json).unwrap();
}

#[test]
fn dataset_reads_train_split_in_training_mode() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    write_split(&dir, "train", "squad", TRAIN);
    let dataset = SquadDataset::new(dir.path(), "squad");

    let examples = dataset.examples(SquadSplit::Train)?;
    assert_eq!(examples.len(), 3);
    assert_eq!(examples[0].answer.as_ref().map(|a| a.start), Some(9));
    assert!(examples[1].is_impossible);
    assert_eq!(examples[2].paragraph, "Its fleece was white as snow");
    Ok(())
}

#[test]
fn missing_split_is_not_found() {
    let dir = TempDir::new().unwrap();
    let dataset = SquadDataset::new(dir.path(), "squad");
    let err = dataset.examples(SquadSplit::Dev).unwrap_err();
    match err {
        CorpusError::NotFound(path) => assert_eq!(path, dataset.path(SquadSplit::Dev)),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn training_question_with_two_answers_is_rejected() {
    let json = r#"{"data": [{"paragraphs": [{
        "context": "Mary had a lamb",
        "qas": [{"id": "dup", "question": "What?", "answers": [
            {"text": "a lamb", "answer_start": 9},
            {"text": "lamb", "answer_start": 11}
        ]}]
    }]}]}"#;

    let err = SquadReader::new(ConversionMode::Training)
        .read_str(json)
        .unwrap_err();
    assert!(matches!(err, CorpusError::Malformed { ref id, .. } if id == "dup"));

    // evaluation data may carry several reference answers
    let examples = SquadReader::new(ConversionMode::Inference)
        .read_str(json)
        .unwrap();
    assert_eq!(examples.len(), 1);
}

#[test]
fn converted_features_round_trip_through_json_lines() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    write_split(&dir, "train", "squad", TRAIN);
    let examples = SquadDataset::new(dir.path(), "squad").examples(SquadSplit::Train)?;

    let config = ConverterConfig {
        max_seq_length: 24,
        max_query_length: 8,
        doc_stride: 4,
        ..ConverterConfig::default()
    };
    let converter = ExampleConverter::new(config, WordTokenizer::new())?;
    let ids = FeatureIdCounter::default();
    let out = dir.path().join("train.features.jsonl");

    let mut sink = JsonLinesSink::create(&out)?;
    let report = BatchConverter::new(&converter).convert_into(
        &examples,
        ConversionMode::Training,
        &ids,
        &mut sink,
    )?;
    assert_eq!(sink.written(), report.features);
    drop(sink);

    let features = read_features(&out)?;
    assert_eq!(features.len(), 3);
    let white = &features[2];
    assert_eq!(white.example_id, "q3");
    let labels = white.labels.expect("labels");
    assert_eq!(
        white
            .answer_text(&examples[2].paragraph, labels.start_position, labels.end_position)
            .as_deref(),
        Some("white")
    );
    Ok(())
}
