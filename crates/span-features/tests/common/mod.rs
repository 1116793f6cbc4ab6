#![allow(dead_code)]

use qa_span_features::{
    ConverterConfig, ExampleConverter, Result, SubwordTokenizer, TextNormalizer, WORD_BOUNDARY,
};
use std::collections::HashMap;
use std::sync::Mutex;

const SPECIAL_TOKENS: [&str; 9] = [
    "<unk>", "<s>", "</s>", "<cls>", "<sep>", "<pad>", "<mask>", "<eod>", "<eop>",
];

/// Whitespace tokenizer producing SentencePiece-style pieces of at most
/// `max_piece` chars; ids are assigned on first sight.
pub struct PieceTokenizer {
    normalizer: TextNormalizer,
    max_piece: usize,
    vocab: Mutex<HashMap<String, u32>>,
}

impl PieceTokenizer {
    pub fn new(lowercase: bool) -> Self {
        let vocab = SPECIAL_TOKENS
            .iter()
            .enumerate()
            .map(|(id, token)| (token.to_string(), id as u32))
            .collect();
        Self {
            normalizer: TextNormalizer::new(lowercase),
            max_piece: usize::MAX,
            vocab: Mutex::new(vocab),
        }
    }

    pub fn with_max_piece(mut self, max_piece: usize) -> Self {
        self.max_piece = max_piece;
        self
    }
}

impl SubwordTokenizer for PieceTokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<String>> {
        let normalized = self.normalizer.normalize(text)?;
        let mut tokens = Vec::new();
        for word in normalized.split(' ').filter(|w| !w.is_empty()) {
            let piece: Vec<char> = std::iter::once(WORD_BOUNDARY).chain(word.chars()).collect();
            for chunk in piece.chunks(self.max_piece.min(piece.len())) {
                tokens.push(chunk.iter().collect());
            }
        }
        Ok(tokens)
    }

    fn token_to_id(&self, token: &str) -> u32 {
        let mut vocab = self.vocab.lock().expect("vocab lock");
        let next = vocab.len() as u32;
        *vocab.entry(token.to_string()).or_insert(next)
    }

    fn id_to_token(&self, id: u32) -> Option<String> {
        let vocab = self.vocab.lock().expect("vocab lock");
        vocab
            .iter()
            .find(|(_, &v)| v == id)
            .map(|(token, _)| token.clone())
    }

    fn normalizer(&self) -> TextNormalizer {
        self.normalizer
    }
}

pub fn small_config() -> ConverterConfig {
    ConverterConfig {
        max_seq_length: 32,
        max_query_length: 8,
        doc_stride: 8,
        ..ConverterConfig::default()
    }
}

pub fn converter(config: ConverterConfig) -> ExampleConverter<PieceTokenizer> {
    let lowercase = config.lowercase;
    ExampleConverter::new(config, PieceTokenizer::new(lowercase)).expect("converter")
}

/// "w0 w1 ... w{n-1}"
pub fn numbered_paragraph(words: usize) -> String {
    (0..words)
        .map(|i| format!("w{i}"))
        .collect::<Vec<_>>()
        .join(" ")
}
