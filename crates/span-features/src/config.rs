use serde::{Deserialize, Serialize};

/// Number of reserved marker positions per window (two separators and the
/// classification marker).
pub const RESERVED_MARKERS: usize = 3;

/// Configuration for example conversion.
///
/// The same values must be used for every training and inference run of a
/// model, otherwise window geometry and label semantics diverge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Total length of every produced feature
    pub max_seq_length: usize,

    /// Question tokens kept per window (longer questions are truncated)
    pub max_query_length: usize,

    /// Step between consecutive paragraph windows, in tokens
    pub doc_stride: usize,

    /// Lowercase text before tokenization and alignment
    pub lowercase: bool,

    /// Character alignment tuning
    #[serde(default)]
    pub alignment: AlignmentConfig,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            max_seq_length: 512,
            max_query_length: 64,
            doc_stride: 128,
            lowercase: false,
            alignment: AlignmentConfig::default(),
        }
    }
}

impl ConverterConfig {
    /// Smaller windows for short-context models and fast experiments
    pub fn for_short_context() -> Self {
        Self {
            max_seq_length: 256,
            max_query_length: 48,
            doc_stride: 64,
            ..Default::default()
        }
    }

    /// Paragraph tokens available to a window once `query_len` question
    /// tokens and the reserved markers are placed.
    #[must_use]
    pub const fn window_capacity(&self, query_len: usize) -> usize {
        self.max_seq_length
            .saturating_sub(query_len)
            .saturating_sub(RESERVED_MARKERS)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_seq_length < self.max_query_length + RESERVED_MARKERS + 1 {
            return Err(format!(
                "max_seq_length ({}) must leave room for max_query_length ({}), {} markers and one paragraph token",
                self.max_seq_length, self.max_query_length, RESERVED_MARKERS
            ));
        }

        if self.doc_stride == 0 {
            return Err("doc_stride must be > 0".to_string());
        }

        self.alignment.validate()
    }
}

/// Tuning of the banded character alignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentConfig {
    /// Extra band half-width on top of the raw/tokenized length difference
    pub band_slack: usize,

    /// How many times the band is doubled after a low-coverage attempt
    pub max_retries: usize,

    /// Fraction of raw characters that must be matched to accept an attempt
    pub min_coverage: f64,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            band_slack: 5,
            max_retries: 2,
            min_coverage: 0.8,
        }
    }
}

impl AlignmentConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(self.min_coverage > 0.0 && self.min_coverage <= 1.0) {
            return Err(format!(
                "min_coverage ({}) must be in (0, 1]",
                self.min_coverage
            ));
        }
        if self.band_slack == 0 {
            return Err("band_slack must be > 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        assert!(ConverterConfig::default().validate().is_ok());
        assert!(ConverterConfig::for_short_context().validate().is_ok());
    }

    #[test]
    fn test_window_capacity() {
        let config = ConverterConfig::default();
        assert_eq!(config.window_capacity(10), 499);
        assert_eq!(config.window_capacity(600), 0);
    }

    #[test]
    fn test_config_validation() {
        let mut config = ConverterConfig {
            max_seq_length: 67,
            max_query_length: 64,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        config.max_seq_length = 68;
        assert!(config.validate().is_ok());

        config.doc_stride = 0;
        assert!(config.validate().is_err());

        config.doc_stride = 1;
        config.alignment.min_coverage = 1.5;
        assert!(config.validate().is_err());

        config.alignment.min_coverage = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_deserializes_without_alignment() {
        let config: ConverterConfig = serde_json::from_str(
            r#"{"max_seq_length":384,"max_query_length":64,"doc_stride":128,"lowercase":true}"#,
        )
        .expect("config");
        assert_eq!(config.alignment, AlignmentConfig::default());
        assert!(config.lowercase);
    }
}
