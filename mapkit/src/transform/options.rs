//! Per-call CSV configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::{EngineConfig, DEFAULT_BATCH_SIZE};
use crate::error::{CsvError, CsvResult};

/// Options recognized by the import and export flows.
///
/// Deserializes from a partial JSON object; unset keys keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvOptions {
    /// Overrides the default field-derived column list.
    pub columns: Option<Vec<String>>,

    /// Read: the first line holds the row keys. Write: emit a header line.
    pub headers: bool,

    /// Field delimiter. Must be an ASCII character.
    pub delimiter: char,

    /// Header label overrides, keyed by field name.
    pub labels: BTreeMap<String, String>,

    /// Records fetched per batch during export.
    pub batch_size: Option<usize>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            columns: None,
            headers: true,
            delimiter: ',',
            labels: BTreeMap::new(),
            batch_size: None,
        }
    }
}

impl CsvOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options seeded from the engine configuration.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            headers: config.headers,
            delimiter: config.delimiter,
            batch_size: Some(config.batch_size),
            ..Self::default()
        }
    }

    pub fn with_columns<S: AsRef<str>>(mut self, columns: &[S]) -> Self {
        self.columns = Some(columns.iter().map(|c| c.as_ref().to_string()).collect());
        self
    }

    pub fn with_headers(mut self, headers: bool) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_label(mut self, field: impl Into<String>, label: impl Into<String>) -> Self {
        self.labels.insert(field.into(), label.into());
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    /// Delimiter as the byte the codec expects.
    pub fn delimiter_byte(&self) -> CsvResult<u8> {
        u8::try_from(self.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or(CsvError::InvalidDelimiter(self.delimiter))
    }

    /// Effective batch size, never zero.
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let options: CsvOptions = serde_json::from_str(r#"{"delimiter": ";"}"#).unwrap();

        assert!(options.headers);
        assert_eq!(options.delimiter_byte().unwrap(), b';');
        assert_eq!(options.columns, None);
        assert_eq!(options.effective_batch_size(), DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn test_zero_batch_size_is_clamped() {
        let options = CsvOptions::new().with_batch_size(0);
        assert_eq!(options.effective_batch_size(), 1);
    }

    #[test]
    fn test_non_ascii_delimiter_rejected() {
        let options = CsvOptions::new().with_delimiter('§');
        assert!(matches!(options.delimiter_byte(), Err(CsvError::InvalidDelimiter('§'))));
    }
}
