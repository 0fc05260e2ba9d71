//! Rows, hook outcomes and hook signatures.

use std::ops::Index;
use std::sync::Arc;

use crate::error::HookError;
use crate::models::{Attributes, Record};

/// One CSV line as an ordered key to string value mapping.
///
/// Keys are fixed when the row is built; hooks can change values but not
/// add or remove keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    keys: Vec<String>,
    values: Vec<String>,
    line: Option<u64>,
}

impl Row {
    /// Build a row. Missing values are filled with empty strings and extra
    /// values are dropped.
    pub fn new(keys: Vec<String>, mut values: Vec<String>) -> Self {
        values.resize(keys.len(), String::new());
        Self {
            keys,
            values,
            line: None,
        }
    }

    pub(crate) fn with_line(mut self, line: u64) -> Self {
        self.line = Some(line);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.position(key).map(|i| self.values[i].as_str())
    }

    /// Value at a column position.
    pub fn value_at(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(String::as_str)
    }

    /// Replace the value of an existing key. Returns `false` for unknown keys.
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> bool {
        match self.position(key) {
            Some(i) => {
                self.values[i] = value.into();
                true
            }
            None => false,
        }
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Source line for rows read from a file.
    pub fn line(&self) -> Option<u64> {
        self.line
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.keys
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(String::as_str))
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.keys.iter().position(|k| k == key)
    }
}

impl Index<&str> for Row {
    type Output = str;

    fn index(&self, key: &str) -> &str {
        match self.get(key) {
            Some(value) => value,
            None => panic!("row has no column '{}'", key),
        }
    }
}

/// Result of a hook: keep the (possibly changed) value, or drop it.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Emit(T),
    Skip,
}

impl<T> Outcome<T> {
    pub fn is_skip(&self) -> bool {
        matches!(self, Outcome::Skip)
    }
}

impl<T> From<Option<T>> for Outcome<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Outcome::Emit(v),
            None => Outcome::Skip,
        }
    }
}

/// Export hook: sees the row built from a record and the record itself.
pub type ExportHook = Arc<dyn Fn(Row, &Record) -> Result<Outcome<Row>, HookError> + Send + Sync>;

/// Import hook: sees the parsed row and the attributes built from it.
pub type ImportHook =
    Arc<dyn Fn(&Row, Attributes) -> Result<Outcome<Attributes>, HookError> + Send + Sync>;

/// Wrap a closure as an [`ExportHook`].
pub fn export_hook<F>(hook: F) -> ExportHook
where
    F: Fn(Row, &Record) -> Result<Outcome<Row>, HookError> + Send + Sync + 'static,
{
    Arc::new(hook)
}

/// Wrap a closure as an [`ImportHook`].
pub fn import_hook<F>(hook: F) -> ImportHook
where
    F: Fn(&Row, Attributes) -> Result<Outcome<Attributes>, HookError> + Send + Sync + 'static,
{
    Arc::new(hook)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> Row {
        Row::new(
            vec!["zip_code".into(), "name".into()],
            vec!["411001".into(), "A".into()],
        )
    }

    #[test]
    fn test_set_only_touches_existing_keys() {
        let mut row = row();
        assert!(row.set("zip_code", "IN-411001"));
        assert!(!row.set("region", "X"));

        assert_eq!(&row["zip_code"], "IN-411001");
        assert_eq!(row.keys(), ["zip_code", "name"]);
    }

    #[test]
    fn test_new_pads_missing_values() {
        let row = Row::new(vec!["a".into(), "b".into()], vec!["1".into()]);
        assert_eq!(row.values(), ["1", ""]);
        assert_eq!(row.value_at(1), Some(""));
        assert_eq!(row.value_at(2), None);
    }

    #[test]
    fn test_outcome_from_option() {
        assert_eq!(Outcome::from(Some(1)), Outcome::Emit(1));
        assert!(Outcome::<i32>::from(None).is_skip());
    }
}
