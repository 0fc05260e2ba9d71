//! Column resolution.
//!
//! A column pairs the field it reads or writes with the label shown in the
//! header line. Labels only change presentation; the selected fields and their
//! order come from the mapping (or the class defaults).

use serde::Serialize;

use crate::models::Schema;
use crate::transform::options::CsvOptions;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub field: String,
    pub label: String,
}

impl Column {
    /// Column labeled with its own field name.
    pub fn new(field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            label: field.clone(),
            field,
        }
    }
}

/// Resolve the columns of one call.
///
/// Without options: the schema's eligible fields. With options:
/// `options.columns` if set, else the eligible fields, post-processed by
/// [`process`].
pub fn resolve_columns(schema: &Schema, options: Option<&CsvOptions>) -> Vec<Column> {
    let defaults = schema.default_columns();

    match options {
        None => defaults.into_iter().map(Column::new).collect(),
        Some(options) => {
            let fields = options.columns.clone().unwrap_or(defaults);
            process(fields, options)
        }
    }
}

/// Apply presentation directives (header labels) to a field list.
pub fn process(fields: Vec<String>, options: &CsvOptions) -> Vec<Column> {
    fields
        .into_iter()
        .map(|field| {
            let label = options
                .labels
                .get(&field)
                .cloned()
                .unwrap_or_else(|| field.clone());
            Column { field, label }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldKind;

    fn schema() -> Schema {
        Schema::new("Address")
            .field("name", FieldKind::String)
            .field("region", FieldKind::String)
            .field("internal", FieldKind::Reference)
    }

    fn fields(columns: &[Column]) -> Vec<&str> {
        columns.iter().map(|c| c.field.as_str()).collect()
    }

    #[test]
    fn test_defaults_without_options() {
        assert_eq!(fields(&resolve_columns(&schema(), None)), vec!["name", "region"]);
    }

    #[test]
    fn test_option_columns_win() {
        let options = CsvOptions::new().with_columns(&["region"]);
        assert_eq!(fields(&resolve_columns(&schema(), Some(&options))), vec!["region"]);
    }

    #[test]
    fn test_labels_keep_selection() {
        let options = CsvOptions::new().with_label("region", "Region Name");
        let columns = resolve_columns(&schema(), Some(&options));

        assert_eq!(fields(&columns), vec!["name", "region"]);
        assert_eq!(columns[0].label, "name");
        assert_eq!(columns[1].label, "Region Name");
    }
}
