//! Mapping Registry.
//!
//! A class declares named import and export mappings, each bound to a fixed
//! column list, options and an optional hook. Import and export names live in
//! separate namespaces; a name can be declared at most once per direction.
//!
//! Mappings are immutable once declared.

pub mod columns;

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{MappingError, MappingResult};
use crate::models::Schema;
use crate::transform::options::CsvOptions;
use crate::transform::row::{ExportHook, ImportHook};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Import,
    Export,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Import => f.write_str("import"),
            Direction::Export => f.write_str("export"),
        }
    }
}

/// A named binding from CSV rows to new records.
#[derive(Clone)]
pub struct ImportMapping {
    pub name: String,
    pub columns: Vec<String>,
    pub options: CsvOptions,
    pub hook: Option<ImportHook>,
}

/// A named binding from records to CSV rows.
#[derive(Clone)]
pub struct ExportMapping {
    pub name: String,
    pub columns: Vec<String>,
    pub options: CsvOptions,
    pub hook: Option<ExportHook>,
}

impl ImportMapping {
    /// Copy of the mapping options with the fixed columns set.
    pub fn working_options(&self) -> CsvOptions {
        CsvOptions {
            columns: Some(self.columns.clone()),
            ..self.options.clone()
        }
    }
}

impl ExportMapping {
    /// Copy of the mapping options with the fixed columns set.
    pub fn working_options(&self) -> CsvOptions {
        CsvOptions {
            columns: Some(self.columns.clone()),
            ..self.options.clone()
        }
    }
}

impl fmt::Debug for ImportMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImportMapping")
            .field("name", &self.name)
            .field("columns", &self.columns)
            .field("options", &self.options)
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

impl fmt::Debug for ExportMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportMapping")
            .field("name", &self.name)
            .field("columns", &self.columns)
            .field("options", &self.options)
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

/// Declared mappings of one class, by direction and name.
#[derive(Debug, Clone, Default)]
pub struct MappingRegistry {
    imports: BTreeMap<String, ImportMapping>,
    exports: BTreeMap<String, ExportMapping>,
}

impl MappingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an import mapping.
    ///
    /// Fails with [`MappingError::Duplicate`] if `name` is already an import
    /// mapping; the existing mapping is left untouched.
    pub fn declare_import<S: AsRef<str>>(
        &mut self,
        schema: &Schema,
        name: &str,
        columns: &[S],
        options: CsvOptions,
        hook: Option<ImportHook>,
    ) -> MappingResult<()> {
        if self.imports.contains_key(name) {
            return Err(duplicate(name, Direction::Import));
        }
        let columns = checked_columns(schema, name, columns)?;
        checked_options(name, &options)?;

        self.imports.insert(
            name.to_string(),
            ImportMapping {
                name: name.to_string(),
                columns,
                options,
                hook,
            },
        );
        Ok(())
    }

    /// Declare an export mapping. Same duplicate contract as imports.
    pub fn declare_export<S: AsRef<str>>(
        &mut self,
        schema: &Schema,
        name: &str,
        columns: &[S],
        options: CsvOptions,
        hook: Option<ExportHook>,
    ) -> MappingResult<()> {
        if self.exports.contains_key(name) {
            return Err(duplicate(name, Direction::Export));
        }
        let columns = checked_columns(schema, name, columns)?;
        checked_options(name, &options)?;

        self.exports.insert(
            name.to_string(),
            ExportMapping {
                name: name.to_string(),
                columns,
                options,
                hook,
            },
        );
        Ok(())
    }

    pub fn import(&self, name: &str) -> MappingResult<&ImportMapping> {
        self.imports.get(name).ok_or_else(|| MappingError::Unknown {
            name: name.to_string(),
            direction: Direction::Import,
        })
    }

    pub fn export(&self, name: &str) -> MappingResult<&ExportMapping> {
        self.exports.get(name).ok_or_else(|| MappingError::Unknown {
            name: name.to_string(),
            direction: Direction::Export,
        })
    }

    pub fn imports(&self) -> impl Iterator<Item = &ImportMapping> {
        self.imports.values()
    }

    pub fn exports(&self) -> impl Iterator<Item = &ExportMapping> {
        self.exports.values()
    }
}

fn duplicate(name: &str, direction: Direction) -> MappingError {
    MappingError::Duplicate {
        name: name.to_string(),
        direction,
    }
}

fn checked_columns<S: AsRef<str>>(
    schema: &Schema,
    mapping: &str,
    columns: &[S],
) -> MappingResult<Vec<String>> {
    if columns.is_empty() {
        return Err(MappingError::NoColumns(mapping.to_string()));
    }

    columns
        .iter()
        .map(|c| {
            let column = c.as_ref();
            if schema.has_field(column) {
                Ok(column.to_string())
            } else {
                Err(MappingError::UnknownColumn {
                    mapping: mapping.to_string(),
                    column: column.to_string(),
                })
            }
        })
        .collect()
}

fn checked_options(mapping: &str, options: &CsvOptions) -> MappingResult<()> {
    options
        .delimiter_byte()
        .map(|_| ())
        .map_err(|_| MappingError::InvalidDelimiter {
            mapping: mapping.to_string(),
            delimiter: options.delimiter,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldKind;
    use crate::transform::row::{export_hook, Outcome};

    fn schema() -> Schema {
        Schema::new("Address")
            .field("name", FieldKind::String)
            .field("zip_code", FieldKind::Integer)
    }

    #[test]
    fn test_duplicate_per_direction() {
        let schema = schema();
        let mut registry = MappingRegistry::new();

        registry
            .declare_import(&schema, "address", &["name"], CsvOptions::new(), None)
            .unwrap();
        registry
            .declare_export(&schema, "address", &["name"], CsvOptions::new(), None)
            .unwrap();

        let err = registry
            .declare_import(&schema, "address", &["zip_code"], CsvOptions::new(), None)
            .unwrap_err();
        assert!(matches!(err, MappingError::Duplicate { direction: Direction::Import, .. }));

        let err = registry
            .declare_export(&schema, "address", &["zip_code"], CsvOptions::new(), None)
            .unwrap_err();
        assert!(matches!(err, MappingError::Duplicate { direction: Direction::Export, .. }));

        assert_eq!(registry.import("address").unwrap().columns, vec!["name"]);
    }

    #[test]
    fn test_unknown_column_rejected() {
        let mut registry = MappingRegistry::new();
        let err = registry
            .declare_export(&schema(), "address", &["name", "colour"], CsvOptions::new(), None)
            .unwrap_err();

        assert!(matches!(
            err,
            MappingError::UnknownColumn { ref column, .. } if column == "colour"
        ));
        assert!(registry.export("address").is_err());
    }

    #[test]
    fn test_non_ascii_delimiter_rejected() {
        let mut registry = MappingRegistry::new();
        let options = CsvOptions::new().with_delimiter('§');
        let err = registry
            .declare_import(&schema(), "address", &["name"], options, None)
            .unwrap_err();

        assert!(matches!(err, MappingError::InvalidDelimiter { delimiter: '§', .. }));
        assert!(registry.import("address").is_err());
    }

    #[test]
    fn test_empty_columns_rejected() {
        let mut registry = MappingRegistry::new();
        let columns: [&str; 0] = [];
        let err = registry
            .declare_import(&schema(), "empty", &columns, CsvOptions::new(), None)
            .unwrap_err();
        assert!(matches!(err, MappingError::NoColumns(_)));
    }

    #[test]
    fn test_working_options_fix_columns() {
        let mut registry = MappingRegistry::new();
        let options = CsvOptions::new().with_columns(&["zip_code"]).with_headers(false);
        registry
            .declare_export(
                &schema(),
                "names",
                &["name"],
                options,
                Some(export_hook(|row, _| Ok(Outcome::Emit(row)))),
            )
            .unwrap();

        let mapping = registry.export("names").unwrap();
        let working = mapping.working_options();
        assert_eq!(working.columns, Some(vec!["name".to_string()]));
        assert!(!working.headers);
        assert!(format!("{:?}", mapping).contains("hook: true"));
    }

    #[test]
    fn test_unknown_mapping() {
        let registry = MappingRegistry::new();
        let err = registry.import("missing").unwrap_err();
        assert_eq!(err.to_string(), "import mapping 'missing' is not defined");
    }
}
