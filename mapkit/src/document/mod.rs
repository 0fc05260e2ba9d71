//! Document classes.
//!
//! A [`DocumentClass`] is a schema plus the capabilities attached to it. With
//! `csv_transformer` attached it carries a [`MappingRegistry`] and exposes the
//! mapping entry points:
//!
//! ```rust,ignore
//! let mut address = DocumentClass::new(
//!     Schema::new("Address")
//!         .field("name", FieldKind::String)
//!         .field("region", FieldKind::String)
//!         .field("zip_code", FieldKind::Integer),
//! );
//! address.attach(&["csv_transformer"])?;
//!
//! address.declare_export_mapping(
//!     "address",
//!     &["zip_code", "name", "region"],
//!     CsvOptions::default(),
//!     Some(export_hook(|mut row, _record| {
//!         let zip = format!("IN-{}", &row["zip_code"]);
//!         row.set("zip_code", zip);
//!         Ok(Outcome::Emit(row))
//!     })),
//! )?;
//!
//! address.export_via("address", "address.csv", &collection, None)?;
//! ```

use serde_json::Value;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::info;

use crate::capability::{CSV_TRANSFORMER, MODEL_HELPERS, STANDARD_LOADER};
use crate::error::{CapabilityError, MappingError, MappingResult, TransformResult};
use crate::mapping::columns::{resolve_columns, Column};
use crate::mapping::MappingRegistry;
use crate::models::helpers::{declare_multi_fields, ModelHelpers, PredicateNaming};
use crate::models::{FieldKind, Record, Schema};
use crate::store::{Collection, Criteria};
use crate::transform::engine::{export_records, import_rows, ExportSummary, ImportSummary};
use crate::transform::options::CsvOptions;
use crate::transform::row::{ExportHook, ImportHook};

/// A document-model class: its fields and attached capabilities.
#[derive(Debug, Clone)]
pub struct DocumentClass {
    schema: Schema,
    capabilities: BTreeSet<String>,
    mappings: Option<MappingRegistry>,
    helpers: Option<ModelHelpers>,
}

impl DocumentClass {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            capabilities: BTreeSet::new(),
            mappings: None,
            helpers: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.schema.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    // =========================================================================
    // Capabilities
    // =========================================================================

    /// Attach capabilities from the standard loader.
    pub fn attach<S: AsRef<str>>(&mut self, names: &[S]) -> Result<&mut Self, CapabilityError> {
        STANDARD_LOADER.attach(self, names)?;
        Ok(self)
    }

    pub fn has_capability(&self, name: &str) -> bool {
        self.capabilities.contains(name)
    }

    pub fn capabilities(&self) -> impl Iterator<Item = &str> {
        self.capabilities.iter().map(String::as_str)
    }

    /// Record a capability as attached. Returns `false` if it already was.
    pub(crate) fn mark_attached(&mut self, name: &str) -> bool {
        self.capabilities.insert(name.to_string())
    }

    pub(crate) fn install_mapping_registry(&mut self) {
        self.mappings.get_or_insert_with(MappingRegistry::new);
    }

    pub(crate) fn install_model_helpers(&mut self) {
        self.helpers.get_or_insert_with(ModelHelpers::new);
    }

    // =========================================================================
    // Mapping Registry
    // =========================================================================

    pub fn mappings(&self) -> MappingResult<&MappingRegistry> {
        self.mappings
            .as_ref()
            .ok_or_else(|| MappingError::CapabilityMissing(CSV_TRANSFORMER.to_string()))
    }

    /// Declare an import mapping, reachable through [`DocumentClass::import_via`].
    pub fn declare_import_mapping<S: AsRef<str>>(
        &mut self,
        name: &str,
        columns: &[S],
        options: CsvOptions,
        hook: Option<ImportHook>,
    ) -> MappingResult<()> {
        let registry = self
            .mappings
            .as_mut()
            .ok_or_else(|| MappingError::CapabilityMissing(CSV_TRANSFORMER.to_string()))?;
        registry.declare_import(&self.schema, name, columns, options, hook)
    }

    /// Declare an export mapping, reachable through [`DocumentClass::export_via`].
    pub fn declare_export_mapping<S: AsRef<str>>(
        &mut self,
        name: &str,
        columns: &[S],
        options: CsvOptions,
        hook: Option<ExportHook>,
    ) -> MappingResult<()> {
        let registry = self
            .mappings
            .as_mut()
            .ok_or_else(|| MappingError::CapabilityMissing(CSV_TRANSFORMER.to_string()))?;
        registry.declare_export(&self.schema, name, columns, options, hook)
    }

    /// Columns used when no mapping fixes them.
    ///
    /// Without options: the eligible fields in declaration order (identity
    /// and non-scalar fields excluded). With options: `options.columns` or
    /// the eligible fields, with header labels applied.
    pub fn resolve_default_columns(&self, options: Option<&CsvOptions>) -> Vec<Column> {
        resolve_columns(&self.schema, options)
    }

    /// Import `path` through the named import mapping.
    pub fn import_via<C: Collection + ?Sized>(
        &self,
        name: &str,
        path: impl AsRef<Path>,
        collection: &mut C,
    ) -> TransformResult<ImportSummary> {
        let mapping = self.mappings()?.import(name)?;
        info!(
            class = %self.name(),
            mapping = name,
            path = %path.as_ref().display(),
            "importing csv"
        );

        self.csv_import(path, collection, &mapping.working_options(), mapping.hook.as_ref())
    }

    /// Export to `path` through the named export mapping.
    ///
    /// `criteria` defaults to the collection's selection of every record.
    pub fn export_via<C: Collection + ?Sized>(
        &self,
        name: &str,
        path: impl AsRef<Path>,
        collection: &C,
        criteria: Option<Criteria>,
    ) -> TransformResult<ExportSummary> {
        let mapping = self.mappings()?.export(name)?;
        let criteria = criteria.unwrap_or_else(|| collection.default_selection());
        info!(
            class = %self.name(),
            mapping = name,
            path = %path.as_ref().display(),
            "exporting csv"
        );

        self.csv_export(
            path,
            collection,
            &criteria,
            &mapping.working_options(),
            mapping.hook.as_ref(),
        )
    }

    /// Import `path` with ad-hoc options.
    pub fn csv_import<C: Collection + ?Sized>(
        &self,
        path: impl AsRef<Path>,
        collection: &mut C,
        options: &CsvOptions,
        hook: Option<&ImportHook>,
    ) -> TransformResult<ImportSummary> {
        let columns = self.resolve_default_columns(Some(options));
        import_rows(path.as_ref(), columns, options, collection, hook)
    }

    /// Export the selected records to `path` with ad-hoc options.
    pub fn csv_export<C: Collection + ?Sized>(
        &self,
        path: impl AsRef<Path>,
        collection: &C,
        criteria: &Criteria,
        options: &CsvOptions,
        hook: Option<&ExportHook>,
    ) -> TransformResult<ExportSummary> {
        let columns = self.resolve_default_columns(Some(options));
        export_records(path.as_ref(), columns, options, collection, criteria, hook)
    }

    // =========================================================================
    // Model Helpers
    // =========================================================================

    fn helpers_mut(&mut self) -> Result<&mut ModelHelpers, CapabilityError> {
        self.helpers
            .as_mut()
            .ok_or_else(|| CapabilityError::NotAttached(MODEL_HELPERS.to_string()))
    }

    /// Declare several fields of one kind (`string` when `kind` is `None`).
    ///
    /// Defaults are coerced through the kind; a rejected default declares
    /// none of the fields.
    pub fn multi_fields(
        &mut self,
        fields: &[(&str, Option<Value>)],
        kind: Option<FieldKind>,
    ) -> Result<(), CapabilityError> {
        self.helpers_mut()?;
        declare_multi_fields(&mut self.schema, fields, kind)?;
        Ok(())
    }

    /// Register one predicate per value of `field`.
    pub fn boolean_methods(
        &mut self,
        field: &str,
        values: &[&str],
        naming: PredicateNaming,
    ) -> Result<(), CapabilityError> {
        self.helpers_mut()?.boolean_methods(field, values, &naming);
        Ok(())
    }

    /// Evaluate a predicate registered with [`DocumentClass::boolean_methods`].
    pub fn predicate(&self, name: &str, record: &Record) -> Option<bool> {
        self.helpers.as_ref()?.predicate(name, record)
    }
}
