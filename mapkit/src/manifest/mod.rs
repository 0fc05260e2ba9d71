//! Class manifests.
//!
//! A manifest declares document classes, their fields, capabilities and
//! mappings as JSON, with declarative hooks in place of closures:
//!
//! ```json
//! {
//!   "classes": [{
//!     "name": "Address",
//!     "capabilities": ["csv_transformer"],
//!     "fields": [
//!       {"name": "name", "kind": "string"},
//!       {"name": "zip_code", "kind": "integer"}
//!     ],
//!     "export_mappings": [{
//!       "name": "address",
//!       "columns": ["zip_code", "name"],
//!       "hook": {"transforms": {"zip_code": [{"type": "ensure_prefix", "value": "IN-"}]}}
//!     }]
//!   }]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::config::EngineConfig;
use crate::document::DocumentClass;
use crate::error::{ManifestError, ManifestResult};
use crate::models::{FieldDescriptor, Schema};
use crate::transform::dsl::HookSpec;
use crate::transform::options::CsvOptions;

/// Default manifest file name.
pub const DEFAULT_MANIFEST: &str = "mapkit.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub classes: Vec<ClassDecl>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
    #[serde(default)]
    pub import_mappings: Vec<MappingDecl>,
    #[serde(default)]
    pub export_mappings: Vec<MappingDecl>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingDecl {
    pub name: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub options: Option<CsvOptions>,
    #[serde(default)]
    pub hook: Option<HookSpec>,
}

impl MappingDecl {
    /// Declared options, with unset values taken from `config`.
    fn options(&self, config: &EngineConfig) -> CsvOptions {
        match &self.options {
            None => CsvOptions::from_config(config),
            Some(options) => {
                let mut options = options.clone();
                options.batch_size.get_or_insert(config.batch_size);
                options
            }
        }
    }
}

impl Manifest {
    pub fn from_json(json: &str) -> ManifestResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> ManifestResult<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// Build every declared class.
    pub fn build(&self, config: &EngineConfig) -> ManifestResult<Catalog> {
        let mut classes = BTreeMap::new();
        for decl in &self.classes {
            let class = decl.build(config)?;
            debug!(class = %decl.name, fields = decl.fields.len(), "built class");
            classes.insert(decl.name.clone(), class);
        }
        Ok(Catalog { classes })
    }
}

impl ClassDecl {
    fn build(&self, config: &EngineConfig) -> ManifestResult<DocumentClass> {
        let mut schema = Schema::new(self.name.clone());
        for field in &self.fields {
            schema.declare(field.clone())?;
        }

        let mut class = DocumentClass::new(schema);
        class.attach(&self.capabilities)?;

        for mapping in &self.import_mappings {
            class.declare_import_mapping(
                &mapping.name,
                &mapping.columns,
                mapping.options(config),
                mapping.hook.as_ref().map(HookSpec::import_hook).transpose()?,
            )?;
        }
        for mapping in &self.export_mappings {
            class.declare_export_mapping(
                &mapping.name,
                &mapping.columns,
                mapping.options(config),
                mapping.hook.as_ref().map(HookSpec::export_hook).transpose()?,
            )?;
        }

        Ok(class)
    }
}

/// Classes built from a manifest, by name.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    classes: BTreeMap<String, DocumentClass>,
}

impl Catalog {
    pub fn class(&self, name: &str) -> ManifestResult<&DocumentClass> {
        self.classes
            .get(name)
            .ok_or_else(|| ManifestError::UnknownClass(name.to_string()))
    }

    pub fn classes(&self) -> impl Iterator<Item = &DocumentClass> {
        self.classes.values()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CapabilityError, DslError, MappingError, PersistenceError};
    use crate::models::FieldKind;
    use crate::store::MemoryCollection;
    use std::fs;
    use tempfile::tempdir;

    const ADDRESS: &str = r#"{
        "classes": [{
            "name": "Address",
            "capabilities": ["csv_transformer"],
            "fields": [
                {"name": "name", "kind": "string"},
                {"name": "region", "kind": "string"},
                {"name": "zip_code", "kind": "integer"},
                {"name": "country", "kind": "string", "default": "IN"}
            ],
            "import_mappings": [
                {"name": "address", "columns": ["name", "region", "zip_code"]}
            ],
            "export_mappings": [{
                "name": "address",
                "columns": ["zip_code", "name", "region"],
                "options": {"batch_size": 1},
                "hook": {"transforms": {"zip_code": [{"type": "ensure_prefix", "value": "IN-"}]}}
            }]
        }]
    }"#;

    #[test]
    fn test_build_catalog() {
        let catalog = Manifest::from_json(ADDRESS)
            .unwrap()
            .build(&EngineConfig::default())
            .unwrap();
        let class = catalog.class("Address").unwrap();

        assert_eq!(class.schema().get("zip_code").unwrap().kind, FieldKind::Integer);
        let export = class.mappings().unwrap().export("address").unwrap();
        assert_eq!(export.options.batch_size, Some(1));
        let import = class.mappings().unwrap().import("address").unwrap();
        assert_eq!(import.options.batch_size, Some(1000));
        assert!(matches!(catalog.class("Office"), Err(ManifestError::UnknownClass(_))));
    }

    #[test]
    fn test_manifest_round_trip_through_files() {
        let dir = tempdir().unwrap();
        let manifest_path = dir.path().join("mapkit.json");
        fs::write(&manifest_path, ADDRESS).unwrap();
        let input = dir.path().join("in.csv");
        fs::write(&input, "name,region,zip_code\nA,X,411001\nB,Y,560001\n").unwrap();
        let output = dir.path().join("out.csv");

        let catalog = Manifest::load(&manifest_path)
            .unwrap()
            .build(&EngineConfig::default())
            .unwrap();
        let class = catalog.class("Address").unwrap();
        let mut collection = MemoryCollection::new(class.schema().clone());

        class.import_via("address", &input, &mut collection).unwrap();
        assert_eq!(collection.records()[0].render("country"), "IN");

        let summary = class.export_via("address", &output, &collection, None).unwrap();
        assert_eq!(summary.batches, 2);
        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "zip_code,name,region\nIN-411001,A,X\nIN-560001,B,Y\n"
        );
    }

    #[test]
    fn test_unknown_capability() {
        let json = r#"{"classes": [{"name": "A", "capabilities": ["geo_index"]}]}"#;
        let err = Manifest::from_json(json)
            .unwrap()
            .build(&EngineConfig::default())
            .unwrap_err();
        assert!(matches!(err, ManifestError::Capability(CapabilityError::Unknown(_))));
    }

    #[test]
    fn test_mapping_without_capability() {
        let json = r#"{"classes": [{
            "name": "A",
            "fields": [{"name": "name", "kind": "string"}],
            "import_mappings": [{"name": "a", "columns": ["name"]}]
        }]}"#;
        let err = Manifest::from_json(json)
            .unwrap()
            .build(&EngineConfig::default())
            .unwrap_err();
        assert!(matches!(err, ManifestError::Mapping(MappingError::CapabilityMissing(_))));
    }

    fn build(json: &str) -> ManifestResult<Catalog> {
        Manifest::from_json(json)?.build(&EngineConfig::default())
    }

    #[test]
    fn test_default_rejected_by_field_kind() {
        let json = r#"{"classes": [{
            "name": "A",
            "fields": [{"name": "floor", "kind": "integer", "default": "abc"}]
        }]}"#;
        let err = build(json).unwrap_err();
        assert!(matches!(err, ManifestError::Field(PersistenceError::InvalidValue { .. })));
    }

    #[test]
    fn test_default_coerced_to_field_kind() {
        let json = r#"{"classes": [{
            "name": "A",
            "fields": [{"name": "floor", "kind": "integer", "default": "3"}]
        }]}"#;
        let catalog = build(json).unwrap();
        let field = catalog.class("A").unwrap().schema().get("floor").cloned().unwrap();
        assert_eq!(field.default, Some(serde_json::json!(3)));
    }

    #[test]
    fn test_invalid_replace_pattern_fails_build() {
        let json = r#"{"classes": [{
            "name": "A",
            "capabilities": ["csv_transformer"],
            "fields": [{"name": "name", "kind": "string"}],
            "export_mappings": [{
                "name": "a",
                "columns": ["name"],
                "hook": {"transforms": {"name": [{"type": "replace", "pattern": "("}]}}
            }]
        }]}"#;
        let err = build(json).unwrap_err();
        assert!(matches!(err, ManifestError::Dsl(DslError::InvalidPattern { .. })));
    }

    #[test]
    fn test_non_ascii_delimiter_fails_build() {
        let json = r#"{"classes": [{
            "name": "A",
            "capabilities": ["csv_transformer"],
            "fields": [{"name": "name", "kind": "string"}],
            "import_mappings": [{"name": "a", "columns": ["name"], "options": {"delimiter": "§"}}]
        }]}"#;
        let err = build(json).unwrap_err();
        assert!(matches!(
            err,
            ManifestError::Mapping(MappingError::InvalidDelimiter { delimiter: '§', .. })
        ));
    }
}
