//! # Mapkit - named CSV mappings for document-model classes
//!
//! Mapkit lets a document-model class declare named import and export
//! mappings between its records and CSV files, then run them through two
//! entry points.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  CSV File   │◀───▶│   Engine    │◀───▶│    Hooks    │◀───▶│ Collection  │
//! │ (rows)      │     │ (read/write)│     │ (per row)   │     │ (batches)   │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mapkit::{CsvOptions, DocumentClass, FieldKind, MemoryCollection, Schema};
//!
//! let mut address = DocumentClass::new(
//!     Schema::new("Address")
//!         .field("name", FieldKind::String)
//!         .field("zip_code", FieldKind::Integer),
//! );
//! address.attach(&["csv_transformer"])?;
//! address.declare_import_mapping("address", &["name", "zip_code"], CsvOptions::new(), None)?;
//!
//! let mut collection = MemoryCollection::new(address.schema().clone());
//! let summary = address.import_via("address", "addresses.csv", &mut collection)?;
//! println!("{}", summary.summary());
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`config`] - Engine configuration from the environment
//! - [`models`] - Field kinds, schemas, records, model helpers
//! - [`capability`] - Capability loader
//! - [`mapping`] - Mapping registry and column resolution
//! - [`document`] - Document classes and their entry points
//! - [`transform`] - CSV engine, hooks, declarative operations
//! - [`store`] - Persistence collaborator
//! - [`manifest`] - JSON class manifests

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Classes
pub mod capability;
pub mod document;
pub mod mapping;

// Transformation
pub mod transform;

// Persistence
pub mod store;

// Manifests
pub mod manifest;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    CapabilityError, ConfigError, CsvError, DslError, HookError, ManifestError, MappingError,
    PersistenceError, TransformError, TransformResult,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::helpers::PredicateNaming;
pub use models::{Attributes, FieldDescriptor, FieldKind, Record, Schema, IDENTITY_FIELD};

// =============================================================================
// Re-exports - Classes
// =============================================================================

pub use capability::{CapabilityLoader, CSV_TRANSFORMER, MODEL_HELPERS, STANDARD_LOADER};
pub use document::DocumentClass;
pub use mapping::columns::Column;
pub use mapping::{Direction, ExportMapping, ImportMapping, MappingRegistry};

// =============================================================================
// Re-exports - Transform
// =============================================================================

pub use transform::dsl::{operations_description, HookSpec, Operation, Pipeline};
pub use transform::{
    export_hook, export_records, import_hook, import_rows, CsvOptions, ExportHook,
    ExportSummary, ImportHook, ImportSummary, Outcome, Row,
};

// =============================================================================
// Re-exports - Persistence
// =============================================================================

pub use store::{Collection, Criteria, JsonStore, MemoryCollection, SortOrder};

// =============================================================================
// Re-exports - Configuration and manifests
// =============================================================================

pub use config::EngineConfig;
pub use manifest::{Catalog, Manifest};
