//! Error types for mapkit.
//!
//! This module defines the error hierarchy used across the crate:
//!
//! - [`CsvError`] - file and codec errors, malformed rows
//! - [`MappingError`] - mapping declaration and lookup errors
//! - [`CapabilityError`] - capability attachment errors
//! - [`PersistenceError`] - errors raised by a [`crate::store::Collection`]
//! - [`ConfigError`] - invalid environment configuration
//! - [`DslError`] - declarative hook compilation errors
//! - [`TransformError`] - top-level error of one import/export call
//! - [`ManifestError`] - manifest loading errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

use crate::mapping::Direction;

/// Error type returned by user hooks.
///
/// Hooks may fail with any error; the engine keeps it untouched as the
/// `source` of [`TransformError::Hook`].
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

// =============================================================================
// CSV Errors
// =============================================================================

/// Errors while reading or writing a CSV file.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to open, create or flush the file.
    #[error("CSV file error: {0}")]
    Io(#[from] std::io::Error),

    /// The CSV codec rejected the input or output.
    #[error("CSV codec error: {0}")]
    Codec(#[from] csv::Error),

    /// A line does not have the expected number of fields.
    #[error("Malformed row at line {line}: expected {expected} fields, found {found}")]
    MalformedRow {
        line: u64,
        expected: usize,
        found: usize,
    },

    /// The header line has no entry for a mapped column.
    #[error("Missing column '{column}' in header at line {line}")]
    MissingColumn { line: u64, column: String },

    /// The delimiter is not a single ASCII character.
    #[error("Invalid delimiter {0:?}: must be an ASCII character")]
    InvalidDelimiter(char),
}

// =============================================================================
// Mapping Errors
// =============================================================================

/// Errors while declaring or looking up a mapping.
#[derive(Debug, Error)]
pub enum MappingError {
    /// A mapping with this name already exists in this direction.
    #[error("{direction} mapping '{name}' is already defined")]
    Duplicate { name: String, direction: Direction },

    /// No mapping with this name exists in this direction.
    #[error("{direction} mapping '{name}' is not defined")]
    Unknown { name: String, direction: Direction },

    /// A mapping was declared without columns.
    #[error("Mapping '{0}' has no columns")]
    NoColumns(String),

    /// A mapping names a column the class does not declare.
    #[error("Mapping '{mapping}' references unknown field '{column}'")]
    UnknownColumn { mapping: String, column: String },

    /// The class has not attached the capability providing mappings.
    #[error("Capability '{0}' is not attached to this class")]
    CapabilityMissing(String),

    /// The mapping options name a delimiter the codec cannot use.
    #[error("Mapping '{mapping}' has an invalid delimiter {delimiter:?}")]
    InvalidDelimiter { mapping: String, delimiter: char },
}

// =============================================================================
// Capability Errors
// =============================================================================

/// Errors while attaching capabilities to a class.
#[derive(Debug, Error)]
pub enum CapabilityError {
    /// The loader does not know this capability.
    #[error("Unknown capability: {0}")]
    Unknown(String),

    /// The class has not attached this capability.
    #[error("Capability '{0}' is not attached to this class")]
    NotAttached(String),

    /// A helper declaration was rejected by the schema.
    #[error("Field declaration rejected: {0}")]
    Declaration(#[from] PersistenceError),
}

// =============================================================================
// Persistence Errors
// =============================================================================

/// Errors raised by the persistence collaborator.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The attribute names a field the class does not declare.
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// The value cannot be assigned to a field of this kind.
    #[error("Invalid value for field '{field}' ({kind}): {value}")]
    InvalidValue {
        field: String,
        kind: String,
        value: String,
    },

    /// Store IO error.
    #[error("Store IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Store JSON error.
    #[error("Store JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable holds an unusable value.
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },
}

// =============================================================================
// DSL Errors
// =============================================================================

/// Errors while compiling declarative hooks.
#[derive(Debug, Error)]
pub enum DslError {
    /// A `replace` operation has a pattern that is not a valid regex.
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

// =============================================================================
// Transform Errors (top-level)
// =============================================================================

/// Error of a single import or export call.
///
/// Wraps all lower-level errors. Hook errors keep the original error as
/// their source.
#[derive(Debug, Error)]
pub enum TransformError {
    /// CSV error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Mapping error.
    #[error("Mapping error: {0}")]
    Mapping(#[from] MappingError),

    /// Persistence error.
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// A hook failed.
    #[error("Hook failed at {at}: {source}")]
    Hook {
        at: String,
        #[source]
        source: HookError,
    },
}

impl TransformError {
    /// Wrap a hook error with the location it happened at.
    pub fn hook(at: impl Into<String>, source: HookError) -> Self {
        TransformError::Hook {
            at: at.into(),
            source,
        }
    }
}

// =============================================================================
// Manifest Errors
// =============================================================================

/// Errors while loading a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// Failed to read the manifest file.
    #[error("Failed to read manifest: {0}")]
    Io(#[from] std::io::Error),

    /// The manifest is not valid JSON.
    #[error("Invalid manifest JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A capability could not be attached.
    #[error("Capability error: {0}")]
    Capability(#[from] CapabilityError),

    /// A mapping could not be declared.
    #[error("Mapping error: {0}")]
    Mapping(#[from] MappingError),

    /// A field declaration was rejected.
    #[error("Field error: {0}")]
    Field(#[from] PersistenceError),

    /// A declarative hook could not be compiled.
    #[error("Hook error: {0}")]
    Dsl(#[from] DslError),

    /// The manifest has no class with this name.
    #[error("Unknown class: {0}")]
    UnknownClass(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for mapping declarations.
pub type MappingResult<T> = Result<T, MappingError>;

/// Result type for persistence operations.
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Result type for import/export calls.
pub type TransformResult<T> = Result<T, TransformError>;

/// Result type for hook compilation.
pub type DslResult<T> = Result<T, DslError>;

/// Result type for manifest loading.
pub type ManifestResult<T> = Result<T, ManifestError>;
