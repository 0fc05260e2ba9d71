//! CSV transformation.
//!
//! - options: per-call CSV configuration
//! - row: rows, attribute maps, hook signatures
//! - engine: the read and write flows
//! - dsl: declarative hooks built from operation lists

pub mod dsl;
pub mod engine;
pub mod options;
pub mod row;

pub use engine::{export_records, import_rows, CsvSink, CsvSource, ExportSummary, ImportSummary};
pub use options::CsvOptions;
pub use row::{export_hook, import_hook, ExportHook, ImportHook, Outcome, Row};
