//! Declarative hooks.
//!
//! - `operations`: per-value column operations
//! - `hook`: [`HookSpec`], compiled into import and export hooks
//!
//! ```rust,ignore
//! let spec: HookSpec = serde_json::from_str(r#"{
//!     "transforms": { "zip_code": [{ "type": "ensure_prefix", "value": "IN-" }] }
//! }"#)?;
//! class.declare_export_mapping("address", &columns, options, Some(spec.export_hook()?))?;
//! ```

pub mod hook;
pub mod operations;

pub use hook::HookSpec;
pub use operations::{operations_description, Operation, Pipeline};
