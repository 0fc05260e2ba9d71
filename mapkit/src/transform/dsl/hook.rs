//! Declarative hooks.
//!
//! A [`HookSpec`] lists operations per column and the columns that must not
//! be empty. It compiles into the same hook types a closure would produce,
//! so manifests can declare mappings without code. Compilation fails on an
//! invalid `replace` pattern, before any row is processed.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::operations::{Operation, Pipeline};
use crate::error::DslResult;
use crate::models::render_value;
use crate::transform::row::{export_hook, import_hook, ExportHook, ImportHook, Outcome};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HookSpec {
    /// Operations applied to each column, in order.
    pub transforms: BTreeMap<String, Vec<Operation>>,
    /// Columns that skip the row or record when empty after the transforms.
    pub required: Vec<String>,
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

impl HookSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transform(mut self, column: impl Into<String>, operations: Vec<Operation>) -> Self {
        self.transforms.entry(column.into()).or_default().extend(operations);
        self
    }

    pub fn require(mut self, column: impl Into<String>) -> Self {
        self.required.push(column.into());
        self
    }

    fn pipelines(&self) -> DslResult<Vec<(String, Pipeline)>> {
        self.transforms
            .iter()
            .map(|(column, operations)| Ok((column.clone(), Pipeline::compile(operations)?)))
            .collect()
    }

    /// Hook over the attributes built from each row.
    ///
    /// Transformed values keep their JSON type, so `to_number` hands the
    /// persistence layer a number.
    pub fn import_hook(&self) -> DslResult<ImportHook> {
        let pipelines = self.pipelines()?;
        let required = self.required.clone();
        Ok(import_hook(move |_row, mut attrs| {
            for (column, pipeline) in &pipelines {
                if let Some(value) = attrs.get_mut(column) {
                    *value = pipeline.apply(value);
                }
            }
            let missing = required
                .iter()
                .any(|c| attrs.get(c).map_or(true, is_empty));
            if missing {
                return Ok(Outcome::Skip);
            }
            Ok(Outcome::Emit(attrs))
        }))
    }

    /// Hook over the row built from each record. Results are rendered back
    /// to text.
    pub fn export_hook(&self) -> DslResult<ExportHook> {
        let pipelines = self.pipelines()?;
        let required = self.required.clone();
        Ok(export_hook(move |mut row, _record| {
            for (column, pipeline) in &pipelines {
                if let Some(current) = row.get(column) {
                    let value = pipeline.apply(&Value::String(current.to_string()));
                    row.set(column, render_value(&value));
                }
            }
            let missing = required
                .iter()
                .any(|c| row.get(c).map_or(true, |v| v.trim().is_empty()));
            if missing {
                return Ok(Outcome::Skip);
            }
            Ok(Outcome::Emit(row))
        }))
    }
}
