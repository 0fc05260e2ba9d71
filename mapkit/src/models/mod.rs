//! Document models consumed by the mapping engine.
//!
//! - [`FieldKind`] - declared kind of a persisted attribute
//! - [`FieldDescriptor`] - one named, typed attribute of a class
//! - [`Schema`] - the declaration-ordered field list of a class
//! - [`Record`] - one persisted document
//!
//! Values are carried as [`serde_json::Value`]. A field's kind decides how a
//! value is coerced when it is assigned (see [`FieldKind::coerce`]).

pub mod helpers;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt;

use crate::error::{PersistenceError, PersistenceResult};

/// Name of the identity field every schema starts with.
pub const IDENTITY_FIELD: &str = "_id";

/// Field-name to value map used to construct a record.
pub type Attributes = Map<String, Value>;

// =============================================================================
// Field Kind
// =============================================================================

/// Declared kind of a persisted attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    String,
    Integer,
    Float,
    Boolean,
    DateTime,
    /// Identity kind.
    ObjectId,
    /// Relation to another document.
    Reference,
    Array,
    Embedded,
}

impl FieldKind {
    /// Whether this kind is a standard scalar, eligible as a default CSV column.
    pub fn is_standard_scalar(self) -> bool {
        matches!(
            self,
            FieldKind::String
                | FieldKind::Integer
                | FieldKind::Float
                | FieldKind::Boolean
                | FieldKind::DateTime
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Integer => "integer",
            FieldKind::Float => "float",
            FieldKind::Boolean => "boolean",
            FieldKind::DateTime => "date_time",
            FieldKind::ObjectId => "object_id",
            FieldKind::Reference => "reference",
            FieldKind::Array => "array",
            FieldKind::Embedded => "embedded",
        }
    }

    /// Coerce a value assigned to a field of this kind.
    ///
    /// `null` always stays `null`. Blank strings become `null` for every kind
    /// except `string`. Kinds without a scalar representation keep the value
    /// unchanged.
    pub fn coerce(self, field: &str, value: Value) -> PersistenceResult<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        if self != FieldKind::String && value.as_str().is_some_and(|s| s.trim().is_empty()) {
            return Ok(Value::Null);
        }

        let invalid = |value: &Value| PersistenceError::InvalidValue {
            field: field.to_string(),
            kind: self.to_string(),
            value: render_value(value),
        };

        match self {
            FieldKind::String => match value {
                Value::String(_) => Ok(value),
                Value::Number(_) | Value::Bool(_) => Ok(Value::String(render_value(&value))),
                _ => Err(invalid(&value)),
            },
            FieldKind::Integer => match &value {
                Value::Number(n) if n.is_i64() || n.is_u64() => Ok(value.clone()),
                Value::String(s) => s
                    .trim()
                    .parse::<i64>()
                    .map(|n| Value::Number(n.into()))
                    .map_err(|_| invalid(&value)),
                _ => Err(invalid(&value)),
            },
            FieldKind::Float => {
                let parsed = match &value {
                    Value::Number(n) => n.as_f64(),
                    Value::String(s) => s.trim().parse::<f64>().ok(),
                    _ => None,
                };
                parsed
                    .and_then(Number::from_f64)
                    .map(Value::Number)
                    .ok_or_else(|| invalid(&value))
            }
            FieldKind::Boolean => match &value {
                Value::Bool(_) => Ok(value.clone()),
                Value::Number(n) => match n.as_i64() {
                    Some(0) => Ok(Value::Bool(false)),
                    Some(1) => Ok(Value::Bool(true)),
                    _ => Err(invalid(&value)),
                },
                Value::String(s) => match s.trim().to_lowercase().as_str() {
                    "true" | "1" => Ok(Value::Bool(true)),
                    "false" | "0" => Ok(Value::Bool(false)),
                    _ => Err(invalid(&value)),
                },
                _ => Err(invalid(&value)),
            },
            FieldKind::DateTime => match &value {
                Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
                    .map(|dt| Value::String(dt.with_timezone(&Utc).to_rfc3339()))
                    .map_err(|_| invalid(&value)),
                _ => Err(invalid(&value)),
            },
            FieldKind::ObjectId | FieldKind::Reference | FieldKind::Array | FieldKind::Embedded => {
                Ok(value)
            }
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Field Descriptor
// =============================================================================

/// One persisted attribute of a document class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: FieldKind,
    /// Value assigned when a record is created without this field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}

// =============================================================================
// Schema
// =============================================================================

/// Declaration-ordered fields of a document class.
///
/// Every schema starts with the identity field [`IDENTITY_FIELD`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,
    pub fields: Vec<FieldDescriptor>,
}

impl Schema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: vec![FieldDescriptor::new(IDENTITY_FIELD, FieldKind::ObjectId)],
        }
    }

    /// Builder form of [`Schema::declare`] for a field without default.
    pub fn field(mut self, name: &str, kind: FieldKind) -> Self {
        self.insert(FieldDescriptor::new(name, kind));
        self
    }

    /// Declare a field. Redeclaring a name replaces it in place.
    ///
    /// The default is coerced through the field kind; a default the kind
    /// rejects fails the declaration and leaves the schema unchanged.
    pub fn declare(&mut self, mut descriptor: FieldDescriptor) -> PersistenceResult<()> {
        if let Some(default) = descriptor.default.take() {
            let coerced = descriptor.kind.coerce(&descriptor.name, default)?;
            descriptor.default = Some(coerced).filter(|v| !v.is_null());
        }
        self.insert(descriptor);
        Ok(())
    }

    fn insert(&mut self, descriptor: FieldDescriptor) {
        match self.fields.iter_mut().find(|f| f.name == descriptor.name) {
            Some(existing) => *existing = descriptor,
            None => self.fields.push(descriptor),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn identity(&self) -> &str {
        IDENTITY_FIELD
    }

    /// Names of the fields eligible as default CSV columns, in declaration order.
    ///
    /// Excludes the identity field and every field whose kind is not a
    /// standard scalar.
    pub fn default_columns(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|f| f.name != IDENTITY_FIELD && f.kind.is_standard_scalar())
            .map(|f| f.name.clone())
            .collect()
    }

    /// Coerce attributes through their declared kinds and fill defaults.
    ///
    /// The identity field is never taken from `attrs`.
    pub fn assign(&self, attrs: Attributes) -> PersistenceResult<Attributes> {
        let mut values = Map::new();

        for (name, value) in attrs {
            if name == IDENTITY_FIELD {
                continue;
            }
            let descriptor = self
                .get(&name)
                .ok_or_else(|| PersistenceError::UnknownField(name.clone()))?;
            let coerced = descriptor.kind.coerce(&name, value)?;
            values.insert(name, coerced);
        }

        for descriptor in &self.fields {
            if descriptor.name == IDENTITY_FIELD || values.contains_key(&descriptor.name) {
                continue;
            }
            if let Some(default) = &descriptor.default {
                values.insert(descriptor.name.clone(), default.clone());
            }
        }

        Ok(values)
    }
}

// =============================================================================
// Record
// =============================================================================

/// One persisted document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub values: Attributes,
}

impl Record {
    pub fn new(id: impl Into<String>, values: Attributes) -> Self {
        Self {
            id: id.into(),
            values,
        }
    }

    /// Current value of a field. The identity field resolves to the record id.
    pub fn get(&self, field: &str) -> Option<Value> {
        if field == IDENTITY_FIELD {
            return Some(Value::String(self.id.clone()));
        }
        self.values.get(field).cloned()
    }

    /// String rendering of a field's current value; missing fields render empty.
    pub fn render(&self, field: &str) -> String {
        self.get(field).map(|v| render_value(&v)).unwrap_or_default()
    }
}

/// Render a value the way it appears in a CSV cell.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}
