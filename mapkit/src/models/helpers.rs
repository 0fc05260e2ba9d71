//! Model helpers capability.
//!
//! Small declaration shortcuts a class gets by attaching `model_helpers`:
//!
//! - [`declare_multi_fields`] - declare several fields of one kind at once
//! - [`ModelHelpers::boolean_methods`] - named predicates comparing a field
//!   against fixed values
//!
//! ```rust,ignore
//! let mut game = DocumentClass::new(Schema::new("Game").field("format", FieldKind::String));
//! game.attach(&["model_helpers"])?;
//! game.boolean_methods("format", &["t20", "odi", "test"], PredicateNaming::postfix("match"))?;
//!
//! assert_eq!(game.predicate("t20_match", &record), Some(true));
//! ```

use serde_json::Value;

use super::{FieldDescriptor, FieldKind, Record, Schema};
use crate::error::PersistenceResult;

/// How predicate names are built from a value: `<prefix>_<value>_<postfix>`.
#[derive(Debug, Clone, Default)]
pub struct PredicateNaming {
    pub prefix: Option<String>,
    pub postfix: Option<String>,
}

impl PredicateNaming {
    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            postfix: None,
        }
    }

    pub fn postfix(postfix: impl Into<String>) -> Self {
        Self {
            prefix: None,
            postfix: Some(postfix.into()),
        }
    }

    fn name_for(&self, value_name: &str) -> String {
        [
            self.prefix.as_deref(),
            Some(value_name),
            self.postfix.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join("_")
    }
}

/// A named check `record[field] == value`.
#[derive(Debug, Clone, PartialEq)]
pub struct BooleanPredicate {
    pub name: String,
    pub field: String,
    pub value: Value,
}

impl BooleanPredicate {
    pub fn evaluate(&self, record: &Record) -> bool {
        record.get(&self.field).as_ref() == Some(&self.value)
    }
}

/// State installed by the `model_helpers` capability.
#[derive(Debug, Clone, Default)]
pub struct ModelHelpers {
    predicates: Vec<BooleanPredicate>,
}

impl ModelHelpers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one predicate per value; each is named after its value.
    ///
    /// Registering an existing name replaces the earlier predicate.
    pub fn boolean_methods(&mut self, field: &str, values: &[&str], naming: &PredicateNaming) {
        let pairs = values
            .iter()
            .map(|v| (v.to_string(), Value::String(v.to_string())));
        self.boolean_methods_with(field, pairs, naming);
    }

    /// Register predicates from explicit `(name, value)` pairs.
    pub fn boolean_methods_with(
        &mut self,
        field: &str,
        pairs: impl IntoIterator<Item = (String, Value)>,
        naming: &PredicateNaming,
    ) {
        for (value_name, value) in pairs {
            let predicate = BooleanPredicate {
                name: naming.name_for(&value_name),
                field: field.to_string(),
                value,
            };
            self.predicates.retain(|p| p.name != predicate.name);
            self.predicates.push(predicate);
        }
    }

    /// Evaluate a predicate by name. `None` if no predicate has that name.
    pub fn predicate(&self, name: &str, record: &Record) -> Option<bool> {
        self.predicates
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.evaluate(record))
    }

    pub fn predicate_names(&self) -> Vec<&str> {
        self.predicates.iter().map(|p| p.name.as_str()).collect()
    }
}

/// Declare several fields of the same kind, each with an optional default.
///
/// `kind` defaults to [`FieldKind::String`]. If any default is rejected by
/// the kind, no field is declared.
pub fn declare_multi_fields(
    schema: &mut Schema,
    fields: &[(&str, Option<Value>)],
    kind: Option<FieldKind>,
) -> PersistenceResult<()> {
    let kind = kind.unwrap_or(FieldKind::String);
    let mut next = schema.clone();
    for (name, default) in fields {
        let mut descriptor = FieldDescriptor::new(*name, kind);
        descriptor.default = default.clone();
        next.declare(descriptor)?;
    }
    *schema = next;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Attributes;
    use serde_json::json;

    fn game(format: &str) -> Record {
        let mut values = Attributes::new();
        values.insert("format".into(), json!(format));
        Record::new("g1", values)
    }

    #[test]
    fn test_boolean_methods_with_postfix() {
        let mut helpers = ModelHelpers::new();
        let naming = PredicateNaming::postfix("match");
        helpers.boolean_methods("format", &["t20", "odi", "test"], &naming);

        let record = game("t20");
        assert_eq!(helpers.predicate("t20_match", &record), Some(true));
        assert_eq!(helpers.predicate("odi_match", &record), Some(false));
        assert_eq!(helpers.predicate("t20", &record), None);
    }

    #[test]
    fn test_boolean_methods_with_explicit_values() {
        let mut helpers = ModelHelpers::new();
        helpers.boolean_methods_with(
            "format",
            vec![("short".to_string(), json!("t20"))],
            &PredicateNaming::prefix("is"),
        );

        assert_eq!(helpers.predicate("is_short", &game("t20")), Some(true));
        assert_eq!(helpers.predicate_names(), vec!["is_short"]);
    }

    #[test]
    fn test_multi_fields() {
        let mut schema = Schema::new("Game");
        declare_multi_fields(
            &mut schema,
            &[("city", None), ("venue", Some(json!("Mumbai"))), ("country", None)],
            None,
        )
        .unwrap();
        declare_multi_fields(
            &mut schema,
            &[("start_time", None), ("end_time", None)],
            Some(FieldKind::DateTime),
        )
        .unwrap();

        assert_eq!(schema.get("venue").unwrap().default, Some(json!("Mumbai")));
        assert_eq!(schema.get("city").unwrap().kind, FieldKind::String);
        assert_eq!(schema.get("end_time").unwrap().kind, FieldKind::DateTime);
        assert_eq!(
            schema.default_columns(),
            vec!["city", "venue", "country", "start_time", "end_time"]
        );
    }

    #[test]
    fn test_multi_fields_rejected_default_declares_nothing() {
        let mut schema = Schema::new("Game");
        let err = declare_multi_fields(
            &mut schema,
            &[("overs", Some(json!(20))), ("innings", Some(json!("two")))],
            Some(FieldKind::Integer),
        )
        .unwrap_err();

        assert!(matches!(err, crate::error::PersistenceError::InvalidValue { .. }));
        assert!(!schema.has_field("overs"));
    }
}
