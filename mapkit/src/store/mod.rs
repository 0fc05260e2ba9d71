//! Persistence collaborator.
//!
//! The mapping engine only talks to storage through the [`Collection`] trait:
//! read the class fields, create a record from attributes, and iterate a
//! selection in bounded batches.
//!
//! Two implementations ship with the crate:
//!
//! - [`MemoryCollection`] - insertion-ordered documents held in memory
//! - [`JsonStore`] - a [`MemoryCollection`] persisted to one JSON file

pub mod json;

use serde_json::Value;
use std::cmp::Ordering;
use uuid::Uuid;

use crate::error::PersistenceResult;
use crate::models::{render_value, Attributes, Record, Schema};

pub use json::JsonStore;

/// Batches of records yielded by [`Collection::batches`].
pub type Batches<'a> = Box<dyn Iterator<Item = PersistenceResult<Vec<Record>>> + 'a>;

/// Storage for the records of one document class.
pub trait Collection {
    /// Schema of the stored class. Its fields are declaration-ordered.
    fn schema(&self) -> &Schema;

    /// Create and persist a record from attributes.
    fn create(&mut self, attrs: Attributes) -> PersistenceResult<Record>;

    /// Iterate the records selected by `criteria` in groups of at most
    /// `batch_size`, preserving selection order across and within batches.
    fn batches<'a>(
        &'a self,
        criteria: &Criteria,
        batch_size: usize,
    ) -> PersistenceResult<Batches<'a>>;

    /// Selection of every record.
    fn default_selection(&self) -> Criteria {
        Criteria::all()
    }
}

// =============================================================================
// Criteria
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Record selection: equality filters, one sort key and a limit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    pub filters: Vec<(String, Value)>,
    pub order_by: Option<(String, SortOrder)>,
    pub limit: Option<usize>,
}

impl Criteria {
    /// Every record, in insertion order.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push((field.into(), value.into()));
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.order_by = Some((field.into(), order));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.filters
            .iter()
            .all(|(field, value)| record.get(field).as_ref() == Some(value))
    }
}

/// Order two optional values: missing and `null` first, numbers numerically,
/// everything else by rendered text.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());

    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(x), Some(y)) => render_value(x).cmp(&render_value(y)),
    }
}

// =============================================================================
// Memory Collection
// =============================================================================

/// Insertion-ordered documents held in memory.
#[derive(Debug, Clone)]
pub struct MemoryCollection {
    schema: Schema,
    records: Vec<Record>,
}

impl MemoryCollection {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            records: Vec::new(),
        }
    }

    /// Collection over already persisted records. Records are not coerced.
    pub fn with_records(schema: Schema, records: Vec<Record>) -> Self {
        Self { schema, records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.id == id)
    }

    fn select(&self, criteria: &Criteria) -> Vec<usize> {
        let mut selected: Vec<usize> = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, r)| criteria.matches(r))
            .map(|(i, _)| i)
            .collect();

        if let Some((field, order)) = &criteria.order_by {
            selected.sort_by(|&a, &b| {
                let ordering = compare_values(
                    self.records[a].get(field).as_ref(),
                    self.records[b].get(field).as_ref(),
                );
                match order {
                    SortOrder::Ascending => ordering,
                    SortOrder::Descending => ordering.reverse(),
                }
            });
        }

        if let Some(limit) = criteria.limit {
            selected.truncate(limit);
        }

        selected
    }
}

impl Collection for MemoryCollection {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn create(&mut self, attrs: Attributes) -> PersistenceResult<Record> {
        let values = self.schema.assign(attrs)?;
        let record = Record::new(Uuid::new_v4().to_string(), values);
        self.records.push(record.clone());
        Ok(record)
    }

    fn batches<'a>(
        &'a self,
        criteria: &Criteria,
        batch_size: usize,
    ) -> PersistenceResult<Batches<'a>> {
        let chunks: Vec<Vec<usize>> = self
            .select(criteria)
            .chunks(batch_size.max(1))
            .map(<[usize]>::to_vec)
            .collect();

        Ok(Box::new(chunks.into_iter().map(
            move |chunk| -> PersistenceResult<Vec<Record>> {
                Ok(chunk.iter().map(|&i| self.records[i].clone()).collect())
            },
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PersistenceError;
    use crate::models::FieldKind;
    use serde_json::json;

    fn offices() -> MemoryCollection {
        let schema = Schema::new("Office")
            .field("name", FieldKind::String)
            .field("size", FieldKind::Integer);
        let mut collection = MemoryCollection::new(schema);

        for (name, size) in [("b", "3"), ("a", "10"), ("c", "1"), ("d", "")] {
            let mut attrs = Attributes::new();
            attrs.insert("name".into(), json!(name));
            attrs.insert("size".into(), json!(size));
            collection.create(attrs).unwrap();
        }
        collection
    }

    fn names(
        collection: &MemoryCollection,
        criteria: &Criteria,
        batch_size: usize,
    ) -> Vec<Vec<String>> {
        collection
            .batches(criteria, batch_size)
            .unwrap()
            .map(|batch| batch.unwrap().iter().map(|r| r.render("name")).collect())
            .collect()
    }

    #[test]
    fn test_create_coerces_and_assigns_id() {
        let collection = offices();
        let first = &collection.records()[0];

        assert_eq!(first.values["size"], json!(3));
        assert_eq!(collection.records()[3].values["size"], Value::Null);
        assert!(Uuid::parse_str(&first.id).is_ok());
        assert!(collection.find(&first.id).is_some());
    }

    #[test]
    fn test_create_rejects_invalid_value() {
        let mut collection = offices();
        let mut attrs = Attributes::new();
        attrs.insert("size".into(), json!("large"));

        let err = collection.create(attrs).unwrap_err();
        assert!(matches!(err, PersistenceError::InvalidValue { ref field, .. } if field == "size"));
        assert_eq!(collection.len(), 4);
    }

    #[test]
    fn test_batches_preserve_order() {
        let collection = offices();
        assert_eq!(
            names(&collection, &Criteria::all(), 3),
            vec![vec!["b", "a", "c"], vec!["d"]]
        );
    }

    #[test]
    fn test_batches_sorted_numerically() {
        let collection = offices();
        let criteria = Criteria::all().order_by("size", SortOrder::Descending);
        assert_eq!(names(&collection, &criteria, 10), vec![vec!["a", "b", "c", "d"]]);
    }

    #[test]
    fn test_filter_and_limit() {
        let collection = offices();
        let criteria = Criteria::all().where_eq("name", "c");
        assert_eq!(names(&collection, &criteria, 2), vec![vec!["c"]]);

        let criteria = Criteria::all().limit(2);
        assert_eq!(names(&collection, &criteria, 1), vec![vec!["b"], vec!["a"]]);
    }

    #[test]
    fn test_empty_selection_yields_no_batches() {
        let collection = offices();
        let criteria = Criteria::all().where_eq("name", "zzz");
        assert!(names(&collection, &criteria, 2).is_empty());
    }
}
