//! JSON Store - persist a collection to disk
//!
//! Each class is stored as one pretty-printed JSON file in the store directory,
//! named after the class (`Address` -> `address.json`).

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{Batches, Collection, Criteria, MemoryCollection};
use crate::error::PersistenceResult;
use crate::models::{Attributes, Record, Schema};

/// Directory where stores are kept (relative to current dir)
pub const DEFAULT_STORE_DIR: &str = ".mapkit/store";

/// On-disk layout of one class file
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreFile {
    /// Class name
    class: String,
    /// Last time the file was written
    updated_at: String,
    /// Stored records
    records: Vec<Record>,
}

/// A [`MemoryCollection`] loaded from and saved to a JSON file
pub struct JsonStore {
    path: PathBuf,
    inner: MemoryCollection,
}

impl JsonStore {
    /// Open the store for a class, loading existing records from disk
    pub fn open(dir: impl AsRef<Path>, schema: Schema) -> PersistenceResult<Self> {
        let path = dir.as_ref().join(format!("{}.json", slug(&schema.name)));

        let records = if path.exists() {
            let content = fs::read_to_string(&path)?;
            let file: StoreFile = serde_json::from_str(&content)?;
            file.records
        } else {
            Vec::new()
        };

        debug!(path = %path.display(), records = records.len(), "opened json store");

        Ok(Self {
            path,
            inner: MemoryCollection::with_records(schema, records),
        })
    }

    /// Write all records back to disk
    pub fn save(&self) -> PersistenceResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = StoreFile {
            class: self.inner.schema().name.clone(),
            updated_at: chrono::Utc::now().to_rfc3339(),
            records: self.inner.records().to_vec(),
        };
        let content = serde_json::to_string_pretty(&file)?;
        fs::write(&self.path, content)?;

        debug!(path = %self.path.display(), records = self.inner.len(), "saved json store");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> &[Record] {
        self.inner.records()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Collection for JsonStore {
    fn schema(&self) -> &Schema {
        self.inner.schema()
    }

    fn create(&mut self, attrs: Attributes) -> PersistenceResult<Record> {
        self.inner.create(attrs)
    }

    fn batches<'a>(
        &'a self,
        criteria: &Criteria,
        batch_size: usize,
    ) -> PersistenceResult<Batches<'a>> {
        self.inner.batches(criteria, batch_size)
    }
}

/// File name for a class name
fn slug(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldKind;
    use serde_json::json;
    use tempfile::tempdir;

    fn schema() -> Schema {
        Schema::new("Postal Address").field("name", FieldKind::String)
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("Postal Address"), "postal-address");
        assert_eq!(slug("Address"), "address");
    }

    #[test]
    fn test_save_and_reopen() {
        let dir = tempdir().unwrap();

        let mut store = JsonStore::open(dir.path(), schema()).unwrap();
        assert!(store.is_empty());

        let mut attrs = Attributes::new();
        attrs.insert("name".into(), json!("A"));
        let created = store.create(attrs).unwrap();
        store.save().unwrap();

        assert!(dir.path().join("postal-address.json").exists());

        let reopened = JsonStore::open(dir.path(), schema()).unwrap();
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.records()[0], created);
    }

    #[test]
    fn test_unsaved_records_are_not_persisted() {
        let dir = tempdir().unwrap();

        let mut store = JsonStore::open(dir.path(), schema()).unwrap();
        store.create(Attributes::new()).unwrap();

        let reopened = JsonStore::open(dir.path(), schema()).unwrap();
        assert!(reopened.is_empty());
    }
}
