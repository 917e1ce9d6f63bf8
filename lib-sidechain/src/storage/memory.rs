//! In-memory StateStore implementation.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::trace;

use super::{
    document_id, Document, Filter, Query, StateStore, StorageError, StorageResult, ID_FIELD,
};
use crate::types::sha256_hex_concat;

#[derive(Debug, Default, Clone)]
struct Table {
    indexes: Vec<String>,
    next_id: u64,
    rows: BTreeMap<u64, Document>,
}

/// Table store kept entirely in memory, with epoch hashing of every mutation.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    tables: BTreeMap<String, Table>,
    epoch_hash: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Declared index fields of a table.
    pub fn indexes(&self, table: &str) -> Option<&[String]> {
        self.tables.get(table).map(|t| t.indexes.as_slice())
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.tables.get(table).map_or(0, |t| t.rows.len())
    }

    fn table(&self, name: &str) -> StorageResult<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| StorageError::TableNotFound(name.to_string()))
    }

    fn table_mut(&mut self, name: &str) -> StorageResult<&mut Table> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| StorageError::TableNotFound(name.to_string()))
    }

    // Mutations outside an epoch (e.g. genesis seeding) are applied but not hashed.
    fn fold_mutation(&mut self, doc: &Document) -> StorageResult<()> {
        if let Some(current) = self.epoch_hash.as_mut() {
            let json = serde_json::to_string(doc)
                .map_err(|e| StorageError::Serialization(e.to_string()))?;
            *current = sha256_hex_concat(&[current.as_str(), json.as_str()]);
        }
        Ok(())
    }
}

impl StateStore for MemoryStore {
    fn table_exists(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    fn create_table(&mut self, table: &str, indexes: &[&str]) -> StorageResult<()> {
        if self.tables.contains_key(table) {
            return Err(StorageError::TableExists(table.to_string()));
        }
        trace!(table, ?indexes, "creating table");
        self.tables.insert(
            table.to_string(),
            Table {
                indexes: indexes.iter().map(|i| i.to_string()).collect(),
                next_id: 1,
                rows: BTreeMap::new(),
            },
        );
        Ok(())
    }

    fn find_one(&self, table: &str, filter: &Filter) -> StorageResult<Option<Document>> {
        Ok(self
            .table(table)?
            .rows
            .values()
            .find(|doc| filter.matches(doc))
            .cloned())
    }

    fn find(&self, table: &str, query: &Query) -> StorageResult<Vec<Document>> {
        let matching: Vec<Document> = self
            .table(table)?
            .rows
            .values()
            .filter(|doc| query.filter.matches(doc))
            .cloned()
            .collect();
        Ok(query.apply(matching))
    }

    fn insert(&mut self, table: &str, mut doc: Document) -> StorageResult<Document> {
        let t = self.table_mut(table)?;
        let id = t.next_id;
        t.next_id += 1;
        doc.insert(ID_FIELD.to_string(), Value::from(id));
        t.rows.insert(id, doc.clone());
        self.fold_mutation(&doc)?;
        Ok(doc)
    }

    fn update(&mut self, table: &str, doc: Document) -> StorageResult<()> {
        let id = document_id(&doc).ok_or(StorageError::MissingId)?;
        let t = self.table_mut(table)?;
        match t.rows.get_mut(&id) {
            Some(row) => *row = doc.clone(),
            None => {
                return Err(StorageError::DocumentNotFound {
                    table: table.to_string(),
                    id,
                })
            }
        }
        self.fold_mutation(&doc)
    }

    fn remove(&mut self, table: &str, doc: &Document) -> StorageResult<()> {
        let id = document_id(doc).ok_or(StorageError::MissingId)?;
        let removed = self
            .table_mut(table)?
            .rows
            .remove(&id)
            .ok_or_else(|| StorageError::DocumentNotFound {
                table: table.to_string(),
                id,
            })?;
        self.fold_mutation(&removed)
    }

    fn begin_hash_epoch(&mut self, prior: &str) -> StorageResult<()> {
        self.epoch_hash = Some(prior.to_string());
        Ok(())
    }

    fn current_epoch_hash(&self) -> StorageResult<String> {
        self.epoch_hash.clone().ok_or(StorageError::EpochNotStarted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::sha256_hex;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    fn store_with_balances() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.create_table("tokens_balances", &["account"]).unwrap();
        store
    }

    #[test]
    fn test_insert_assigns_ids() {
        let mut store = store_with_balances();
        let a = store.insert("tokens_balances", doc(json!({ "account": "alice" }))).unwrap();
        let b = store.insert("tokens_balances", doc(json!({ "account": "bob" }))).unwrap();
        assert_eq!(document_id(&a), Some(1));
        assert_eq!(document_id(&b), Some(2));
        assert_eq!(store.row_count("tokens_balances"), 2);
    }

    #[test]
    fn test_missing_table_and_duplicate_table() {
        let mut store = store_with_balances();
        assert_eq!(
            store.find_one("nope", &Filter::new()),
            Err(StorageError::TableNotFound("nope".into()))
        );
        assert_eq!(
            store.create_table("tokens_balances", &[]),
            Err(StorageError::TableExists("tokens_balances".into()))
        );
        assert_eq!(store.indexes("tokens_balances").unwrap(), ["account".to_string()]);
    }

    #[test]
    fn test_update_and_remove() {
        let mut store = store_with_balances();
        let mut alice = store
            .insert("tokens_balances", doc(json!({ "account": "alice", "balance": "1" })))
            .unwrap();
        alice.insert("balance".into(), json!("2"));
        store.update("tokens_balances", alice.clone()).unwrap();

        let found = store
            .find_one("tokens_balances", &Filter::new().eq("account", "alice"))
            .unwrap()
            .unwrap();
        assert_eq!(found["balance"], json!("2"));

        store.remove("tokens_balances", &alice).unwrap();
        assert!(store
            .find_one("tokens_balances", &Filter::new().eq("account", "alice"))
            .unwrap()
            .is_none());
        assert!(matches!(
            store.remove("tokens_balances", &alice),
            Err(StorageError::DocumentNotFound { id: 1, .. })
        ));
    }

    #[test]
    fn test_epoch_requires_begin() {
        let store = MemoryStore::new();
        assert_eq!(store.current_epoch_hash(), Err(StorageError::EpochNotStarted));
    }

    #[test]
    fn test_epoch_folds_each_mutation() {
        let mut store = store_with_balances();
        store.begin_hash_epoch("S").unwrap();
        assert_eq!(store.current_epoch_hash().unwrap(), "S");

        store.insert("tokens_balances", doc(json!({ "account": "alice" }))).unwrap();
        let expected = sha256_hex(r#"S{"_id":1,"account":"alice"}"#);
        assert_eq!(store.current_epoch_hash().unwrap(), expected);

        store.begin_hash_epoch("T").unwrap();
        assert_eq!(store.current_epoch_hash().unwrap(), "T");
    }

    #[test]
    fn test_same_mutations_same_hash() {
        let run = || {
            let mut store = store_with_balances();
            store.begin_hash_epoch("seed").unwrap();
            let mut d = store
                .insert("tokens_balances", doc(json!({ "balance": "5", "account": "bob" })))
                .unwrap();
            d.insert("balance".into(), json!("4"));
            store.update("tokens_balances", d).unwrap();
            store.current_epoch_hash().unwrap()
        };
        assert_eq!(run(), run());
    }
}
