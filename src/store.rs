//! In-memory transaction store served by the HTTP API
//!
//! Records are kept in insertion order with an id index beside them. The store
//! is an ordinary owned value; the server shares it through [`SharedStore`].

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::metrics::MetricsCollector;
use crate::models::{NewTransaction, TransactionPatch, TransactionRecord};

/// Store handle shared between request handlers
pub type SharedStore = Arc<RwLock<TransactionStore>>;

/// Ordered, id-indexed set of records
#[derive(Debug, Clone, Default)]
pub struct TransactionStore {
    records: Vec<TransactionRecord>,
    index: HashMap<u64, usize>,
    next_id: u64,
}

impl TransactionStore {
    /// Empty store whose first created record gets id 1
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Self::default()
        }
    }

    /// Store seeded with a parsed batch
    ///
    /// A later record with an id already seen replaces the earlier one in place.
    pub fn from_records(records: Vec<TransactionRecord>) -> Self {
        let mut store = Self::new();
        for record in records {
            store.next_id = store.next_id.max(record.id.saturating_add(1));
            match store.index.get(&record.id) {
                Some(&position) => store.records[position] = record,
                None => {
                    store.index.insert(record.id, store.records.len());
                    store.records.push(record);
                }
            }
        }
        MetricsCollector::default().update_store_size(store.len());
        store
    }

    /// Wrap the store for sharing across handlers
    pub fn into_shared(self) -> SharedStore {
        Arc::new(RwLock::new(self))
    }

    /// All records in insertion order
    pub fn list(&self) -> &[TransactionRecord] {
        &self.records
    }

    pub fn get(&self, id: u64) -> Option<&TransactionRecord> {
        self.index.get(&id).map(|&position| &self.records[position])
    }

    /// Append a new record under the next free id
    pub fn create(&mut self, new: NewTransaction) -> TransactionRecord {
        let id = self.next_id;
        self.next_id += 1;

        let record = TransactionRecord::from_new(id, new);
        self.index.insert(id, self.records.len());
        self.records.push(record.clone());

        debug!(id, "Created transaction");
        MetricsCollector::default().update_store_size(self.len());
        record
    }

    /// Apply a partial update, returning the updated record
    pub fn update(&mut self, id: u64, patch: TransactionPatch) -> Option<TransactionRecord> {
        let position = *self.index.get(&id)?;
        let record = &mut self.records[position];
        record.apply(patch);
        debug!(id, "Updated transaction");
        Some(record.clone())
    }

    /// Remove a record, keeping the relative order of the rest
    pub fn delete(&mut self, id: u64) -> Option<TransactionRecord> {
        let position = self.index.remove(&id)?;
        let removed = self.records.remove(position);

        for slot in self.index.values_mut() {
            if *slot > position {
                *slot -= 1;
            }
        }

        debug!(id, "Deleted transaction");
        MetricsCollector::default().update_store_size(self.len());
        Some(removed)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Id the next created record will get
    pub const fn next_id(&self) -> u64 {
        self.next_id
    }
}
