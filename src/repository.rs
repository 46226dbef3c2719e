use async_trait::async_trait;
use std::sync::Arc;

use crate::db::Database;
use crate::error::Result;
use crate::models::{Dashboard, StoredTransaction, TransactionRecord};

/// Async access to persisted transactions and their aggregates
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Append a batch of records, returning how many rows were written
    async fn save_batch(&self, records: &[TransactionRecord]) -> Result<usize>;
    /// Headline figures, per-kind volume, daily volume and the newest rows
    async fn dashboard(&self, recent_limit: usize) -> Result<Dashboard>;
    /// Newest `limit` stored rows
    async fn recent_transactions(&self, limit: usize) -> Result<Vec<StoredTransaction>>;
}

/// SQLite-backed repository
///
/// rusqlite is synchronous, so every call runs on the blocking thread pool.
#[derive(Clone)]
pub struct SqliteTransactionRepository {
    database: Arc<Database>,
}

impl SqliteTransactionRepository {
    pub fn new(database: Database) -> Self {
        Self {
            database: Arc::new(database),
        }
    }

    /// Open the database at `database_url` and wrap it
    pub fn open(database_url: &str) -> Result<Self> {
        Ok(Self::new(Database::new(database_url)?))
    }

    pub fn database(&self) -> &Database {
        &self.database
    }
}

#[async_trait]
impl TransactionRepository for SqliteTransactionRepository {
    async fn save_batch(&self, records: &[TransactionRecord]) -> Result<usize> {
        let database = Arc::clone(&self.database);
        let records = records.to_vec();
        tokio::task::spawn_blocking(move || database.insert_transactions(&records)).await?
    }

    async fn dashboard(&self, recent_limit: usize) -> Result<Dashboard> {
        let database = Arc::clone(&self.database);
        tokio::task::spawn_blocking(move || database.dashboard(recent_limit)).await?
    }

    async fn recent_transactions(&self, limit: usize) -> Result<Vec<StoredTransaction>> {
        let database = Arc::clone(&self.database);
        tokio::task::spawn_blocking(move || database.recent_transactions(limit)).await?
    }
}
