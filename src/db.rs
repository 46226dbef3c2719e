use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::error::Result;
use crate::file_writer;
use crate::metrics::MetricsCollector;
use crate::models::{DailyPoint, Dashboard, Kpis, RecentTransaction, StoredTransaction, TransactionRecord};
use crate::schema::transactions;

// Type alias for the database connection pool
pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = r2d2::PooledConnection<SqliteConnectionManager>;

const DEFAULT_POOL_SIZE: u32 = 4;
const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Database manager for handling connections and operations
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    /// Open (or create) the database behind a `sqlite:` URL or plain path
    pub fn new(database_url: &str) -> Result<Self> {
        Self::with_pool(database_url, DEFAULT_POOL_SIZE, DEFAULT_CONNECTION_TIMEOUT)
    }

    /// Open the database using the `database` configuration section
    pub fn from_config(database_url: &str, config: &DatabaseConfig) -> Result<Self> {
        Self::with_pool(
            database_url,
            config.max_connections,
            Duration::from_secs(config.connection_timeout_secs),
        )
    }

    fn with_pool(database_url: &str, max_size: u32, timeout: Duration) -> Result<Self> {
        let path = database_path(database_url);

        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        // Set up connection manager and pool
        let manager = SqliteConnectionManager::file(&path)
            .with_init(|conn| conn.busy_timeout(BUSY_TIMEOUT));
        let pool = Pool::builder()
            .max_size(max_size)
            .connection_timeout(timeout)
            .build(manager)?;

        // Run migrations
        let conn = pool.get()?;
        Self::run_migrations(&conn)?;
        debug!(path = %path.display(), "Database ready");

        Ok(Self { pool })
    }

    /// Run database migrations
    fn run_migrations(conn: &Connection) -> Result<()> {
        conn.execute_batch(include_str!(
            "../migrations/2024-09-01-000000_create_transactions/up.sql"
        ))?;
        Ok(())
    }

    /// Get a connection from the pool
    pub fn get_connection(&self) -> Result<DbConnection> {
        Ok(self.pool.get()?)
    }

    /// Insert a batch of records in one transaction, returning the row count
    pub fn insert_transactions(&self, records: &[TransactionRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let start = Instant::now();
        let mut conn = self.get_connection()?;
        let tx = conn.transaction()?;
        let mut inserted = 0;

        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {} ({}, {}, {}, {}, {}, {}, {}, {}, {}, {}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                transactions::TABLE,
                transactions::SOURCE_ID,
                transactions::DATE_ISO,
                transactions::CATEGORY,
                transactions::AMOUNT,
                transactions::CURRENCY,
                transactions::SENDER,
                transactions::RECEIVER,
                transactions::OCCURRED_AT,
                transactions::TRANSACTION_ID,
                transactions::RAW_TEXT
            ))?;

            for record in records {
                inserted += stmt.execute(params![
                    i64::try_from(record.id).ok(),
                    record.date_iso(),
                    record.kind.as_str(),
                    record.amount,
                    record.currency,
                    record.counterparty_from,
                    record.counterparty_to,
                    record.timestamp,
                    record.external_reference_id,
                    record.raw_text
                ])?;
            }
        }

        tx.commit()?;

        MetricsCollector::default().record_records_stored(inserted, start.elapsed());
        info!(inserted, "Stored transactions");
        Ok(inserted)
    }

    /// Number of stored transactions
    pub fn count(&self) -> Result<u64> {
        let conn = self.get_connection()?;
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", transactions::TABLE),
            params![],
            |row| row.get(0),
        )?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// Count, sum and average of all amounts
    pub fn kpis(&self) -> Result<Kpis> {
        let start = Instant::now();
        let conn = self.get_connection()?;
        let (count, volume, average): (i64, f64, f64) = conn.query_row(
            &format!(
                "SELECT COUNT(*), COALESCE(SUM({amount}), 0), COALESCE(AVG({amount}), 0) FROM {table}",
                amount = transactions::AMOUNT,
                table = transactions::TABLE
            ),
            params![],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;
        MetricsCollector::default().record_db_query("kpis", start.elapsed());

        Ok(Kpis {
            total_count: u64::try_from(count).unwrap_or_default(),
            total_volume: volume,
            avg_amount: average,
        })
    }

    /// Summed amount per transaction kind
    pub fn volume_by_category(&self) -> Result<BTreeMap<String, f64>> {
        let conn = self.get_connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {cat}, COALESCE(SUM({amount}), 0) FROM {table} GROUP BY {cat}",
            cat = transactions::CATEGORY,
            amount = transactions::AMOUNT,
            table = transactions::TABLE
        ))?;

        let rows = stmt.query_map(params![], |row| Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?)))?;

        let mut results = BTreeMap::new();
        for row in rows {
            let (category, volume) = row?;
            results.insert(category, volume);
        }

        Ok(results)
    }

    /// Summed amount per calendar day, oldest first, skipping undated rows
    pub fn daily_volume(&self) -> Result<Vec<DailyPoint>> {
        let conn = self.get_connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {date}, COALESCE(SUM({amount}), 0) FROM {table} WHERE {date} IS NOT NULL GROUP BY {date} ORDER BY {date}",
            date = transactions::DATE_ISO,
            amount = transactions::AMOUNT,
            table = transactions::TABLE
        ))?;

        let points = stmt.query_map(params![], |row| {
            Ok(DailyPoint {
                date: row.get(0)?,
                volume: row.get(1)?,
            })
        })?;

        let mut results = Vec::new();
        for point in points {
            results.push(point?);
        }

        Ok(results)
    }

    /// Newest `limit` transactions in dashboard form
    pub fn recent(&self, limit: usize) -> Result<Vec<RecentTransaction>> {
        let conn = self.get_connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {date}, {cat}, COALESCE({sender}, {receiver}), {amount} FROM {table} ORDER BY {id} DESC LIMIT ?",
            date = transactions::DATE_ISO,
            cat = transactions::CATEGORY,
            sender = transactions::SENDER,
            receiver = transactions::RECEIVER,
            amount = transactions::AMOUNT,
            table = transactions::TABLE,
            id = transactions::ID
        ))?;

        let rows = stmt.query_map(params![sql_limit(limit)], |row| {
            Ok(RecentTransaction {
                date: row.get(0)?,
                category: row.get(1)?,
                counterparty: row.get(2)?,
                amount: row.get(3)?,
            })
        })?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }

        Ok(results)
    }

    /// Newest `limit` stored rows in full
    pub fn recent_transactions(&self, limit: usize) -> Result<Vec<StoredTransaction>> {
        let conn = self.get_connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT * FROM {} ORDER BY {} DESC LIMIT ?",
            transactions::TABLE,
            transactions::ID
        ))?;

        let rows = stmt.query_map(params![sql_limit(limit)], Self::map_stored_transaction)?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }

        Ok(results)
    }

    /// Get a stored row by its primary key
    pub fn get_transaction(&self, row_id: i64) -> Result<Option<StoredTransaction>> {
        let conn = self.get_connection()?;

        let transaction = conn
            .query_row(
                &format!("SELECT * FROM {} WHERE {} = ?", transactions::TABLE, transactions::ID),
                params![row_id],
                Self::map_stored_transaction,
            )
            .optional()?;

        Ok(transaction)
    }

    /// All dashboard aggregates
    pub fn dashboard(&self, recent_limit: usize) -> Result<Dashboard> {
        Ok(Dashboard {
            kpis: self.kpis()?,
            by_category: self.volume_by_category()?,
            daily: self.daily_volume()?,
            recent: self.recent(recent_limit)?,
        })
    }

    /// Build the dashboard and write it as JSON to `out_path`
    pub fn export_dashboard(&self, out_path: &Path, recent_limit: usize) -> Result<Dashboard> {
        let dashboard = self.dashboard(recent_limit)?;
        file_writer::write_dashboard(&dashboard, out_path)?;
        info!(path = %out_path.display(), "Exported dashboard");
        Ok(dashboard)
    }

    /// Map a database row to a StoredTransaction
    fn map_stored_transaction(row: &Row) -> rusqlite::Result<StoredTransaction> {
        Ok(StoredTransaction {
            row_id: row.get(transactions::ID)?,
            source_id: row.get(transactions::SOURCE_ID)?,
            date_iso: row.get(transactions::DATE_ISO)?,
            category: row.get(transactions::CATEGORY)?,
            amount: row.get(transactions::AMOUNT)?,
            currency: row.get(transactions::CURRENCY)?,
            sender: row.get(transactions::SENDER)?,
            receiver: row.get(transactions::RECEIVER)?,
            timestamp: row.get(transactions::OCCURRED_AT)?,
            transaction_id: row.get(transactions::TRANSACTION_ID)?,
            raw_text: row.get(transactions::RAW_TEXT)?,
        })
    }
}

/// Filesystem path behind a `sqlite:` or `sqlite://` URL
#[must_use]
pub fn database_path(database_url: &str) -> PathBuf {
    let path = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
        .unwrap_or(database_url);
    PathBuf::from(path)
}

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}
