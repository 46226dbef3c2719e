//! Database schema definitions
//!
//! Table and column names used with rusqlite.

/// Transactions table schema
pub mod transactions {
    /// Table name
    pub const TABLE: &str = "transactions";
    /// Primary key column
    pub const ID: &str = "id";
    /// Id of the record in its parsed batch
    pub const SOURCE_ID: &str = "source_id";
    /// Calendar date column (`YYYY-MM-DD`)
    pub const DATE_ISO: &str = "date_iso";
    /// Transaction kind column
    pub const CATEGORY: &str = "category";
    /// Amount column
    pub const AMOUNT: &str = "amount";
    /// Currency code column
    pub const CURRENCY: &str = "currency";
    /// Payer name column
    pub const SENDER: &str = "sender";
    /// Payee name column
    pub const RECEIVER: &str = "receiver";
    /// Formatted date-time column
    pub const OCCURRED_AT: &str = "occurred_at";
    /// Provider reference id column
    pub const TRANSACTION_ID: &str = "transaction_id";
    /// Original SMS body column
    pub const RAW_TEXT: &str = "raw_text";
}
