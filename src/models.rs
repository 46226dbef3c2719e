//! Data models for SMS entries, transaction records and analytics
//!
//! This module contains the structures that flow through the pipeline: the raw
//! entry read from the export, the canonical record produced by the normalizer,
//! the request payloads accepted by the HTTP API and the aggregate shapes
//! returned by the storage layer.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Currency applied when a message does not name one explicitly
pub const DEFAULT_CURRENCY: &str = "RWF";

/// One SMS entry from the source document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSmsEntry {
    /// Free text body of the message
    pub body: String,
    /// Milliseconds since the Unix epoch, as found in the document
    pub timestamp_millis: Option<String>,
}

impl RawSmsEntry {
    /// Create an entry from a body and an optional millisecond timestamp
    pub fn new(body: impl Into<String>, timestamp_millis: Option<&str>) -> Self {
        Self {
            body: body.into(),
            timestamp_millis: timestamp_millis.map(ToString::to_string),
        }
    }
}

/// Best-effort classification of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money came in
    Received,
    /// Money went out
    Sent,
    /// No classification keyword found
    Unknown,
}

impl TransactionKind {
    /// All kinds, in classification priority order
    pub const ALL: [Self; 3] = [Self::Received, Self::Sent, Self::Unknown];

    /// Lowercase label used in JSON and in the database
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Sent => "sent",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown transaction type: {s}"))
    }
}

/// Canonical transaction record produced by the normalizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Sequential id, unique within a batch or store
    pub id: u64,
    /// Classification
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// Non-negative amount
    pub amount: f64,
    /// Currency code
    pub currency: String,
    /// Name of the payer, for received transactions
    #[serde(rename = "sender")]
    pub counterparty_from: Option<String>,
    /// Name of the payee, for sent transactions
    #[serde(rename = "receiver")]
    pub counterparty_to: Option<String>,
    /// Local date-time formatted `YYYY-MM-DD HH:MM:SS`
    pub timestamp: Option<String>,
    /// Provider-assigned transaction id found in the text
    #[serde(rename = "transaction_id")]
    pub external_reference_id: Option<String>,
    /// Original message body
    pub raw_text: String,
}

impl TransactionRecord {
    /// Calendar date part of the timestamp (`YYYY-MM-DD`), if any
    #[must_use]
    pub fn date_iso(&self) -> Option<&str> {
        self.timestamp.as_deref().and_then(|ts| ts.get(..10))
    }

    /// The populated counterparty, whichever side it is on
    #[must_use]
    pub fn counterparty(&self) -> Option<&str> {
        self.counterparty_from
            .as_deref()
            .or(self.counterparty_to.as_deref())
    }

    /// Build a record from a create request and the id assigned by the store
    #[must_use]
    pub fn from_new(id: u64, new: NewTransaction) -> Self {
        Self {
            id,
            kind: new.kind,
            amount: new.amount,
            currency: new.currency,
            counterparty_from: new.sender,
            counterparty_to: new.receiver,
            timestamp: new.timestamp,
            external_reference_id: new.transaction_id,
            raw_text: new.raw_text,
        }
    }

    /// Apply a partial update in place
    pub fn apply(&mut self, patch: TransactionPatch) {
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(amount) = patch.amount {
            self.amount = amount;
        }
        if let Some(currency) = patch.currency {
            self.currency = currency;
        }
        if let Some(sender) = patch.sender {
            self.counterparty_from = sender;
        }
        if let Some(receiver) = patch.receiver {
            self.counterparty_to = receiver;
        }
        if let Some(timestamp) = patch.timestamp {
            self.timestamp = timestamp;
        }
        if let Some(transaction_id) = patch.transaction_id {
            self.external_reference_id = transaction_id;
        }
        if let Some(raw_text) = patch.raw_text {
            self.raw_text = raw_text;
        }
    }
}

/// Body of a create request
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewTransaction {
    /// Classification
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// Amount, as a number or numeric string
    #[serde(deserialize_with = "deserialize_amount")]
    pub amount: f64,
    /// Currency code
    pub currency: String,
    /// Payer name
    pub sender: Option<String>,
    /// Payee name
    pub receiver: Option<String>,
    /// Formatted date-time
    pub timestamp: Option<String>,
    /// Provider transaction id
    #[serde(default)]
    pub transaction_id: Option<String>,
    /// Original text, empty when not supplied
    #[serde(default)]
    pub raw_text: String,
}

impl NewTransaction {
    /// Keys a create request must carry (values may be null)
    pub const REQUIRED_FIELDS: [&'static str; 6] =
        ["type", "amount", "currency", "sender", "receiver", "timestamp"];
}

/// Body of a partial update request
///
/// Nullable fields use `Option<Option<_>>`: the outer `None` means the key was
/// absent, `Some(None)` means it was sent as `null`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TransactionPatch {
    /// New classification
    #[serde(rename = "type", default)]
    pub kind: Option<TransactionKind>,
    /// New amount
    #[serde(default, deserialize_with = "deserialize_optional_amount")]
    pub amount: Option<f64>,
    /// New currency
    #[serde(default)]
    pub currency: Option<String>,
    /// New payer name
    #[serde(default, deserialize_with = "double_option")]
    pub sender: Option<Option<String>>,
    /// New payee name
    #[serde(default, deserialize_with = "double_option")]
    pub receiver: Option<Option<String>>,
    /// New timestamp
    #[serde(default, deserialize_with = "double_option")]
    pub timestamp: Option<Option<String>>,
    /// New provider transaction id
    #[serde(default, deserialize_with = "double_option")]
    pub transaction_id: Option<Option<String>>,
    /// New original text
    #[serde(default)]
    pub raw_text: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

fn deserialize_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(value) => Ok(value),
        NumberOrText::Text(text) => text
            .trim()
            .replace(',', "")
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("amount is not a number: {text}"))),
    }
}

fn deserialize_optional_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_amount(deserializer).map(Some)
}

fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// A row of the `transactions` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredTransaction {
    /// Database primary key
    pub row_id: i64,
    /// Id the record had in its batch
    pub source_id: Option<i64>,
    /// Calendar date (`YYYY-MM-DD`)
    pub date_iso: Option<String>,
    /// Transaction kind label
    pub category: String,
    /// Amount
    pub amount: f64,
    /// Currency code
    pub currency: String,
    /// Payer name
    pub sender: Option<String>,
    /// Payee name
    pub receiver: Option<String>,
    /// Formatted date-time
    pub timestamp: Option<String>,
    /// Provider transaction id
    pub transaction_id: Option<String>,
    /// Original message body
    pub raw_text: String,
}

/// Headline figures for the dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Kpis {
    /// Number of stored transactions
    pub total_count: u64,
    /// Sum of all amounts
    pub total_volume: f64,
    /// Mean amount, zero when empty
    pub avg_amount: f64,
}

/// Volume for one calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPoint {
    /// Calendar date (`YYYY-MM-DD`)
    pub date: String,
    /// Summed amount for the day
    pub volume: f64,
}

/// Short form of a stored transaction for the dashboard feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentTransaction {
    /// Calendar date
    pub date: Option<String>,
    /// Transaction kind label
    pub category: String,
    /// Sender or receiver name
    pub counterparty: Option<String>,
    /// Amount
    pub amount: f64,
}

/// Aggregates exported for the frontend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    /// Headline figures
    pub kpis: Kpis,
    /// Summed amount per kind
    pub by_category: BTreeMap<String, f64>,
    /// Volume per day, oldest first
    pub daily: Vec<DailyPoint>,
    /// Newest transactions first
    pub recent: Vec<RecentTransaction>,
}

/// Output format for exported records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Comma-separated values format
    Csv,
    /// JSON format
    Json,
}

impl OutputFormat {
    /// Get the file extension for this format
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(format!("unsupported output format: {other}")),
        }
    }
}
