//! Assembles extracted fields into canonical transaction records.

use crate::error::Result;
use crate::extractor::{convert_timestamp, FieldExtractor};
use crate::models::{RawSmsEntry, TransactionKind, TransactionRecord, DEFAULT_CURRENCY};

/// Turns raw entries into [`TransactionRecord`]s
#[derive(Debug, Clone)]
pub struct RecordNormalizer {
    extractor: FieldExtractor,
    default_currency: String,
}

impl RecordNormalizer {
    /// Normalizer using the `RWF` currency default
    pub fn new() -> Result<Self> {
        Self::with_currency(DEFAULT_CURRENCY)
    }

    /// Normalizer with a different document-level currency default
    pub fn with_currency(default_currency: &str) -> Result<Self> {
        Ok(Self {
            extractor: FieldExtractor::new()?,
            default_currency: default_currency.to_uppercase(),
        })
    }

    /// The extractor this normalizer runs
    #[must_use]
    pub const fn extractor(&self) -> &FieldExtractor {
        &self.extractor
    }

    /// Currency used when the body does not name one
    #[must_use]
    pub fn default_currency(&self) -> &str {
        &self.default_currency
    }

    /// Build the record for the entry at 1-based `position` in its batch
    #[must_use]
    pub fn normalize(&self, position: u64, entry: &RawSmsEntry) -> TransactionRecord {
        let fields = self.extractor.extract(&entry.body);

        // Only the side matching the classification is kept.
        let (counterparty_from, counterparty_to) = match fields.kind {
            TransactionKind::Received => (fields.counterparty_from, None),
            TransactionKind::Sent => (None, fields.counterparty_to),
            TransactionKind::Unknown => (None, None),
        };

        TransactionRecord {
            id: position,
            kind: fields.kind,
            amount: fields.amount,
            currency: fields
                .currency
                .unwrap_or_else(|| self.default_currency.clone()),
            counterparty_from,
            counterparty_to,
            timestamp: convert_timestamp(entry.timestamp_millis.as_deref()),
            external_reference_id: fields.external_reference_id,
            raw_text: entry.body.clone(),
        }
    }

    /// Normalize a whole batch, numbering entries from 1 in order
    #[must_use]
    pub fn normalize_all(&self, entries: &[RawSmsEntry]) -> Vec<TransactionRecord> {
        (1..)
            .zip(entries)
            .map(|(position, entry)| self.normalize(position, entry))
            .collect()
    }
}
