use anyhow::{anyhow, Result};
use serde_json::Value;
use std::path::Path;

use crate::models::{NewTransaction, TransactionPatch};

const MAX_LIMIT: usize = 10_000;
const MAX_LOOKUPS: usize = 10_000_000;

/// Validation utilities for input sanitization and edge case handling
#[derive(Debug, Copy, Clone)]
pub struct InputValidator;

impl InputValidator {
    /// Parse a path segment as a transaction id
    pub fn parse_transaction_id(raw: &str) -> Result<u64> {
        raw.trim()
            .parse::<u64>()
            .ok()
            .filter(|id| *id > 0)
            .ok_or_else(|| anyhow!("invalid id"))
    }

    /// Required create keys absent from a JSON object (null values count as present)
    #[must_use]
    pub fn missing_required_fields(body: &Value) -> Vec<&'static str> {
        NewTransaction::REQUIRED_FIELDS
            .into_iter()
            .filter(|field| body.get(field).is_none())
            .collect()
    }

    /// Validate a create payload after deserialization
    pub fn validate_new_transaction(new: &NewTransaction) -> Result<()> {
        Self::validate_amount(new.amount)?;
        Self::validate_currency(&new.currency)?;
        Ok(())
    }

    /// Validate the fields present in a partial update
    pub fn validate_patch(patch: &TransactionPatch) -> Result<()> {
        if let Some(amount) = patch.amount {
            Self::validate_amount(amount)?;
        }
        if let Some(currency) = &patch.currency {
            Self::validate_currency(currency)?;
        }
        Ok(())
    }

    /// Validate amount
    pub fn validate_amount(amount: f64) -> Result<()> {
        if !amount.is_finite() {
            return Err(anyhow!("amount must be a finite number"));
        }

        if amount < 0.0 {
            return Err(anyhow!("amount cannot be negative"));
        }

        Ok(())
    }

    /// Validate a three-letter currency code
    pub fn validate_currency(currency: &str) -> Result<()> {
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(anyhow!("currency must be a three-letter code"));
        }

        Ok(())
    }

    /// Validate a result-count limit
    pub fn validate_limit(limit: usize) -> Result<()> {
        if limit == 0 {
            return Err(anyhow!("limit must be greater than 0"));
        }

        if limit > MAX_LIMIT {
            return Err(anyhow!("limit too large (max 10,000)"));
        }

        Ok(())
    }

    /// Validate the number of benchmark lookups
    pub fn validate_lookups(lookups: usize) -> Result<()> {
        if lookups == 0 {
            return Err(anyhow!("lookups must be greater than 0"));
        }

        if lookups > MAX_LOOKUPS {
            return Err(anyhow!("lookups too large (max 10,000,000)"));
        }

        Ok(())
    }

    /// Validate a local file path given on the command line
    pub fn validate_file_path(path: &Path) -> Result<()> {
        let path_str = path.to_string_lossy();
        if path_str.trim().is_empty() {
            return Err(anyhow!("File path cannot be empty"));
        }

        if path_str.len() > 4096 {
            return Err(anyhow!("File path too long (max 4096 characters)"));
        }

        Ok(())
    }

    /// Validate database URL
    pub fn validate_database_url(url: &str) -> Result<()> {
        if url.trim().is_empty() {
            return Err(anyhow!("Database URL cannot be empty"));
        }

        if !url.starts_with("sqlite:") {
            return Err(anyhow!("Only SQLite databases are supported"));
        }

        if url.len() > 1000 {
            return Err(anyhow!("Database URL too long"));
        }

        Ok(())
    }
}
