//! Field extraction from free-form mobile-money SMS bodies.
//!
//! Every extractor is total: a pattern that does not match yields a default
//! or `None`, never an error. Patterns that compete for the same field are kept
//! in ordered lists and evaluated first-match-wins.

use chrono::{Local, TimeZone};
use regex::{Captures, Regex};

use crate::error::Result;
use crate::models::TransactionKind;

/// Format of normalized timestamps
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const AMOUNT_PATTERNS: [(&str, &str); 2] = [
    ("received", r"(?i)\breceived\s+(\d[\d,]*(?:\.\d+)?)\s*([A-Z]{3})\b"),
    ("payment_of", r"(?i)\bpayment\s+of\s+(\d[\d,]*(?:\.\d+)?)\s*([A-Z]{3})\b"),
];

/// ISO 4217 codes accepted as an explicit currency after an amount
const KNOWN_CURRENCIES: [&str; 16] = [
    "BIF", "CDF", "CNY", "EUR", "GBP", "GHS", "JPY", "KES", "MWK", "NGN", "RWF", "TZS", "UGX", "USD", "XAF",
    "ZAR",
];

const REFERENCE_PATTERNS: [(&str, &str); 2] = [
    ("tx_id", r"(?i)\bTxId:\s*(\d+)"),
    ("financial_transaction_id", r"(?i)\bFinancial\s+Transaction\s+Id:\s*(\d+)"),
];

const FROM_PATTERN: &str = r"(?i)\bfrom\s+([^(]+?)\s*\(";
const TO_PATTERN: &str = r"(?i)\bto\s+([\p{L} ]+?)\s*\d";

/// A named pattern in an ordered pattern list
#[derive(Debug, Clone)]
pub struct Pattern {
    /// Short name used in logs and tests
    pub label: &'static str,
    regex: Regex,
}

impl Pattern {
    fn compile(label: &'static str, source: &str) -> Result<Self> {
        Ok(Self {
            label,
            regex: Regex::new(source)?,
        })
    }

    /// Captures of this pattern in `text`, if it matches
    #[must_use]
    pub fn captures<'t>(&self, text: &'t str) -> Option<Captures<'t>> {
        self.regex.captures(text)
    }
}

/// Evaluate `patterns` in order and return the first one that matches
pub fn first_match<'p, 't>(
    patterns: &'p [Pattern],
    text: &'t str,
) -> Option<(&'p Pattern, Captures<'t>)> {
    patterns
        .iter()
        .find_map(|pattern| pattern.captures(text).map(|caps| (pattern, caps)))
}

/// An amount found in a message together with the currency written next to it
#[derive(Debug, Clone, PartialEq)]
pub struct AmountMatch {
    /// Parsed amount, separators removed
    pub amount: f64,
    /// Upper-cased currency code, if the word after the amount is one
    pub currency: Option<String>,
}

/// All fields extracted from one body
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedFields {
    /// Classification
    pub kind: TransactionKind,
    /// Amount, `0.0` if nothing matched
    pub amount: f64,
    /// Currency named in the amount phrase
    pub currency: Option<String>,
    /// Payer name
    pub counterparty_from: Option<String>,
    /// Payee name
    pub counterparty_to: Option<String>,
    /// Provider transaction id
    pub external_reference_id: Option<String>,
}

/// Compiled extraction patterns
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    amount_patterns: Vec<Pattern>,
    reference_patterns: Vec<Pattern>,
    from_pattern: Regex,
    to_pattern: Regex,
}

impl FieldExtractor {
    /// Compile the pattern tables
    pub fn new() -> Result<Self> {
        let amount_patterns = AMOUNT_PATTERNS
            .iter()
            .map(|(label, source)| Pattern::compile(label, source))
            .collect::<Result<Vec<_>>>()?;
        let reference_patterns = REFERENCE_PATTERNS
            .iter()
            .map(|(label, source)| Pattern::compile(label, source))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            amount_patterns,
            reference_patterns,
            from_pattern: Regex::new(FROM_PATTERN)?,
            to_pattern: Regex::new(TO_PATTERN)?,
        })
    }

    /// Amount patterns in evaluation order
    #[must_use]
    pub fn amount_patterns(&self) -> &[Pattern] {
        &self.amount_patterns
    }

    /// Reference id patterns in evaluation order
    #[must_use]
    pub fn reference_patterns(&self) -> &[Pattern] {
        &self.reference_patterns
    }

    /// Run every extractor over `body`
    #[must_use]
    pub fn extract(&self, body: &str) -> ExtractedFields {
        let amount = self.extract_amount_match(body);
        ExtractedFields {
            kind: classify_kind(body),
            amount: amount.as_ref().map_or(0.0, |m| m.amount),
            currency: amount.and_then(|m| m.currency),
            counterparty_from: self.extract_counterparty_from(body),
            counterparty_to: self.extract_counterparty_to(body),
            external_reference_id: self.extract_reference_id(body),
        }
    }

    /// Amount of the first matching amount phrase, `0.0` if none matches
    #[must_use]
    pub fn extract_amount(&self, body: &str) -> f64 {
        self.extract_amount_match(body).map_or(0.0, |m| m.amount)
    }

    /// Amount and currency of the first matching amount phrase
    #[must_use]
    pub fn extract_amount_match(&self, body: &str) -> Option<AmountMatch> {
        let (pattern, caps) = first_match(&self.amount_patterns, body)?;
        let amount = parse_amount(caps.get(1)?.as_str());
        tracing::trace!(pattern = pattern.label, amount, "amount matched");
        Some(AmountMatch {
            amount,
            currency: caps.get(2).and_then(|m| currency_code(m.as_str())),
        })
    }

    /// Name between "from" and the next opening parenthesis
    #[must_use]
    pub fn extract_counterparty_from(&self, body: &str) -> Option<String> {
        capture_trimmed(&self.from_pattern, body)
    }

    /// Name between "to" and the first following digit
    #[must_use]
    pub fn extract_counterparty_to(&self, body: &str) -> Option<String> {
        capture_trimmed(&self.to_pattern, body)
    }

    /// Digits following the first matching reference label
    #[must_use]
    pub fn extract_reference_id(&self, body: &str) -> Option<String> {
        first_match(&self.reference_patterns, body)
            .and_then(|(_, caps)| caps.get(1).map(|m| m.as_str().to_string()))
    }
}

/// Classify by keyword: "received" beats "payment"/"paid"
#[must_use]
pub fn classify_kind(body: &str) -> TransactionKind {
    let lowered = body.to_lowercase();
    if lowered.contains("received") {
        TransactionKind::Received
    } else if lowered.contains("payment") || lowered.contains("paid") {
        TransactionKind::Sent
    } else {
        TransactionKind::Unknown
    }
}

/// Convert epoch milliseconds to a local `YYYY-MM-DD HH:MM:SS` string
///
/// Missing, non-numeric or out-of-range input yields `None`.
#[must_use]
pub fn convert_timestamp(millis: Option<&str>) -> Option<String> {
    let millis: i64 = millis?.trim().parse().ok()?;
    Local
        .timestamp_millis_opt(millis)
        .single()
        .map(|dt| dt.format(TIMESTAMP_FORMAT).to_string())
}

/// Upper-cased `word` if it names a known currency
fn currency_code(word: &str) -> Option<String> {
    let code = word.to_uppercase();
    KNOWN_CURRENCIES.contains(&code.as_str()).then_some(code)
}

fn parse_amount(digits: &str) -> f64 {
    digits
        .replace(',', "")
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value >= 0.0)
        .unwrap_or(0.0)
}

fn capture_trimmed(regex: &Regex, body: &str) -> Option<String> {
    regex
        .captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_tables_compile_in_order() {
        let extractor = FieldExtractor::new().unwrap();
        let labels: Vec<_> = extractor.amount_patterns().iter().map(|p| p.label).collect();
        assert_eq!(labels, ["received", "payment_of"]);
        let labels: Vec<_> = extractor.reference_patterns().iter().map(|p| p.label).collect();
        assert_eq!(labels, ["tx_id", "financial_transaction_id"]);
    }

    #[test]
    fn test_first_match_prefers_earlier_pattern() {
        let extractor = FieldExtractor::new().unwrap();
        let body = "Financial Transaction Id: 222. TxId: 111.";
        let (pattern, caps) = first_match(extractor.reference_patterns(), body).unwrap();
        assert_eq!(pattern.label, "tx_id");
        assert_eq!(&caps[1], "111");
    }

    #[test]
    fn test_parse_amount_strips_separators() {
        assert!((parse_amount("24,900") - 24900.0).abs() < f64::EPSILON);
        assert!((parse_amount("1,000.50") - 1000.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_currency_is_uppercased() {
        let extractor = FieldExtractor::new().unwrap();
        let found = extractor.extract_amount_match("received 50 usd today").unwrap();
        assert_eq!(found.currency.as_deref(), Some("USD"));
    }

    #[test]
    fn test_ordinary_words_are_not_currencies() {
        assert_eq!(currency_code("via"), None);
        assert_eq!(currency_code("and"), None);
        assert_eq!(currency_code("kes").as_deref(), Some("KES"));
    }
}
