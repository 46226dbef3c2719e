//! Tests for validation.rs module

use momo_analytics::models::{NewTransaction, TransactionPatch};
use momo_analytics::validation::InputValidator;
use serde_json::json;
use std::path::Path;

#[test]
fn test_parse_transaction_id() {
    assert_eq!(InputValidator::parse_transaction_id("42").unwrap(), 42);
    assert_eq!(InputValidator::parse_transaction_id(" 7 ").unwrap(), 7);
}

#[test]
fn test_parse_transaction_id_rejects_garbage() {
    for raw in ["", "abc", "-1", "0", "1.5", "99999999999999999999999"] {
        let err = InputValidator::parse_transaction_id(raw).unwrap_err();
        assert_eq!(err.to_string(), "invalid id", "{raw}");
    }
}

#[test]
fn test_missing_required_fields() {
    let body = json!({"type": "sent", "amount": 10, "sender": null});
    assert_eq!(
        InputValidator::missing_required_fields(&body),
        vec!["currency", "receiver", "timestamp"]
    );

    let complete = json!({
        "type": "sent", "amount": 10, "currency": "RWF",
        "sender": null, "receiver": null, "timestamp": null
    });
    assert!(InputValidator::missing_required_fields(&complete).is_empty());
}

#[test]
fn test_validate_new_transaction() {
    let mut new: NewTransaction = serde_json::from_value(json!({
        "type": "received", "amount": 10, "currency": "RWF",
        "sender": "Jane", "receiver": null, "timestamp": null
    }))
    .unwrap();
    assert!(InputValidator::validate_new_transaction(&new).is_ok());

    new.amount = -1.0;
    assert!(InputValidator::validate_new_transaction(&new).is_err());

    new.amount = 1.0;
    new.currency = "RWFX".to_string();
    assert!(InputValidator::validate_new_transaction(&new).is_err());
}

#[test]
fn test_validate_patch() {
    assert!(InputValidator::validate_patch(&TransactionPatch::default()).is_ok());

    let patch: TransactionPatch = serde_json::from_value(json!({"amount": "-5"})).unwrap();
    assert!(InputValidator::validate_patch(&patch).is_err());

    let patch: TransactionPatch = serde_json::from_value(json!({"currency": "usd"})).unwrap();
    assert!(InputValidator::validate_patch(&patch).is_ok());
}

#[test]
fn test_validate_amount() {
    assert!(InputValidator::validate_amount(0.0).is_ok());
    assert!(InputValidator::validate_amount(24_900.0).is_ok());
    assert!(InputValidator::validate_amount(-0.01).is_err());
    assert!(InputValidator::validate_amount(f64::NAN).is_err());
    assert!(InputValidator::validate_amount(f64::INFINITY).is_err());
}

#[test]
fn test_validate_limit() {
    assert!(InputValidator::validate_limit(1).is_ok());
    assert!(InputValidator::validate_limit(10_000).is_ok());
    assert!(InputValidator::validate_limit(0).is_err());
    assert!(InputValidator::validate_limit(10_001).is_err());
}

#[test]
fn test_validate_lookups() {
    assert!(InputValidator::validate_lookups(1000).is_ok());
    assert!(InputValidator::validate_lookups(0).is_err());
}

#[test]
fn test_validate_file_path() {
    assert!(InputValidator::validate_file_path(Path::new("data/processed/dashboard.json")).is_ok());
    assert!(InputValidator::validate_file_path(Path::new("")).is_err());
    assert!(InputValidator::validate_file_path(Path::new("../exports/sms.xml")).is_ok());
    assert!(InputValidator::validate_file_path(Path::new("data/sms..backup.xml")).is_ok());
    let long = "a".repeat(4097);
    assert!(InputValidator::validate_file_path(Path::new(&long)).is_err());
}

#[test]
fn test_validate_database_url() {
    assert!(InputValidator::validate_database_url("sqlite:data/db.sqlite3").is_ok());
    assert!(InputValidator::validate_database_url("").is_err());
    assert!(InputValidator::validate_database_url("mysql://localhost").is_err());
}
