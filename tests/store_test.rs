//! Tests for the in-memory transaction store

use momo_analytics::models::{NewTransaction, TransactionKind, TransactionPatch, TransactionRecord};
use momo_analytics::store::TransactionStore;

fn record(id: u64) -> TransactionRecord {
    TransactionRecord {
        id,
        kind: TransactionKind::Received,
        amount: 100.0 * id as f64,
        currency: "RWF".to_string(),
        counterparty_from: Some(format!("Sender {id}")),
        counterparty_to: None,
        timestamp: Some("2024-05-10 16:30:51".to_string()),
        external_reference_id: None,
        raw_text: format!("entry {id}"),
    }
}

fn new_transaction() -> NewTransaction {
    serde_json::from_str(
        r#"{"type": "sent", "amount": "1,500", "currency": "RWF", "sender": null, "receiver": "Samuel Carter", "timestamp": "2024-05-11 10:00:00"}"#,
    )
    .expect("valid payload")
}

#[test]
fn test_empty_store_starts_at_one() {
    let mut store = TransactionStore::new();
    assert!(store.is_empty());
    assert_eq!(store.next_id(), 1);

    let created = store.create(new_transaction());
    assert_eq!(created.id, 1);
    assert_eq!(store.len(), 1);
}

#[test]
fn test_create_after_load_uses_max_plus_one() {
    let mut store = TransactionStore::from_records(vec![record(1), record(5), record(2)]);
    assert_eq!(store.next_id(), 6);

    let created = store.create(new_transaction());
    assert_eq!(created.id, 6);
    assert_eq!(created.kind, TransactionKind::Sent);
    assert!((created.amount - 1500.0).abs() < f64::EPSILON);
    assert_eq!(created.counterparty_to.as_deref(), Some("Samuel Carter"));
    assert_eq!(created.raw_text, "");
    assert_eq!(store.get(6), Some(&created));
    assert_eq!(store.list().last(), Some(&created));
}

#[test]
fn test_delete_preserves_order() {
    let mut store = TransactionStore::from_records((1..=5).map(record).collect());

    let removed = store.delete(3).expect("record 3 exists");
    assert_eq!(removed.id, 3);

    let ids: Vec<u64> = store.list().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![1, 2, 4, 5]);
    assert!(store.get(3).is_none());
    assert_eq!(store.get(5).map(|r| r.id), Some(5));
}

#[test]
fn test_ids_not_reused_after_delete() {
    let mut store = TransactionStore::from_records(vec![record(1), record(2)]);
    store.delete(2).expect("record 2 exists");

    assert_eq!(store.create(new_transaction()).id, 3);
}

#[test]
fn test_delete_missing_is_none() {
    let mut store = TransactionStore::from_records(vec![record(1)]);
    assert!(store.delete(42).is_none());
    assert_eq!(store.len(), 1);
}

#[test]
fn test_update_applies_patch() {
    let mut store = TransactionStore::from_records(vec![record(1), record(2)]);
    let patch: TransactionPatch =
        serde_json::from_str(r#"{"amount": 42, "sender": null, "transaction_id": "999"}"#).expect("valid patch");

    let updated = store.update(2, patch).expect("record 2 exists");

    assert!((updated.amount - 42.0).abs() < f64::EPSILON);
    assert_eq!(updated.counterparty_from, None);
    assert_eq!(updated.external_reference_id.as_deref(), Some("999"));
    assert_eq!(updated.raw_text, "entry 2");
    assert_eq!(store.get(2), Some(&updated));
}

#[test]
fn test_update_missing_is_none() {
    let mut store = TransactionStore::new();
    assert!(store.update(1, TransactionPatch::default()).is_none());
}

#[tokio::test]
async fn test_shared_store() {
    let shared = TransactionStore::from_records(vec![record(1)]).into_shared();

    shared.write().await.create(new_transaction());

    let store = shared.read().await;
    assert_eq!(store.len(), 2);
}
