//! In-process tests for the HTTP API

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use mockall::mock;
use mockall::predicate::eq;
use serde_json::{json, Value};
use tower::ServiceExt;

use momo_analytics::error::Result;
use momo_analytics::models::{Dashboard, Kpis, StoredTransaction, TransactionKind, TransactionRecord};
use momo_analytics::repository::TransactionRepository;
use momo_analytics::server::{router, AppState, Credentials};
use momo_analytics::store::{SharedStore, TransactionStore};

mock! {
    pub Repository {}

    #[async_trait]
    impl TransactionRepository for Repository {
        async fn save_batch(&self, records: &[TransactionRecord]) -> Result<usize>;
        async fn dashboard(&self, recent_limit: usize) -> Result<Dashboard>;
        async fn recent_transactions(&self, limit: usize) -> Result<Vec<StoredTransaction>>;
    }
}

fn record(id: u64) -> TransactionRecord {
    TransactionRecord {
        id,
        kind: TransactionKind::Received,
        amount: 1000.0 * id as f64,
        currency: "RWF".to_string(),
        counterparty_from: Some(format!("Sender {id}")),
        counterparty_to: None,
        timestamp: Some("2024-05-10 16:30:51".to_string()),
        external_reference_id: None,
        raw_text: format!("You have received {id}000 RWF"),
    }
}

fn seeded_store() -> SharedStore {
    TransactionStore::from_records((1..=3).map(record).collect()).into_shared()
}

fn app(store: &SharedStore) -> Router {
    router(AppState::new(Arc::clone(store), Credentials::default()))
}

fn basic(user: &str, pass: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{user}:{pass}")))
}

async fn send(app: Router, method: Method, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
    send_with_auth(app, method, uri, body, Some(&basic("admin", "admin123"))).await
}

async fn send_with_auth(
    app: Router,
    method: Method,
    uri: &str,
    body: Option<&str>,
    authorization: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    let request = builder
        .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_health_is_open() {
    let store = seeded_store();
    let (status, body) = send_with_auth(app(&store), Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true}));
}

#[tokio::test]
async fn test_missing_credentials_rejected() {
    let store = seeded_store();
    let request = Request::builder().uri("/transactions").body(Body::empty()).unwrap();

    let response = app(&store).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
        r#"Basic realm="momo""#
    );
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, json!({"error": "Unauthorized"}));
}

#[tokio::test]
async fn test_wrong_password_rejected() {
    let store = seeded_store();
    let wrong = basic("admin", "nope");
    for uri in ["/transactions", "/transactions/1", "/analytics", "/no/such/route"] {
        let (status, _) = send_with_auth(app(&store), Method::GET, uri, None, Some(&wrong)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
    }
}

#[tokio::test]
async fn test_custom_credentials() {
    let store = seeded_store();
    let app = router(AppState::new(Arc::clone(&store), Credentials::new("ops", "s3cret")));
    let (status, _) =
        send_with_auth(app, Method::GET, "/transactions", None, Some(&basic("ops", "s3cret"))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_list_transactions() {
    let store = seeded_store();
    let (status, body) = send(app(&store), Method::GET, "/transactions", None).await;

    assert_eq!(status, StatusCode::OK);
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0]["id"], 1);
    assert_eq!(items[0]["type"], "received");
    assert_eq!(items[0]["sender"], "Sender 1");
    assert!(items[0]["receiver"].is_null());
}

#[tokio::test]
async fn test_get_transaction() {
    let store = seeded_store();

    let (status, body) = send(app(&store), Method::GET, "/transactions/2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 2);
    assert_eq!(body["amount"], 2000.0);

    let (status, body) = send(app(&store), Method::GET, "/transactions/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "invalid id"}));

    let (status, body) = send(app(&store), Method::GET, "/transactions/99", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "not found"}));
}

#[tokio::test]
async fn test_create_transaction() {
    let store = seeded_store();
    let payload = json!({
        "type": "sent",
        "amount": "1,500",
        "currency": "RWF",
        "sender": null,
        "receiver": "Samuel Carter",
        "timestamp": "2024-05-11 10:00:00"
    })
    .to_string();

    let (status, body) = send(app(&store), Method::POST, "/transactions", Some(&payload)).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], 4);
    assert_eq!(body["type"], "sent");
    assert_eq!(body["amount"], 1500.0);
    assert_eq!(body["receiver"], "Samuel Carter");
    assert_eq!(body["raw_text"], "");
    assert_eq!(store.read().await.len(), 4);
}

#[tokio::test]
async fn test_create_rejects_bad_bodies() {
    let store = seeded_store();

    for payload in ["", "not json", "[1, 2]"] {
        let (status, body) = send(app(&store), Method::POST, "/transactions", Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{payload}");
        assert_eq!(body, json!({"error": "invalid json"}));
    }

    let (status, body) = send(
        app(&store),
        Method::POST,
        "/transactions",
        Some(r#"{"type": "sent", "amount": 5, "currency": "RWF"}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "missing fields: sender, receiver, timestamp");

    let invalid_type = json!({
        "type": "PAY", "amount": 5, "currency": "RWF",
        "sender": null, "receiver": null, "timestamp": null
    })
    .to_string();
    let (status, _) = send(app(&store), Method::POST, "/transactions", Some(&invalid_type)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let negative = json!({
        "type": "sent", "amount": -5, "currency": "RWF",
        "sender": null, "receiver": null, "timestamp": null
    })
    .to_string();
    let (status, body) = send(app(&store), Method::POST, "/transactions", Some(&negative)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "amount cannot be negative");

    assert_eq!(store.read().await.len(), 3);
}

#[tokio::test]
async fn test_update_transaction() {
    let store = seeded_store();

    let (status, body) = send(
        app(&store),
        Method::PUT,
        "/transactions/1",
        Some(r#"{"amount": 250, "sender": null}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["amount"], 250.0);
    assert!(body["sender"].is_null());
    assert_eq!(body["type"], "received");

    let (status, _) = send(app(&store), Method::PUT, "/transactions/42", Some("{}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(app(&store), Method::PUT, "/transactions/x", Some("{}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(app(&store), Method::PUT, "/transactions/1", Some("{broken")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "invalid json"}));

    let (status, _) = send(app(&store), Method::PUT, "/transactions/1", Some(r#"{"currency": "RWFX"}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(store.read().await.get(1).unwrap().currency, "RWF");
}

#[tokio::test]
async fn test_delete_transaction() {
    let store = seeded_store();

    let (status, body) = send(app(&store), Method::DELETE, "/transactions/2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "deleted", "id": 2}));

    let (_, body) = send(app(&store), Method::GET, "/transactions", None).await;
    let ids: Vec<u64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 3]);

    let (status, _) = send(app(&store), Method::DELETE, "/transactions/2", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_endpoint() {
    let store = seeded_store();
    let (status, body) = send(app(&store), Method::GET, "/transactionz", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "unknown endpoint"}));
}

#[tokio::test]
async fn test_analytics_without_storage() {
    let store = seeded_store();
    for uri in ["/analytics", "/analytics/transactions"] {
        let (status, _) = send(app(&store), Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE, "{uri}");
    }
}

#[tokio::test]
async fn test_analytics_dashboard() {
    let mut repository = MockRepository::new();
    repository
        .expect_dashboard()
        .with(eq(10))
        .times(1)
        .returning(|_| {
            Ok(Dashboard {
                kpis: Kpis {
                    total_count: 2,
                    total_volume: 3000.0,
                    avg_amount: 1500.0,
                },
                ..Dashboard::default()
            })
        });

    let store = seeded_store();
    let state = AppState::new(Arc::clone(&store), Credentials::default())
        .with_repository(Arc::new(repository))
        .with_recent_limit(10);

    let (status, body) = send(router(state), Method::GET, "/analytics", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kpis"]["total_count"], 2);
    assert_eq!(body["kpis"]["avg_amount"], 1500.0);
}

#[tokio::test]
async fn test_analytics_transactions_limit() {
    let mut repository = MockRepository::new();
    repository
        .expect_recent_transactions()
        .with(eq(50))
        .times(1)
        .returning(|_| Ok(Vec::new()));
    repository
        .expect_recent_transactions()
        .with(eq(5))
        .times(1)
        .returning(|_| Ok(Vec::new()));

    let store = seeded_store();
    let state = Arc::new(repository);

    let app = |repo: &Arc<MockRepository>| {
        router(AppState::new(Arc::clone(&store), Credentials::default()).with_repository(Arc::clone(repo) as _))
    };

    let (status, body) = send(app(&state), Method::GET, "/analytics/transactions", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, _) = send(app(&state), Method::GET, "/analytics/transactions?limit=5", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(app(&state), Method::GET, "/analytics/transactions?limit=abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "invalid limit"}));
}
