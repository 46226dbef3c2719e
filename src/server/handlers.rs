use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::info;

use super::error::ApiError;
use super::AppState;
use crate::models::{Dashboard, NewTransaction, StoredTransaction, TransactionPatch, TransactionRecord};
use crate::validation::InputValidator;

/// Liveness check, served without authentication
pub async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

/// All in-memory records, in order
pub async fn list_transactions(State(state): State<Arc<AppState>>) -> Json<Vec<TransactionRecord>> {
    let store = state.store.read().await;
    Json(store.list().to_vec())
}

pub async fn get_transaction(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Result<Json<TransactionRecord>, ApiError> {
    let id = parse_id(&raw_id)?;
    let store = state.store.read().await;
    store.get(id).cloned().map(Json).ok_or(ApiError::NotFound)
}

pub async fn create_transaction(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<(StatusCode, Json<TransactionRecord>), ApiError> {
    let value = parse_object(&body)?;

    let missing = InputValidator::missing_required_fields(&value);
    if !missing.is_empty() {
        return Err(ApiError::MissingFields(missing));
    }

    let new: NewTransaction =
        serde_json::from_value(value).map_err(|e| ApiError::InvalidValue(e.to_string()))?;
    InputValidator::validate_new_transaction(&new).map_err(|e| ApiError::InvalidValue(e.to_string()))?;

    let record = state.store.write().await.create(new);
    info!(id = record.id, "Transaction created");
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn update_transaction(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
    body: String,
) -> Result<Json<TransactionRecord>, ApiError> {
    let id = parse_id(&raw_id)?;
    if state.store.read().await.get(id).is_none() {
        return Err(ApiError::NotFound);
    }

    let value = parse_object(&body)?;
    let patch: TransactionPatch =
        serde_json::from_value(value).map_err(|e| ApiError::InvalidValue(e.to_string()))?;
    InputValidator::validate_patch(&patch).map_err(|e| ApiError::InvalidValue(e.to_string()))?;

    let updated = state.store.write().await.update(id, patch).ok_or(ApiError::NotFound)?;
    info!(id, "Transaction updated");
    Ok(Json(updated))
}

pub async fn delete_transaction(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&raw_id)?;
    state.store.write().await.delete(id).ok_or(ApiError::NotFound)?;
    info!(id, "Transaction deleted");
    Ok(Json(json!({ "status": "deleted", "id": id })))
}

/// Dashboard aggregates from the database
pub async fn analytics(State(state): State<Arc<AppState>>) -> Result<Json<Dashboard>, ApiError> {
    let repository = state.repository.as_ref().ok_or(ApiError::StorageUnavailable)?;
    let dashboard = repository.dashboard(state.recent_limit).await?;
    Ok(Json(dashboard))
}

/// Newest stored rows, `?limit=N` (default 50)
pub async fn analytics_transactions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<StoredTransaction>>, ApiError> {
    let repository = state.repository.as_ref().ok_or(ApiError::StorageUnavailable)?;

    let limit = match params.get("limit") {
        Some(raw) => raw
            .trim()
            .parse::<usize>()
            .map_err(|_| ApiError::InvalidValue("invalid limit".to_string()))?,
        None => DEFAULT_ANALYTICS_LIMIT,
    };
    InputValidator::validate_limit(limit).map_err(|e| ApiError::InvalidValue(e.to_string()))?;

    let rows = repository.recent_transactions(limit).await?;
    Ok(Json(rows))
}

pub async fn unknown_endpoint() -> ApiError {
    ApiError::UnknownEndpoint
}

const DEFAULT_ANALYTICS_LIMIT: usize = 50;

fn parse_id(raw: &str) -> Result<u64, ApiError> {
    InputValidator::parse_transaction_id(raw).map_err(|_| ApiError::InvalidId)
}

/// Request bodies must be a JSON object
fn parse_object(body: &str) -> Result<Value, ApiError> {
    match serde_json::from_str::<Value>(body) {
        Ok(value) if value.is_object() => Ok(value),
        _ => Err(ApiError::InvalidJson),
    }
}
