use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::error::MomoError;

/// Client-facing failures of the HTTP API
///
/// Every variant renders as `{"error": message}` with its status code.
#[derive(Debug)]
pub enum ApiError {
    InvalidId,
    NotFound,
    InvalidJson,
    MissingFields(Vec<&'static str>),
    InvalidValue(String),
    Unauthorized,
    StorageUnavailable,
    UnknownEndpoint,
    Internal(String),
}

impl ApiError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidId | Self::InvalidJson | Self::MissingFields(_) | Self::InvalidValue(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound | Self::UnknownEndpoint => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::StorageUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::InvalidId => "invalid id".to_string(),
            Self::NotFound => "not found".to_string(),
            Self::InvalidJson => "invalid json".to_string(),
            Self::MissingFields(fields) => format!("missing fields: {}", fields.join(", ")),
            Self::InvalidValue(msg) => msg.clone(),
            Self::Unauthorized => "Unauthorized".to_string(),
            Self::StorageUnavailable => "analytics storage not configured".to_string(),
            Self::UnknownEndpoint => "unknown endpoint".to_string(),
            Self::Internal(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.message() }));

        match self {
            Self::Unauthorized => (
                status,
                [(header::WWW_AUTHENTICATE, r#"Basic realm="momo""#)],
                body,
            )
                .into_response(),
            Self::Internal(ref msg) => {
                tracing::error!(error = %msg, "Request failed");
                (status, body).into_response()
            }
            _ => (status, body).into_response(),
        }
    }
}

impl From<MomoError> for ApiError {
    fn from(err: MomoError) -> Self {
        Self::Internal(err.to_string())
    }
}
