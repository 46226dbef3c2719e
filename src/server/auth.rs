use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

use super::error::ApiError;
use super::AppState;

/// Username and password accepted by the Basic auth check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Check the value of an `Authorization` header
    pub fn authorizes(&self, header_value: &str) -> bool {
        decode_basic(header_value)
            .is_some_and(|(username, password)| username == self.username && password == self.password)
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self::new("admin", "admin123")
    }
}

/// Split `Basic <base64(user:pass)>` into its two halves
pub fn decode_basic(header_value: &str) -> Option<(String, String)> {
    let encoded = header_value.strip_prefix("Basic ")?;
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

/// Middleware rejecting requests without valid Basic credentials
pub async fn require_basic_auth(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| state.credentials.authorizes(value));

    if !authorized {
        debug!(path = %request.uri().path(), "Rejected unauthenticated request");
        return Err(ApiError::Unauthorized);
    }

    Ok(next.run(request).await)
}
