//! HTTP API over the in-memory store and the analytics database
//!
//! `/health` is open; every other route, including unknown paths, sits behind
//! HTTP Basic auth.

pub mod auth;
pub mod error;
pub mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::get,
    Router,
};
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::metrics::MetricsCollector;
use crate::repository::TransactionRepository;
use crate::store::SharedStore;

pub use auth::Credentials;
pub use error::ApiError;

/// Shared state handed to every handler
pub struct AppState {
    pub store: SharedStore,
    /// Absent when the server runs without a database
    pub repository: Option<Arc<dyn TransactionRepository>>,
    pub credentials: Credentials,
    /// Size of the `recent` list in `/analytics`
    pub recent_limit: usize,
}

impl AppState {
    pub fn new(store: SharedStore, credentials: Credentials) -> Self {
        Self {
            store,
            repository: None,
            credentials,
            recent_limit: 50,
        }
    }

    #[must_use]
    pub fn with_repository(mut self, repository: Arc<dyn TransactionRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    #[must_use]
    pub const fn with_recent_limit(mut self, recent_limit: usize) -> Self {
        self.recent_limit = recent_limit;
        self
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let state = Arc::new(state);

    let protected = Router::new()
        .route(
            "/transactions",
            get(handlers::list_transactions).post(handlers::create_transaction),
        )
        .route(
            "/transactions/:id",
            get(handlers::get_transaction)
                .put(handlers::update_transaction)
                .delete(handlers::delete_transaction),
        )
        .route("/analytics", get(handlers::analytics))
        .route("/analytics/transactions", get(handlers::analytics_transactions))
        .fallback(handlers::unknown_endpoint)
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            auth::require_basic_auth,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(protected)
        .layer(middleware::from_fn(track_requests))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP API listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP API stopped");
    Ok(())
}

async fn track_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    let status = response.status().as_u16();
    MetricsCollector::default().record_http_request(method.as_str(), status);
    debug!(%method, %path, status, "Handled request");
    response
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
}
