//! MoMo Analytics - Mobile Money SMS Ingestion and Reporting
//!
//! A Rust library for turning mobile-money SMS exports into structured
//! transaction records, storing them, and serving them over HTTP.
//!
//! # Features
//!
//! - Parse SMS backup XML documents into ordered transaction records
//! - Pattern-based extraction of amounts, counterparties and reference ids
//! - SQLite storage with dashboard aggregates and JSON export
//! - Authenticated CRUD and analytics HTTP API
//! - Linear vs keyed lookup diagnostics

/// Linear scan vs keyed lookup diagnostics
pub mod comparator;
/// Configuration management
pub mod config;
/// Database operations and connection pooling
pub mod db;
/// Library error type
pub mod error;
/// Field extraction from SMS bodies
pub mod extractor;
/// Record and dashboard export
pub mod file_writer;
/// Logging setup and utilities
pub mod logging;
/// Metrics collection
pub mod metrics;
/// Data models and structures
pub mod models;
/// Assembly of canonical records
pub mod normalizer;
/// XML batch parsing
pub mod parser;
/// Repository pattern for data access
pub mod repository;
/// Database schema definitions
pub mod schema;
/// HTTP API
pub mod server;
/// In-memory record store
pub mod store;
/// Input validation and sanitization
pub mod validation;

// Re-export key components for easier access
pub use db::Database;
pub use error::{MomoError, Result};
pub use extractor::FieldExtractor;
pub use models::{Dashboard, OutputFormat, RawSmsEntry, TransactionKind, TransactionRecord};
pub use normalizer::RecordNormalizer;
pub use parser::BatchParser;
pub use store::{SharedStore, TransactionStore};
