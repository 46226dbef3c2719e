use metrics::{counter, gauge, histogram};
use std::time::Duration;

/// Metric names emitted by the pipeline and the HTTP API
///
/// Nothing is exported unless the binary installs a recorder; without one the
/// `metrics` facade discards every call.
pub struct MetricsCollector {
    // Parsing metrics
    pub records_parsed_total: &'static str,
    pub batch_parse_duration: &'static str,
    pub source_failures_total: &'static str,

    // Storage metrics
    pub records_stored_total: &'static str,
    pub db_operation_duration: &'static str,

    // Serving metrics
    pub store_size: &'static str,
    pub http_requests_total: &'static str,

    // Command metrics
    pub operation_duration: &'static str,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self {
            records_parsed_total: "momo_records_parsed_total",
            batch_parse_duration: "momo_batch_parse_duration_seconds",
            source_failures_total: "momo_source_failures_total",

            records_stored_total: "momo_records_stored_total",
            db_operation_duration: "momo_db_operation_duration_seconds",

            store_size: "momo_store_size",
            http_requests_total: "momo_http_requests_total",

            operation_duration: "momo_operation_duration_seconds",
        }
    }
}

impl MetricsCollector {
    /// Record a successfully parsed batch
    pub fn record_batch_parsed(&self, count: usize, duration: Duration) {
        counter!(self.records_parsed_total).increment(count as u64);
        histogram!(self.batch_parse_duration).record(duration.as_secs_f64());
    }

    /// Record a document-level parse failure
    pub fn record_source_failure(&self, kind: &'static str) {
        counter!(self.source_failures_total, "kind" => kind).increment(1);
    }

    /// Record a bulk insert into the database
    pub fn record_records_stored(&self, count: usize, duration: Duration) {
        counter!(self.records_stored_total).increment(count as u64);
        histogram!(self.db_operation_duration, "operation" => "insert").record(duration.as_secs_f64());
    }

    /// Record a database query
    pub fn record_db_query(&self, operation: &'static str, duration: Duration) {
        histogram!(self.db_operation_duration, "operation" => operation).record(duration.as_secs_f64());
    }

    /// Update the in-memory store size
    pub fn update_store_size(&self, size: usize) {
        gauge!(self.store_size).set(size as f64);
    }

    /// Record an HTTP response
    pub fn record_http_request(&self, method: &str, status: u16) {
        counter!(
            self.http_requests_total,
            "method" => method.to_string(),
            "status" => status.to_string()
        )
        .increment(1);
    }

    /// Record how long a timed operation took
    pub fn record_operation(&self, operation: &str, duration: Duration) {
        histogram!(self.operation_duration, "operation" => operation.to_string()).record(duration.as_secs_f64());
    }
}
