//! Tests for metrics.rs module
//!
//! No recorder is installed, so these check naming and that every call is a
//! safe no-op.

use std::time::Duration;
use momo_analytics::metrics::MetricsCollector;

#[test]
fn test_metrics_collector_default() {
    let collector = MetricsCollector::default();
    assert_eq!(collector.records_parsed_total, "momo_records_parsed_total");
    assert_eq!(collector.batch_parse_duration, "momo_batch_parse_duration_seconds");
    assert_eq!(collector.source_failures_total, "momo_source_failures_total");
    assert_eq!(collector.records_stored_total, "momo_records_stored_total");
    assert_eq!(collector.db_operation_duration, "momo_db_operation_duration_seconds");
    assert_eq!(collector.store_size, "momo_store_size");
    assert_eq!(collector.http_requests_total, "momo_http_requests_total");
    assert_eq!(collector.operation_duration, "momo_operation_duration_seconds");
}

#[test]
fn test_metric_names_share_prefix() {
    let collector = MetricsCollector::default();
    for name in [
        collector.records_parsed_total,
        collector.batch_parse_duration,
        collector.source_failures_total,
        collector.records_stored_total,
        collector.db_operation_duration,
        collector.store_size,
        collector.http_requests_total,
        collector.operation_duration,
    ] {
        assert!(name.starts_with("momo_"), "{name}");
    }
}

#[test]
fn test_record_without_recorder() {
    let collector = MetricsCollector::default();
    collector.record_batch_parsed(0, Duration::ZERO);
    collector.record_batch_parsed(1600, Duration::from_millis(120));
    collector.record_source_failure("malformed");
    collector.record_records_stored(1600, Duration::from_millis(40));
    collector.record_db_query("kpis", Duration::from_micros(300));
    collector.update_store_size(0);
    collector.record_operation("load", Duration::from_millis(15));
    collector.record_http_request("DELETE", 404);
}
