//! Metrics and observability utilities
//!
//! Prometheus-style counters and histograms for the batch pipeline with
//! standardized naming conventions. Without an installed recorder every
//! helper is a no-op.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all AuthorMatch metrics
pub const METRICS_PREFIX: &str = "authormatch";

/// Buckets for batch stage durations (in seconds)
pub const STAGE_BUCKETS: &[f64] = &[
    0.010,  // 10ms
    0.050,  // 50ms
    0.100,  // 100ms
    0.500,  // 500ms
    1.000,  // 1s
    5.000,  // 5s
    10.00,  // 10s
    30.00,  // 30s
    60.00,  // 1m
    300.0,  // 5m
    900.0,  // 15m
];

/// Register all metric descriptions
pub fn register_metrics() {
    describe_histogram!(
        format!("{}_stage_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Batch stage duration in seconds"
    );

    describe_counter!(
        format!("{}_table_rows_total", METRICS_PREFIX),
        Unit::Count,
        "Raw table rows read"
    );

    describe_counter!(
        format!("{}_malformed_rows_total", METRICS_PREFIX),
        Unit::Count,
        "Raw table rows skipped as malformed"
    );

    describe_counter!(
        format!("{}_feature_rows_total", METRICS_PREFIX),
        Unit::Count,
        "Feature rows emitted"
    );

    describe_counter!(
        format!("{}_lack_of_data_rows_total", METRICS_PREFIX),
        Unit::Count,
        "Label rows skipped for lack of data"
    );

    describe_counter!(
        format!("{}_unlinked_author_rows_total", METRICS_PREFIX),
        Unit::Count,
        "Label rows skipped because the author has no PaperAuthor entry"
    );

    describe_counter!(
        format!("{}_compacted_rows_total", METRICS_PREFIX),
        Unit::Count,
        "Raw table rows kept or dropped by compaction"
    );

    describe_counter!(
        format!("{}_neighbor_queries_total", METRICS_PREFIX),
        Unit::Count,
        "Neighbor searches performed"
    );

    describe_counter!(
        format!("{}_cache_hits_total", METRICS_PREFIX),
        Unit::Count,
        "Total artifact cache hits"
    );

    describe_counter!(
        format!("{}_cache_misses_total", METRICS_PREFIX),
        Unit::Count,
        "Total artifact cache misses"
    );

    tracing::info!("Metrics registered");
}

/// Times one batch stage and logs/records it on completion
pub struct StageTimer {
    start: Instant,
    stage: &'static str,
}

impl StageTimer {
    /// Start timing a stage
    pub fn start(stage: &'static str) -> Self {
        Self {
            start: Instant::now(),
            stage,
        }
    }

    /// Record completion, returning the elapsed seconds
    pub fn finish(self) -> f64 {
        let duration = self.start.elapsed().as_secs_f64();

        histogram!(
            format!("{}_stage_duration_seconds", METRICS_PREFIX),
            "stage" => self.stage
        )
        .record(duration);

        tracing::info!(
            stage = self.stage,
            elapsed_ms = format!("{:.3}", duration * 1000.0),
            "Stage finished"
        );

        duration
    }
}

/// Helper to record table reading metrics
pub fn record_table(table: &str, rows: usize, malformed: usize) {
    counter!(
        format!("{}_table_rows_total", METRICS_PREFIX),
        "table" => table.to_string()
    )
    .increment(rows as u64);

    if malformed > 0 {
        counter!(
            format!("{}_malformed_rows_total", METRICS_PREFIX),
            "table" => table.to_string()
        )
        .increment(malformed as u64);
    }
}

/// Helper to record emitted feature rows
pub fn record_features(pass: &str, label: &str, rows: usize) {
    counter!(
        format!("{}_feature_rows_total", METRICS_PREFIX),
        "pass" => pass.to_string(),
        "label" => label.to_string()
    )
    .increment(rows as u64);
}

/// Helper to record lack-of-data label rows
pub fn record_lack_of_data(pass: &str, rows: usize) {
    counter!(
        format!("{}_lack_of_data_rows_total", METRICS_PREFIX),
        "pass" => pass.to_string()
    )
    .increment(rows as u64);
}

/// Helper to record label rows of authors without PaperAuthor entries
pub fn record_unlinked_authors(pass: &str, rows: usize) {
    counter!(
        format!("{}_unlinked_author_rows_total", METRICS_PREFIX),
        "pass" => pass.to_string()
    )
    .increment(rows as u64);
}

/// Helper to record one compacted table
pub fn record_compaction(table: &str, kept: usize, dropped: usize) {
    counter!(
        format!("{}_compacted_rows_total", METRICS_PREFIX),
        "table" => table.to_string(),
        "outcome" => "kept"
    )
    .increment(kept as u64);

    counter!(
        format!("{}_compacted_rows_total", METRICS_PREFIX),
        "table" => table.to_string(),
        "outcome" => "dropped"
    )
    .increment(dropped as u64);
}

/// Helper to record neighbor searches
pub fn record_neighbor_query(result_count: usize) {
    counter!(
        format!("{}_neighbor_queries_total", METRICS_PREFIX),
        "empty" => (result_count == 0).to_string()
    )
    .increment(1);
}

/// Helper to record cache metrics
pub fn record_cache(hit: bool, artifact: &str) {
    if hit {
        counter!(
            format!("{}_cache_hits_total", METRICS_PREFIX),
            "artifact" => artifact.to_string()
        )
        .increment(1);
    } else {
        counter!(
            format!("{}_cache_misses_total", METRICS_PREFIX),
            "artifact" => artifact.to_string()
        )
        .increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_buckets_sorted() {
        let mut prev = 0.0;
        for &bucket in STAGE_BUCKETS {
            assert!(bucket > prev);
            prev = bucket;
        }
    }

    #[test]
    fn test_stage_timer() {
        let timer = StageTimer::start("test");
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(timer.finish() >= 0.005);
    }
}
