//! Metrics and observability utilities
//!
//! Provides Prometheus metrics with SLO-aligned histograms
//! and standardized naming conventions.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};

/// Metrics prefix for all Korpus metrics
pub const METRICS_PREFIX: &str = "korpus";

/// Histogram buckets for query latency (in seconds)
pub const LATENCY_BUCKETS: &[f64] = &[
    0.001,  // 1ms
    0.005,  // 5ms
    0.010,  // 10ms
    0.025,  // 25ms
    0.050,  // 50ms
    0.100,  // 100ms
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.500,  // 2.5s
    5.000,  // 5s
];

/// Histogram buckets for spans returned per query
pub const MATCH_COUNT_BUCKETS: &[f64] = &[0.0, 1.0, 5.0, 10.0, 50.0, 100.0, 500.0, 1000.0, 5000.0];

/// Register all metric descriptions
pub fn register_metrics() {
    // Search metrics
    describe_counter!(
        format!("{}_search_queries_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of search queries by outcome"
    );

    describe_histogram!(
        format!("{}_search_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Search query latency in seconds"
    );

    describe_histogram!(
        format!("{}_search_matches", METRICS_PREFIX),
        Unit::Count,
        "Spans returned per search query"
    );

    // Ingestion metrics
    describe_counter!(
        format!("{}_passages_ingested_total", METRICS_PREFIX),
        Unit::Count,
        "Total passages loaded into the corpus"
    );

    describe_counter!(
        format!("{}_words_ingested_total", METRICS_PREFIX),
        Unit::Count,
        "Total word records loaded into the corpus"
    );

    describe_histogram!(
        format!("{}_ingestion_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Corpus load latency in seconds"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record search metrics
pub fn record_search(duration_secs: f64, outcome: &str, match_count: usize) {
    counter!(
        format!("{}_search_queries_total", METRICS_PREFIX),
        "outcome" => outcome.to_string()
    )
    .increment(1);

    histogram!(
        format!("{}_search_duration_seconds", METRICS_PREFIX),
        "outcome" => outcome.to_string()
    )
    .record(duration_secs);

    histogram!(format!("{}_search_matches", METRICS_PREFIX)).record(match_count as f64);
}

/// Helper to record ingestion metrics
pub fn record_ingestion(duration_secs: f64, passages: usize, words: usize) {
    counter!(format!("{}_passages_ingested_total", METRICS_PREFIX)).increment(passages as u64);

    counter!(format!("{}_words_ingested_total", METRICS_PREFIX)).increment(words as u64);

    histogram!(format!("{}_ingestion_duration_seconds", METRICS_PREFIX)).record(duration_secs);
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics::{
        Counter, Gauge, Histogram, HistogramFn, Key, KeyName, Metadata, Recorder, SharedString,
    };
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_latency_buckets() {
        // Verify buckets are sorted
        let mut prev = 0.0;
        for &bucket in LATENCY_BUCKETS {
            assert!(bucket > prev);
            prev = bucket;
        }
    }

    #[derive(Default)]
    struct Captured {
        histograms: Mutex<Vec<(String, f64)>>,
        gauges: Mutex<Vec<String>>,
    }

    struct CapturedHistogram {
        name: String,
        sink: Arc<Captured>,
    }

    impl HistogramFn for CapturedHistogram {
        fn record(&self, value: f64) {
            self.sink
                .histograms
                .lock()
                .unwrap()
                .push((self.name.clone(), value));
        }
    }

    struct CapturingRecorder(Arc<Captured>);

    impl Recorder for CapturingRecorder {
        fn describe_counter(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
        fn describe_gauge(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
        fn describe_histogram(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

        fn register_counter(&self, _: &Key, _: &Metadata<'_>) -> Counter {
            Counter::noop()
        }

        fn register_gauge(&self, key: &Key, _: &Metadata<'_>) -> Gauge {
            self.0.gauges.lock().unwrap().push(key.name().to_string());
            Gauge::noop()
        }

        fn register_histogram(&self, key: &Key, _: &Metadata<'_>) -> Histogram {
            Histogram::from_arc(Arc::new(CapturedHistogram {
                name: key.name().to_string(),
                sink: self.0.clone(),
            }))
        }
    }

    #[test]
    fn test_match_counts_are_a_distribution() {
        let captured = Arc::new(Captured::default());
        let recorder = CapturingRecorder(captured.clone());

        metrics::with_local_recorder(&recorder, || {
            record_search(0.004, "matched", 3);
            record_search(0.002, "matched", 7);
        });

        let histograms = captured.histograms.lock().unwrap();
        let matches: Vec<f64> = histograms
            .iter()
            .filter(|(name, _)| name == "korpus_search_matches")
            .map(|(_, value)| *value)
            .collect();
        assert_eq!(matches, vec![3.0, 7.0]);
        assert!(captured.gauges.lock().unwrap().is_empty());
    }

    #[test]
    fn test_recording_without_recorder() {
        record_search(0.002, "matched", 3);
        record_ingestion(0.5, 2, 40);
        // Just verify it runs without panic
    }
}
