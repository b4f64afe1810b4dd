//! Metrics collection and exposition.
//!
//! A small in-process registry shared by every request handler: two
//! monotonic counters and a bounded latency histogram. The `/__metrics__`
//! endpoint renders `snapshot()` as a JSON object.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use hdrhistogram::Histogram;
use serde_json::{json, Value};

/// Lowest discernible latency, in milliseconds.
const LATENCY_LOW_MS: u64 = 1;
/// Highest trackable latency: three minutes, in milliseconds.
const LATENCY_HIGH_MS: u64 = 1000 * 60 * 3;
/// Histogram precision.
const LATENCY_SIGFIGS: u8 = 3;

/// Request counters and the latency histogram.
///
/// Counters are lock-free atomics; the histogram mutex is held only for a
/// single record or snapshot call.
pub struct Metrics {
    requests: AtomicU64,
    responses: AtomicU64,
    latency_ms: Mutex<Histogram<u64>>,
}

impl Metrics {
    pub fn new() -> Self {
        let histogram =
            Histogram::new_with_bounds(LATENCY_LOW_MS, LATENCY_HIGH_MS, LATENCY_SIGFIGS)
                .expect("latency histogram bounds are static");

        Self {
            requests: AtomicU64::new(0),
            responses: AtomicU64::new(0),
            latency_ms: Mutex::new(histogram),
        }
    }

    /// Count a request entering the handler chain.
    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a request leaving the handler chain, on any exit path.
    pub fn record_response(&self) {
        self.responses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one request's elapsed wall time.
    pub fn record_latency(&self, elapsed_ms: u64) {
        let mut histogram = self
            .latency_ms
            .lock()
            .expect("latency histogram lock poisoned");
        histogram.saturating_record(elapsed_ms.max(LATENCY_LOW_MS));
    }

    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    pub fn responses(&self) -> u64 {
        self.responses.load(Ordering::Relaxed)
    }

    /// Render the registry as a flat JSON object, counter names to values.
    pub fn snapshot(&self) -> Value {
        let histogram = self
            .latency_ms
            .lock()
            .expect("latency histogram lock poisoned");

        json!({
            "HTTP.Requests": self.requests(),
            "HTTP.Responses": self.responses(),
            "HTTP.Latency.Count": histogram.len(),
            "HTTP.Latency.P50": histogram.value_at_quantile(0.50),
            "HTTP.Latency.P75": histogram.value_at_quantile(0.75),
            "HTTP.Latency.P90": histogram.value_at_quantile(0.90),
            "HTTP.Latency.P95": histogram.value_at_quantile(0.95),
            "HTTP.Latency.P99": histogram.value_at_quantile(0.99),
            "HTTP.Latency.P999": histogram.value_at_quantile(0.999),
            "HTTP.Latency.Max": histogram.max(),
        })
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero() {
        let metrics = Metrics::new();
        assert_eq!(metrics.requests(), 0);
        assert_eq!(metrics.responses(), 0);
    }

    #[test]
    fn counters_increment_independently() {
        let metrics = Metrics::new();
        metrics.record_request();
        metrics.record_request();
        metrics.record_response();

        assert_eq!(metrics.requests(), 2);
        assert_eq!(metrics.responses(), 1);
    }

    #[test]
    fn latency_is_clamped_into_bounds() {
        let metrics = Metrics::new();
        metrics.record_latency(0);
        metrics.record_latency(10_000_000);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot["HTTP.Latency.Count"], 2);
        assert!(snapshot["HTTP.Latency.Max"].as_u64().unwrap() <= LATENCY_HIGH_MS);
    }

    #[test]
    fn snapshot_reflects_recorded_values() {
        let metrics = Metrics::new();
        metrics.record_request();
        metrics.record_response();
        metrics.record_latency(25);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot["HTTP.Requests"], 1);
        assert_eq!(snapshot["HTTP.Responses"], 1);
        let p50 = snapshot["HTTP.Latency.P50"].as_u64().unwrap();
        assert!((25..=26).contains(&p50), "p50 was {}", p50);
    }

    #[test]
    fn concurrent_updates_do_not_lose_counts() {
        use std::sync::Arc;

        let metrics = Arc::new(Metrics::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let metrics = Arc::clone(&metrics);
            handles.push(std::thread::spawn(move || {
                for _ in 0..1000 {
                    metrics.record_request();
                    metrics.record_latency(5);
                    metrics.record_response();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(metrics.requests(), 8000);
        assert_eq!(metrics.responses(), 8000);
        assert_eq!(metrics.snapshot()["HTTP.Latency.Count"], 8000);
    }
}
