//! Metrics collection and exposition.
//!
//! # Metrics
//! - `router_requests_total` (counter): requests by method, status, route
//! - `router_request_duration_seconds` (histogram): latency distribution
//! - `router_not_found_total` (counter): requests no route matched
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Route label is the route name, falling back to its template

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter with its own HTTP listener on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record one finished request.
///
/// `unmatched` marks requests no route claimed; a 404 written by a matched
/// route's own handler is not counted as not-found.
pub fn record_request(method: &str, status: u16, route: &str, unmatched: bool, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
        ("route", route.to_string()),
    ];

    metrics::counter!("router_requests_total", &labels).increment(1);
    metrics::histogram!("router_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());

    if unmatched {
        metrics::counter!("router_not_found_total", "method" => method.to_string()).increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    use metrics::{
        Counter, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit,
    };

    /// Recorder that only keeps the not-found counter.
    #[derive(Default)]
    struct NotFoundRecorder {
        not_found: Arc<AtomicU64>,
    }

    impl Recorder for NotFoundRecorder {
        fn describe_counter(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
        fn describe_gauge(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
        fn describe_histogram(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

        fn register_counter(&self, key: &Key, _: &Metadata<'_>) -> Counter {
            if key.name() == "router_not_found_total" {
                Counter::from_arc(self.not_found.clone())
            } else {
                Counter::noop()
            }
        }

        fn register_gauge(&self, _: &Key, _: &Metadata<'_>) -> Gauge {
            Gauge::noop()
        }

        fn register_histogram(&self, _: &Key, _: &Metadata<'_>) -> Histogram {
            Histogram::noop()
        }
    }

    #[test]
    fn test_not_found_counts_only_unmatched() {
        let recorder = NotFoundRecorder::default();

        metrics::with_local_recorder(&recorder, || {
            record_request("GET", 404, "users", false, Instant::now());
            record_request("GET", 200, "users", false, Instant::now());
            record_request("GET", 413, "none", false, Instant::now());
        });
        assert_eq!(recorder.not_found.load(Ordering::Relaxed), 0);

        metrics::with_local_recorder(&recorder, || {
            record_request("GET", 404, "none", true, Instant::now());
        });
        assert_eq!(recorder.not_found.load(Ordering::Relaxed), 1);
    }
}
