// Metrics module - Prometheus-compatible metrics tracking
// Counters per operation and status, byte totals, and latency quantiles

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Latency samples kept for quantile estimation
const MAX_DURATION_SAMPLES: usize = 10_000;

/// Histogram represents percentile statistics for latency measurements
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Histogram {
    pub p50: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
}

/// Metrics struct tracks counters and histograms for Prometheus export
/// Thread-safe via atomic operations and mutexes
pub struct Metrics {
    // Request counters
    request_count: AtomicU64,

    // Status code counters (e.g., 200, 400, 415)
    status_counts: Mutex<BTreeMap<u16, u64>>,

    // Upload counters by operation (resize, crop, contrast)
    operation_counts: Mutex<BTreeMap<String, u64>>,

    // Failed uploads by error kind (decode_failure, storage_failure, ...)
    upload_errors: Mutex<BTreeMap<String, u64>>,

    unsupported_media_rejections: AtomicU64,

    // Transform work currently on the blocking pool
    active_transforms: AtomicU64,

    bytes_received: AtomicU64,
    bytes_written: AtomicU64,

    // Request duration samples in microseconds
    durations: Mutex<VecDeque<u64>>,
    duration_total_us: AtomicU64,
    duration_count: AtomicU64,
}

impl Metrics {
    /// Create a new Metrics instance
    pub fn new() -> Self {
        Metrics {
            request_count: AtomicU64::new(0),
            status_counts: Mutex::new(BTreeMap::new()),
            operation_counts: Mutex::new(BTreeMap::new()),
            upload_errors: Mutex::new(BTreeMap::new()),
            unsupported_media_rejections: AtomicU64::new(0),
            active_transforms: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            bytes_written: AtomicU64::new(0),
            durations: Mutex::new(VecDeque::new()),
            duration_total_us: AtomicU64::new(0),
            duration_count: AtomicU64::new(0),
        }
    }

    /// Increment the total request count
    pub fn increment_request_count(&self) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment counter for a specific HTTP status code
    pub fn increment_status_count(&self, status_code: u16) {
        if let Ok(mut counts) = self.status_counts.lock() {
            *counts.entry(status_code).or_insert(0) += 1;
        }
    }

    /// Increment counter for an upload operation
    pub fn increment_operation_count(&self, operation: &str) {
        if let Ok(mut counts) = self.operation_counts.lock() {
            *counts.entry(operation.to_string()).or_insert(0) += 1;
        }
    }

    /// Increment counter for a failed upload by error kind
    pub fn increment_upload_error(&self, kind: &str) {
        if kind == "unsupported_media" {
            self.unsupported_media_rejections
                .fetch_add(1, Ordering::Relaxed);
        }
        if let Ok(mut counts) = self.upload_errors.lock() {
            *counts.entry(kind.to_string()).or_insert(0) += 1;
        }
    }

    pub fn increment_active_transforms(&self) {
        self.active_transforms.fetch_add(1, Ordering::Relaxed);
    }

    pub fn decrement_active_transforms(&self) {
        // Saturating so a stray decrement cannot wrap the gauge
        let _ = self
            .active_transforms
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| {
                Some(v.saturating_sub(1))
            });
    }

    pub fn add_bytes_received(&self, bytes: u64) {
        self.bytes_received.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn add_bytes_written(&self, bytes: u64) {
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record a request duration in milliseconds
    pub fn record_duration(&self, duration_ms: f64) {
        let duration_us = (duration_ms * 1000.0) as u64;
        self.duration_total_us
            .fetch_add(duration_us, Ordering::Relaxed);
        self.duration_count.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut durations) = self.durations.lock() {
            if durations.len() == MAX_DURATION_SAMPLES {
                durations.pop_front();
            }
            durations.push_back(duration_us);
        }
    }

    /// Calculate histogram from the retained duration samples
    pub fn get_duration_histogram(&self) -> Histogram {
        match self.durations.lock() {
            Ok(durations) => calculate_histogram(&durations.iter().copied().collect::<Vec<_>>()),
            Err(_) => calculate_histogram(&[]),
        }
    }

    pub fn get_request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }

    pub fn get_status_count(&self, status_code: u16) -> u64 {
        self.status_counts
            .lock()
            .ok()
            .and_then(|counts| counts.get(&status_code).copied())
            .unwrap_or(0)
    }

    pub fn get_operation_count(&self, operation: &str) -> u64 {
        self.operation_counts
            .lock()
            .ok()
            .and_then(|counts| counts.get(operation).copied())
            .unwrap_or(0)
    }

    pub fn get_upload_error_count(&self, kind: &str) -> u64 {
        self.upload_errors
            .lock()
            .ok()
            .and_then(|counts| counts.get(kind).copied())
            .unwrap_or(0)
    }

    pub fn get_unsupported_media_rejections(&self) -> u64 {
        self.unsupported_media_rejections.load(Ordering::Relaxed)
    }

    pub fn get_active_transforms(&self) -> u64 {
        self.active_transforms.load(Ordering::Relaxed)
    }

    pub fn get_bytes_received(&self) -> u64 {
        self.bytes_received.load(Ordering::Relaxed)
    }

    pub fn get_bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::Relaxed)
    }

    pub fn export_prometheus(&self) -> String {
        let mut output = String::new();

        // Request metrics
        output.push_str("# HELP http_requests_total Total number of HTTP requests received\n");
        output.push_str("# TYPE http_requests_total counter\n");
        output.push_str(&format!(
            "http_requests_total {}\n",
            self.request_count.load(Ordering::Relaxed)
        ));

        // Status code metrics
        output.push_str("\n# HELP http_requests_by_status_total HTTP requests by status code\n");
        output.push_str("# TYPE http_requests_by_status_total counter\n");
        if let Ok(counts) = self.status_counts.lock() {
            for (status, count) in counts.iter() {
                output.push_str(&format!(
                    "http_requests_by_status_total{{status=\"{}\"}} {}\n",
                    status, count
                ));
            }
        }

        // Upload metrics
        output.push_str("\n# HELP image_uploads_total Image uploads by operation\n");
        output.push_str("# TYPE image_uploads_total counter\n");
        if let Ok(counts) = self.operation_counts.lock() {
            for (operation, count) in counts.iter() {
                output.push_str(&format!(
                    "image_uploads_total{{operation=\"{}\"}} {}\n",
                    operation, count
                ));
            }
        }

        output.push_str("\n# HELP image_upload_errors_total Failed uploads by error kind\n");
        output.push_str("# TYPE image_upload_errors_total counter\n");
        if let Ok(counts) = self.upload_errors.lock() {
            for (kind, count) in counts.iter() {
                output.push_str(&format!(
                    "image_upload_errors_total{{kind=\"{}\"}} {}\n",
                    kind, count
                ));
            }
        }

        output.push_str(
            "\n# HELP image_unsupported_media_total Uploads rejected for their content type\n",
        );
        output.push_str("# TYPE image_unsupported_media_total counter\n");
        output.push_str(&format!(
            "image_unsupported_media_total {}\n",
            self.unsupported_media_rejections.load(Ordering::Relaxed)
        ));

        output.push_str("\n# HELP image_transforms_active Transforms running on the blocking pool\n");
        output.push_str("# TYPE image_transforms_active gauge\n");
        output.push_str(&format!(
            "image_transforms_active {}\n",
            self.active_transforms.load(Ordering::Relaxed)
        ));

        // Byte counters
        output.push_str("\n# HELP http_request_bytes_total Request body bytes received\n");
        output.push_str("# TYPE http_request_bytes_total counter\n");
        output.push_str(&format!(
            "http_request_bytes_total {}\n",
            self.bytes_received.load(Ordering::Relaxed)
        ));

        output.push_str("\n# HELP image_bytes_written_total Encoded image bytes written to disk\n");
        output.push_str("# TYPE image_bytes_written_total counter\n");
        output.push_str(&format!(
            "image_bytes_written_total {}\n",
            self.bytes_written.load(Ordering::Relaxed)
        ));

        // Duration summary
        let histogram = self.get_duration_histogram();
        output.push_str("\n# HELP http_request_duration_seconds HTTP request latency\n");
        output.push_str("# TYPE http_request_duration_seconds summary\n");
        for (quantile, value) in [
            ("0.5", histogram.p50),
            ("0.9", histogram.p90),
            ("0.95", histogram.p95),
            ("0.99", histogram.p99),
        ] {
            output.push_str(&format!(
                "http_request_duration_seconds{{quantile=\"{}\"}} {:.3}\n",
                quantile,
                value / 1000.0
            ));
        }
        output.push_str(&format!(
            "http_request_duration_seconds_sum {:.6}\n",
            self.duration_total_us.load(Ordering::Relaxed) as f64 / 1_000_000.0
        ));
        output.push_str(&format!(
            "http_request_duration_seconds_count {}\n",
            self.duration_count.load(Ordering::Relaxed)
        ));

        output
    }
}

/// Percentiles in milliseconds from microsecond samples
fn calculate_histogram(samples: &[u64]) -> Histogram {
    if samples.is_empty() {
        return Histogram {
            p50: 0.0,
            p90: 0.0,
            p95: 0.0,
            p99: 0.0,
        };
    }

    let mut sorted: Vec<u64> = samples.to_vec();
    sorted.sort_unstable();

    let at = |q: f64| {
        let idx = (sorted.len() as f64 * q) as usize;
        sorted.get(idx.saturating_sub(1)).copied().unwrap_or(0) as f64 / 1000.0
    };

    Histogram {
        p50: at(0.50),
        p90: at(0.90),
        p95: at(0.95),
        p99: at(0.99),
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
