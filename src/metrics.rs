use metrics::{Counter, Gauge, Histogram};
use std::time::{Duration, Instant};
use tracing::info;

/// Counter and gauge handles for the capture service.
///
/// Handles start as no-ops; numbers only flow somewhere once the Prometheus
/// recorder is installed via [`install_prometheus_recorder`].
pub struct Metrics {
    pub captures_taken: Counter,
    pub captures_failed: Counter,
    pub capture_duration: Histogram,
    pub words_counted: Counter,
    pub profanities_found: Counter,
    pub artifacts_swept: Counter,
    pub browser_restarts: Counter,
    pub probe_failures: Counter,
    pub retry_count: Counter,
    pub active_captures: Gauge,
    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            captures_taken: Counter::noop(),
            captures_failed: Counter::noop(),
            capture_duration: Histogram::noop(),
            words_counted: Counter::noop(),
            profanities_found: Counter::noop(),
            artifacts_swept: Counter::noop(),
            browser_restarts: Counter::noop(),
            probe_failures: Counter::noop(),
            retry_count: Counter::noop(),
            active_captures: Gauge::noop(),
            start_time: Instant::now(),
        }
    }

    pub fn record_capture(&self, duration: Duration, success: bool) {
        if success {
            self.captures_taken.increment(1);
        } else {
            self.captures_failed.increment(1);
        }

        self.capture_duration.record(duration.as_secs_f64());
    }

    pub fn record_page_stats(&self, word_count: usize, profanity_count: usize) {
        self.words_counted.increment(word_count as u64);
        self.profanities_found.increment(profanity_count as u64);
    }

    pub fn record_sweep(&self, deleted: usize) {
        if deleted > 0 {
            self.artifacts_swept.increment(deleted as u64);
        }
    }

    pub fn record_browser_restart(&self) {
        self.browser_restarts.increment(1);
    }

    pub fn record_probe_failure(&self) {
        self.probe_failures.increment(1);
    }

    pub fn record_retry(&self) {
        self.retry_count.increment(1);
    }

    pub fn set_active_captures(&self, count: usize) {
        self.active_captures.set(count as f64);
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Install the Prometheus recorder as the global metrics sink.
pub fn install_prometheus_recorder() -> Result<(), Box<dyn std::error::Error>> {
    let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();

    metrics::set_boxed_recorder(Box::new(recorder))?;
    info!("Prometheus metrics recorder installed");

    Ok(())
}
