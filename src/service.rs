//! Capture pipeline orchestration
//!
//! Coordinates the shared browser session, redaction, statistics, and the
//! artifact store for one capture at a time: navigate, read the original
//! content, rewrite the live DOM with redacted markup, then snapshot and
//! screenshot the redacted page. Later stages depend on the DOM state left by
//! earlier ones, so the stages are awaited strictly in order.

use crate::{
    stats, ArtifactStore, BrowserSession, CaptureError, CaptureRequest, CircuitBreaker, Config,
    Dictionary, Metrics, PageGuard, ProfanityAnalyzer, ProfanityStats, Redactor, RetryConfig,
    ValidityChecker,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

/// Result of one successful capture.
#[derive(Debug, Clone)]
pub struct CaptureOutcome {
    pub id: String,
    pub url: String,
    pub stats: ProfanityStats,
    pub duration: Duration,
}

/// Orchestrates the capture pipeline over the shared browser session.
///
/// # Examples
///
/// ```rust,no_run
/// use profanity_capture::{CaptureRequest, CaptureService, Config, Dictionary, Metrics};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = Config::default();
///     let dictionary = Dictionary::load(&config.dictionary_path).await?;
///     let service = CaptureService::new(config, dictionary, Arc::new(Metrics::new())).await?;
///
///     let outcome = service
///         .capture(CaptureRequest::new("https://example.com", "clone"))
///         .await?;
///     println!("{} words, {} profane", outcome.stats.word_count, outcome.stats.profanity_count);
///
///     service.shutdown().await;
///     Ok(())
/// }
/// ```
pub struct CaptureService {
    session: BrowserSession,
    redactor: Redactor,
    analyzer: ProfanityAnalyzer,
    store: Arc<ArtifactStore>,
    checker: ValidityChecker,
    circuit_breaker: CircuitBreaker,
    retry_config: RetryConfig,
    metrics: Arc<Metrics>,
    config: Config,
}

impl CaptureService {
    pub async fn new(
        config: Config,
        dictionary: Dictionary,
        metrics: Arc<Metrics>,
    ) -> Result<Self, CaptureError> {
        let store = Arc::new(ArtifactStore::open(config.storage_root.clone()).await?);
        let session = BrowserSession::launch(config.clone(), metrics.clone()).await?;
        let redactor = Redactor::new(&dictionary);
        let analyzer = ProfanityAnalyzer::new(&dictionary);

        let retry_config = RetryConfig {
            max_attempts: config.retry_attempts.max(1),
            ..Default::default()
        };

        Ok(Self {
            session,
            redactor,
            analyzer,
            store,
            checker: ValidityChecker::default(),
            circuit_breaker: CircuitBreaker::new(5, Duration::from_secs(30)),
            retry_config,
            metrics,
            config,
        })
    }

    pub fn store(&self) -> Arc<ArtifactStore> {
        self.store.clone()
    }

    pub fn metrics(&self) -> Arc<Metrics> {
        self.metrics.clone()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// HEAD-probe `url` and return its status, sentinel 404 on probe failure.
    pub async fn check_validity(&self, url: &str) -> u16 {
        let status = self.checker.check(url).await;
        if !ValidityChecker::is_reachable(status) {
            self.metrics.record_probe_failure();
        }
        status
    }

    /// Run the full pipeline for one request, retrying transient failures
    /// with exponential backoff.
    pub async fn capture(&self, request: CaptureRequest) -> Result<CaptureOutcome, CaptureError> {
        crate::validate_url(&request.url)
            .map_err(|_| CaptureError::InvalidUrl(request.url.clone()))?;

        let mut last_error = CaptureError::BrowserUnavailable;

        for attempt in 0..self.retry_config.max_attempts {
            if !self.circuit_breaker.can_execute() {
                return Err(CaptureError::BrowserUnavailable);
            }

            let started = Instant::now();
            match self.capture_once(&request).await {
                Ok(outcome) => {
                    self.circuit_breaker.record_success();
                    self.metrics.record_capture(outcome.duration, true);
                    return Ok(outcome);
                }
                Err(e) => {
                    self.metrics.record_capture(started.elapsed(), false);

                    if e.is_browser_fatal() {
                        // A single bad capture never takes the shared browser
                        // down, but a dead browser process must be replaced
                        // before anyone retries
                        self.circuit_breaker.record_failure();
                        if let Err(restart_err) = self.session.restart().await {
                            warn!("Browser relaunch failed: {restart_err}");
                        }
                    }

                    if !e.is_retryable() || attempt == self.retry_config.max_attempts - 1 {
                        return Err(e);
                    }

                    let delay = self.retry_delay(attempt);
                    debug!(
                        "Retrying capture of {} after {:?} (attempt {}/{}): {}",
                        request.url,
                        delay,
                        attempt + 1,
                        self.retry_config.max_attempts,
                        e
                    );
                    self.metrics.record_retry();
                    last_error = e;
                    sleep(delay).await;
                }
            }
        }

        Err(last_error)
    }

    /// One attempt: open a page, drive the pipeline under the capture
    /// timeout, and clean up on every exit path — the page is always closed,
    /// and a failed attempt leaves no partial artifacts behind.
    async fn capture_once(&self, request: &CaptureRequest) -> Result<CaptureOutcome, CaptureError> {
        let page = self.session.open_page().await?;

        let result = match timeout(
            self.config.capture_timeout,
            self.run_pipeline(&page, request),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(CaptureError::NavigationTimeout(self.config.capture_timeout)),
        };

        page.close().await;

        if result.is_err() {
            self.store.remove(&request.id).await;
        }

        result
    }

    async fn run_pipeline(
        &self,
        page: &PageGuard,
        request: &CaptureRequest,
    ) -> Result<CaptureOutcome, CaptureError> {
        let started = Instant::now();

        page.navigate(&request.url, self.config.navigation_timeout)
            .await?;

        // Statistics come from the original content, before any masking
        let text = page.extract_text().await?;
        let page_stats = self.analyzer.analyze(&text);

        let markup = page.extract_markup().await?;
        let redacted = self.redactor.redact(&markup);

        // Push the redacted markup back into the live page so the snapshot
        // and screenshot never expose unredacted content
        page.apply_markup(&redacted).await?;

        let snapshot = page.capture_snapshot().await?;
        let screenshot = page.screenshot().await?;

        self.store.save(&request.id, &snapshot, &screenshot).await?;

        let duration = started.elapsed();
        self.metrics
            .record_page_stats(page_stats.word_count, page_stats.profanity_count);
        stats::log_report(&self.config, &page_stats);
        info!(
            "Captured {} as {:?} in {} (substring matches: {})",
            request.url,
            request.id,
            crate::format_duration(duration),
            self.analyzer.substring_count(&text)
        );

        Ok(CaptureOutcome {
            id: request.id.clone(),
            url: request.url.clone(),
            stats: page_stats,
            duration,
        })
    }

    fn retry_delay(&self, attempt: usize) -> Duration {
        let delay = self.retry_config.initial_delay.as_millis() as f64
            * self.retry_config.multiplier.powi(attempt as i32);

        let delay = Duration::from_millis(delay as u64);

        if delay > self.retry_config.max_delay {
            self.retry_config.max_delay
        } else {
            delay
        }
    }

    pub async fn shutdown(&self) {
        info!("Shutting down capture service...");
        self.session.shutdown().await;
        info!("Capture service shutdown complete");
    }
}
