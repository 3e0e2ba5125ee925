use std::time::Duration;
use thiserror::Error;
use tokio::sync::AcquireError;

#[derive(Debug, Clone, Error)]
pub enum CaptureError {
    #[error("Dictionary unavailable: {0}")]
    DictionaryUnavailable(String),

    #[error("Browser instance unavailable")]
    BrowserUnavailable,

    #[error("Browser launch failed: {0}")]
    BrowserLaunchFailed(String),

    #[error("Browser process died: {0}")]
    BrowserProcessDied(String),

    #[error("Navigation failed for {url}: {reason}")]
    NavigationFailed { url: String, reason: String },

    #[error("Navigation timed out after {0:?}")]
    NavigationTimeout(Duration),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Page error: {0}")]
    PageError(String),

    #[error("Snapshot capture failed: {0}")]
    SnapshotFailed(String),

    #[error("Screenshot capture failed: {0}")]
    ScreenshotFailed(String),

    #[error("Artifact not found: {0}")]
    ArtifactNotFound(String),

    #[error("Capture IO error: {0}")]
    CaptureIo(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Semaphore acquire error: {0}")]
    SemaphoreError(String),
}

impl CaptureError {
    /// Transient failures worth another attempt against the shared browser.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CaptureError::BrowserUnavailable
                | CaptureError::BrowserProcessDied(_)
                | CaptureError::NavigationFailed { .. }
                | CaptureError::NavigationTimeout(_)
                | CaptureError::PageError(_)
        )
    }

    /// Failures that poison the shared browser process itself, as opposed to
    /// a single page. These trigger a supervised relaunch.
    pub fn is_browser_fatal(&self) -> bool {
        matches!(
            self,
            CaptureError::BrowserUnavailable
                | CaptureError::BrowserProcessDied(_)
                | CaptureError::BrowserLaunchFailed(_)
        )
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CaptureError::InvalidUrl(_) => ErrorSeverity::Low,
            CaptureError::ArtifactNotFound(_) => ErrorSeverity::Low,
            CaptureError::DictionaryUnavailable(_) => ErrorSeverity::Critical,
            CaptureError::ConfigurationError(_) => ErrorSeverity::High,
            CaptureError::BrowserLaunchFailed(_) => ErrorSeverity::High,
            _ => ErrorSeverity::Medium,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// Trips after repeated browser-level failures so a struggling Chrome process
/// gets a recovery window instead of a stampede of doomed captures.
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    state: std::sync::Arc<std::sync::Mutex<CircuitState>>,
    failure_threshold: usize,
    recovery_timeout: Duration,
    failure_count: std::sync::Arc<std::sync::atomic::AtomicUsize>,
    last_failure_time: std::sync::Arc<std::sync::Mutex<Option<std::time::Instant>>>,
}

#[derive(Debug, Clone, Copy)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: usize, recovery_timeout: Duration) -> Self {
        Self {
            state: std::sync::Arc::new(std::sync::Mutex::new(CircuitState::Closed)),
            failure_threshold,
            recovery_timeout,
            failure_count: std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0)),
            last_failure_time: std::sync::Arc::new(std::sync::Mutex::new(None)),
        }
    }

    pub fn can_execute(&self) -> bool {
        let state = *self.state.lock().unwrap();
        match state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                if let Some(last_failure) = *self.last_failure_time.lock().unwrap() {
                    if last_failure.elapsed() > self.recovery_timeout {
                        *self.state.lock().unwrap() = CircuitState::HalfOpen;
                        true
                    } else {
                        false
                    }
                } else {
                    false
                }
            }
            CircuitState::HalfOpen => true,
        }
    }

    pub fn record_success(&self) {
        self.failure_count
            .store(0, std::sync::atomic::Ordering::Relaxed);
        *self.state.lock().unwrap() = CircuitState::Closed;
        *self.last_failure_time.lock().unwrap() = None;
    }

    pub fn record_failure(&self) {
        let failures = self
            .failure_count
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed)
            + 1;
        *self.last_failure_time.lock().unwrap() = Some(std::time::Instant::now());

        if failures >= self.failure_threshold {
            *self.state.lock().unwrap() = CircuitState::Open;
        }
    }

    pub fn get_state(&self) -> CircuitState {
        *self.state.lock().unwrap()
    }

    pub fn get_failure_count(&self) -> usize {
        self.failure_count
            .load(std::sync::atomic::Ordering::Relaxed)
    }
}

impl From<AcquireError> for CaptureError {
    fn from(err: AcquireError) -> Self {
        CaptureError::SemaphoreError(err.to_string())
    }
}

impl From<std::io::Error> for CaptureError {
    fn from(err: std::io::Error) -> Self {
        CaptureError::CaptureIo(err.to_string())
    }
}

impl From<serde_json::Error> for CaptureError {
    fn from(err: serde_json::Error) -> Self {
        CaptureError::SerializationError(err.to_string())
    }
}
