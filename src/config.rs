//! Configuration management with serde serialization/deserialization
//!
//! Settings for the capture service: browser behavior, storage layout,
//! retention policy, and the HTTP surface.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for the capture service
///
/// # Examples
///
/// ```rust
/// use profanity_capture::Config;
///
/// // Use default configuration
/// let config = Config::default();
///
/// // Create custom configuration
/// let config = Config {
///     listen_port: 8080,
///     retention: std::time::Duration::from_secs(60),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Root directory for persisted artifacts (default: `storage/clones`)
    pub storage_root: PathBuf,

    /// Path to the newline-separated prohibited-word list
    /// (default: `storage/dictionary/bad-words`)
    pub dictionary_path: PathBuf,

    /// Port the HTTP surface listens on (default: 3000)
    pub listen_port: u16,

    /// Separator line printed around the console profanity report.
    /// Formatting only, nothing parses it.
    pub log_separator: String,

    /// Age past which stored artifacts are deleted by the sweep
    /// (default: 10 seconds)
    #[serde(with = "duration_secs")]
    pub retention: Duration,

    /// How often the background sweep runs (default: 10 seconds)
    #[serde(with = "duration_secs")]
    pub sweep_interval: Duration,

    /// Timeout for a single page navigation (default: 30 seconds)
    #[serde(with = "duration_secs")]
    pub navigation_timeout: Duration,

    /// Timeout for one full capture pipeline run, navigation included
    /// (default: 60 seconds)
    #[serde(with = "duration_secs")]
    pub capture_timeout: Duration,

    /// Number of attempts for failed captures (default: 3)
    ///
    /// Transient failures like navigation timeouts are retried up to this
    /// limit with exponential backoff delays.
    pub retry_attempts: usize,

    /// Maximum number of pages open concurrently on the shared browser
    /// (default: number of CPUs)
    ///
    /// The browser process is shared; this bounds admission so concurrent
    /// requests cannot exhaust its memory.
    pub max_concurrent_pages: usize,

    /// Probe the URL with a HEAD request before committing to a full render
    /// (default: true)
    pub precheck_validity: bool,

    /// Browser viewport used when rendering pages
    pub viewport: Viewport,

    /// Path to Chrome/Chromium executable (default: auto-detect)
    pub chrome_path: Option<String>,

    /// Custom User-Agent string for requests (default: Chrome default)
    pub user_agent: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from("storage/clones"),
            dictionary_path: PathBuf::from("storage/dictionary/bad-words"),
            listen_port: 3000,
            log_separator: "-".repeat(40),
            retention: Duration::from_secs(10),
            sweep_interval: Duration::from_secs(10),
            navigation_timeout: Duration::from_secs(30),
            capture_timeout: Duration::from_secs(60),
            retry_attempts: 3,
            max_concurrent_pages: num_cpus::get(),
            precheck_validity: true,
            viewport: Viewport::default(),
            chrome_path: None,
            user_agent: None,
        }
    }
}

/// Serialize `Duration` fields as whole seconds in config files.
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}

/// Browser viewport configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Viewport {
    /// Viewport width in pixels (default: 1920)
    pub width: u32,

    /// Viewport height in pixels (default: 1080)
    pub height: u32,

    /// Device pixel ratio for high-DPI displays (default: 1.0)
    pub device_scale_factor: f64,

    /// Whether to emulate a mobile device (default: false)
    pub mobile: bool,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            device_scale_factor: 1.0,
            mobile: false,
        }
    }
}

/// One capture job: a URL to render and the identifier its artifacts are
/// stored under.
///
/// The identifier is used verbatim as the artifact base name; callers are
/// responsible for uniqueness — the store does not deduplicate.
#[derive(Debug, Clone)]
pub struct CaptureRequest {
    pub url: String,
    pub id: String,
}

impl CaptureRequest {
    pub fn new(url: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            id: id.into(),
        }
    }
}

impl Default for CaptureRequest {
    fn default() -> Self {
        Self {
            url: String::new(),
            id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: usize,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

/// Generate Chrome command-line arguments based on configuration
///
/// A single long-lived browser process serves all captures, so unlike a
/// pooled setup there is no per-instance port or profile juggling; one
/// unique user-data dir per process is enough.
pub fn get_chrome_args(config: &Config) -> Vec<String> {
    let mut args = vec![
        "--headless".to_string(),
        "--no-sandbox".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--disable-gpu".to_string(),
        "--disable-background-timer-throttling".to_string(),
        "--disable-backgrounding-occluded-windows".to_string(),
        "--disable-renderer-backgrounding".to_string(),
        "--disable-extensions".to_string(),
        "--disable-default-apps".to_string(),
        "--disable-sync".to_string(),
        "--no-first-run".to_string(),
        "--allow-running-insecure-content".to_string(),
        "--ignore-certificate-errors".to_string(),
        format!(
            "--window-size={},{}",
            config.viewport.width, config.viewport.height
        ),
        format!(
            "--user-data-dir=/tmp/profanity-capture-{}",
            std::process::id()
        ),
    ];

    if let Some(user_agent) = &config.user_agent {
        args.push(format!("--user-agent={user_agent}"));
    }

    args
}

/// Reject configurations that cannot possibly work before launching Chrome.
pub fn validate_config(config: &Config) -> Result<(), crate::CaptureError> {
    use crate::CaptureError::ConfigurationError;

    if config.max_concurrent_pages == 0 {
        return Err(ConfigurationError(
            "max_concurrent_pages must be greater than 0".into(),
        ));
    }

    if config.capture_timeout.as_secs() == 0 {
        return Err(ConfigurationError(
            "capture_timeout must be greater than 0".into(),
        ));
    }

    if config.viewport.width == 0 || config.viewport.height == 0 {
        return Err(ConfigurationError(
            "viewport dimensions must be greater than 0".into(),
        ));
    }

    if config.retention.is_zero() {
        return Err(ConfigurationError(
            "retention must be greater than 0".into(),
        ));
    }

    Ok(())
}

pub fn create_browser_config(config: &Config) -> chromiumoxide::browser::BrowserConfig {
    use chromiumoxide::browser::BrowserConfig;

    let mut builder = BrowserConfig::builder()
        .window_size(config.viewport.width, config.viewport.height)
        .args(get_chrome_args(config));

    if let Some(chrome_path) = &config.chrome_path {
        builder = builder.chrome_executable(chrome_path);
    }

    builder
        .build()
        .unwrap_or_else(|_| BrowserConfig::with_executable("/usr/bin/chromium"))
}
