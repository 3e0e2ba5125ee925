//! Lightweight URL reachability probe
//!
//! A HEAD request (no body transfer) against the candidate URL before
//! committing to a full render. Network failures, malformed URLs, and
//! timeouts all collapse into the sentinel not-found code, so the result is
//! only a proceed/do-not-proceed signal, not a trustworthy HTTP status.

use std::time::Duration;
use tracing::debug;

/// Status returned when the probe itself fails.
pub const SENTINEL_NOT_FOUND: u16 = 404;

/// Reachability checker with a shared HTTP client.
#[derive(Debug, Clone)]
pub struct ValidityChecker {
    client: reqwest::Client,
}

impl ValidityChecker {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self { client }
    }

    /// Probe `url` with a HEAD request and return the remote status code,
    /// or [`SENTINEL_NOT_FOUND`] if the probe fails for any reason.
    pub async fn check(&self, url: &str) -> u16 {
        match self.client.head(url).send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                debug!("Validity probe for {url}: {status}");
                status
            }
            Err(e) => {
                debug!("Validity probe for {url} failed: {e}");
                SENTINEL_NOT_FOUND
            }
        }
    }

    /// Whether a probe result means a full render is worth attempting.
    pub fn is_reachable(status: u16) -> bool {
        status < 400
    }
}

impl Default for ValidityChecker {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_host_yields_sentinel_not_error() {
        let checker = ValidityChecker::new(Duration::from_millis(500));
        // Reserved TLD, guaranteed unresolvable
        let status = checker.check("http://unreachable.invalid/").await;
        assert_eq!(status, SENTINEL_NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_url_yields_sentinel() {
        let checker = ValidityChecker::default();
        assert_eq!(checker.check("not a url").await, SENTINEL_NOT_FOUND);
    }

    #[test]
    fn reachability_threshold() {
        assert!(ValidityChecker::is_reachable(200));
        assert!(ValidityChecker::is_reachable(301));
        assert!(!ValidityChecker::is_reachable(404));
        assert!(!ValidityChecker::is_reachable(500));
    }
}
