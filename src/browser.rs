//! Shared headless-browser session and per-request pages
//!
//! One Chrome process is launched at startup and reused for the process
//! lifetime; each capture opens its own isolated page so concurrent requests
//! never interleave DOM state. A semaphore bounds how many pages are open at
//! once, since they all share the browser's memory and CPU.

use crate::{create_browser_config, CaptureError, Config, Metrics};
use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, CaptureSnapshotParams,
};
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

struct SessionInner {
    browser: Browser,
    handler: tokio::task::JoinHandle<Result<(), chromiumoxide::error::CdpError>>,
}

/// Long-lived browser session shared by all captures.
///
/// Expensive to start, cheap to reuse. If the Chrome process or its CDP
/// handler dies, the next page acquisition relaunches it; individual capture
/// failures never take the session down.
pub struct BrowserSession {
    inner: Arc<Mutex<SessionInner>>,
    page_permits: Arc<Semaphore>,
    config: Config,
    metrics: Arc<Metrics>,
}

impl BrowserSession {
    /// Launch the shared Chrome process and start polling its CDP event
    /// stream on a background task.
    pub async fn launch(config: Config, metrics: Arc<Metrics>) -> Result<Self, CaptureError> {
        let inner = Self::spawn_browser(&config).await?;
        info!("Browser session launched");

        Ok(Self {
            inner: Arc::new(Mutex::new(inner)),
            page_permits: Arc::new(Semaphore::new(config.max_concurrent_pages)),
            config,
            metrics,
        })
    }

    async fn spawn_browser(config: &Config) -> Result<SessionInner, CaptureError> {
        let (browser, mut handler) = Browser::launch(create_browser_config(config))
            .await
            .map_err(|e| CaptureError::BrowserLaunchFailed(e.to_string()))?;

        // The handler implements Stream and must be polled for the CDP
        // connection to make progress
        let handler_task = tokio::spawn(async move {
            loop {
                match handler.next().await {
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        error!("Browser handler error: {}", e);
                        return Err(e);
                    }
                    None => {
                        info!("Browser handler stream ended");
                        break;
                    }
                }
            }
            Ok(())
        });

        Ok(SessionInner {
            browser,
            handler: handler_task,
        })
    }

    /// Open an isolated page for one capture.
    ///
    /// Blocks while the concurrent-page limit is reached. Relaunches the
    /// browser first if its handler has died since the last capture.
    pub async fn open_page(&self) -> Result<PageGuard, CaptureError> {
        let permit = self
            .page_permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| CaptureError::SemaphoreError(e.to_string()))?;

        let mut inner = self.inner.lock().await;

        if inner.handler.is_finished() {
            warn!("Browser handler dead, relaunching browser");
            self.restart_locked(&mut inner).await?;
        }

        let page = inner
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| CaptureError::BrowserProcessDied(e.to_string()))?;

        let viewport = &self.config.viewport;
        let emulation = SetDeviceMetricsOverrideParams::builder()
            .width(viewport.width)
            .height(viewport.height)
            .device_scale_factor(viewport.device_scale_factor)
            .mobile(viewport.mobile)
            .build()
            .map_err(CaptureError::PageError)?;

        page.execute(emulation)
            .await
            .map_err(|e| CaptureError::PageError(e.to_string()))?;

        Ok(PageGuard {
            page,
            _permit: permit,
        })
    }

    /// Tear down and relaunch the shared browser. Used when a capture hits a
    /// browser-fatal error.
    pub async fn restart(&self) -> Result<(), CaptureError> {
        let mut inner = self.inner.lock().await;
        self.restart_locked(&mut inner).await
    }

    async fn restart_locked(&self, inner: &mut SessionInner) -> Result<(), CaptureError> {
        let _ = inner.browser.close().await;
        inner.handler.abort();

        *inner = Self::spawn_browser(&self.config).await?;
        self.metrics.record_browser_restart();
        info!("Browser session relaunched");
        Ok(())
    }

    pub async fn shutdown(&self) {
        info!("Shutting down browser session...");
        let mut inner = self.inner.lock().await;
        let _ = inner.browser.close().await;
        inner.handler.abort();
        info!("Browser session shutdown complete");
    }
}

/// One isolated page, held for the duration of a single capture.
///
/// The permit keeps the concurrent-page bound honest for as long as the page
/// is open; [`close`](Self::close) must run on every exit path.
pub struct PageGuard {
    page: Page,
    _permit: OwnedSemaphorePermit,
}

impl PageGuard {
    /// Load `url`, waiting for the page's load signal or the timeout.
    pub async fn navigate(&self, url: &str, limit: Duration) -> Result<(), CaptureError> {
        let navigation = async {
            self.page.goto(url).await.map_err(|e| CaptureError::NavigationFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
            self.page
                .wait_for_navigation()
                .await
                .map_err(|e| CaptureError::NavigationFailed {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?;
            Ok(())
        };

        match timeout(limit, navigation).await {
            Ok(result) => result,
            Err(_) => Err(CaptureError::NavigationTimeout(limit)),
        }
    }

    /// The rendered document's visible text, punctuation stripped and
    /// whitespace runs collapsed to single spaces, ready for tokenization.
    pub async fn extract_text(&self) -> Result<String, CaptureError> {
        let raw: String = self
            .page
            .evaluate("document.body.innerText")
            .await
            .map_err(|e| CaptureError::PageError(e.to_string()))?
            .into_value()
            .map_err(|e| CaptureError::PageError(e.to_string()))?;

        let stripped: String = raw
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || c == '_' || c.is_whitespace() {
                    c
                } else {
                    ' '
                }
            })
            .collect();

        Ok(stripped.split_whitespace().collect::<Vec<_>>().join(" "))
    }

    /// Serialized markup of the document body (innerHTML-equivalent).
    pub async fn extract_markup(&self) -> Result<String, CaptureError> {
        self.page
            .evaluate("document.body.innerHTML")
            .await
            .map_err(|e| CaptureError::PageError(e.to_string()))?
            .into_value()
            .map_err(|e| CaptureError::PageError(e.to_string()))
    }

    /// Replace the live document body with `markup`, so the subsequent
    /// snapshot and screenshot show the redacted page.
    pub async fn apply_markup(&self, markup: &str) -> Result<(), CaptureError> {
        // Encode the markup as a JS string literal; JSON is a subset of JS
        let literal = serde_json::to_string(markup)?;
        self.page
            .evaluate(format!("document.body.innerHTML = {literal}"))
            .await
            .map_err(|e| CaptureError::PageError(e.to_string()))?;

        Ok(())
    }

    /// Self-contained MHTML snapshot of the fully rendered page, captured
    /// over the CDP snapshot protocol. Unlike raw HTML serialization this
    /// keeps the resources needed for faithful offline replay.
    pub async fn capture_snapshot(&self) -> Result<String, CaptureError> {
        let response = self
            .page
            .execute(CaptureSnapshotParams::default())
            .await
            .map_err(|e| CaptureError::SnapshotFailed(e.to_string()))?;

        Ok(response.result.data)
    }

    /// Full-page PNG screenshot.
    pub async fn screenshot(&self) -> Result<Vec<u8>, CaptureError> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build();

        self.page
            .screenshot(params)
            .await
            .map_err(|e| CaptureError::ScreenshotFailed(e.to_string()))
    }

    /// Release the page and its concurrency permit.
    pub async fn close(self) {
        if let Err(e) = self.page.close().await {
            debug!("Page close failed (browser may already be gone): {}", e);
        }
    }
}
