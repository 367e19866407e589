//! Chromium-based renderer using chromiumoxide.

use super::{RenderError, RenderSession, Renderer};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

/// Delay between DOM polls while waiting for a selector.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Find the Chromium binary path.
pub fn find_chromium() -> Option<PathBuf> {
    // 1. PRICEWATCH_CHROMIUM_PATH env
    if let Ok(p) = std::env::var("PRICEWATCH_CHROMIUM_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. System PATH
    for name in [
        "google-chrome",
        "google-chrome-stable",
        "chromium",
        "chromium-browser",
    ] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    // 3. Common macOS locations
    if cfg!(target_os = "macos") {
        let common =
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// Launches one headless Chromium per session.
pub struct ChromiumRenderer {
    chrome_path: PathBuf,
    user_agent: String,
}

impl ChromiumRenderer {
    /// Locate a browser executable. Fails when none is installed, which is an
    /// environment problem rather than a page problem.
    pub fn new(explicit: Option<PathBuf>, user_agent: &str) -> Result<Self, RenderError> {
        let chrome_path = explicit
            .filter(|p| p.exists())
            .or_else(find_chromium)
            .ok_or_else(|| {
                RenderError::Environment(
                    "Chromium not found. Install Chrome/Chromium or set PRICEWATCH_CHROMIUM_PATH."
                        .to_string(),
                )
            })?;
        Ok(Self {
            chrome_path,
            user_agent: user_agent.to_string(),
        })
    }

    pub fn chrome_path(&self) -> &PathBuf {
        &self.chrome_path
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn open(&self) -> Result<Box<dyn RenderSession>, RenderError> {
        let config = BrowserConfig::builder()
            .chrome_executable(&self.chrome_path)
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-background-networking")
            .arg(format!("--user-agent={}", self.user_agent))
            .build()
            .map_err(|e| RenderError::Environment(format!("failed to build browser config: {e}")))?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| RenderError::Environment(format!("failed to launch Chromium: {e}")))?;

        // Drive the CDP connection for the lifetime of the session.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let _ = browser.close().await;
                let _ = browser.wait().await;
                handler_task.abort();
                return Err(RenderError::Environment(format!(
                    "failed to create page: {e}"
                )));
            }
        };

        Ok(Box::new(ChromiumSession {
            browser,
            page,
            handler_task,
        }))
    }
}

/// A running browser plus the page being rendered.
pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
}

#[async_trait]
impl RenderSession for ChromiumSession {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), RenderError> {
        let load = async {
            self.page.goto(url).await?;
            self.page.wait_for_navigation().await?;
            Ok::<_, chromiumoxide::error::CdpError>(())
        };

        match tokio::time::timeout(timeout, load).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(RenderError::Navigation(e.to_string())),
            Err(_) => Err(RenderError::Navigation(format!(
                "timed out after {}ms",
                timeout.as_millis()
            ))),
        }
    }

    async fn wait_for_text(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Option<String>, RenderError> {
        let deadline = Instant::now() + timeout;
        loop {
            // A missing element is reported as an error by CDP; keep polling.
            if let Ok(element) = self.page.find_element(selector).await {
                let text = element
                    .inner_text()
                    .await
                    .map_err(|e| RenderError::Page(e.to_string()))?;
                return Ok(Some(text.unwrap_or_default()));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn close(self: Box<Self>) {
        let ChromiumSession {
            mut browser,
            page,
            handler_task,
        } = *self;
        let _ = page.close().await;
        if let Err(e) = browser.close().await {
            tracing::debug!("browser close failed: {e}");
        }
        let _ = browser.wait().await;
        handler_task.abort();
    }
}
