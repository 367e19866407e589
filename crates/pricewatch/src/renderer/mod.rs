//! Renderer abstraction for browser-based page rendering.
//!
//! Defines the `Renderer` and `RenderSession` traits that abstract over
//! the browser engine (currently Chromium via chromiumoxide). A session owns
//! a running browser and must be closed with [`RenderSession::close`].

pub mod chromium;

use async_trait::async_trait;
use std::time::Duration;

/// Failures from the rendering tier.
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    /// The browser could not be started. Fixable by the operator.
    #[error("browser unavailable: {0}")]
    Environment(String),

    /// The page could not be loaded.
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// The page loaded but a DOM query failed.
    #[error("page error: {0}")]
    Page(String),

    /// Rendering was turned off by configuration.
    #[error("browser rendering is disabled")]
    Disabled,
}

/// A browser engine that can start rendering sessions.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Start a fresh browser session.
    async fn open(&self) -> Result<Box<dyn RenderSession>, RenderError>;
}

/// A single headless browser session.
#[async_trait]
pub trait RenderSession: Send {
    /// Navigate to a URL, giving up after `timeout`.
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), RenderError>;

    /// Wait up to `timeout` for `selector` to appear and return its text.
    ///
    /// `Ok(None)` means the element never appeared within the timeout.
    async fn wait_for_text(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Option<String>, RenderError>;

    /// Shut the session down and release the browser.
    async fn close(self: Box<Self>);
}

/// A renderer used when browser rendering is disabled.
///
/// Static extraction works without a browser; the rendered tier is simply
/// skipped.
pub struct NoopRenderer;

#[async_trait]
impl Renderer for NoopRenderer {
    async fn open(&self) -> Result<Box<dyn RenderSession>, RenderError> {
        Err(RenderError::Disabled)
    }
}

/// Stands in for a browser that could not be found; every rendered fetch
/// is an environment failure.
pub struct UnavailableRenderer {
    reason: String,
}

impl UnavailableRenderer {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl Renderer for UnavailableRenderer {
    async fn open(&self) -> Result<Box<dyn RenderSession>, RenderError> {
        Err(RenderError::Environment(self.reason.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_renderer_is_disabled() {
        let err = NoopRenderer.open().await.err().expect("noop must fail");
        assert!(matches!(err, RenderError::Disabled));
    }

    #[tokio::test]
    async fn test_unavailable_renderer_is_environment_failure() {
        let err = UnavailableRenderer::new("Chromium not found")
            .open()
            .await
            .err()
            .expect("must fail");
        assert!(matches!(err, RenderError::Environment(ref m) if m == "Chromium not found"));
    }
}
