//! Two-tier price extraction.
//!
//! Tier 1 fetches the page over HTTP and runs the strategy's selectors against
//! the static HTML. Only when that yields nothing does tier 2 open a headless
//! browser and wait for each selector in turn. The first selector (in strategy
//! order) that produces a parseable price wins.

use super::normalize::{element_text, parse_price};
use super::{ExtractError, Extraction, SiteStrategy, Tier};
use crate::acquisition::http_client::HttpClient;
use crate::config::Config;
use crate::renderer::{RenderError, RenderSession, Renderer};
use rust_decimal::Decimal;
use scraper::{Html, Selector};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Result of scanning a static HTML document.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct StaticScan {
    /// First `(selector, price)` that parsed.
    pub hit: Option<(String, Decimal)>,
    pub title: Option<String>,
}

/// Extracts a price for a URL using a [`SiteStrategy`].
pub struct PriceExtractor {
    http: HttpClient,
    renderer: Arc<dyn Renderer>,
    navigation_timeout: Duration,
    selector_timeout: Duration,
}

impl PriceExtractor {
    pub fn new(
        http: HttpClient,
        renderer: Arc<dyn Renderer>,
        navigation_timeout: Duration,
        selector_timeout: Duration,
    ) -> Self {
        Self {
            http,
            renderer,
            navigation_timeout,
            selector_timeout,
        }
    }

    pub fn from_config(config: &Config, renderer: Arc<dyn Renderer>) -> Self {
        Self::new(
            HttpClient::new(&config.user_agent, config.http_timeout),
            renderer,
            config.navigation_timeout,
            config.selector_timeout,
        )
    }

    /// Extract the current price of the product at `url`.
    pub async fn extract(
        &self,
        url: &str,
        strategy: &SiteStrategy,
    ) -> Result<Extraction, ExtractError> {
        let mut title = None;

        match self.http.get(url).await {
            Ok(resp) if resp.is_success() => {
                let scan = scan_static(&resp.body, strategy);
                if let Some((selector, price)) = scan.hit {
                    info!("price {price} via static fetch ({} `{selector}`)", strategy.site);
                    return Ok(Extraction {
                        price,
                        selector,
                        tier: Tier::Static,
                        title: scan.title,
                    });
                }
                debug!(
                    "static page {} had no parseable price, trying renderer",
                    resp.final_url
                );
                title = scan.title;
            }
            Ok(resp) => debug!(
                "static fetch of {url} returned HTTP {}, trying renderer",
                resp.status
            ),
            Err(e) => debug!("static fetch of {url} failed: {e}, trying renderer"),
        }

        let (selector, price) = self.extract_rendered(url, &strategy.selectors).await?;
        info!("price {price} via renderer ({} `{selector}`)", strategy.site);
        Ok(Extraction {
            price,
            selector,
            tier: Tier::Rendered,
            title,
        })
    }

    /// Run the rendered tier inside one browser session. The session is closed
    /// on every path out once it has been opened.
    async fn extract_rendered(
        &self,
        url: &str,
        selectors: &[String],
    ) -> Result<(String, Decimal), ExtractError> {
        let mut session = match self.renderer.open().await {
            Ok(session) => session,
            Err(RenderError::Environment(msg)) => return Err(ExtractError::Environment(msg)),
            Err(RenderError::Disabled) => {
                debug!("rendering disabled, no rendered fallback for {url}");
                return Err(ExtractError::ExtractionFailed);
            }
            Err(e) => {
                warn!("could not start render session for {url}: {e}");
                return Err(ExtractError::ExtractionFailed);
            }
        };

        let outcome = scan_rendered(
            session.as_mut(),
            url,
            selectors,
            self.navigation_timeout,
            self.selector_timeout,
        )
        .await;

        session.close().await;
        outcome
    }
}

/// Try each selector against the rendered page in order.
async fn scan_rendered(
    session: &mut dyn RenderSession,
    url: &str,
    selectors: &[String],
    navigation_timeout: Duration,
    selector_timeout: Duration,
) -> Result<(String, Decimal), ExtractError> {
    if let Err(e) = session.navigate(url, navigation_timeout).await {
        warn!("rendered fetch of {url} failed: {e}");
        return Err(ExtractError::ExtractionFailed);
    }

    for selector in selectors {
        match session.wait_for_text(selector, selector_timeout).await {
            Ok(Some(text)) => match parse_price(&text) {
                Some(price) => return Ok((selector.clone(), price)),
                None => debug!("`{selector}` rendered unparseable text {text:?}"),
            },
            Ok(None) => debug!(
                "`{selector}` did not appear within {}ms",
                selector_timeout.as_millis()
            ),
            Err(e) => debug!("`{selector}` query failed: {e}"),
        }
    }

    Err(ExtractError::ExtractionFailed)
}

/// Run a strategy's selectors against static HTML.
///
/// For each selector in order, the first matching element's text is
/// normalized; the first selector giving a price is the hit. Selectors that
/// are not valid CSS are skipped.
pub fn scan_static(html: &str, strategy: &SiteStrategy) -> StaticScan {
    let document = Html::parse_document(html);

    let hit = strategy.selectors.iter().find_map(|selector_str| {
        let sel = parse_selector(selector_str)?;
        let el = document.select(&sel).next()?;
        let text = element_text(&el);
        match parse_price(&text) {
            Some(price) => Some((selector_str.clone(), price)),
            None => {
                debug!("`{selector_str}` matched unparseable text {text:?}");
                None
            }
        }
    });

    StaticScan {
        hit,
        title: extract_title(&document, &strategy.title_selectors),
    }
}

/// Product title from the strategy's selectors, then `og:title`, then `<title>`.
fn extract_title(document: &Html, title_selectors: &[String]) -> Option<String> {
    let from_selectors = title_selectors.iter().find_map(|s| {
        let sel = parse_selector(s)?;
        let el = document.select(&sel).next()?;
        Some(element_text(&el))
    });

    let og_title = || {
        let sel = Selector::parse(r#"meta[property="og:title"]"#).ok()?;
        let el = document.select(&sel).next()?;
        el.value().attr("content").map(|c| c.trim().to_string())
    };

    let title_tag = || {
        let sel = Selector::parse("title").ok()?;
        let el = document.select(&sel).next()?;
        Some(element_text(&el))
    };

    from_selectors
        .filter(|t| !t.is_empty())
        .or_else(|| og_title().filter(|t| !t.is_empty()))
        .or_else(|| title_tag().filter(|t| !t.is_empty()))
}

fn parse_selector(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(sel) => Some(sel),
        Err(e) => {
            warn!("skipping invalid selector `{selector}`: {e:?}");
            None
        }
    }
}
