//! Site strategy table: which selectors to try for which retailer.
//!
//! Adding a site means adding a row, either to [`StrategyTable::builtin`] or to
//! a JSON file loaded with [`StrategyTable::load_overrides`]. There is no
//! per-site control flow anywhere in the pipeline.

use super::ExtractError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Where the price (and optionally the title) renders for one site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteStrategy {
    /// Short key used in logs, e.g. `"amazon"`.
    pub site: String,
    /// Host fragments that select this strategy.
    pub domains: Vec<String>,
    /// Price selectors, most specific first.
    pub selectors: Vec<String>,
    /// Title selectors used to backfill unnamed products.
    #[serde(default)]
    pub title_selectors: Vec<String>,
}

impl SiteStrategy {
    fn new(site: &str, domains: &[&str], selectors: &[&str], title_selectors: &[&str]) -> Self {
        Self {
            site: site.to_string(),
            domains: domains.iter().map(|s| s.to_string()).collect(),
            selectors: selectors.iter().map(|s| s.to_string()).collect(),
            title_selectors: title_selectors.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Whether any of this strategy's fragments matches `host`.
    pub fn matches_host(&self, host: &str) -> bool {
        self.domains.iter().any(|d| fragment_matches(host, d))
    }
}

/// Ordered lookup from host fragment to [`SiteStrategy`]. First match wins.
#[derive(Debug, Clone, Default)]
pub struct StrategyTable {
    entries: Vec<SiteStrategy>,
}

impl StrategyTable {
    /// Empty table. Every URL resolves to `SiteUnsupported`.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The sites supported out of the box.
    pub fn builtin() -> Self {
        Self {
            entries: vec![
                SiteStrategy::new(
                    "amazon",
                    &["amazon"],
                    &[
                        "span.a-price-whole",
                        "#priceblock_ourprice",
                        "#priceblock_dealprice",
                        "span.priceToPay > span.a-offscreen",
                    ],
                    &["#productTitle"],
                ),
                SiteStrategy::new(
                    "flipkart",
                    &["flipkart"],
                    &["div._30jeq3._16Jk6d", "div._30jeq3._1_WHN1"],
                    &["span.B_NuCI", "h1 span.VU-ZEz"],
                ),
            ],
        }
    }

    /// Built-in table with entries from `path` placed in front, so a file
    /// entry can override a built-in site.
    pub fn with_overrides(path: &Path) -> Result<Self> {
        let mut table = Self::builtin();
        table.load_overrides(path)?;
        Ok(table)
    }

    /// Read a JSON array of [`SiteStrategy`] and give it priority over the
    /// current entries.
    pub fn load_overrides(&mut self, path: &Path) -> Result<usize> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read site table: {}", path.display()))?;
        let extra: Vec<SiteStrategy> = serde_json::from_str(&raw)
            .with_context(|| format!("invalid site table: {}", path.display()))?;
        let count = extra.len();
        self.entries.splice(0..0, extra);
        Ok(count)
    }

    /// Append a strategy at the lowest priority.
    pub fn push(&mut self, strategy: SiteStrategy) {
        self.entries.push(strategy);
    }

    pub fn entries(&self) -> &[SiteStrategy] {
        &self.entries
    }

    /// Resolve a product URL to its strategy.
    pub fn resolve(&self, url: &str) -> Result<&SiteStrategy, ExtractError> {
        let host = host_of(url)?;
        self.entries
            .iter()
            .find(|s| s.matches_host(&host))
            .ok_or(ExtractError::SiteUnsupported { domain: host })
    }
}

/// Lowercased host of `url`, without a leading `www.`.
pub fn host_of(url: &str) -> Result<String, ExtractError> {
    let parsed = url::Url::parse(url).map_err(|_| ExtractError::InvalidUrl(url.to_string()))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| ExtractError::InvalidUrl(url.to_string()))?
        .to_ascii_lowercase();
    Ok(host.strip_prefix("www.").map(str::to_string).unwrap_or(host))
}

/// `fragment` matches when it lines up with whole dot-separated labels of
/// `host`: `amazon` matches `smile.amazon.co.uk` but not `notamazon.com`.
fn fragment_matches(host: &str, fragment: &str) -> bool {
    let fragment = fragment.trim_matches('.').to_ascii_lowercase();
    if fragment.is_empty() {
        return false;
    }
    host == fragment
        || host.starts_with(&format!("{fragment}."))
        || host.ends_with(&format!(".{fragment}"))
        || host.contains(&format!(".{fragment}."))
}
