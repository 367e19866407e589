//! Price extraction: site strategies, normalization, and the two-tier fetch.

pub mod extractor;
pub mod normalize;
pub mod strategy;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub use extractor::PriceExtractor;
pub use normalize::parse_price;
pub use strategy::{SiteStrategy, StrategyTable};

/// Which fetch produced a price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Plain HTTP GET + HTML parse.
    Static,
    /// Headless browser.
    Rendered,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Static => write!(f, "static"),
            Tier::Rendered => write!(f, "rendered"),
        }
    }
}

/// A successfully extracted price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    pub price: Decimal,
    /// The selector that produced the price.
    pub selector: String,
    pub tier: Tier,
    /// Page title, when the static page had one.
    pub title: Option<String>,
}

/// Why no price was obtained for a product this cycle.
///
/// None of these abort a check cycle; they decide how loudly the skip is
/// reported.
#[derive(thiserror::Error, Debug)]
pub enum ExtractError {
    #[error("unsupported website: {domain}")]
    SiteUnsupported { domain: String },

    #[error("invalid product URL: {0}")]
    InvalidUrl(String),

    /// Both tiers ran and no selector produced a price.
    #[error("could not find a price on the page")]
    ExtractionFailed,

    /// The rendering engine could not start.
    #[error("rendering environment unavailable: {0}")]
    Environment(String),
}

impl ExtractError {
    /// Failures an operator needs to fix, as opposed to site variance.
    pub fn is_environment(&self) -> bool {
        matches!(self, ExtractError::Environment(_))
    }
}
