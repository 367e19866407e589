//! Price normalization: raw element text to a decimal price.

use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::OnceLock;

/// Digits with optional `,` thousands separators and an optional fraction.
fn price_regex() -> &'static Regex {
    static PRICE_RE: OnceLock<Regex> = OnceLock::new();
    PRICE_RE.get_or_init(|| Regex::new(r"\d[\d,]*(?:\.\d+)?").expect("price regex is valid"))
}

/// Parse the first number in `text` as a price.
///
/// Currency glyphs, whitespace and surrounding marketing copy are ignored:
/// `"₹1,234.50 approx"` gives `1234.50`. Returns `None` when the text has no
/// digits or the number does not fit a [`Decimal`]. The result is never negative
/// since a leading minus sign is not part of the match.
pub fn parse_price(text: &str) -> Option<Decimal> {
    let mat = price_regex().find(text)?;
    let digits: String = mat.as_str().chars().filter(|c| *c != ',').collect();
    Decimal::from_str(&digits).ok()
}

/// Collapse an element's text nodes into single-spaced text.
pub(crate) fn element_text(el: &scraper::ElementRef<'_>) -> String {
    el.text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
