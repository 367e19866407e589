//! Core records shared across the pipeline.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Row id of a registered product.
pub type ProductId = i64;

/// A product registered for monitoring. Identity is the URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub url: String,
    /// Optional display name; may be backfilled from the page title.
    pub name: Option<String>,
    /// Alert when the observed price is at or below this.
    pub threshold: Decimal,
}

impl Product {
    /// Name for messages: the display name, or the URL when unnamed.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.url)
    }
}

/// A single recorded price. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub id: i64,
    pub product_id: ProductId,
    pub price: Decimal,
    pub observed_at: DateTime<Utc>,
}
