//! Price history report: every observation per product plus overall change.

use crate::temporal::store::{PriceHistory, ProductStore, StoreResult};
use crate::temporal::watch::percent_change;
use crate::types::{PriceObservation, Product};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt::Write;

/// Change from the first to the last observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PriceChange {
    Percent {
        first: Decimal,
        last: Decimal,
        percent: Decimal,
    },
    /// The first price was zero, so no percentage exists.
    ZeroBaseline { last: Decimal },
    /// The percentage is too large to represent.
    Unavailable { first: Decimal, last: Decimal },
}

/// History for one product.
#[derive(Debug, Clone, Serialize)]
pub struct ProductHistory {
    pub product: Product,
    pub observations: Vec<PriceObservation>,
    /// `None` when there are no observations yet.
    pub change: Option<PriceChange>,
}

/// Summarise a product's observations, given oldest first.
pub fn summarize(product: Product, observations: Vec<PriceObservation>) -> ProductHistory {
    let change = match (observations.first(), observations.last()) {
        (Some(first), Some(last)) if first.price.is_zero() => {
            Some(PriceChange::ZeroBaseline { last: last.price })
        }
        (Some(first), Some(last)) => Some(match percent_change(first.price, last.price) {
            Some(percent) => PriceChange::Percent {
                first: first.price,
                last: last.price,
                percent,
            },
            None => PriceChange::Unavailable {
                first: first.price,
                last: last.price,
            },
        }),
        _ => None,
    };
    ProductHistory {
        product,
        observations,
        change,
    }
}

/// Build the history of every registered product.
pub fn build<S>(store: &S) -> StoreResult<Vec<ProductHistory>>
where
    S: ProductStore + PriceHistory + ?Sized,
{
    store
        .list_products()?
        .into_iter()
        .map(|product| -> StoreResult<ProductHistory> {
            let observations = store.all_observations(product.id)?;
            Ok(summarize(product, observations))
        })
        .collect()
}

/// Human-readable rendering. Products without observations are omitted.
pub fn render_text(histories: &[ProductHistory], currency: &str) -> String {
    let mut out = String::new();
    for history in histories.iter().filter(|h| !h.observations.is_empty()) {
        let _ = writeln!(out, "\n--- Price History for {} ---", history.product.label());
        for obs in &history.observations {
            let _ = writeln!(
                out,
                "  {}  {currency}{}",
                obs.observed_at.format("%Y-%m-%d %H:%M:%S"),
                obs.price
            );
        }
        match &history.change {
            Some(PriceChange::Percent {
                first,
                last,
                percent,
            }) => {
                let sign = if percent.is_sign_negative() { "" } else { "+" };
                let _ = writeln!(
                    out,
                    "\nOverall Change: {sign}{percent:.2}% (From {currency}{first} to {currency}{last})"
                );
            }
            Some(PriceChange::ZeroBaseline { last }) => {
                let _ = writeln!(
                    out,
                    "\nInitial price was zero. Current price: {currency}{last}"
                );
            }
            Some(PriceChange::Unavailable { first, last }) => {
                let _ = writeln!(
                    out,
                    "\nOverall Change: too large to show (From {currency}{first} to {currency}{last})"
                );
            }
            None => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal::store::{AddOutcome, SqliteStore};
    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;

    fn product() -> Product {
        Product {
            id: 1,
            url: "https://www.amazon.in/dp/B01".to_string(),
            name: Some("Kettle".to_string()),
            threshold: dec!(500),
        }
    }

    fn obs(id: i64, price: Decimal) -> PriceObservation {
        PriceObservation {
            id,
            product_id: 1,
            price,
            observed_at: Utc::now() + Duration::minutes(id),
        }
    }

    #[test]
    fn test_summarize_percent() {
        let h = summarize(product(), vec![obs(1, dec!(600)), obs(2, dec!(550)), obs(3, dec!(450))]);
        assert_eq!(
            h.change,
            Some(PriceChange::Percent {
                first: dec!(600),
                last: dec!(450),
                percent: dec!(-25),
            })
        );
    }

    #[test]
    fn test_summarize_zero_baseline() {
        let h = summarize(product(), vec![obs(1, dec!(0)), obs(2, dec!(10))]);
        assert_eq!(h.change, Some(PriceChange::ZeroBaseline { last: dec!(10) }));
    }

    #[test]
    fn test_summarize_huge_change_is_unavailable() {
        let first = crate::extraction::parse_price("₹0.01").unwrap();
        let last = crate::extraction::parse_price("₹1,000,000,000,000,000,000,000,000,000").unwrap();
        let h = summarize(product(), vec![obs(1, first), obs(2, last)]);
        assert_eq!(h.change, Some(PriceChange::Unavailable { first, last }));
        assert!(render_text(&[h], "₹").contains("Overall Change: too large to show"));
    }

    #[test]
    fn test_summarize_empty() {
        assert!(summarize(product(), vec![]).change.is_none());
    }

    #[test]
    fn test_render_text() {
        let rising = summarize(product(), vec![obs(1, dec!(300)), obs(2, dec!(400))]);
        let text = render_text(&[rising], "₹");
        assert!(text.contains("--- Price History for Kettle ---"));
        assert!(text.contains("Overall Change: +33.33% (From ₹300 to ₹400)"));

        let zero = summarize(product(), vec![obs(1, dec!(0)), obs(2, dec!(10))]);
        assert!(render_text(&[zero], "₹").contains("Initial price was zero. Current price: ₹10"));

        let empty = summarize(product(), vec![]);
        assert!(render_text(&[empty], "₹").is_empty());
    }

    #[test]
    fn test_build_from_store() {
        let store = SqliteStore::open_in_memory().unwrap();
        let AddOutcome::Added(id) = store
            .add_product("https://www.amazon.in/dp/B01", dec!(500), None)
            .unwrap()
        else {
            panic!("expected insert");
        };
        store
            .add_product("https://www.flipkart.com/p/2", dec!(100), None)
            .unwrap();
        let t0 = Utc::now();
        store.record(id, dec!(600), t0).unwrap();
        store.record(id, dec!(450), t0 + Duration::hours(6)).unwrap();

        let histories = build(&store).unwrap();
        assert_eq!(histories.len(), 2);
        assert_eq!(histories[0].observations.len(), 2);
        assert!(histories[1].observations.is_empty());
        assert!(matches!(
            histories[0].change,
            Some(PriceChange::Percent { percent, .. }) if percent == dec!(-25)
        ));
    }
}
