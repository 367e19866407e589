//! Drop and threshold decisions for a freshly observed price.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// What a new observation means for a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// No earlier observation existed, so nothing was compared.
    pub first_observation: bool,
    /// Price is strictly below the previous observation.
    pub dropped: bool,
    /// Price is at or below the threshold and an alert should go out.
    pub alert: bool,
}

/// Decide on drop and alert for `current`.
///
/// The threshold test is inclusive and independent of the drop test, so a
/// price that stays at or under the threshold alerts on every check. A
/// product's first observation never alerts.
pub fn evaluate(current: Decimal, threshold: Decimal, previous: Option<Decimal>) -> Decision {
    match previous {
        None => Decision {
            first_observation: true,
            dropped: false,
            alert: false,
        },
        Some(previous) => Decision {
            first_observation: false,
            dropped: current < previous,
            alert: current <= threshold,
        },
    }
}

/// Percentage change from `first` to `last`.
///
/// `None` for a zero baseline, or when the change does not fit a [`Decimal`].
pub fn percent_change(first: Decimal, last: Decimal) -> Option<Decimal> {
    if first.is_zero() {
        return None;
    }
    let ratio = last.checked_sub(first)?.checked_div(first)?;
    Some(ratio.checked_mul(Decimal::ONE_HUNDRED)?.round_dp(2))
}
