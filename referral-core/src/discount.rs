//! Discount Selection
//!
//! Selects the best eligible discount for a price and applies the
//! percentage reduction. The computation is pure: eligibility is judged
//! against the `now` passed in by the caller, so the catalog, the
//! product page, and the checkout all quote the same final price.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{ReferralError, ReferralResult};

/// Read-side view of a discount, as needed for price computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountView {
    /// Discount row id
    pub id: String,
    /// Percentage off, 0-100
    pub percentage: u8,
    /// Active flag; cleared on redemption
    pub is_active: bool,
    /// Expiration; a discount with no expiry never ages out
    pub expires_at: Option<DateTime<Utc>>,
}

impl DiscountView {
    /// A discount is eligible iff it is active and unexpired.
    pub fn is_eligible(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at.map_or(true, |expiry| expiry > now)
    }
}

/// Result of applying the best discount to a price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    /// Price before any reduction
    pub original_price: Decimal,
    /// Price after the reduction, rounded to cents, floored at zero
    pub final_price: Decimal,
    /// The discount that was applied, if any
    pub applied: Option<DiscountView>,
}

/// Validate a percentage is within 0-100.
pub fn validate_percentage(value: u8) -> ReferralResult<()> {
    if value > 100 {
        return Err(ReferralError::InvalidPercentage { value });
    }
    Ok(())
}

/// Apply the best eligible discount to a price.
///
/// Discounts are never stacked: the single eligible discount with the
/// highest percentage wins, and among equal percentages the first
/// encountered is kept.
pub fn apply_best_discount(
    price: Decimal,
    discounts: &[DiscountView],
    now: DateTime<Utc>,
) -> PriceQuote {
    let mut best: Option<&DiscountView> = None;
    for discount in discounts.iter().filter(|d| d.is_eligible(now)) {
        // replace only on a strictly higher percentage: first wins ties
        let better = match best {
            Some(current) => discount.percentage > current.percentage,
            None => true,
        };
        if better {
            best = Some(discount);
        }
    }

    match best {
        None => PriceQuote {
            original_price: price,
            final_price: price,
            applied: None,
        },
        Some(discount) => {
            let remaining = Decimal::ONE_HUNDRED - Decimal::from(discount.percentage);
            let reduced = round2(price * remaining / Decimal::ONE_HUNDRED);
            PriceQuote {
                original_price: price,
                final_price: reduced.max(Decimal::ZERO),
                applied: Some(discount.clone()),
            }
        }
    }
}

/// Round to two decimal places (currency).
fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn active(id: &str, percentage: u8) -> DiscountView {
        DiscountView {
            id: id.to_string(),
            percentage,
            is_active: true,
            expires_at: Some(Utc::now() + Duration::days(30)),
        }
    }

    #[test]
    fn test_empty_input_leaves_price_unchanged() {
        let quote = apply_best_discount(Decimal::new(4999, 2), &[], Utc::now());
        assert_eq!(quote.final_price, Decimal::new(4999, 2));
        assert!(quote.applied.is_none());
    }

    #[test]
    fn test_highest_percentage_wins() {
        let discounts = vec![active("d1", 10), active("d2", 25), active("d3", 15)];
        let quote = apply_best_discount(Decimal::new(100, 0), &discounts, Utc::now());
        assert_eq!(quote.applied.as_ref().unwrap().id, "d2");
        assert_eq!(quote.final_price, Decimal::new(7500, 2));
    }

    #[test]
    fn test_ties_keep_first_encountered() {
        let discounts = vec![active("first", 20), active("second", 20)];
        let quote = apply_best_discount(Decimal::new(100, 0), &discounts, Utc::now());
        assert_eq!(quote.applied.as_ref().unwrap().id, "first");
    }

    #[test]
    fn test_expired_discount_never_selected() {
        let expired = DiscountView {
            id: "stale".to_string(),
            percentage: 90,
            is_active: true,
            expires_at: Some(Utc::now() - Duration::days(1)),
        };
        let discounts = vec![expired, active("live", 15)];
        let quote = apply_best_discount(Decimal::new(200, 0), &discounts, Utc::now());
        assert_eq!(quote.applied.as_ref().unwrap().id, "live");
        assert_eq!(quote.final_price, Decimal::new(17000, 2));
    }

    #[test]
    fn test_inactive_discount_never_selected() {
        let redeemed = DiscountView {
            id: "used".to_string(),
            percentage: 50,
            is_active: false,
            expires_at: None,
        };
        let quote = apply_best_discount(Decimal::new(80, 0), &[redeemed], Utc::now());
        assert!(quote.applied.is_none());
        assert_eq!(quote.final_price, Decimal::new(80, 0));
    }

    #[test]
    fn test_no_expiry_counts_as_eligible() {
        let evergreen = DiscountView {
            id: "evergreen".to_string(),
            percentage: 15,
            is_active: true,
            expires_at: None,
        };
        assert!(evergreen.is_eligible(Utc::now()));
    }

    #[test]
    fn test_rounding_to_cents() {
        let quote = apply_best_discount(Decimal::new(1999, 2), &[active("d", 15)], Utc::now());
        // 19.99 * 0.85 = 16.9915 -> 16.99
        assert_eq!(quote.final_price, Decimal::new(1699, 2));
    }

    #[test]
    fn test_full_discount_floors_at_zero() {
        let quote = apply_best_discount(Decimal::new(100, 0), &[active("d", 100)], Utc::now());
        assert_eq!(quote.final_price, Decimal::ZERO);
    }

    #[test]
    fn test_validate_percentage() {
        assert!(validate_percentage(0).is_ok());
        assert!(validate_percentage(100).is_ok());
        assert_eq!(
            validate_percentage(101),
            Err(ReferralError::InvalidPercentage { value: 101 })
        );
    }
}
