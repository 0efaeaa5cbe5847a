use serde::Serialize;
use utoipa::ToSchema;

pub const DISCOUNT_TYPE_PERCENTAGE: &str = "percentage";
pub const DISCOUNT_TYPE_FIXED: &str = "fixed";

/// Price of a single unit after applying the product's own discount.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct PriceBreakdown {
    pub original_price: f64,
    pub final_price: f64,
    pub discount_amount: f64,
}

/// Round to two decimals, half away from zero on cents.
pub fn round_to_two(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn discounted_price(price: f64, discount: f64, discount_type: &str) -> PriceBreakdown {
    let original = if price.is_finite() { price } else { 0.0 };
    let discount = if discount.is_finite() { discount } else { 0.0 };

    if discount == 0.0 || original <= 0.0 {
        return PriceBreakdown {
            original_price: round_to_two(original),
            final_price: round_to_two(original),
            discount_amount: 0.0,
        };
    }

    let final_price = if discount_type == DISCOUNT_TYPE_PERCENTAGE {
        original * (1.0 - discount / 100.0)
    } else {
        original - discount
    };

    let final_price = final_price.max(0.0);
    let discount_amount = (original - final_price).max(0.0);

    PriceBreakdown {
        original_price: round_to_two(original),
        final_price: round_to_two(final_price),
        discount_amount: round_to_two(discount_amount),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_discount() {
        let p = discounted_price(100.0, 20.0, DISCOUNT_TYPE_PERCENTAGE);
        assert_eq!(p.original_price, 100.0);
        assert_eq!(p.final_price, 80.0);
        assert_eq!(p.discount_amount, 20.0);
    }

    #[test]
    fn fixed_discount_clamps_at_zero() {
        let p = discounted_price(100.0, 150.0, DISCOUNT_TYPE_FIXED);
        assert_eq!(p.final_price, 0.0);
        assert_eq!(p.discount_amount, 100.0);
    }

    #[test]
    fn no_discount_passes_price_through() {
        let p = discounted_price(49.99, 0.0, DISCOUNT_TYPE_PERCENTAGE);
        assert_eq!(p.final_price, 49.99);
        assert_eq!(p.discount_amount, 0.0);
    }

    #[test]
    fn zero_price_never_discounts() {
        let p = discounted_price(0.0, 30.0, DISCOUNT_TYPE_PERCENTAGE);
        assert_eq!(p.original_price, 0.0);
        assert_eq!(p.final_price, 0.0);
        assert_eq!(p.discount_amount, 0.0);
    }

    #[test]
    fn final_price_never_exceeds_original() {
        for (price, discount, kind) in [
            (19.99, 5.0, DISCOUNT_TYPE_FIXED),
            (19.99, 5.0, DISCOUNT_TYPE_PERCENTAGE),
            (3.0, 200.0, DISCOUNT_TYPE_PERCENTAGE),
            (3.0, 200.0, DISCOUNT_TYPE_FIXED),
        ] {
            let p = discounted_price(price, discount, kind);
            assert!(p.final_price <= p.original_price);
            assert!(p.final_price >= 0.0);
            assert_eq!(
                p.discount_amount,
                round_to_two(p.original_price - p.final_price)
            );
        }
    }

    #[test]
    fn unknown_discount_type_is_treated_as_fixed() {
        let p = discounted_price(50.0, 10.0, "whatever");
        assert_eq!(p.final_price, 40.0);
    }

    #[test]
    fn rounding_keeps_two_decimals() {
        assert_eq!(round_to_two(2.345678), 2.35);
        assert_eq!(round_to_two(-2.345678), -2.35);
        assert_eq!(round_to_two(1.0 / 3.0), 0.33);
    }

    #[test]
    fn percentage_results_are_rounded_to_cents() {
        // 19.99 * 0.85 = 16.9915
        let p = discounted_price(19.99, 15.0, DISCOUNT_TYPE_PERCENTAGE);
        assert_eq!(p.final_price, 16.99);
        assert_eq!(p.discount_amount, 3.0);
    }
}
