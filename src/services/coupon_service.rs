use chrono::Utc;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::{AppError, AppResult},
    models::{COUPON_KIND_PERCENT, Coupon},
    pricing::round_to_two,
};

pub async fn find_by_code(pool: &DbPool, code: &str) -> AppResult<Option<Coupon>> {
    let coupon = sqlx::query_as::<_, Coupon>("SELECT * FROM coupons WHERE code = $1")
        .bind(code)
        .fetch_optional(pool)
        .await?;
    Ok(coupon)
}

pub fn compute_discount(kind: &str, value: f64, total: f64) -> f64 {
    if kind == COUPON_KIND_PERCENT {
        total * (value / 100.0)
    } else {
        value
    }
}

/// Check a coupon against a cart total for a given user and return the
/// discount it grants. Pure; recording the redemption is `redeem`'s job.
pub fn validate(coupon: &Coupon, user_id: Uuid, cart_total: f64) -> AppResult<f64> {
    if let Some(expires_at) = coupon.expires_at
        && expires_at < Utc::now()
    {
        return Err(AppError::BadRequest("Coupon has expired".into()));
    }

    if cart_total < coupon.min_cart_value {
        return Err(AppError::BadRequest(format!(
            "Coupon requires minimum cart value of {}",
            coupon.min_cart_value
        )));
    }

    if coupon.used_by.contains(&user_id) {
        return Err(AppError::Conflict("Coupon already used by you".into()));
    }

    Ok(compute_discount(&coupon.kind, coupon.value, cart_total))
}

/// Record a redemption. The append and the already-used check are a single
/// conditional update, so two racing checkouts cannot both redeem.
pub async fn redeem(conn: &mut PgConnection, coupon_id: Uuid, user_id: Uuid) -> AppResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE coupons
        SET used_by = array_append(used_by, $2)
        WHERE id = $1 AND NOT (used_by @> ARRAY[$2]::uuid[])
        "#,
    )
    .bind(coupon_id)
    .bind(user_id)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::Conflict("Coupon already used by you".into()));
    }
    Ok(())
}

/// Discount and post-discount total, both rounded, floored at zero.
pub fn apply_discount(total: f64, discount: f64) -> (f64, f64) {
    let discount = round_to_two(discount);
    let after = round_to_two((total - discount).max(0.0));
    (discount, after)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn coupon(kind: &str, value: f64, min: f64) -> Coupon {
        Coupon {
            id: Uuid::new_v4(),
            code: "SAVE10".into(),
            kind: kind.into(),
            value,
            expires_at: Some(Utc::now() + Duration::days(7)),
            min_cart_value: min,
            used_by: Vec::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn percent_discount_scales_with_total() {
        assert_eq!(compute_discount("percent", 10.0, 250.0), 25.0);
    }

    #[test]
    fn fixed_discount_ignores_total() {
        assert_eq!(compute_discount("fixed", 40.0, 250.0), 40.0);
    }

    #[test]
    fn expired_coupon_is_rejected() {
        let mut c = coupon("percent", 10.0, 0.0);
        c.expires_at = Some(Utc::now() - Duration::hours(1));
        let err = validate(&c, Uuid::new_v4(), 100.0).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn minimum_cart_value_is_enforced() {
        let c = coupon("percent", 10.0, 500.0);
        let err = validate(&c, Uuid::new_v4(), 100.0).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn already_used_coupon_conflicts() {
        let user = Uuid::new_v4();
        let mut c = coupon("fixed", 10.0, 0.0);
        c.used_by.push(user);
        let err = validate(&c, user, 100.0).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn coupon_without_expiry_never_expires() {
        let mut c = coupon("fixed", 10.0, 0.0);
        c.expires_at = None;
        assert_eq!(validate(&c, Uuid::new_v4(), 100.0).unwrap(), 10.0);
    }

    #[test]
    fn discount_never_drives_total_below_zero() {
        let (discount, after) = apply_discount(30.0, 50.0);
        assert_eq!(discount, 50.0);
        assert_eq!(after, 0.0);
    }
}
