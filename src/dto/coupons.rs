use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Coupon;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCouponRequest {
    pub code: String,
    /// "percent" or "fixed"; defaults to "percent".
    pub kind: Option<String>,
    pub value: f64,
    pub expires_at: Option<DateTime<Utc>>,
    pub min_cart_value: Option<f64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCouponRequest {
    pub code: Option<String>,
    pub kind: Option<String>,
    pub value: Option<f64>,
    pub expires_at: Option<DateTime<Utc>>,
    pub min_cart_value: Option<f64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CouponList {
    pub items: Vec<Coupon>,
}
