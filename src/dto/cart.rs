use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub quantity: Option<i32>,
    pub color: Option<String>,
    pub size: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateQuantityRequest {
    pub quantity: i32,
    pub color: Option<String>,
    pub size: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RemoveFromCartRequest {
    pub color: Option<String>,
    pub size: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ApplyCouponRequest {
    pub coupon_code: String,
}

/// Preview of a coupon against the live cart; nothing is persisted.
#[derive(Debug, Serialize, ToSchema)]
pub struct CouponPreview {
    pub discount: f64,
    pub total_after_discount: f64,
}
