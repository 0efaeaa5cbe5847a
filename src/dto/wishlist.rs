use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Wishlist;

/// Wishlist entry joined with the product fields the storefront displays.
#[derive(Debug, Serialize, ToSchema)]
pub struct WishlistProduct {
    pub product_id: Uuid,
    pub title: String,
    pub price: f64,
    pub image: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WishlistView {
    pub wishlist: Wishlist,
    pub products: Vec<WishlistProduct>,
}
