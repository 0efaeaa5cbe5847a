use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::address::ShippingAddress;
use crate::pricing::{PriceBreakdown, discounted_price};

pub const ROLE_USER: &str = "user";
pub const ROLE_ADMIN: &str = "admin";

pub const COUPON_KIND_PERCENT: &str = "percent";
pub const COUPON_KIND_FIXED: &str = "fixed";

/// Order lifecycle labels. Any state may move to any other; there is no
/// transition graph.
pub const ORDER_STATES: [&str; 5] = ["pending", "processing", "shipped", "delivered", "cancelled"];

pub const DEFAULT_PAYMENT_METHOD: &str = "CashOnDelivery";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub phone: String,
    pub email: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub is_verified: bool,
    #[serde(skip_serializing)]
    pub verification_token: Option<String>,
    #[schema(value_type = Vec<ShippingAddress>)]
    pub shipping_addresses: Json<Vec<ShippingAddress>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub discount: f64,
    pub discount_type: String,
    pub category: Vec<String>,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub tags: Vec<String>,
    pub images: Vec<String>,
    pub in_stock: bool,
    pub stock_quantity: i32,
    pub brand: String,
    pub rating: f64,
    pub num_reviews: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn price_breakdown(&self) -> PriceBreakdown {
        discounted_price(self.price, self.discount, &self.discount_type)
    }
}

/// One cart line; at most one line exists per (product_id, color, size).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CartLine {
    pub product_id: Uuid,
    pub quantity: i32,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
}

impl CartLine {
    pub fn matches(&self, product_id: Uuid, color: Option<&str>, size: Option<&str>) -> bool {
        self.product_id == product_id
            && self.color.as_deref() == color
            && self.size.as_deref() == size
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Cart {
    pub id: Uuid,
    pub user_id: Uuid,
    #[schema(value_type = Vec<CartLine>)]
    pub items: Json<Vec<CartLine>>,
    pub total: f64,
    pub coupon_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WishlistEntry {
    pub product_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Wishlist {
    pub id: Uuid,
    pub user_id: Uuid,
    #[schema(value_type = Vec<WishlistEntry>)]
    pub items: Json<Vec<WishlistEntry>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Immutable snapshot of a product at purchase time. Later product edits
/// never touch these fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrderLine {
    pub product_id: Uuid,
    pub name: String,
    pub image: Option<String>,
    pub price: f64,
    pub original_price: f64,
    pub quantity: i32,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub order_number: String,
    pub state: String,
    #[schema(value_type = Vec<OrderLine>)]
    pub items: Json<Vec<OrderLine>>,
    #[schema(value_type = ShippingAddress)]
    pub shipping_address: Json<ShippingAddress>,
    pub coupon_code: Option<String>,
    pub total: f64,
    pub payment_method: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Coupon {
    pub id: Uuid,
    pub code: String,
    pub kind: String,
    pub value: f64,
    pub expires_at: Option<DateTime<Utc>>,
    pub min_cart_value: f64,
    pub used_by: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Admin-to-user notification.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct UserMessage {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub content: String,
    pub kind: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Message a customer sends through the contact form.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ContactMessage {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub phone: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Subscriber {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub phone: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SiteColors {
    #[serde(default)]
    pub primary: String,
    #[serde(default)]
    pub secondary: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ContactInfo {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    pub address: Option<String>,
    pub working_hours: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SocialLinks {
    #[serde(default)]
    pub facebook: String,
    #[serde(default)]
    pub instagram: String,
    #[serde(default)]
    pub twitter: String,
    #[serde(default)]
    pub linkedin: String,
    #[serde(default)]
    pub youtube: String,
    #[serde(default)]
    pub tiktok: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct WebsiteSettings {
    pub id: Uuid,
    pub site_name: String,
    pub site_description: String,
    pub site_tagline: String,
    pub logo: Option<String>,
    pub logo_type: String,
    pub font_family: String,
    #[schema(value_type = SiteColors)]
    pub site_colors: Json<SiteColors>,
    #[schema(value_type = ContactInfo)]
    pub contact: Json<ContactInfo>,
    #[schema(value_type = SocialLinks)]
    pub social_links: Json<SocialLinks>,
    pub about_us: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Category {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category_key: String,
    pub image_url: String,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
