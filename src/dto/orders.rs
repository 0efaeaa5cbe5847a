use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::address::ShippingAddressInput;
use crate::models::Order;

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderItemRequest {
    pub product_id: Uuid,
    pub quantity: Option<i32>,
    pub color: Option<String>,
    pub size: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub items: Vec<OrderItemRequest>,
    pub shipping_address: ShippingAddressInput,
    pub coupon_code: Option<String>,
    pub payment_method: Option<String>,
    /// Defaults to true: the shipping address is upserted into the user's
    /// address book.
    pub save_shipping_address: Option<bool>,
    pub set_default_shipping_address: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub state: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateShippingRequest {
    pub shipping_address: ShippingAddressInput,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderStatusChange {
    pub previous_state: String,
    pub new_state: String,
    pub order: Order,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}
