pub mod auth_service;
pub mod cart_service;
pub mod coupon_service;
pub mod order_service;
pub mod user_service;
