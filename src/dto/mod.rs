pub mod auth;
pub mod cart;
pub mod categories;
pub mod coupons;
pub mod messages;
pub mod orders;
pub mod products;
pub mod settings;
pub mod users;
pub mod wishlist;
