use axum::Router;

use crate::state::AppState;

pub mod auth;
pub mod cart;
pub mod categories;
pub mod contact;
pub mod coupons;
pub mod doc;
pub mod health;
pub mod messages;
pub mod orders;
pub mod params;
pub mod products;
pub mod settings;
pub mod subscribers;
pub mod users;
pub mod wishlist;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/products", products::router())
        .nest("/cart", cart::router())
        .nest("/wishlist", wishlist::router())
        .nest("/orders", orders::router())
        .nest("/coupons", coupons::router())
        .nest("/messages", messages::router())
        .nest("/contact", contact::router())
        .nest("/subscribers", subscribers::router())
        .nest("/settings", settings::router())
        .nest("/categories", categories::router())
}
