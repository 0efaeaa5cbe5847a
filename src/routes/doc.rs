use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    address::{ShippingAddress, ShippingAddressInput},
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest, UserInfo},
        cart::{AddToCartRequest, ApplyCouponRequest, CouponPreview, UpdateQuantityRequest},
        categories::{CategoryList, CreateCategoryRequest, UpdateCategoryRequest},
        coupons::{CouponList, CreateCouponRequest, UpdateCouponRequest},
        messages::{
            BroadcastMessageRequest, ContactMessageList, ContactRequest, MarkReadRequest,
            MarkReadResponse, SendMessageRequest, SubscribeRequest, SubscriberList,
            UpdateMessageRequest, UserMessageList,
        },
        orders::{
            CreateOrderRequest, OrderItemRequest, OrderList, OrderStatusChange,
            UpdateOrderStatusRequest, UpdateShippingRequest,
        },
        products::{CreateProductRequest, ProductList, UpdateProductRequest},
        settings::UpdateSettingsRequest,
        users::{DeleteUserRequest, UpdateUserRequest, UserList},
        wishlist::{WishlistProduct, WishlistView},
    },
    models::{
        Cart, CartLine, Category, ContactInfo, ContactMessage, Coupon, Order, OrderLine, Product,
        SiteColors, SocialLinks, Subscriber, User, UserMessage, WebsiteSettings, Wishlist,
        WishlistEntry,
    },
    response::{ApiResponse, Meta},
    routes::{
        auth, cart, categories, contact, coupons, health, messages, orders, params, products,
        settings, subscribers, users, wishlist,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::verify_email,
        users::get_me,
        users::update_me,
        users::list_users,
        users::get_user,
        users::delete_user,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        cart::get_cart,
        cart::add_to_cart,
        cart::update_quantity,
        cart::remove_from_cart,
        cart::clear_cart,
        cart::apply_coupon,
        wishlist::get_wishlist,
        wishlist::add_to_wishlist,
        wishlist::remove_from_wishlist,
        wishlist::clear_wishlist,
        orders::create_order,
        orders::list_my_orders,
        orders::list_all_orders,
        orders::get_order,
        orders::update_status,
        orders::update_shipping,
        orders::delete_order,
        coupons::list_coupons,
        coupons::get_coupon,
        coupons::create_coupon,
        coupons::update_coupon,
        coupons::delete_coupon,
        messages::send_message,
        messages::broadcast_message,
        messages::list_all_messages,
        messages::list_my_messages,
        messages::get_message,
        messages::mark_read,
        messages::update_message,
        messages::delete_message,
        contact::send_contact_message,
        contact::list_contact_messages,
        contact::delete_contact_message,
        subscribers::subscribe,
        subscribers::list_subscribers,
        subscribers::unsubscribe,
        settings::get_settings,
        settings::update_settings,
        categories::list_categories,
        categories::get_category,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
    ),
    components(
        schemas(
            User,
            UserInfo,
            Product,
            Cart,
            CartLine,
            Wishlist,
            WishlistEntry,
            WishlistProduct,
            WishlistView,
            Order,
            OrderLine,
            Coupon,
            UserMessage,
            ContactMessage,
            Subscriber,
            WebsiteSettings,
            SiteColors,
            ContactInfo,
            SocialLinks,
            Category,
            ShippingAddress,
            ShippingAddressInput,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            UpdateUserRequest,
            DeleteUserRequest,
            UserList,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            AddToCartRequest,
            UpdateQuantityRequest,
            ApplyCouponRequest,
            CouponPreview,
            CreateOrderRequest,
            OrderItemRequest,
            UpdateOrderStatusRequest,
            UpdateShippingRequest,
            OrderStatusChange,
            OrderList,
            CreateCouponRequest,
            UpdateCouponRequest,
            CouponList,
            SendMessageRequest,
            BroadcastMessageRequest,
            UpdateMessageRequest,
            MarkReadRequest,
            MarkReadResponse,
            UserMessageList,
            ContactRequest,
            ContactMessageList,
            SubscribeRequest,
            SubscriberList,
            UpdateSettingsRequest,
            CreateCategoryRequest,
            UpdateCategoryRequest,
            CategoryList,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            Meta,
            ApiResponse<User>,
            ApiResponse<Product>,
            ApiResponse<Cart>,
            ApiResponse<Order>,
            ApiResponse<OrderList>,
            ApiResponse<WishlistView>,
            ApiResponse<CouponPreview>,
            ApiResponse<WebsiteSettings>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration, login and email verification"),
        (name = "Users", description = "Profiles and admin user management"),
        (name = "Products", description = "Product catalog"),
        (name = "Cart", description = "Shopping cart"),
        (name = "Wishlist", description = "Wishlist"),
        (name = "Orders", description = "Checkout and order management"),
        (name = "Coupons", description = "Coupon administration"),
        (name = "Messages", description = "In-app messaging"),
        (name = "Contact", description = "Contact form"),
        (name = "Subscribers", description = "Newsletter subscriptions"),
        (name = "Settings", description = "Website settings"),
        (name = "Categories", description = "Category catalog"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
