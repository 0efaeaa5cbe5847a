use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::cart::{AddToCartRequest, ApplyCouponRequest, CouponPreview, UpdateQuantityRequest},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Cart, CartLine},
    pricing::{discounted_price, round_to_two},
    response::{ApiResponse, Meta},
    services::coupon_service,
    state::AppState,
};

/// Fetch the user's cart, creating an empty one on first touch.
pub async fn ensure_cart(pool: &DbPool, user_id: Uuid) -> AppResult<Cart> {
    if let Some(cart) = sqlx::query_as::<_, Cart>("SELECT * FROM carts WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?
    {
        return Ok(cart);
    }

    // Racing first touches both hit the unique user_id constraint; the loser
    // re-reads the winner's row.
    let inserted = sqlx::query_as::<_, Cart>(
        "INSERT INTO carts (id, user_id) VALUES ($1, $2) ON CONFLICT (user_id) DO NOTHING RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    match inserted {
        Some(cart) => Ok(cart),
        None => {
            let cart = sqlx::query_as::<_, Cart>("SELECT * FROM carts WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(pool)
                .await?;
            Ok(cart)
        }
    }
}

/// Cart total from live product prices. Lines whose product vanished
/// contribute nothing.
pub async fn calculate_cart_total(pool: &DbPool, items: &[CartLine]) -> AppResult<f64> {
    let mut conn = pool.acquire().await?;
    calculate_total_with(&mut conn, items).await
}

/// Same computation on an existing connection, usable mid-transaction.
pub async fn calculate_total_with(
    conn: &mut sqlx::PgConnection,
    items: &[CartLine],
) -> AppResult<f64> {
    let mut sum = 0.0;
    for line in items {
        let product: Option<(f64, f64, String)> =
            sqlx::query_as("SELECT price, discount, discount_type FROM products WHERE id = $1")
                .bind(line.product_id)
                .fetch_optional(&mut *conn)
                .await?;
        if let Some((price, discount, discount_type)) = product {
            let breakdown = discounted_price(price, discount, &discount_type);
            sum += breakdown.final_price * f64::from(line.quantity);
        }
    }
    Ok(round_to_two(sum))
}

async fn persist_cart(pool: &DbPool, cart: &Cart) -> AppResult<Cart> {
    let updated = sqlx::query_as::<_, Cart>(
        r#"
        UPDATE carts
        SET items = $2, total = $3, coupon_code = $4, updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(cart.id)
    .bind(&cart.items)
    .bind(cart.total)
    .bind(&cart.coupon_code)
    .fetch_one(pool)
    .await?;
    Ok(updated)
}

pub async fn get_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Cart>> {
    let cart = ensure_cart(&state.pool, user.user_id).await?;
    let meta = Meta::new(1, cart.items.0.len() as i64, cart.items.0.len() as i64);
    Ok(ApiResponse::success("OK", cart, Some(meta)))
}

pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<Cart>> {
    let quantity = payload.quantity.unwrap_or(1);
    if quantity <= 0 {
        return Err(AppError::BadRequest("Invalid quantity".into()));
    }

    let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_optional(&state.pool)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound(format!(
            "Product not found: {product_id}"
        )));
    }

    let mut cart = ensure_cart(&state.pool, user.user_id).await?;

    let duplicate = cart.items.0.iter().any(|line| {
        line.matches(
            product_id,
            payload.color.as_deref(),
            payload.size.as_deref(),
        )
    });
    if duplicate {
        return Err(AppError::BadRequest(
            "Product already exists in cart".into(),
        ));
    }

    cart.items.0.push(CartLine {
        product_id,
        quantity,
        color: payload.color,
        size: payload.size,
    });
    cart.total = calculate_cart_total(&state.pool, &cart.items.0).await?;

    let cart = persist_cart(&state.pool, &cart).await?;
    Ok(ApiResponse::success("Added to cart", cart, None))
}

pub async fn remove_from_cart(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    color: Option<String>,
    size: Option<String>,
) -> AppResult<ApiResponse<Cart>> {
    let mut cart = ensure_cart(&state.pool, user.user_id).await?;

    let before = cart.items.0.len();
    cart.items
        .0
        .retain(|line| !line.matches(product_id, color.as_deref(), size.as_deref()));
    if cart.items.0.len() == before {
        return Err(AppError::NotFound("Product not found in cart".into()));
    }

    cart.total = calculate_cart_total(&state.pool, &cart.items.0).await?;
    let cart = persist_cart(&state.pool, &cart).await?;
    Ok(ApiResponse::success("Removed from cart", cart, None))
}

pub async fn update_quantity(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: UpdateQuantityRequest,
) -> AppResult<ApiResponse<Cart>> {
    if payload.quantity < 1 {
        return Err(AppError::BadRequest("Invalid quantity".into()));
    }

    let mut cart = ensure_cart(&state.pool, user.user_id).await?;

    let line = cart.items.0.iter_mut().find(|line| {
        line.matches(
            product_id,
            payload.color.as_deref(),
            payload.size.as_deref(),
        )
    });
    match line {
        Some(line) => line.quantity = payload.quantity,
        None => return Err(AppError::NotFound("Item not in cart".into())),
    }

    cart.total = calculate_cart_total(&state.pool, &cart.items.0).await?;
    let cart = persist_cart(&state.pool, &cart).await?;
    Ok(ApiResponse::success("Quantity updated", cart, None))
}

pub async fn clear_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Cart>> {
    let mut cart = ensure_cart(&state.pool, user.user_id).await?;
    cart.items.0.clear();
    cart.coupon_code = None;
    cart.total = 0.0;
    let cart = persist_cart(&state.pool, &cart).await?;
    Ok(ApiResponse::success("Cart cleared", cart, None))
}

/// Preview a coupon against the live cart. Validates exactly like order
/// creation but records nothing and persists nothing.
pub async fn apply_coupon(
    state: &AppState,
    user: &AuthUser,
    payload: ApplyCouponRequest,
) -> AppResult<ApiResponse<CouponPreview>> {
    let code = payload.coupon_code.trim().to_uppercase();
    if code.is_empty() {
        return Err(AppError::BadRequest("Coupon code is required".into()));
    }

    let cart = ensure_cart(&state.pool, user.user_id).await?;
    if cart.items.0.is_empty() {
        return Err(AppError::BadRequest("Your cart is empty".into()));
    }

    let cart_total = calculate_cart_total(&state.pool, &cart.items.0).await?;

    let coupon = coupon_service::find_by_code(&state.pool, &code)
        .await?
        .ok_or_else(|| AppError::BadRequest("Invalid coupon code".into()))?;

    let discount = coupon_service::validate(&coupon, user.user_id, cart_total)?;
    let (discount, total_after_discount) = coupon_service::apply_discount(cart_total, discount);

    Ok(ApiResponse::success(
        "Coupon applied successfully",
        CouponPreview {
            discount,
            total_after_discount,
        },
        Some(Meta::empty()),
    ))
}
