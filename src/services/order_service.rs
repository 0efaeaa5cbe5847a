use rand::Rng;
use sqlx::PgConnection;
use sqlx::types::Json;
use uuid::Uuid;

use crate::{
    address,
    dto::orders::{
        CreateOrderRequest, OrderList, OrderStatusChange, UpdateOrderStatusRequest,
        UpdateShippingRequest,
    },
    error::{AppError, AppResult},
    mailer::Mailer,
    middleware::auth::{AuthUser, ensure_admin},
    models::{Cart, CartLine, DEFAULT_PAYMENT_METHOD, ORDER_STATES, Order, OrderLine, Product, User},
    pricing::round_to_two,
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::{cart_service, coupon_service},
    state::AppState,
};

const ORDER_NUMBER_PREFIX: &str = "NTV";
/// Uppercase letters and digits minus the easily-confused 0/O/1/I.
const ORDER_NUMBER_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const ORDER_NUMBER_SUFFIX_LEN: usize = 6;
const ORDER_NUMBER_MAX_ATTEMPTS: usize = 10;

pub fn random_order_number() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ORDER_NUMBER_SUFFIX_LEN)
        .map(|_| {
            let index = rng.gen_range(0..ORDER_NUMBER_ALPHABET.len());
            ORDER_NUMBER_ALPHABET[index] as char
        })
        .collect();
    format!("{ORDER_NUMBER_PREFIX}-{suffix}")
}

/// Draw candidates until one is unused. Ten collisions in a row means
/// something is deeply wrong with the keyspace; surface it as a save error.
async fn generate_order_number(conn: &mut PgConnection) -> AppResult<String> {
    for _ in 0..ORDER_NUMBER_MAX_ATTEMPTS {
        let candidate = random_order_number();
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM orders WHERE order_number = $1)")
                .bind(&candidate)
                .fetch_one(&mut *conn)
                .await?;
        if !exists {
            return Ok(candidate);
        }
    }
    Err(AppError::Internal(anyhow::anyhow!(
        "Failed to generate a unique order number"
    )))
}

pub async fn create_order(
    state: &AppState,
    auth: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<Order>> {
    if payload.items.is_empty() {
        return Err(AppError::BadRequest("No items in order".into()));
    }

    let shipping_address = address::normalize(&payload.shipping_address);
    if !address::is_complete(&shipping_address) {
        return Err(AppError::BadRequest(
            "Shipping address is incomplete".into(),
        ));
    }

    let mut txn = state.pool.begin().await?;

    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(auth.user_id)
        .fetch_optional(&mut *txn)
        .await?;
    let user = user.ok_or_else(|| AppError::NotFound("User not found".into()))?;

    // Snapshot every line from the live product; any miss aborts the order.
    let mut snapshot_items: Vec<OrderLine> = Vec::with_capacity(payload.items.len());
    for item in &payload.items {
        let product: Option<Product> = sqlx::query_as("SELECT * FROM products WHERE id = $1")
            .bind(item.product_id)
            .fetch_optional(&mut *txn)
            .await?;
        let product = product.ok_or_else(|| {
            AppError::NotFound(format!("Product not found: {}", item.product_id))
        })?;

        let quantity = item.quantity.unwrap_or(1);
        if quantity < 1 {
            return Err(AppError::BadRequest("Invalid quantity".into()));
        }

        let breakdown = product.price_breakdown();
        snapshot_items.push(OrderLine {
            product_id: product.id,
            name: product.title.clone(),
            image: product.images.first().cloned(),
            price: breakdown.final_price,
            original_price: breakdown.original_price,
            quantity,
            color: item.color.clone(),
            size: item.size.clone(),
        });
    }

    let subtotal = round_to_two(
        snapshot_items
            .iter()
            .map(|line| line.price * f64::from(line.quantity))
            .sum(),
    );

    let mut total = subtotal;
    let mut final_coupon: Option<String> = None;
    let mut discount_value = 0.0;
    if let Some(code) = payload
        .coupon_code
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
    {
        let code = code.to_uppercase();
        let coupon: Option<crate::models::Coupon> =
            sqlx::query_as("SELECT * FROM coupons WHERE code = $1")
                .bind(&code)
                .fetch_optional(&mut *txn)
                .await?;
        let coupon = coupon.ok_or_else(|| AppError::BadRequest("Invalid coupon code".into()))?;

        let discount = coupon_service::validate(&coupon, user.id, subtotal)?;
        // Validation and redemption are separate statements; redeem re-checks
        // used_by conditionally so a racing checkout cannot double-redeem.
        coupon_service::redeem(&mut txn, coupon.id, user.id).await?;

        let (discount, after) = coupon_service::apply_discount(subtotal, discount);
        discount_value = discount;
        total = after;
        final_coupon = Some(code);
    }

    let order_number = generate_order_number(&mut txn).await?;

    let order: Order = sqlx::query_as(
        r#"
        INSERT INTO orders (id, user_id, order_number, state, items, shipping_address,
                            coupon_code, total, payment_method)
        VALUES ($1, $2, $3, 'pending', $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.id)
    .bind(&order_number)
    .bind(Json(&snapshot_items))
    .bind(Json(&shipping_address))
    .bind(&final_coupon)
    .bind(total)
    .bind(
        payload
            .payment_method
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_PAYMENT_METHOD),
    )
    .fetch_one(&mut *txn)
    .await?;

    // The order already references the user through user_id; the only user
    // write left is the address book, and it happens at most once.
    let save_address = payload.save_shipping_address.unwrap_or(true);
    let set_default = payload.set_default_shipping_address.unwrap_or(false);
    if save_address {
        let mut book = user.shipping_addresses.0.clone();
        if address::upsert(&mut book, &shipping_address, set_default) {
            sqlx::query(
                "UPDATE users SET shipping_addresses = $2, updated_at = now() WHERE id = $1",
            )
            .bind(user.id)
            .bind(Json(&book))
            .execute(&mut *txn)
            .await?;
        }
    }

    reconcile_cart(&mut txn, user.id, &order.items.0).await?;

    txn.commit().await?;

    send_order_emails(state, &user, &order, discount_value);

    Ok(ApiResponse::success(
        "Order created successfully",
        order,
        Some(Meta::empty()),
    ))
}

/// Drop every cart line matching an ordered (product, color, size) tuple and
/// recompute the total from what remains.
async fn reconcile_cart(
    conn: &mut PgConnection,
    user_id: Uuid,
    ordered: &[OrderLine],
) -> AppResult<()> {
    let cart: Option<Cart> =
        sqlx::query_as("SELECT * FROM carts WHERE user_id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut *conn)
            .await?;
    let Some(mut cart) = cart else {
        return Ok(());
    };

    cart.items.0.retain(|line: &CartLine| {
        !ordered.iter().any(|o| {
            o.product_id == line.product_id && o.color == line.color && o.size == line.size
        })
    });
    let total = cart_service::calculate_total_with(&mut *conn, &cart.items.0).await?;

    sqlx::query("UPDATE carts SET items = $2, total = $3, updated_at = now() WHERE id = $1")
        .bind(cart.id)
        .bind(&cart.items)
        .bind(total)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

fn order_summary_lines(order: &Order) -> String {
    order
        .items
        .0
        .iter()
        .map(|line| format!("  - {} x{} @ {:.2}", line.name, line.quantity, line.price))
        .collect::<Vec<_>>()
        .join("\n")
}

fn send_order_emails(state: &AppState, user: &User, order: &Order, discount: f64) {
    let mailer: &Mailer = &state.mailer;
    let store = mailer.store_name();

    let coupon_note = match order.coupon_code.as_deref() {
        Some(code) => format!("\nCoupon {code} applied: -{discount:.2}"),
        None => String::new(),
    };

    match user.email.as_deref() {
        Some(email) => {
            let body = format!(
                "Hi {username},\n\nThanks for your order {number}!\n\nItems:\n{items}\n{coupon_note}\nTotal: {total:.2}\nPayment: {payment}\n\n{store} will notify you when your order ships.\n",
                username = user.username,
                number = order.order_number,
                items = order_summary_lines(order),
                total = order.total,
                payment = order.payment_method,
            );
            mailer.spawn_send(
                email,
                &format!("Order Confirmation #{}", order.order_number),
                &body,
            );
        }
        None => {
            tracing::warn!(
                user_id = %user.id,
                order = %order.order_number,
                "user has no email address, skipping order confirmation"
            );
        }
    }

    let operator_body = format!(
        "New order {number} from {username} ({phone}).\n\nItems:\n{items}\n{coupon_note}\nTotal: {total:.2}\n",
        number = order.order_number,
        username = user.username,
        phone = user.phone,
        items = order_summary_lines(order),
        total = order.total,
    );
    mailer.spawn_send(
        &state.config.store_email,
        &format!("New Order Received #{}", order.order_number),
        &operator_body,
    );
}

pub async fn list_my_orders(state: &AppState, auth: &AuthUser) -> AppResult<ApiResponse<OrderList>> {
    let items: Vec<Order> =
        sqlx::query_as("SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC")
            .bind(auth.user_id)
            .fetch_all(&state.pool)
            .await?;

    let meta = Meta::new(1, items.len() as i64, items.len() as i64);
    Ok(ApiResponse::success("Ok", OrderList { items }, Some(meta)))
}

pub async fn list_all_orders(
    state: &AppState,
    auth: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(auth)?;

    let (page, limit, offset) = query.pagination.normalize();
    let order_clause = query.sort_order.unwrap_or(SortOrder::Desc).as_sql();
    let status = query.status.filter(|s| !s.is_empty());

    let sql = format!(
        r#"
        SELECT * FROM orders
        WHERE ($1::text IS NULL OR state = $1)
          AND ($2::uuid IS NULL OR user_id = $2)
        ORDER BY created_at {order_clause}
        LIMIT $3 OFFSET $4
        "#
    );
    let items: Vec<Order> = sqlx::query_as(&sql)
        .bind(&status)
        .bind(query.user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&state.pool)
        .await?;

    let (total,): (i64,) = sqlx::query_as(
        r#"
        SELECT count(*) FROM orders
        WHERE ($1::text IS NULL OR state = $1)
          AND ($2::uuid IS NULL OR user_id = $2)
        "#,
    )
    .bind(&status)
    .bind(query.user_id)
    .fetch_one(&state.pool)
    .await?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Ok", OrderList { items }, Some(meta)))
}

/// Look an order up by id or by its public order number.
pub async fn get_order(
    state: &AppState,
    auth: &AuthUser,
    identifier: &str,
) -> AppResult<ApiResponse<Order>> {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return Err(AppError::BadRequest("Order ID is required".into()));
    }

    let by_id = Uuid::parse_str(identifier).ok();
    let order: Option<Order> = sqlx::query_as(
        "SELECT * FROM orders WHERE order_number = $1 OR ($2::uuid IS NOT NULL AND id = $2)",
    )
    .bind(identifier.to_uppercase())
    .bind(by_id)
    .fetch_optional(&state.pool)
    .await?;

    let order = order.ok_or_else(|| AppError::NotFound("Order not found".into()))?;
    if auth.role != crate::models::ROLE_ADMIN && order.user_id != Some(auth.user_id) {
        return Err(AppError::Forbidden);
    }

    Ok(ApiResponse::success("OK", order, Some(Meta::empty())))
}

pub async fn update_status(
    state: &AppState,
    auth: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<OrderStatusChange>> {
    ensure_admin(auth)?;

    let new_state = payload.state.trim().to_lowercase();
    if !ORDER_STATES.contains(&new_state.as_str()) {
        return Err(AppError::BadRequest("Invalid order state".into()));
    }

    let order: Option<Order> = sqlx::query_as("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    let order = order.ok_or_else(|| AppError::NotFound("Order not found".into()))?;
    let previous_state = order.state.clone();

    // Deliberately no transition graph: any state may move to any state,
    // including itself.
    let updated: Order = sqlx::query_as(
        "UPDATE orders SET state = $2, updated_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(order.id)
    .bind(&new_state)
    .fetch_one(&state.pool)
    .await?;

    send_status_email(state, &updated, &previous_state).await;

    Ok(ApiResponse::success(
        format!("Order status updated from {previous_state} to {new_state}"),
        OrderStatusChange {
            previous_state,
            new_state: updated.state.clone(),
            order: updated,
        },
        Some(Meta::empty()),
    ))
}

// Best effort only: the relabel is already committed, so nothing in here may
// turn into a request failure.
async fn send_status_email(state: &AppState, order: &Order, previous: &str) {
    let Some(user_id) = order.user_id else {
        return;
    };
    let user: Result<Option<(String, Option<String>)>, sqlx::Error> =
        sqlx::query_as("SELECT username, email FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&state.pool)
            .await;

    match user {
        Ok(Some((username, Some(email)))) => {
            let body = format!(
                "Hi {username},\n\nYour order {number} moved from {previous} to {current}.\nTotal: {total:.2}\n",
                number = order.order_number,
                current = order.state,
                total = order.total,
            );
            state.mailer.spawn_send(
                &email,
                &format!("Order {} update: {}", order.order_number, order.state),
                &body,
            );
        }
        Ok(_) => {
            tracing::warn!(
                order = %order.order_number,
                "could not send status update email, user email not found"
            );
        }
        Err(err) => {
            tracing::warn!(
                order = %order.order_number,
                error = %err,
                "could not send status update email, user lookup failed"
            );
        }
    }
}

/// Owner-only shipping address replacement on an existing order.
pub async fn update_shipping(
    state: &AppState,
    auth: &AuthUser,
    id: Uuid,
    payload: UpdateShippingRequest,
) -> AppResult<ApiResponse<Order>> {
    let shipping_address = address::normalize(&payload.shipping_address);
    if !address::is_complete(&shipping_address) {
        return Err(AppError::BadRequest(
            "Shipping address is incomplete".into(),
        ));
    }

    let order: Option<Order> = sqlx::query_as("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    let order = order.ok_or_else(|| AppError::NotFound("Order not found".into()))?;

    if order.user_id != Some(auth.user_id) {
        return Err(AppError::Forbidden);
    }

    let updated: Order = sqlx::query_as(
        "UPDATE orders SET shipping_address = $2, updated_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(order.id)
    .bind(Json(&shipping_address))
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::success(
        "Shipping address updated",
        updated,
        Some(Meta::empty()),
    ))
}

pub async fn delete_order(
    state: &AppState,
    auth: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(auth)?;

    let result = sqlx::query("DELETE FROM orders WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Order not found".into()));
    }

    Ok(ApiResponse::success(
        "Order deleted successfully",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_number_format() {
        for _ in 0..50 {
            let number = random_order_number();
            let (prefix, suffix) = number.split_once('-').expect("hyphenated");
            assert_eq!(prefix, ORDER_NUMBER_PREFIX);
            assert_eq!(suffix.len(), ORDER_NUMBER_SUFFIX_LEN);
            assert!(
                suffix
                    .bytes()
                    .all(|b| ORDER_NUMBER_ALPHABET.contains(&b))
            );
        }
    }

    #[test]
    fn alphabet_has_no_ambiguous_characters() {
        for forbidden in [b'0', b'O', b'1', b'I'] {
            assert!(!ORDER_NUMBER_ALPHABET.contains(&forbidden));
        }
    }
}
