use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use sqlx::types::Json as SqlJson;
use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::wishlist::{WishlistProduct, WishlistView},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Wishlist, WishlistEntry},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_wishlist).delete(clear_wishlist))
        .route("/{product_id}", post(add_to_wishlist).delete(remove_from_wishlist))
}

async fn ensure_wishlist(pool: &DbPool, user_id: Uuid) -> AppResult<Wishlist> {
    if let Some(list) = sqlx::query_as::<_, Wishlist>("SELECT * FROM wishlists WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?
    {
        return Ok(list);
    }

    let inserted = sqlx::query_as::<_, Wishlist>(
        "INSERT INTO wishlists (id, user_id) VALUES ($1, $2) ON CONFLICT (user_id) DO NOTHING RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    match inserted {
        Some(list) => Ok(list),
        None => {
            let list = sqlx::query_as::<_, Wishlist>("SELECT * FROM wishlists WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(pool)
                .await?;
            Ok(list)
        }
    }
}

async fn populate(pool: &DbPool, wishlist: Wishlist) -> AppResult<WishlistView> {
    let ids: Vec<Uuid> = wishlist.items.0.iter().map(|e| e.product_id).collect();
    let rows: Vec<(Uuid, String, f64, Vec<String>)> =
        sqlx::query_as("SELECT id, title, price, images FROM products WHERE id = ANY($1)")
            .bind(&ids)
            .fetch_all(pool)
            .await?;

    // Preserve wishlist insertion order, not the database's.
    let products = ids
        .iter()
        .filter_map(|id| {
            rows.iter()
                .find(|(pid, _, _, _)| pid == id)
                .map(|(pid, title, price, images)| WishlistProduct {
                    product_id: *pid,
                    title: title.clone(),
                    price: *price,
                    image: images.first().cloned(),
                })
        })
        .collect();

    Ok(WishlistView { wishlist, products })
}

#[utoipa::path(
    get,
    path = "/api/wishlist",
    responses(
        (status = 200, description = "Current user's wishlist with product details", body = ApiResponse<WishlistView>)
    ),
    security(("bearer_auth" = [])),
    tag = "Wishlist"
)]
pub async fn get_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<WishlistView>>> {
    let wishlist = ensure_wishlist(&state.pool, user.user_id).await?;
    let view = populate(&state.pool, wishlist).await?;
    let meta = Meta::new(1, view.products.len() as i64, view.products.len() as i64);
    Ok(Json(ApiResponse::success("OK", view, Some(meta))))
}

#[utoipa::path(
    post,
    path = "/api/wishlist/{product_id}",
    params(("product_id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Add a product to the wishlist", body = ApiResponse<WishlistView>),
        (status = 400, description = "Already in wishlist"),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Wishlist"
)]
pub async fn add_to_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<WishlistView>>> {
    let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_optional(&state.pool)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound(format!(
            "Product not found: {product_id}"
        )));
    }

    let mut wishlist = ensure_wishlist(&state.pool, user.user_id).await?;
    if wishlist.items.0.iter().any(|e| e.product_id == product_id) {
        return Err(AppError::BadRequest(
            "Product already in wishlist".into(),
        ));
    }
    wishlist.items.0.push(WishlistEntry { product_id });

    let wishlist = sqlx::query_as::<_, Wishlist>(
        "UPDATE wishlists SET items = $2, updated_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(wishlist.id)
    .bind(SqlJson(&wishlist.items.0))
    .fetch_one(&state.pool)
    .await?;

    let view = populate(&state.pool, wishlist).await?;
    Ok(Json(ApiResponse::success("Added to wishlist", view, None)))
}

#[utoipa::path(
    delete,
    path = "/api/wishlist",
    responses(
        (status = 200, description = "Empty the wishlist", body = ApiResponse<WishlistView>)
    ),
    security(("bearer_auth" = [])),
    tag = "Wishlist"
)]
pub async fn clear_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<WishlistView>>> {
    let wishlist = ensure_wishlist(&state.pool, user.user_id).await?;

    let wishlist = sqlx::query_as::<_, Wishlist>(
        "UPDATE wishlists SET items = '[]'::jsonb, updated_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(wishlist.id)
    .fetch_one(&state.pool)
    .await?;

    let view = populate(&state.pool, wishlist).await?;
    Ok(Json(ApiResponse::success("Wishlist cleared", view, None)))
}

#[utoipa::path(
    delete,
    path = "/api/wishlist/{product_id}",
    params(("product_id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Remove a product from the wishlist", body = ApiResponse<WishlistView>),
        (status = 404, description = "Product not in wishlist")
    ),
    security(("bearer_auth" = [])),
    tag = "Wishlist"
)]
pub async fn remove_from_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<WishlistView>>> {
    let mut wishlist = ensure_wishlist(&state.pool, user.user_id).await?;

    let before = wishlist.items.0.len();
    wishlist.items.0.retain(|e| e.product_id != product_id);
    if wishlist.items.0.len() == before {
        return Err(AppError::NotFound("Product not in wishlist".into()));
    }

    let wishlist = sqlx::query_as::<_, Wishlist>(
        "UPDATE wishlists SET items = $2, updated_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(wishlist.id)
    .bind(SqlJson(&wishlist.items.0))
    .fetch_one(&state.pool)
    .await?;

    let view = populate(&state.pool, wishlist).await?;
    Ok(Json(ApiResponse::success(
        "Removed from wishlist",
        view,
        None,
    )))
}
