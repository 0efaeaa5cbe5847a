use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::products::{CreateProductRequest, ProductList, UpdateProductRequest},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Product,
    pricing::DISCOUNT_TYPE_PERCENTAGE,
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route(
            "/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
}

#[utoipa::path(
    get,
    path = "/api/products",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("q" = Option<String>, Query, description = "Search in title and description"),
        ("category" = Option<String>, Query, description = "Filter by category key"),
        ("brand" = Option<String>, Query, description = "Filter by brand"),
        ("min_price" = Option<f64>, Query, description = "Minimum price"),
        ("max_price" = Option<f64>, Query, description = "Maximum price"),
        ("discounted" = Option<bool>, Query, description = "Only discounted products"),
        ("sort_by" = Option<String>, Query, description = "created_at, price, title, rating"),
        ("sort_order" = Option<String>, Query, description = "asc, desc")
    ),
    responses(
        (status = 200, description = "List products", body = ApiResponse<ProductList>)
    ),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let (page, limit, offset) = query.pagination.normalize();
    let sort_by = query.sort_by.unwrap_or(ProductSortBy::CreatedAt).as_sql();
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc).as_sql();

    let q = query.q.filter(|s| !s.trim().is_empty());
    let category = query.category.filter(|s| !s.is_empty());
    let brand = query.brand.filter(|s| !s.is_empty());
    let discounted = query.discounted.unwrap_or(false);

    let filter = r#"
        WHERE ($1::text IS NULL OR title ILIKE '%' || $1 || '%' OR description ILIKE '%' || $1 || '%')
          AND ($2::text IS NULL OR $2 = ANY(category))
          AND ($3::text IS NULL OR brand = $3)
          AND ($4::float8 IS NULL OR price >= $4)
          AND ($5::float8 IS NULL OR price <= $5)
          AND (NOT $6::bool OR discount > 0)
    "#;

    let sql = format!(
        "SELECT * FROM products {filter} ORDER BY {sort_by} {sort_order} LIMIT $7 OFFSET $8"
    );
    let items = sqlx::query_as::<_, Product>(&sql)
        .bind(&q)
        .bind(&category)
        .bind(&brand)
        .bind(query.min_price)
        .bind(query.max_price)
        .bind(discounted)
        .bind(limit)
        .bind(offset)
        .fetch_all(&state.pool)
        .await?;

    let count_sql = format!("SELECT count(*) FROM products {filter}");
    let total: (i64,) = sqlx::query_as(&count_sql)
        .bind(&q)
        .bind(&category)
        .bind(&brand)
        .bind(query.min_price)
        .bind(query.max_price)
        .bind(discounted)
        .fetch_one(&state.pool)
        .await?;

    let meta = Meta::new(page, limit, total.0);
    let data = ProductList { items };
    Ok(Json(ApiResponse::success("Products", data, Some(meta))))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Get product", body = ApiResponse<Product>),
        (status = 404, description = "Product not found"),
    ),
    tag = "Products"
)]
pub async fn get_product(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    let product = match product {
        Some(p) => p,
        None => return Err(AppError::NotFound("Product not found".into())),
    };
    Ok(Json(ApiResponse::success("Product", product, None)))
}

#[utoipa::path(
    post,
    path = "/api/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Create product (admin only)", body = ApiResponse<Product>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateProductRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Product>>)> {
    ensure_admin(&user)?;

    let title = payload.title.trim().to_string();
    if title.is_empty() {
        return Err(AppError::BadRequest("Title is required".into()));
    }
    if payload.price < 0.0 {
        return Err(AppError::BadRequest("Price cannot be negative".into()));
    }

    let product = sqlx::query_as::<_, Product>(
        r#"
        INSERT INTO products (id, title, description, price, discount, discount_type,
                              category, sizes, colors, tags, images, in_stock,
                              stock_quantity, brand, rating, num_reviews, is_active)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&title)
    .bind(&payload.description)
    .bind(payload.price)
    .bind(payload.discount.unwrap_or(0.0))
    .bind(
        payload
            .discount_type
            .as_deref()
            .unwrap_or(DISCOUNT_TYPE_PERCENTAGE),
    )
    .bind(payload.category.unwrap_or_default())
    .bind(payload.sizes.unwrap_or_default())
    .bind(payload.colors.unwrap_or_default())
    .bind(payload.tags.unwrap_or_default())
    .bind(payload.images.unwrap_or_default())
    .bind(payload.in_stock.unwrap_or(true))
    .bind(payload.stock_quantity.unwrap_or(0))
    .bind(payload.brand.as_deref().unwrap_or("Notervo"))
    .bind(payload.rating.unwrap_or(0.0))
    .bind(payload.num_reviews.unwrap_or(0))
    .bind(payload.is_active.unwrap_or(true))
    .fetch_one(&state.pool)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Product created",
            product,
            Some(Meta::empty()),
        )),
    ))
}

#[utoipa::path(
    put,
    path = "/api/products/{id}",
    request_body = UpdateProductRequest,
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Update product (admin only)", body = ApiResponse<Product>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    ensure_admin(&user)?;

    let current = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    let current = match current {
        Some(p) => p,
        None => return Err(AppError::NotFound("Product not found".into())),
    };

    let price = payload.price.unwrap_or(current.price);
    if price < 0.0 {
        return Err(AppError::BadRequest("Price cannot be negative".into()));
    }

    let product = sqlx::query_as::<_, Product>(
        r#"
        UPDATE products
        SET title = $2, description = $3, price = $4, discount = $5, discount_type = $6,
            category = $7, sizes = $8, colors = $9, tags = $10, images = $11,
            in_stock = $12, stock_quantity = $13, brand = $14, rating = $15,
            num_reviews = $16, is_active = $17, updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(current.id)
    .bind(payload.title.unwrap_or(current.title))
    .bind(payload.description.unwrap_or(current.description))
    .bind(price)
    .bind(payload.discount.unwrap_or(current.discount))
    .bind(payload.discount_type.unwrap_or(current.discount_type))
    .bind(payload.category.unwrap_or(current.category))
    .bind(payload.sizes.unwrap_or(current.sizes))
    .bind(payload.colors.unwrap_or(current.colors))
    .bind(payload.tags.unwrap_or(current.tags))
    .bind(payload.images.unwrap_or(current.images))
    .bind(payload.in_stock.unwrap_or(current.in_stock))
    .bind(payload.stock_quantity.unwrap_or(current.stock_quantity))
    .bind(payload.brand.unwrap_or(current.brand))
    .bind(payload.rating.unwrap_or(current.rating))
    .bind(payload.num_reviews.unwrap_or(current.num_reviews))
    .bind(payload.is_active.unwrap_or(current.is_active))
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(ApiResponse::success(
        "Product updated",
        product,
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Delete product (admin only)"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    ensure_admin(&user)?;

    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Product not found".into()));
    }

    Ok(Json(ApiResponse::success(
        "Product deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    )))
}
