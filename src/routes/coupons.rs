use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::coupons::{CouponList, CreateCouponRequest, UpdateCouponRequest},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{COUPON_KIND_FIXED, COUPON_KIND_PERCENT, Coupon},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_coupons).post(create_coupon))
        .route("/{id}", get(get_coupon).put(update_coupon).delete(delete_coupon))
}

fn validate_kind(kind: &str) -> AppResult<()> {
    if kind != COUPON_KIND_PERCENT && kind != COUPON_KIND_FIXED {
        return Err(AppError::BadRequest(
            "Coupon kind must be 'percent' or 'fixed'".into(),
        ));
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/api/coupons",
    responses(
        (status = 200, description = "List coupons (admin only)", body = ApiResponse<CouponList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Coupons"
)]
pub async fn list_coupons(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CouponList>>> {
    ensure_admin(&user)?;

    let items: Vec<Coupon> = sqlx::query_as("SELECT * FROM coupons ORDER BY created_at DESC")
        .fetch_all(&state.pool)
        .await?;

    let meta = Meta::new(1, items.len() as i64, items.len() as i64);
    Ok(Json(ApiResponse::success(
        "Coupons",
        CouponList { items },
        Some(meta),
    )))
}

#[utoipa::path(
    get,
    path = "/api/coupons/{id}",
    params(("id" = Uuid, Path, description = "Coupon ID")),
    responses(
        (status = 200, description = "Get coupon (admin only)", body = ApiResponse<Coupon>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Coupon not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Coupons"
)]
pub async fn get_coupon(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Coupon>>> {
    ensure_admin(&user)?;

    let coupon: Option<Coupon> = sqlx::query_as("SELECT * FROM coupons WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    let coupon = coupon.ok_or_else(|| AppError::NotFound("Coupon not found".into()))?;
    Ok(Json(ApiResponse::success("Coupon", coupon, None)))
}

#[utoipa::path(
    post,
    path = "/api/coupons",
    request_body = CreateCouponRequest,
    responses(
        (status = 201, description = "Create coupon (admin only)", body = ApiResponse<Coupon>),
        (status = 400, description = "Invalid coupon data"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Code already exists")
    ),
    security(("bearer_auth" = [])),
    tag = "Coupons"
)]
pub async fn create_coupon(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateCouponRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Coupon>>)> {
    ensure_admin(&user)?;

    let code = payload.code.trim().to_uppercase();
    if code.is_empty() {
        return Err(AppError::BadRequest("Coupon code is required".into()));
    }
    let kind = payload
        .kind
        .unwrap_or_else(|| COUPON_KIND_PERCENT.to_string());
    validate_kind(&kind)?;
    if payload.value <= 0.0 {
        return Err(AppError::BadRequest("Coupon value must be positive".into()));
    }

    let taken: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM coupons WHERE code = $1")
        .bind(&code)
        .fetch_optional(&state.pool)
        .await?;
    if taken.is_some() {
        return Err(AppError::Conflict("Coupon code already exists".into()));
    }

    let coupon: Coupon = sqlx::query_as(
        r#"
        INSERT INTO coupons (id, code, kind, value, expires_at, min_cart_value)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&code)
    .bind(&kind)
    .bind(payload.value)
    .bind(payload.expires_at)
    .bind(payload.min_cart_value.unwrap_or(0.0))
    .fetch_one(&state.pool)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Coupon created",
            coupon,
            Some(Meta::empty()),
        )),
    ))
}

#[utoipa::path(
    put,
    path = "/api/coupons/{id}",
    request_body = UpdateCouponRequest,
    params(("id" = Uuid, Path, description = "Coupon ID")),
    responses(
        (status = 200, description = "Update coupon (admin only)", body = ApiResponse<Coupon>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Coupon not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Coupons"
)]
pub async fn update_coupon(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCouponRequest>,
) -> AppResult<Json<ApiResponse<Coupon>>> {
    ensure_admin(&user)?;

    let current: Option<Coupon> = sqlx::query_as("SELECT * FROM coupons WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    let current = current.ok_or_else(|| AppError::NotFound("Coupon not found".into()))?;

    let code = match payload.code {
        Some(code) => {
            let code = code.trim().to_uppercase();
            if code.is_empty() {
                return Err(AppError::BadRequest("Coupon code is required".into()));
            }
            code
        }
        None => current.code,
    };
    let kind = payload.kind.unwrap_or(current.kind);
    validate_kind(&kind)?;
    let value = payload.value.unwrap_or(current.value);
    if value <= 0.0 {
        return Err(AppError::BadRequest("Coupon value must be positive".into()));
    }

    let coupon: Coupon = sqlx::query_as(
        r#"
        UPDATE coupons
        SET code = $2, kind = $3, value = $4, expires_at = $5, min_cart_value = $6
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(current.id)
    .bind(&code)
    .bind(&kind)
    .bind(value)
    .bind(payload.expires_at.or(current.expires_at))
    .bind(payload.min_cart_value.unwrap_or(current.min_cart_value))
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(ApiResponse::success(
        "Coupon updated",
        coupon,
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    delete,
    path = "/api/coupons/{id}",
    params(("id" = Uuid, Path, description = "Coupon ID")),
    responses(
        (status = 200, description = "Delete coupon (admin only)"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Coupon not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Coupons"
)]
pub async fn delete_coupon(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    ensure_admin(&user)?;

    let result = sqlx::query("DELETE FROM coupons WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Coupon not found".into()));
    }

    Ok(Json(ApiResponse::success(
        "Coupon deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    )))
}
