use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::messages::{SubscribeRequest, SubscriberList},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Subscriber,
    response::{ApiResponse, Meta},
    services::user_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_subscribers).post(subscribe))
        .route("/{id}", axum::routing::delete(unsubscribe))
}

#[utoipa::path(
    post,
    path = "/api/subscribers",
    request_body = SubscribeRequest,
    responses(
        (status = 201, description = "Subscribe to the newsletter", body = ApiResponse<Subscriber>),
        (status = 400, description = "Invalid email"),
        (status = 409, description = "Already subscribed")
    ),
    security(("bearer_auth" = [])),
    tag = "Subscribers"
)]
pub async fn subscribe(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<SubscribeRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Subscriber>>)> {
    let email = payload.email.trim().to_lowercase();
    if !email.contains('@') {
        return Err(AppError::BadRequest("Invalid email address".into()));
    }

    let existing: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM subscribers WHERE user_id = $1 OR email = $2")
            .bind(user.user_id)
            .bind(&email)
            .fetch_optional(&state.pool)
            .await?;
    if existing.is_some() {
        return Err(AppError::Conflict("Already subscribed".into()));
    }

    let subscriber_user = user_service::find_user(&state, user.user_id).await?;

    let subscriber: Subscriber = sqlx::query_as(
        r#"
        INSERT INTO subscribers (id, user_id, username, phone, email)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(subscriber_user.id)
    .bind(&subscriber_user.username)
    .bind(&subscriber_user.phone)
    .bind(&email)
    .fetch_one(&state.pool)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Subscribed",
            subscriber,
            Some(Meta::empty()),
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/api/subscribers",
    responses(
        (status = 200, description = "All subscribers (admin only)", body = ApiResponse<SubscriberList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Subscribers"
)]
pub async fn list_subscribers(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<SubscriberList>>> {
    ensure_admin(&user)?;

    let items: Vec<Subscriber> =
        sqlx::query_as("SELECT * FROM subscribers ORDER BY created_at DESC")
            .fetch_all(&state.pool)
            .await?;

    let meta = Meta::new(1, items.len() as i64, items.len() as i64);
    Ok(Json(ApiResponse::success(
        "Subscribers",
        SubscriberList { items },
        Some(meta),
    )))
}

#[utoipa::path(
    delete,
    path = "/api/subscribers/{id}",
    params(("id" = Uuid, Path, description = "Subscriber ID")),
    responses(
        (status = 200, description = "Remove a subscriber (admin only)"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Subscriber not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Subscribers"
)]
pub async fn unsubscribe(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    ensure_admin(&user)?;

    let result = sqlx::query("DELETE FROM subscribers WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Subscriber not found".into()));
    }

    Ok(Json(ApiResponse::success(
        "Subscriber removed",
        serde_json::json!({}),
        Some(Meta::empty()),
    )))
}
