use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::messages::{ContactMessageList, ContactRequest},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::ContactMessage,
    response::{ApiResponse, Meta},
    services::user_service,
    state::AppState,
};

const MIN_CONTACT_BODY_LEN: usize = 6;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_contact_messages).post(send_contact_message))
        .route("/{id}", axum::routing::delete(delete_contact_message))
}

#[utoipa::path(
    post,
    path = "/api/contact",
    request_body = ContactRequest,
    responses(
        (status = 201, description = "Leave a message for the store", body = ApiResponse<ContactMessage>),
        (status = 400, description = "Message too short")
    ),
    security(("bearer_auth" = [])),
    tag = "Contact"
)]
pub async fn send_contact_message(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ContactRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<ContactMessage>>)> {
    let body = payload.message.trim().to_string();
    if body.chars().count() < MIN_CONTACT_BODY_LEN {
        return Err(AppError::BadRequest(format!(
            "Message must be at least {MIN_CONTACT_BODY_LEN} characters"
        )));
    }

    // Snapshot the sender's name and phone so the message stays readable
    // even if the account is later deleted.
    let sender = user_service::find_user(&state, user.user_id).await?;

    let message: ContactMessage = sqlx::query_as(
        r#"
        INSERT INTO contact_messages (id, user_id, username, phone, body)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(sender.id)
    .bind(&sender.username)
    .bind(&sender.phone)
    .bind(&body)
    .fetch_one(&state.pool)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Message received",
            message,
            Some(Meta::empty()),
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/api/contact",
    responses(
        (status = 200, description = "All contact messages (admin only)", body = ApiResponse<ContactMessageList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Contact"
)]
pub async fn list_contact_messages(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<ContactMessageList>>> {
    ensure_admin(&user)?;

    let items: Vec<ContactMessage> =
        sqlx::query_as("SELECT * FROM contact_messages ORDER BY created_at DESC")
            .fetch_all(&state.pool)
            .await?;

    let meta = Meta::new(1, items.len() as i64, items.len() as i64);
    Ok(Json(ApiResponse::success(
        "Contact messages",
        ContactMessageList { items },
        Some(meta),
    )))
}

#[utoipa::path(
    delete,
    path = "/api/contact/{id}",
    params(("id" = Uuid, Path, description = "Contact message ID")),
    responses(
        (status = 200, description = "Delete a contact message (admin only)"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Message not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Contact"
)]
pub async fn delete_contact_message(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    ensure_admin(&user)?;

    let result = sqlx::query("DELETE FROM contact_messages WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Message not found".into()));
    }

    Ok(Json(ApiResponse::success(
        "Message deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    )))
}
