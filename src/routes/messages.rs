use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::messages::{
        BroadcastMessageRequest, MarkReadRequest, MarkReadResponse, SendMessageRequest,
        UpdateMessageRequest, UserMessageList,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{ROLE_ADMIN, UserMessage},
    response::{ApiResponse, Meta},
    state::AppState,
};

const DEFAULT_MESSAGE_KIND: &str = "general";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_all_messages).post(send_message))
        .route("/broadcast", post(broadcast_message))
        .route("/mine", get(list_my_messages))
        .route("/read", post(mark_read))
        .route(
            "/{id}",
            get(get_message).put(update_message).delete(delete_message),
        )
}

#[utoipa::path(
    post,
    path = "/api/messages",
    request_body = SendMessageRequest,
    responses(
        (status = 201, description = "Send a message to a user (admin only)", body = ApiResponse<UserMessage>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Receiver not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Messages"
)]
pub async fn send_message(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<SendMessageRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<UserMessage>>)> {
    ensure_admin(&user)?;

    let content = payload.content.trim().to_string();
    if content.is_empty() {
        return Err(AppError::BadRequest("Message content is required".into()));
    }

    let receiver: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1")
        .bind(payload.receiver_id)
        .fetch_optional(&state.pool)
        .await?;
    if receiver.is_none() {
        return Err(AppError::NotFound("Receiver not found".into()));
    }

    let message: UserMessage = sqlx::query_as(
        r#"
        INSERT INTO user_messages (id, sender_id, receiver_id, content, kind)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.user_id)
    .bind(payload.receiver_id)
    .bind(&content)
    .bind(payload.kind.as_deref().unwrap_or(DEFAULT_MESSAGE_KIND))
    .fetch_one(&state.pool)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Message sent",
            message,
            Some(Meta::empty()),
        )),
    ))
}

#[utoipa::path(
    post,
    path = "/api/messages/broadcast",
    request_body = BroadcastMessageRequest,
    responses(
        (status = 201, description = "Send a message to every user (admin only)", body = ApiResponse<MarkReadResponse>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Messages"
)]
pub async fn broadcast_message(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<BroadcastMessageRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<MarkReadResponse>>)> {
    ensure_admin(&user)?;

    let content = payload.content.trim().to_string();
    if content.is_empty() {
        return Err(AppError::BadRequest("Message content is required".into()));
    }
    let kind = payload
        .kind
        .unwrap_or_else(|| DEFAULT_MESSAGE_KIND.to_string());

    // One round trip: fan out to every user except the sender.
    let result = sqlx::query(
        r#"
        INSERT INTO user_messages (id, sender_id, receiver_id, content, kind)
        SELECT gen_random_uuid(), $1, id, $2, $3 FROM users WHERE id <> $1
        "#,
    )
    .bind(user.user_id)
    .bind(&content)
    .bind(&kind)
    .execute(&state.pool)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Broadcast sent",
            MarkReadResponse {
                modified: result.rows_affected(),
            },
            Some(Meta::empty()),
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/api/messages",
    responses(
        (status = 200, description = "All messages (admin only)", body = ApiResponse<UserMessageList>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Messages"
)]
pub async fn list_all_messages(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<UserMessageList>>> {
    ensure_admin(&user)?;

    let items: Vec<UserMessage> =
        sqlx::query_as("SELECT * FROM user_messages ORDER BY created_at DESC")
            .fetch_all(&state.pool)
            .await?;

    let meta = Meta::new(1, items.len() as i64, items.len() as i64);
    Ok(Json(ApiResponse::success(
        "Messages",
        UserMessageList { items },
        Some(meta),
    )))
}

#[utoipa::path(
    get,
    path = "/api/messages/mine",
    responses(
        (status = 200, description = "Messages addressed to the current user", body = ApiResponse<UserMessageList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Messages"
)]
pub async fn list_my_messages(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<UserMessageList>>> {
    let items: Vec<UserMessage> = sqlx::query_as(
        "SELECT * FROM user_messages WHERE receiver_id = $1 ORDER BY created_at DESC",
    )
    .bind(user.user_id)
    .fetch_all(&state.pool)
    .await?;

    let meta = Meta::new(1, items.len() as i64, items.len() as i64);
    Ok(Json(ApiResponse::success(
        "Messages",
        UserMessageList { items },
        Some(meta),
    )))
}

#[utoipa::path(
    get,
    path = "/api/messages/{id}",
    params(("id" = Uuid, Path, description = "Message ID")),
    responses(
        (status = 200, description = "Get a message (receiver or admin)", body = ApiResponse<UserMessage>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Message not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Messages"
)]
pub async fn get_message(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<UserMessage>>> {
    let message: Option<UserMessage> = sqlx::query_as("SELECT * FROM user_messages WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    let message = message.ok_or_else(|| AppError::NotFound("Message not found".into()))?;

    if user.role != ROLE_ADMIN && message.receiver_id != user.user_id {
        return Err(AppError::Forbidden);
    }

    Ok(Json(ApiResponse::success("Message", message, None)))
}

// Only the recipient can mark their own messages; ids belonging to other
// users are silently skipped and the count reflects that.
#[utoipa::path(
    post,
    path = "/api/messages/read",
    request_body = MarkReadRequest,
    responses(
        (status = 200, description = "Mark own messages as read", body = ApiResponse<MarkReadResponse>)
    ),
    security(("bearer_auth" = [])),
    tag = "Messages"
)]
pub async fn mark_read(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<MarkReadRequest>,
) -> AppResult<Json<ApiResponse<MarkReadResponse>>> {
    if payload.message_ids.is_empty() {
        return Err(AppError::BadRequest("No message ids given".into()));
    }

    let result = sqlx::query(
        "UPDATE user_messages SET is_read = TRUE, updated_at = now() WHERE id = ANY($1) AND receiver_id = $2",
    )
    .bind(&payload.message_ids)
    .bind(user.user_id)
    .execute(&state.pool)
    .await?;

    Ok(Json(ApiResponse::success(
        "Messages marked as read",
        MarkReadResponse {
            modified: result.rows_affected(),
        },
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    put,
    path = "/api/messages/{id}",
    request_body = UpdateMessageRequest,
    params(("id" = Uuid, Path, description = "Message ID")),
    responses(
        (status = 200, description = "Edit a sent message (admin only)", body = ApiResponse<UserMessage>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Message not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Messages"
)]
pub async fn update_message(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateMessageRequest>,
) -> AppResult<Json<ApiResponse<UserMessage>>> {
    ensure_admin(&user)?;

    let current: Option<UserMessage> = sqlx::query_as("SELECT * FROM user_messages WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    let current = current.ok_or_else(|| AppError::NotFound("Message not found".into()))?;

    let content = match payload.content {
        Some(content) => {
            let content = content.trim().to_string();
            if content.is_empty() {
                return Err(AppError::BadRequest("Message content is required".into()));
            }
            content
        }
        None => current.content,
    };

    let message: UserMessage = sqlx::query_as(
        "UPDATE user_messages SET content = $2, kind = $3, updated_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(current.id)
    .bind(&content)
    .bind(payload.kind.unwrap_or(current.kind))
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(ApiResponse::success(
        "Message updated",
        message,
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    delete,
    path = "/api/messages/{id}",
    params(("id" = Uuid, Path, description = "Message ID")),
    responses(
        (status = 200, description = "Delete a message (admin only)"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Message not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Messages"
)]
pub async fn delete_message(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    ensure_admin(&user)?;

    let result = sqlx::query("DELETE FROM user_messages WHERE id = $1")
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
