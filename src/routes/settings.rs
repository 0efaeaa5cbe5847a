use axum::{
    Json, Router,
    extract::State,
    routing::get,
};
use sqlx::types::Json as SqlJson;
use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::settings::UpdateSettingsRequest,
    error::AppResult,
    middleware::auth::{AuthUser, ensure_admin},
    models::WebsiteSettings,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_settings).put(update_settings))
}

/// Single-row table. A missing row is seeded with defaults on first read.
async fn load_or_seed(pool: &DbPool) -> AppResult<WebsiteSettings> {
    if let Some(settings) =
        sqlx::query_as::<_, WebsiteSettings>("SELECT * FROM website_settings LIMIT 1")
            .fetch_optional(pool)
            .await?
    {
        return Ok(settings);
    }

    let settings = sqlx::query_as::<_, WebsiteSettings>(
        "INSERT INTO website_settings (id, site_name) VALUES ($1, 'Notervo') RETURNING *",
    )
    .bind(Uuid::new_v4())
    .fetch_one(pool)
    .await?;
    Ok(settings)
}

#[utoipa::path(
    get,
    path = "/api/settings",
    responses(
        (status = 200, description = "Public website settings", body = ApiResponse<WebsiteSettings>)
    ),
    tag = "Settings"
)]
pub async fn get_settings(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<WebsiteSettings>>> {
    let settings = load_or_seed(&state.pool).await?;
    Ok(Json(ApiResponse::success(
        "Settings",
        settings,
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    put,
    path = "/api/settings",
    request_body = UpdateSettingsRequest,
    responses(
        (status = 200, description = "Update website settings (admin only)", body = ApiResponse<WebsiteSettings>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn update_settings(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateSettingsRequest>,
) -> AppResult<Json<ApiResponse<WebsiteSettings>>> {
    ensure_admin(&user)?;

    let current = load_or_seed(&state.pool).await?;

    let settings = sqlx::query_as::<_, WebsiteSettings>(
        r#"
        UPDATE website_settings
        SET site_name = $2, site_description = $3, site_tagline = $4, logo = $5,
            logo_type = $6, font_family = $7, site_colors = $8, contact = $9,
            social_links = $10, about_us = $11, updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(current.id)
    .bind(payload.site_name.unwrap_or(current.site_name))
    .bind(payload.site_description.unwrap_or(current.site_description))
    .bind(payload.site_tagline.unwrap_or(current.site_tagline))
    .bind(payload.logo.or(current.logo))
    .bind(payload.logo_type.unwrap_or(current.logo_type))
    .bind(payload.font_family.unwrap_or(current.font_family))
    .bind(
        payload
            .site_colors
            .map(SqlJson)
            .unwrap_or(current.site_colors),
    )
    .bind(payload.contact.map(SqlJson).unwrap_or(current.contact))
    .bind(
        payload
            .social_links
            .map(SqlJson)
            .unwrap_or(current.social_links),
    )
    .bind(payload.about_us.unwrap_or(current.about_us))
    .fetch_one(&state.pool)
    .await?;

    Ok(Json(ApiResponse::success(
        "Settings updated",
        settings,
        Some(Meta::empty()),
    )))
}
