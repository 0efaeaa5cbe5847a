use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::Html,
    routing::{get, post},
};

use crate::{
    dto::auth::{LoginRequest, LoginResponse, RegisterRequest, UserInfo, VerifyEmailQuery},
    error::AppResult,
    response::ApiResponse,
    services::auth_service::{self, VerificationOutcome},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/verify-email", get(verify_email))
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Register user", body = ApiResponse<UserInfo>),
        (status = 400, description = "Invalid registration data"),
        (status = 409, description = "Phone or email already registered")
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<UserInfo>>)> {
    let resp = auth_service::register_user(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login with phone or email", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Invalid credentials or unverified email")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let resp = auth_service::login_user(&state, payload).await?;
    Ok(Json(resp))
}

// The link lands in an email client, so the response is a plain HTML page
// rather than the JSON envelope.
#[utoipa::path(
    get,
    path = "/api/auth/verify-email",
    params(("token" = Option<String>, Query, description = "Verification token from the email")),
    responses(
        (status = 200, description = "Verification result page", content_type = "text/html")
    ),
    tag = "Auth"
)]
pub async fn verify_email(
    State(state): State<AppState>,
    Query(query): Query<VerifyEmailQuery>,
) -> AppResult<(StatusCode, Html<String>)> {
    let outcome = auth_service::verify_email(&state, query.token).await?;
    let (status, title, message) = match outcome {
        VerificationOutcome::MissingToken => (
            StatusCode::BAD_REQUEST,
            "Verification failed",
            "The verification link is missing its token.".to_string(),
        ),
        VerificationOutcome::InvalidToken => (
            StatusCode::BAD_REQUEST,
            "Verification failed",
            "This verification link is invalid or was already used.".to_string(),
        ),
        VerificationOutcome::Verified(username) => (
            StatusCode::OK,
            "Email verified",
            format!("Thanks {username}, your email address is now verified. You can log in."),
        ),
    };

    let page = format!(
        "<!DOCTYPE html><html><head><title>{title}</title></head><body><h1>{title}</h1><p>{message}</p></body></html>"
    );
    Ok((status, Html(page)))
}
