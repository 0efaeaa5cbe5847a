use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use rand::{Rng, distributions::Alphanumeric};
use uuid::Uuid;

use crate::{
    dto::auth::{Claims, LoginRequest, LoginResponse, RegisterRequest, UserInfo},
    error::{AppError, AppResult},
    models::{ROLE_USER, User},
    response::{ApiResponse, Meta},
    state::AppState,
};

const VERIFICATION_TOKEN_LEN: usize = 32;

/// At least 8 chars with an uppercase letter, a lowercase letter and a digit.
pub fn is_valid_password(password: &str) -> bool {
    password.chars().count() >= 8
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_digit())
}

/// International format: `+` or `00` prefix, then 8-15 digits not starting
/// with zero.
pub fn is_valid_phone(phone: &str) -> bool {
    let digits = match phone.strip_prefix('+') {
        Some(rest) => rest,
        None => match phone.strip_prefix("00") {
            Some(rest) => rest,
            None => return false,
        },
    };
    let bytes = digits.as_bytes();
    (8..=15).contains(&bytes.len())
        && bytes[0] != b'0'
        && bytes.iter().all(|b| b.is_ascii_digit())
}

fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

fn generate_verification_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(VERIFICATION_TOKEN_LEN)
        .map(char::from)
        .collect()
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<UserInfo>> {
    let RegisterRequest {
        username,
        phone,
        email,
        password,
    } = payload;

    let username = username.trim().to_string();
    if username.is_empty() {
        return Err(AppError::BadRequest("Username is required".into()));
    }

    if !is_valid_password(&password) {
        return Err(AppError::BadRequest(
            "Password must be at least 8 characters, include uppercase, lowercase letters, and numbers".into(),
        ));
    }

    let phone = phone.trim().to_string();
    if !is_valid_phone(&phone) {
        return Err(AppError::BadRequest(
            "Invalid international phone number".into(),
        ));
    }

    let email = email.trim().to_lowercase();
    if !is_plausible_email(&email) {
        return Err(AppError::BadRequest("Invalid email address".into()));
    }

    let phone_taken: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE phone = $1")
        .bind(&phone)
        .fetch_optional(&state.pool)
        .await?;
    if phone_taken.is_some() {
        return Err(AppError::Conflict("Phone number already registered".into()));
    }

    let email_taken: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(&state.pool)
        .await?;
    if email_taken.is_some() {
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let password_hash = hash_password(&password)?;
    let verification_token = generate_verification_token();

    let user: User = sqlx::query_as(
        r#"
        INSERT INTO users (id, username, phone, email, password_hash, role, is_verified, verification_token)
        VALUES ($1, $2, $3, $4, $5, $6, FALSE, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&username)
    .bind(&phone)
    .bind(&email)
    .bind(&password_hash)
    .bind(ROLE_USER)
    .bind(&verification_token)
    .fetch_one(&state.pool)
    .await?;

    let verification_url = format!(
        "{}/api/auth/verify-email?token={}",
        state.config.base_url, verification_token
    );
    state.mailer.spawn_send(
        &email,
        "Verify Your Email Address",
        &format!(
            "Hi {username},\n\nWelcome to {store}! Please confirm your email address by opening:\n\n{verification_url}\n\nIf you did not create this account you can ignore this message.\n",
            store = state.mailer.store_name(),
        ),
    );

    Ok(ApiResponse::success(
        "Registration successful. Please check your email to verify your account before logging in.",
        UserInfo::from(&user),
        Some(Meta::empty()),
    ))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest {
        identifier,
        password,
    } = payload;
    let identifier = identifier.trim();

    let mut user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE phone = $1")
        .bind(identifier)
        .fetch_optional(&state.pool)
        .await?;
    let mut matched_by_email = false;
    if user.is_none() {
        user = sqlx::query_as("SELECT * FROM users WHERE email = $1")
            .bind(identifier.to_lowercase())
            .fetch_optional(&state.pool)
            .await?;
        matched_by_email = user.is_some();
    }

    let user = match user {
        Some(u) => u,
        None => return Err(AppError::NotFound("User not found".into())),
    };

    if matched_by_email && !user.is_verified {
        return Err(AppError::Unauthorized(
            "Please verify your email address before logging in with email".into(),
        ));
    }

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(AppError::Unauthorized("Invalid password".into()));
    }

    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(24))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user.id.to_string(),
        role: user.role.clone(),
        exp: expiration.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(state.config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;

    let resp = LoginResponse {
        token: format!("Bearer {token}"),
        user: UserInfo::from(&user),
    };

    Ok(ApiResponse::success("Logged in", resp, Some(Meta::empty())))
}

pub enum VerificationOutcome {
    MissingToken,
    InvalidToken,
    /// Carries the verified user's username for the success page.
    Verified(String),
}

pub async fn verify_email(
    state: &AppState,
    token: Option<String>,
) -> AppResult<VerificationOutcome> {
    let token = match token.as_deref().map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => return Ok(VerificationOutcome::MissingToken),
    };

    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE verification_token = $1")
        .bind(&token)
        .fetch_optional(&state.pool)
        .await?;

    let user = match user {
        Some(u) => u,
        None => return Ok(VerificationOutcome::InvalidToken),
    };

    sqlx::query(
        "UPDATE users SET is_verified = TRUE, verification_token = NULL, updated_at = now() WHERE id = $1",
    )
    .bind(user.id)
    .execute(&state.pool)
    .await?;

    Ok(VerificationOutcome::Verified(user.username))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_rules() {
        assert!(is_valid_password("Abcdef12"));
        assert!(!is_valid_password("abcdef12"));
        assert!(!is_valid_password("ABCDEF12"));
        assert!(!is_valid_password("Abcdefgh"));
        assert!(!is_valid_password("Ab1"));
    }

    #[test]
    fn phone_rules() {
        assert!(is_valid_phone("+201234567890"));
        assert!(is_valid_phone("00201234567890"));
        assert!(!is_valid_phone("01234567890"));
        assert!(!is_valid_phone("+0123456789"));
        assert!(!is_valid_phone("+2012345"));
        assert!(!is_valid_phone("+20123456789012345"));
        assert!(!is_valid_phone("+2012a4567890"));
    }

    #[test]
    fn email_plausibility() {
        assert!(is_plausible_email("mona@example.com"));
        assert!(!is_plausible_email("mona@example"));
        assert!(!is_plausible_email("mona.example.com"));
        assert!(!is_plausible_email("@example.com"));
    }

    #[test]
    fn verification_tokens_are_alphanumeric() {
        let token = generate_verification_token();
        assert_eq!(token.len(), VERIFICATION_TOKEN_LEN);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
