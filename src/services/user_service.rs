use sqlx::types::Json;
use uuid::Uuid;

use crate::{
    address::{self, ShippingAddress},
    dto::users::{DeleteUserRequest, UpdateUserRequest, UserList},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{ROLE_ADMIN, User},
    response::{ApiResponse, Meta},
    services::auth_service,
    state::AppState,
};

pub async fn find_user(state: &AppState, id: Uuid) -> AppResult<User> {
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    user.ok_or_else(|| AppError::NotFound("User not found".into()))
}

/// Current user's profile. Seeds an empty address book from past orders the
/// first time it is read.
pub async fn get_profile(state: &AppState, auth: &AuthUser) -> AppResult<ApiResponse<User>> {
    let mut user = find_user(state, auth.user_id).await?;

    if user.shipping_addresses.0.is_empty()
        && let Some(migrated) = collect_addresses_from_orders(state, user.id).await?
    {
        sqlx::query("UPDATE users SET shipping_addresses = $2, updated_at = now() WHERE id = $1")
            .bind(user.id)
            .bind(Json(&migrated))
            .execute(&state.pool)
            .await?;
        user.shipping_addresses = Json(migrated);
    }

    Ok(ApiResponse::success(
        "User retrieved successfully",
        user,
        Some(Meta::empty()),
    ))
}

/// Distinct complete shipping addresses from the user's orders, newest first,
/// first entry default. None when the orders yield nothing usable.
async fn collect_addresses_from_orders(
    state: &AppState,
    user_id: Uuid,
) -> AppResult<Option<Vec<ShippingAddress>>> {
    let rows: Vec<(Json<ShippingAddress>,)> = sqlx::query_as(
        "SELECT shipping_address FROM orders WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(seed_address_book(
        rows.into_iter().map(|(Json(address),)| address),
    ))
}

/// Dedup pass over order addresses, in the order given (callers pass newest
/// first). Incomplete entries are skipped, identity duplicates collapse onto
/// their first occurrence, and the first surviving entry becomes the default.
fn seed_address_book(
    candidates: impl IntoIterator<Item = ShippingAddress>,
) -> Option<Vec<ShippingAddress>> {
    let mut addresses: Vec<ShippingAddress> = Vec::new();
    let mut seen: Vec<String> = Vec::new();
    for mut candidate in candidates {
        candidate.is_default = false;
        if !address::is_complete(&candidate) {
            continue;
        }
        let key = address::identity(&candidate);
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        addresses.push(candidate);
    }

    if addresses.is_empty() {
        return None;
    }
    addresses[0].is_default = true;
    Some(addresses)
}

pub async fn list_users(state: &AppState, auth: &AuthUser) -> AppResult<ApiResponse<UserList>> {
    crate::middleware::auth::ensure_admin(auth)?;

    let items: Vec<User> = sqlx::query_as("SELECT * FROM users ORDER BY created_at DESC")
        .fetch_all(&state.pool)
        .await?;

    let meta = Meta::new(1, items.len() as i64, items.len() as i64);
    Ok(ApiResponse::success(
        "Users fetched successfully",
        UserList { items },
        Some(meta),
    ))
}

pub async fn get_user_by_id(
    state: &AppState,
    auth: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<User>> {
    crate::middleware::auth::ensure_admin(auth)?;
    let user = find_user(state, id).await?;
    Ok(ApiResponse::success(
        "User retrieved successfully",
        user,
        Some(Meta::empty()),
    ))
}

/// Self-service profile update. Role, email and verification state are not
/// client-writable here.
pub async fn update_me(
    state: &AppState,
    auth: &AuthUser,
    payload: UpdateUserRequest,
) -> AppResult<ApiResponse<User>> {
    let current = find_user(state, auth.user_id).await?;

    let username = match payload.username {
        Some(name) => {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(AppError::BadRequest("Username is required".into()));
            }
            name
        }
        None => current.username,
    };

    let phone = match payload.phone {
        Some(phone) => {
            let phone = phone.trim().to_string();
            if !auth_service::is_valid_phone(&phone) {
                return Err(AppError::BadRequest(
                    "Invalid international phone number".into(),
                ));
            }
            phone
        }
        None => current.phone,
    };

    let password_hash = match payload.password {
        Some(password) => {
            if !auth_service::is_valid_password(&password) {
                return Err(AppError::BadRequest(
                    "Password must be at least 8 characters, include uppercase, lowercase letters, and numbers".into(),
                ));
            }
            auth_service::hash_password(&password)?
        }
        None => current.password_hash,
    };

    let user: User = sqlx::query_as(
        r#"
        UPDATE users
        SET username = $2, phone = $3, password_hash = $4, updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(auth.user_id)
    .bind(&username)
    .bind(&phone)
    .bind(&password_hash)
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::success(
        "User updated successfully",
        user,
        Some(Meta::empty()),
    ))
}

pub async fn delete_user(
    state: &AppState,
    auth: &AuthUser,
    payload: DeleteUserRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    crate::middleware::auth::ensure_admin(auth)?;

    if payload.user_id == auth.user_id {
        return Err(AppError::BadRequest(
            "You cannot delete your own account".into(),
        ));
    }

    let target = find_user(state, payload.user_id).await?;
    if target.role == ROLE_ADMIN {
        return Err(AppError::Forbidden);
    }

    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(target.id)
        .execute(&state.pool)
        .await?;

    Ok(ApiResponse::success(
        "User deleted successfully",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_address(full_name: &str, city: &str, is_default: bool) -> ShippingAddress {
        ShippingAddress {
            full_name: full_name.to_string(),
            phone: "+201234567890".to_string(),
            city: city.to_string(),
            street: "5 Tahrir Sq".to_string(),
            notes: String::new(),
            is_default,
        }
    }

    #[test]
    fn seed_deduplicates_and_defaults_newest() {
        let seeded = seed_address_book([
            order_address("Mona Adel", "Cairo", false),
            order_address("MONA  ADEL", "cairo", true),
            order_address("Mona Adel", "Giza", false),
        ])
        .unwrap();

        assert_eq!(seeded.len(), 2);
        // Newest occurrence of each identity wins and carries the default,
        // regardless of the flags stored on the orders.
        assert_eq!(seeded[0].full_name, "Mona Adel");
        assert_eq!(seeded[0].city, "Cairo");
        assert!(seeded[0].is_default);
        assert!(!seeded[1].is_default);
    }

    #[test]
    fn seed_skips_incomplete_addresses() {
        let mut no_street = order_address("Mona Adel", "Cairo", false);
        no_street.street = "  ".to_string();

        let seeded =
            seed_address_book([no_street, order_address("Mona Adel", "Giza", false)]).unwrap();
        assert_eq!(seeded.len(), 1);
        assert_eq!(seeded[0].city, "Giza");
        assert!(seeded[0].is_default);
    }

    #[test]
    fn seed_yields_nothing_from_unusable_orders() {
        let empty = ShippingAddress {
            is_default: true,
            ..ShippingAddress::default()
        };
        assert!(seed_address_book([empty]).is_none());
        assert!(seed_address_book([]).is_none());
    }
}
