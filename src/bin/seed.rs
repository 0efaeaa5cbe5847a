use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use notervo_api::{config::AppConfig, db::create_pool};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let admin_id = ensure_user(&pool, "Admin", "+201000000001", "Admin1234", "admin").await?;
    let user_id = ensure_user(&pool, "Mona", "+201000000002", "User12345", "user").await?;
    seed_products(&pool).await?;
    seed_settings(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    username: &str,
    phone: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, username, phone, password_hash, role, is_verified)
        VALUES ($1, $2, $3, $4, $5, TRUE)
        ON CONFLICT (phone) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .bind(phone)
    .bind(password_hash)
    .bind(role)
    .fetch_optional(pool)
    .await?;

    // If user already exists, fetch id
    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE phone = $1")
                .bind(phone)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured user {username} (role={role})");
    Ok(user_id)
}

async fn seed_products(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let products = vec![
        (
            "Dotted Notebook A5",
            "96 pages of 120gsm dotted paper",
            14.99,
            10.0,
            "percentage",
        ),
        (
            "Hardcover Journal",
            "Linen hardcover journal with ribbon bookmark",
            24.50,
            0.0,
            "percentage",
        ),
        (
            "Weekly Planner 2026",
            "Undated weekly planner, lies flat",
            19.00,
            3.0,
            "fixed",
        ),
        (
            "Sticky Notes Set",
            "Six pads in muted colors",
            6.75,
            0.0,
            "percentage",
        ),
    ];

    for (title, desc, price, discount, discount_type) in products {
        let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE title = $1")
            .bind(title)
            .fetch_optional(pool)
            .await?;
        if exists.is_some() {
            continue;
        }

        sqlx::query(
            r#"
            INSERT INTO products (id, title, description, price, discount, discount_type, in_stock, stock_quantity)
            VALUES ($1, $2, $3, $4, $5, $6, TRUE, 50)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(title)
        .bind(desc)
        .bind(price)
        .bind(discount)
        .bind(discount_type)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}

async fn seed_settings(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM website_settings LIMIT 1")
        .fetch_optional(pool)
        .await?;
    if exists.is_none() {
        sqlx::query(
            "INSERT INTO website_settings (id, site_name, site_tagline) VALUES ($1, 'Notervo', 'Notebooks that keep up')",
        )
        .bind(Uuid::new_v4())
        .execute(pool)
        .await?;
    }

    println!("Seeded settings");
    Ok(())
}
