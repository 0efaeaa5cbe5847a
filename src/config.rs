use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    /// Public URL used to build email verification links.
    pub base_url: String,
    pub smtp: Option<SmtpConfig>,
    /// Operator inbox that receives new-order notices.
    pub store_email: String,
    pub store_name: String,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let jwt_secret = env::var("JWT_SECRET")?;
        let base_url = env::var("BASE_URL").unwrap_or_else(|_| format!("http://{host}:{port}"));
        let store_email =
            env::var("STORE_EMAIL").unwrap_or_else(|_| "orders@notervo.example".to_string());
        let store_name = env::var("STORE_NAME").unwrap_or_else(|_| "Notervo".to_string());

        // Email delivery is optional; without SMTP_HOST the mailer only logs.
        let smtp = match env::var("SMTP_HOST") {
            Ok(smtp_host) => Some(SmtpConfig {
                host: smtp_host,
                port: env::var("SMTP_PORT")
                    .ok()
                    .and_then(|p| p.parse::<u16>().ok())
                    .unwrap_or(587),
                username: env::var("SMTP_USERNAME").unwrap_or_default(),
                password: env::var("SMTP_PASSWORD").unwrap_or_default(),
                from_address: env::var("SMTP_FROM").unwrap_or_else(|_| store_email.clone()),
            }),
            Err(_) => None,
        };

        Ok(Self {
            database_url,
            host,
            port,
            jwt_secret,
            base_url,
            smtp,
            store_email,
            store_name,
        })
    }
}
