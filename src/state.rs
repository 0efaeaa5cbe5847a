use crate::{config::AppConfig, db::DbPool, mailer::Mailer};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: AppConfig,
    pub mailer: Mailer,
}
