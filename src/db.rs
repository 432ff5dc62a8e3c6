use anyhow::{Context, Result, bail};
use sqlx::MySqlPool;
use tracing::info;

use crate::state::AppState;
use crate::store::MySqlStore;

pub async fn init_db(database_url: &str) -> Result<MySqlPool> {
    MySqlPool::connect(database_url)
        .await
        .context("Failed to connect to database")
}

/// Picks the store from the URL scheme: `mysql://` or `memory://`.
pub async fn init_state(database_url: &str) -> Result<AppState> {
    if database_url.starts_with("memory://") {
        info!("Using in-memory store; data is lost on restart");
        return Ok(AppState::in_memory());
    }
    if database_url.starts_with("mysql://") {
        let pool = init_db(database_url).await?;
        info!("Connected to MySQL");
        return Ok(AppState::mysql(MySqlStore::new(pool)));
    }
    bail!("DATABASE_URL must start with mysql:// or memory://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn memory_url_needs_no_database() {
        let state = init_state("memory://").await.unwrap();
        assert!(state.employees.list().await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn unknown_scheme_is_rejected() {
        assert!(init_state("sqlite://db.sqlite3").await.is_err());
    }
}
