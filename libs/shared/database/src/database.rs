//! PostgreSQL connection pooling, health checks and schema setup.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use shared_config::AppConfig;

use crate::error::{StoreError, StoreResult};

const SCHEMA: &str = include_str!("../migrations/0001_scheduling.sql");

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub database_url: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    /// `None` when no database is configured.
    pub fn from_app_config(config: &AppConfig) -> Option<Self> {
        config.database_url.as_ref().map(|url| Self {
            database_url: url.clone(),
            max_connections: config.database_max_connections,
        })
    }
}

pub async fn init_pool(config: &DatabaseConfig) -> StoreResult<PgPool> {
    let options = config
        .database_url
        .parse()
        .map_err(|e| StoreError::Configuration(format!("Invalid database URL: {}", e)))?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await
        .map_err(StoreError::Connection)?;

    info!("Database pool initialized with {} connections", config.max_connections);
    Ok(pool)
}

pub async fn health_check(pool: &PgPool) -> StoreResult<bool> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(StoreError::Query)?;

    Ok(true)
}

/// Creates the tables and indexes if they do not exist yet.
pub async fn run_migrations(pool: &PgPool) -> StoreResult<()> {
    sqlx::raw_sql(SCHEMA)
        .execute(pool)
        .await
        .map_err(|e| StoreError::Migration(e.to_string()))?;

    info!("Database schema is up to date");
    Ok(())
}
