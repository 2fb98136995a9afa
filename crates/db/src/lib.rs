//! PostgreSQL persistence for the enrollment lifecycle.
//!
//! Layout follows the workspace convention: `models` holds row structs and
//! DTOs, `repositories` holds zero-sized structs with async methods taking
//! `&PgPool`. Every state-changing operation runs inside a single
//! transaction that acquires its governing row lock first.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;

pub mod config;
pub mod error;
pub mod models;
pub mod repositories;

pub use config::DbConfig;
pub use error::RegistrarError;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from the given configuration.
pub async fn create_pool(config: &DbConfig) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(&config.url)
        .await
}

/// Cheap connectivity probe for deploy checks and the bootstrap test.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
