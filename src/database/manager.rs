use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Errors from the persistence layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Query error: {0}")]
    QueryError(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Build the process-wide connection pool from DATABASE_URL. Constructed
/// once at startup and handed to handlers through the application state.
pub async fn connect_pool() -> Result<PgPool, DatabaseError> {
    let database_url =
        std::env::var("DATABASE_URL").map_err(|_| DatabaseError::ConfigMissing("DATABASE_URL"))?;

    // Parse up front so a malformed URL fails fast with a clear error
    url::Url::parse(&database_url).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;

    let db_config = &crate::config::config().database;
    let pool = PgPoolOptions::new()
        .max_connections(db_config.max_connections)
        .acquire_timeout(Duration::from_secs(db_config.connect_timeout_secs))
        .connect(&database_url)
        .await?;

    info!("Created database pool");
    Ok(pool)
}

/// Pings the pool to ensure connectivity
pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
