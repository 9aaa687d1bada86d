use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// Unique index on `LOWER(email)` from the users migration
const EMAIL_UNIQUE_INDEX: &str = "idx_users_email";

/// Creates and configures a PostgreSQL connection pool
///
/// # Arguments
/// * `database_url` - PostgreSQL connection string
///
/// # Returns
/// * `Result<PgPool>` - Configured connection pool or error
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    tracing::debug!("Creating database connection pool");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(3))
        .connect(database_url)
        .await?;

    tracing::info!("Database connection pool created successfully");
    Ok(pool)
}

/// Errors surfaced by the user and post stores
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Unique email constraint violated
    #[error("email already exists")]
    DuplicateEmail,

    /// Any other unique constraint violated
    #[error("unique constraint {0} violated")]
    Conflict(String),

    /// The store could not be reached (pool exhausted, connection refused, ...)
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Any other database failure
    #[error("database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                match db_err.constraint() {
                    Some(EMAIL_UNIQUE_INDEX) => StoreError::DuplicateEmail,
                    Some(constraint) => StoreError::Conflict(constraint.to_string()),
                    None => StoreError::Conflict(db_err.message().to_string()),
                }
            }
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => StoreError::Unavailable(err.to_string()),
            _ => StoreError::Database(err.to_string()),
        }
    }
}
