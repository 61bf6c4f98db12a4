use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::database::sql::SqlError;
use crate::filter::FilterError;

/// Errors from storage-backed operations
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error(transparent)]
    Update(#[from] SqlError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Postgres unique_violation
const UNIQUE_VIOLATION: &str = "23505";
/// Postgres foreign_key_violation
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Constraint failures an insert reports back as a client error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    Unique,
    ForeignKey,
}

impl Violation {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            UNIQUE_VIOLATION => Some(Violation::Unique),
            FOREIGN_KEY_VIOLATION => Some(Violation::ForeignKey),
            _ => None,
        }
    }
}

impl DatabaseError {
    /// Map constraint failures on insert: a unique violation becomes
    /// `Duplicate(duplicate)`, a foreign-key violation becomes `NotFound`
    /// with the message `missing` builds from the violated constraint's name.
    /// Anything else passes through.
    pub fn from_insert(
        err: sqlx::Error,
        duplicate: impl Into<String>,
        missing: impl FnOnce(Option<&str>) -> String,
    ) -> Self {
        let violation = match &err {
            sqlx::Error::Database(db) => db
                .code()
                .as_deref()
                .and_then(Violation::from_code)
                .map(|v| (v, db.constraint().map(str::to_string))),
            _ => None,
        };

        match violation {
            Some((Violation::Unique, _)) => DatabaseError::Duplicate(duplicate.into()),
            Some((Violation::ForeignKey, constraint)) => {
                DatabaseError::NotFound(missing(constraint.as_deref()))
            }
            None => DatabaseError::Sqlx(err),
        }
    }
}

/// Owns construction of the shared connection pool
pub struct DatabaseManager;

impl DatabaseManager {
    pub async fn connect(url: &str, config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        info!("Created database pool ({} max connections)", config.max_connections);
        Ok(pool)
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }
}
