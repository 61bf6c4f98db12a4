use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::database::manager::DatabaseError;

/// Read-only view of an account; registration and credentials live elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub username: String,
    pub email: String,
    pub is_admin: bool,
}

pub async fn get(pool: &PgPool, username: &str) -> Result<User, DatabaseError> {
    sqlx::query_as::<_, User>(
        "SELECT username, email, is_admin
         FROM users
         WHERE username = $1",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound(format!("No user: {}", username)))
}
