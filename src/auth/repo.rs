use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::auth::claims::Role;
use crate::error::ApiError;

pub const USER_COLUMNS: &str =
    "id, name, email, password_hash, role, phone, birthday, image, created_at";

/// User record. `password_hash` is `None` for admin-invited users who have
/// not set a password yet; such users cannot authenticate.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub role: Role,
    pub phone: Option<String>,
    pub birthday: Option<Date>,
    pub image: Option<String>,
    pub created_at: OffsetDateTime,
}

impl User {
    /// Match a user by name or email, case-insensitively.
    pub async fn find_by_identifier(db: &PgPool, identifier: &str) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE lower(name) = lower($1) OR lower(email) = lower($1)"
        ))
        .bind(identifier)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<User>, ApiError> {
        let user =
            sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(db)
                .await?;
        Ok(user)
    }

    /// Registration pre-check: is either the name or the email already taken?
    pub async fn name_or_email_taken(
        db: &PgPool,
        name: &str,
        email: &str,
    ) -> Result<bool, ApiError> {
        let existing: Option<Uuid> = sqlx::query_scalar(
            "SELECT id FROM users \
             WHERE lower(name) = lower($1) OR lower(email) = lower($2) LIMIT 1",
        )
        .bind(name)
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(existing.is_some())
    }

    pub async fn count(db: &PgPool) -> Result<i64, ApiError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(db)
            .await?;
        Ok(count)
    }

    pub async fn create(
        db: &PgPool,
        name: &str,
        email: &str,
        password_hash: Option<&str>,
        role: Role,
    ) -> Result<User, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, email, password_hash, role) \
             VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        ))
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .fetch_one(db)
        .await?;
        Ok(user)
    }
}
