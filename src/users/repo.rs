use sqlx::{PgPool, Postgres, QueryBuilder};
use time::Date;
use uuid::Uuid;

use crate::auth::claims::Role;
use crate::auth::repo::{User, USER_COLUMNS};
use crate::error::ApiError;
use crate::pagination::PageParams;

#[derive(Debug, Clone)]
pub struct UserFilter {
    pub search: Option<String>,
    pub role: Option<Role>,
}

fn apply_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &UserFilter) {
    if let Some(role) = filter.role {
        qb.push(" AND role = ").push_bind(role);
    }
    if let Some(search) = filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        let pat = format!("%{search}%");
        qb.push(" AND (name ILIKE ")
            .push_bind(pat.clone())
            .push(" OR email ILIKE ")
            .push_bind(pat.clone())
            .push(" OR phone ILIKE ")
            .push_bind(pat)
            .push(")");
    }
}

pub async fn list(
    db: &PgPool,
    filter: &UserFilter,
    page: &PageParams,
) -> Result<(Vec<User>, i64), ApiError> {
    let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM users WHERE TRUE");
    apply_filters(&mut count_qb, filter);
    let total: i64 = count_qb.build_query_scalar().fetch_one(db).await?;

    let mut qb = QueryBuilder::new(format!("SELECT {USER_COLUMNS} FROM users WHERE TRUE"));
    apply_filters(&mut qb, filter);
    qb.push(" ORDER BY created_at DESC LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset());

    let rows = qb.build_query_as::<User>().fetch_all(db).await?;
    Ok((rows, total))
}

/// Invited users carry no password hash until they set one themselves.
pub async fn create_invited(
    db: &PgPool,
    name: &str,
    email: &str,
    role: Role,
    phone: Option<&str>,
) -> Result<User, ApiError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (name, email, role, phone) \
         VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
    ))
    .bind(name)
    .bind(email)
    .bind(role)
    .bind(phone)
    .fetch_one(db)
    .await?;
    Ok(user)
}

/// Admin edit. Email is deliberately absent from the column list; it only
/// changes through the owner's own profile update.
pub async fn update(
    db: &PgPool,
    id: Uuid,
    name: &str,
    role: Role,
    phone: Option<&str>,
    birthday: Option<Date>,
) -> Result<Option<User>, ApiError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET name = $2, role = $3, phone = $4, birthday = $5, updated_at = now() \
         WHERE id = $1 RETURNING {USER_COLUMNS}"
    ))
    .bind(id)
    .bind(name)
    .bind(role)
    .bind(phone)
    .bind(birthday)
    .fetch_optional(db)
    .await?;
    Ok(user)
}

pub async fn delete(db: &PgPool, id: Uuid) -> Result<bool, ApiError> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn email_taken_by_other(db: &PgPool, id: Uuid, email: &str) -> Result<bool, ApiError> {
    let existing: Option<Uuid> = sqlx::query_scalar(
        "SELECT id FROM users WHERE lower(email) = lower($1) AND id <> $2 LIMIT 1",
    )
    .bind(email)
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(existing.is_some())
}

pub async fn update_profile(
    db: &PgPool,
    id: Uuid,
    name: &str,
    email: &str,
    image: Option<&str>,
    birthday: Option<Date>,
) -> Result<Option<User>, ApiError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET name = $2, email = $3, image = $4, birthday = $5, updated_at = now() \
         WHERE id = $1 RETURNING {USER_COLUMNS}"
    ))
    .bind(id)
    .bind(name)
    .bind(email)
    .bind(image)
    .bind(birthday)
    .fetch_optional(db)
    .await?;
    Ok(user)
}

pub async fn set_password(db: &PgPool, id: Uuid, password_hash: &str) -> Result<(), ApiError> {
    sqlx::query("UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1")
        .bind(id)
        .bind(password_hash)
        .execute(db)
        .await?;
    Ok(())
}
