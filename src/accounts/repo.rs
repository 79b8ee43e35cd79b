use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::ApiError;
use crate::pagination::PageParams;
use crate::scope::OwnerScope;

#[derive(Debug, Clone, FromRow)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_by: Uuid,
    pub created_at: OffsetDateTime,
}

/// Listing row joined with the owner for presentation.
#[derive(Debug, Clone, FromRow)]
pub struct AccountWithOwner {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_by: Uuid,
    pub created_at: OffsetDateTime,
    pub owner_name: String,
    pub owner_email: String,
}

/// Compiled-once filter for the list query (scope is decided by the caller
/// from claims, never here).
#[derive(Debug, Clone)]
pub struct AccountFilter {
    pub scope: OwnerScope,
    pub search: Option<String>,
}

fn apply_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &AccountFilter) {
    if let Some(owner) = filter.scope.owner() {
        qb.push(" AND a.created_by = ").push_bind(owner);
    }
    if let Some(search) = filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        let pat = format!("%{search}%");
        qb.push(" AND (a.name ILIKE ")
            .push_bind(pat.clone())
            .push(" OR a.email ILIKE ")
            .push_bind(pat.clone())
            .push(" OR a.phone ILIKE ")
            .push_bind(pat.clone())
            .push(" OR a.address ILIKE ")
            .push_bind(pat.clone())
            .push(" OR u.name ILIKE ")
            .push_bind(pat.clone())
            .push(" OR u.email ILIKE ")
            .push_bind(pat)
            .push(")");
    }
}

pub async fn list(
    db: &PgPool,
    filter: &AccountFilter,
    page: &PageParams,
) -> Result<(Vec<AccountWithOwner>, i64), ApiError> {
    let mut count_qb = QueryBuilder::new(
        "SELECT COUNT(*) FROM accounts a JOIN users u ON u.id = a.created_by WHERE TRUE",
    );
    apply_filters(&mut count_qb, filter);
    let total: i64 = count_qb.build_query_scalar().fetch_one(db).await?;

    let mut qb = QueryBuilder::new(
        "SELECT a.id, a.name, a.email, a.phone, a.address, a.created_by, a.created_at, \
         u.name AS owner_name, u.email AS owner_email \
         FROM accounts a JOIN users u ON u.id = a.created_by WHERE TRUE",
    );
    apply_filters(&mut qb, filter);
    qb.push(" ORDER BY a.created_at DESC LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset());

    let rows = qb
        .build_query_as::<AccountWithOwner>()
        .fetch_all(db)
        .await?;
    Ok((rows, total))
}

pub async fn find(db: &PgPool, id: Uuid) -> Result<Option<Account>, ApiError> {
    let account = sqlx::query_as::<_, Account>(
        "SELECT id, name, email, phone, address, created_by, created_at \
         FROM accounts WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(account)
}

pub async fn create(
    db: &PgPool,
    owner: Uuid,
    name: &str,
    email: &str,
    phone: Option<&str>,
    address: Option<&str>,
) -> Result<Account, ApiError> {
    let account = sqlx::query_as::<_, Account>(
        "INSERT INTO accounts (name, email, phone, address, created_by) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING id, name, email, phone, address, created_by, created_at",
    )
    .bind(name)
    .bind(email)
    .bind(phone)
    .bind(address)
    .bind(owner)
    .fetch_one(db)
    .await?;
    Ok(account)
}

pub async fn update(db: &PgPool, account: &Account) -> Result<Account, ApiError> {
    let updated = sqlx::query_as::<_, Account>(
        "UPDATE accounts SET name = $2, email = $3, phone = $4, address = $5, updated_at = now() \
         WHERE id = $1 \
         RETURNING id, name, email, phone, address, created_by, created_at",
    )
    .bind(account.id)
    .bind(&account.name)
    .bind(&account.email)
    .bind(&account.phone)
    .bind(&account.address)
    .fetch_one(db)
    .await?;
    Ok(updated)
}

pub async fn delete(db: &PgPool, id: Uuid) -> Result<(), ApiError> {
    sqlx::query("DELETE FROM accounts WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}
