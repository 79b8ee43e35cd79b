use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::error::ApiError;
use crate::pagination::PageParams;
use crate::scope::OwnerScope;

/// Card-link lifecycle. `Billing` is the open state, `Canceled` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "card_link_status", rename_all = "lowercase")]
pub enum CardLinkStatus {
    Billing,
    Canceled,
}

const CL_COLUMNS: &str = "c.id, c.user_id, c.email, c.card_number, c.site, c.from_date, \
                          c.to_date, c.status, c.approved_by, c.approved_at, c.created_at";

#[derive(Debug, Clone, FromRow)]
pub struct CardLink {
    pub id: Uuid,
    pub user_id: Uuid,
    pub email: String,
    pub card_number: String,
    pub site: String,
    pub from_date: Date,
    pub to_date: Date,
    pub status: CardLinkStatus,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub struct CardLinkWithOwner {
    pub id: Uuid,
    pub user_id: Uuid,
    pub email: String,
    pub card_number: String,
    pub site: String,
    pub from_date: Date,
    pub to_date: Date,
    pub status: CardLinkStatus,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub owner_name: String,
    pub owner_email: String,
}

#[derive(Debug, Clone)]
pub struct CardLinkFilter {
    pub scope: OwnerScope,
    pub search: Option<String>,
    /// Date range applied to the billing start (`from_date`).
    pub from: Option<Date>,
    pub to: Option<Date>,
}

fn apply_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &CardLinkFilter) {
    if let Some(owner) = filter.scope.owner() {
        qb.push(" AND c.user_id = ").push_bind(owner);
    }
    if let Some(from) = filter.from {
        qb.push(" AND c.from_date >= ").push_bind(from);
    }
    if let Some(to) = filter.to {
        qb.push(" AND c.from_date <= ").push_bind(to);
    }
    if let Some(search) = filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        let pat = format!("%{search}%");
        qb.push(" AND (c.card_number ILIKE ")
            .push_bind(pat.clone())
            .push(" OR c.site ILIKE ")
            .push_bind(pat.clone())
            .push(" OR c.email ILIKE ")
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
    filter: &CardLinkFilter,
    page: &PageParams,
) -> Result<(Vec<CardLinkWithOwner>, i64), ApiError> {
    let mut count_qb = QueryBuilder::new(
        "SELECT COUNT(*) FROM card_links c JOIN users u ON u.id = c.user_id WHERE TRUE",
    );
    apply_filters(&mut count_qb, filter);
    let total: i64 = count_qb.build_query_scalar().fetch_one(db).await?;

    let mut qb = QueryBuilder::new(format!(
        "SELECT {CL_COLUMNS}, u.name AS owner_name, u.email AS owner_email \
         FROM card_links c JOIN users u ON u.id = c.user_id WHERE TRUE"
    ));
    apply_filters(&mut qb, filter);
    qb.push(" ORDER BY c.from_date DESC, c.created_at DESC LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset());

    let rows = qb
        .build_query_as::<CardLinkWithOwner>()
        .fetch_all(db)
        .await?;
    Ok((rows, total))
}

pub async fn find(db: &PgPool, id: Uuid) -> Result<Option<CardLinkWithOwner>, ApiError> {
    let cl = sqlx::query_as::<_, CardLinkWithOwner>(&format!(
        "SELECT {CL_COLUMNS}, u.name AS owner_name, u.email AS owner_email \
         FROM card_links c JOIN users u ON u.id = c.user_id WHERE c.id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(cl)
}

#[allow(clippy::too_many_arguments)]
pub async fn create(
    db: &PgPool,
    owner: Uuid,
    email: &str,
    card_number: &str,
    site: &str,
    from_date: Date,
    to_date: Date,
) -> Result<CardLink, ApiError> {
    let cl = sqlx::query_as::<_, CardLink>(
        "INSERT INTO card_links (user_id, email, card_number, site, from_date, to_date, status) \
         VALUES ($1, $2, $3, $4, $5, $6, 'billing') \
         RETURNING id, user_id, email, card_number, site, from_date, to_date, status, \
                   approved_by, approved_at, created_at",
    )
    .bind(owner)
    .bind(email)
    .bind(card_number)
    .bind(site)
    .bind(from_date)
    .bind(to_date)
    .fetch_one(db)
    .await?;
    Ok(cl)
}

pub async fn update_fields(db: &PgPool, cl: &CardLink) -> Result<CardLink, ApiError> {
    let updated = sqlx::query_as::<_, CardLink>(
        "UPDATE card_links \
         SET email = $2, card_number = $3, site = $4, from_date = $5, to_date = $6, \
             updated_at = now() \
         WHERE id = $1 \
         RETURNING id, user_id, email, card_number, site, from_date, to_date, status, \
                   approved_by, approved_at, created_at",
    )
    .bind(cl.id)
    .bind(&cl.email)
    .bind(&cl.card_number)
    .bind(&cl.site)
    .bind(cl.from_date)
    .bind(cl.to_date)
    .fetch_one(db)
    .await?;
    Ok(updated)
}

pub async fn set_status(
    db: &PgPool,
    id: Uuid,
    status: CardLinkStatus,
    approved_by: Uuid,
) -> Result<CardLink, ApiError> {
    let cl = sqlx::query_as::<_, CardLink>(
        "UPDATE card_links \
         SET status = $2, approved_by = $3, approved_at = now(), updated_at = now() \
         WHERE id = $1 \
         RETURNING id, user_id, email, card_number, site, from_date, to_date, status, \
                   approved_by, approved_at, created_at",
    )
    .bind(id)
    .bind(status)
    .bind(approved_by)
    .fetch_one(db)
    .await?;
    Ok(cl)
}

pub async fn delete(db: &PgPool, id: Uuid) -> Result<(), ApiError> {
    sqlx::query("DELETE FROM card_links WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}
