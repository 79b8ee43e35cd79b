use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use time::{Date, Month, OffsetDateTime};
use uuid::Uuid;

use crate::error::ApiError;
use crate::pagination::PageParams;
use crate::scope::OwnerScope;

/// Transaction lifecycle. `Pending` is the only open state; the other two are
/// terminal.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "tx_status", rename_all = "lowercase")]
pub enum TxStatus {
    Pending,
    Approved,
    Rejected,
}

const TX_COLUMNS: &str = "t.id, t.user_id, t.date, t.amount, t.description, t.notes, t.status, \
                          t.approved_by, t.approved_at, t.created_at";

#[derive(Debug, Clone, FromRow)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: Date,
    pub amount: Decimal,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub status: TxStatus,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub struct TransactionWithOwner {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: Date,
    pub amount: Decimal,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub status: TxStatus,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub owner_name: String,
    pub owner_email: String,
}

#[derive(Debug, Clone)]
pub struct TransactionFilter {
    pub scope: OwnerScope,
    pub search: Option<String>,
    pub from: Option<Date>,
    pub to: Option<Date>,
}

fn apply_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &TransactionFilter) {
    if let Some(owner) = filter.scope.owner() {
        qb.push(" AND t.user_id = ").push_bind(owner);
    }
    if let Some(from) = filter.from {
        qb.push(" AND t.date >= ").push_bind(from);
    }
    if let Some(to) = filter.to {
        qb.push(" AND t.date <= ").push_bind(to);
    }
    if let Some(search) = filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        let pat = format!("%{search}%");
        qb.push(" AND (t.description ILIKE ")
            .push_bind(pat.clone())
            .push(" OR t.notes ILIKE ")
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
    filter: &TransactionFilter,
    page: &PageParams,
) -> Result<(Vec<TransactionWithOwner>, i64), ApiError> {
    let mut count_qb = QueryBuilder::new(
        "SELECT COUNT(*) FROM transactions t JOIN users u ON u.id = t.user_id WHERE TRUE",
    );
    apply_filters(&mut count_qb, filter);
    let total: i64 = count_qb.build_query_scalar().fetch_one(db).await?;

    let mut qb = QueryBuilder::new(format!(
        "SELECT {TX_COLUMNS}, u.name AS owner_name, u.email AS owner_email \
         FROM transactions t JOIN users u ON u.id = t.user_id WHERE TRUE"
    ));
    apply_filters(&mut qb, filter);
    // Newest first, creation order as the tie-break.
    qb.push(" ORDER BY t.date DESC, t.created_at DESC LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset());

    let rows = qb
        .build_query_as::<TransactionWithOwner>()
        .fetch_all(db)
        .await?;
    Ok((rows, total))
}

pub async fn find(db: &PgPool, id: Uuid) -> Result<Option<TransactionWithOwner>, ApiError> {
    let tx = sqlx::query_as::<_, TransactionWithOwner>(&format!(
        "SELECT {TX_COLUMNS}, u.name AS owner_name, u.email AS owner_email \
         FROM transactions t JOIN users u ON u.id = t.user_id WHERE t.id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(tx)
}

pub async fn create(
    db: &PgPool,
    owner: Uuid,
    date: Date,
    amount: Decimal,
    description: Option<&str>,
    notes: Option<&str>,
) -> Result<Transaction, ApiError> {
    let tx = sqlx::query_as::<_, Transaction>(
        "INSERT INTO transactions (user_id, date, amount, description, notes, status) \
         VALUES ($1, $2, $3, $4, $5, 'pending') \
         RETURNING id, user_id, date, amount, description, notes, status, \
                   approved_by, approved_at, created_at",
    )
    .bind(owner)
    .bind(date)
    .bind(amount)
    .bind(description)
    .bind(notes)
    .fetch_one(db)
    .await?;
    Ok(tx)
}

pub async fn update_fields(
    db: &PgPool,
    id: Uuid,
    date: Date,
    amount: Decimal,
    description: Option<&str>,
    notes: Option<&str>,
) -> Result<Transaction, ApiError> {
    let tx = sqlx::query_as::<_, Transaction>(
        "UPDATE transactions \
         SET date = $2, amount = $3, description = $4, notes = $5, updated_at = now() \
         WHERE id = $1 \
         RETURNING id, user_id, date, amount, description, notes, status, \
                   approved_by, approved_at, created_at",
    )
    .bind(id)
    .bind(date)
    .bind(amount)
    .bind(description)
    .bind(notes)
    .fetch_one(db)
    .await?;
    Ok(tx)
}

/// Stamp a terminal status together with approver and time.
pub async fn set_status(
    db: &PgPool,
    id: Uuid,
    status: TxStatus,
    approved_by: Uuid,
) -> Result<Transaction, ApiError> {
    let tx = sqlx::query_as::<_, Transaction>(
        "UPDATE transactions \
         SET status = $2, approved_by = $3, approved_at = now(), updated_at = now() \
         WHERE id = $1 \
         RETURNING id, user_id, date, amount, description, notes, status, \
                   approved_by, approved_at, created_at",
    )
    .bind(id)
    .bind(status)
    .bind(approved_by)
    .fetch_one(db)
    .await?;
    Ok(tx)
}

pub async fn delete(db: &PgPool, id: Uuid) -> Result<(), ApiError> {
    sqlx::query("DELETE FROM transactions WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}

// --- yearly summary ---

#[derive(Debug, FromRow)]
pub struct MonthlyTotal {
    pub period: String,
    pub total: Decimal,
}

#[derive(Debug, FromRow)]
pub struct SummaryStats {
    pub total_amount: Decimal,
    pub total_count: i64,
    pub avg_amount: Decimal,
    pub min_amount: Decimal,
    pub max_amount: Decimal,
}

#[derive(Debug, FromRow)]
pub struct StatusTotal {
    pub status: TxStatus,
    pub count: i64,
    pub total: Decimal,
}

pub fn year_window(year: i32) -> Result<(Date, Date), ApiError> {
    let start = Date::from_calendar_date(year, Month::January, 1)
        .map_err(|_| ApiError::validation("invalid year"))?;
    let end = Date::from_calendar_date(year, Month::December, 31)
        .map_err(|_| ApiError::validation("invalid year"))?;
    Ok((start, end))
}

fn push_window(qb: &mut QueryBuilder<'_, Postgres>, scope: OwnerScope, start: Date, end: Date) {
    qb.push(" WHERE t.date BETWEEN ")
        .push_bind(start)
        .push(" AND ")
        .push_bind(end);
    if let Some(owner) = scope.owner() {
        qb.push(" AND t.user_id = ").push_bind(owner);
    }
}

/// Months with no transactions are absent; callers zero-fill for charting.
pub async fn monthly_totals(
    db: &PgPool,
    scope: OwnerScope,
    year: i32,
) -> Result<Vec<MonthlyTotal>, ApiError> {
    let (start, end) = year_window(year)?;
    let mut qb = QueryBuilder::new(
        "SELECT to_char(t.date, 'YYYY-MM') AS period, SUM(t.amount) AS total FROM transactions t",
    );
    push_window(&mut qb, scope, start, end);
    qb.push(" GROUP BY 1 ORDER BY 1");
    let rows = qb.build_query_as::<MonthlyTotal>().fetch_all(db).await?;
    Ok(rows)
}

pub async fn stats(db: &PgPool, scope: OwnerScope, year: i32) -> Result<SummaryStats, ApiError> {
    let (start, end) = year_window(year)?;
    let mut qb = QueryBuilder::new(
        "SELECT COALESCE(SUM(t.amount), 0) AS total_amount, \
                COUNT(*) AS total_count, \
                COALESCE(AVG(t.amount), 0) AS avg_amount, \
                COALESCE(MIN(t.amount), 0) AS min_amount, \
                COALESCE(MAX(t.amount), 0) AS max_amount \
         FROM transactions t",
    );
    push_window(&mut qb, scope, start, end);
    let row = qb.build_query_as::<SummaryStats>().fetch_one(db).await?;
    Ok(row)
}

pub async fn status_breakdown(
    db: &PgPool,
    scope: OwnerScope,
    year: i32,
) -> Result<Vec<StatusTotal>, ApiError> {
    let (start, end) = year_window(year)?;
    let mut qb = QueryBuilder::new(
        "SELECT t.status AS status, COUNT(*) AS count, SUM(t.amount) AS total FROM transactions t",
    );
    push_window(&mut qb, scope, start, end);
    qb.push(" GROUP BY t.status ORDER BY t.status");
    let rows = qb.build_query_as::<StatusTotal>().fetch_all(db).await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_window_spans_whole_year() {
        let (start, end) = year_window(2025).unwrap();
        assert_eq!(start.to_string(), "2025-01-01");
        assert_eq!(end.to_string(), "2025-12-31");
    }

    #[test]
    fn year_window_rejects_out_of_range_years() {
        assert!(year_window(1_000_000).is_err());
    }
}
