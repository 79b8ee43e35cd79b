use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::error::ApiError;
use crate::pagination::PageParams;
use crate::scope::OwnerScope;

const WP_COLUMNS: &str = "w.id, w.user_id, w.week_number, w.year, w.start_date, w.end_date, \
                          w.content, w.result, w.created_at, w.updated_at";

#[derive(Debug, Clone, FromRow)]
pub struct WeeklyPlan {
    pub id: Uuid,
    pub user_id: Uuid,
    pub week_number: i32,
    pub year: i32,
    pub start_date: Date,
    pub end_date: Date,
    pub content: String,
    pub result: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub struct WeeklyPlanWithOwner {
    pub id: Uuid,
    pub user_id: Uuid,
    pub week_number: i32,
    pub year: i32,
    pub start_date: Date,
    pub end_date: Date,
    pub content: String,
    pub result: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub owner_name: String,
    pub owner_email: String,
}

#[derive(Debug, Clone)]
pub struct WeeklyPlanFilter {
    pub scope: OwnerScope,
    pub year: Option<i32>,
    pub week_number: Option<i32>,
}

fn apply_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &WeeklyPlanFilter) {
    if let Some(owner) = filter.scope.owner() {
        qb.push(" AND w.user_id = ").push_bind(owner);
    }
    if let Some(year) = filter.year {
        qb.push(" AND w.year = ").push_bind(year);
    }
    if let Some(week) = filter.week_number {
        qb.push(" AND w.week_number = ").push_bind(week);
    }
}

pub async fn list(
    db: &PgPool,
    filter: &WeeklyPlanFilter,
    page: &PageParams,
) -> Result<(Vec<WeeklyPlanWithOwner>, i64), ApiError> {
    let mut count_qb = QueryBuilder::new(
        "SELECT COUNT(*) FROM weekly_plans w JOIN users u ON u.id = w.user_id WHERE TRUE",
    );
    apply_filters(&mut count_qb, filter);
    let total: i64 = count_qb.build_query_scalar().fetch_one(db).await?;

    let mut qb = QueryBuilder::new(format!(
        "SELECT {WP_COLUMNS}, u.name AS owner_name, u.email AS owner_email \
         FROM weekly_plans w JOIN users u ON u.id = w.user_id WHERE TRUE"
    ));
    apply_filters(&mut qb, filter);
    qb.push(" ORDER BY w.year DESC, w.week_number DESC, w.created_at DESC LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset());

    let rows = qb
        .build_query_as::<WeeklyPlanWithOwner>()
        .fetch_all(db)
        .await?;
    Ok((rows, total))
}

pub async fn find(db: &PgPool, id: Uuid) -> Result<Option<WeeklyPlanWithOwner>, ApiError> {
    let plan = sqlx::query_as::<_, WeeklyPlanWithOwner>(&format!(
        "SELECT {WP_COLUMNS}, u.name AS owner_name, u.email AS owner_email \
         FROM weekly_plans w JOIN users u ON u.id = w.user_id WHERE w.id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(plan)
}

/// One plan per (owner, year, week). The unique index is the real guarantee;
/// this pre-check just gives a friendlier message.
pub async fn exists_for_week(
    db: &PgPool,
    owner: Uuid,
    year: i32,
    week_number: i32,
) -> Result<bool, ApiError> {
    let found: Option<Uuid> = sqlx::query_scalar(
        "SELECT id FROM weekly_plans WHERE user_id = $1 AND year = $2 AND week_number = $3",
    )
    .bind(owner)
    .bind(year)
    .bind(week_number)
    .fetch_optional(db)
    .await?;
    Ok(found.is_some())
}

#[allow(clippy::too_many_arguments)]
pub async fn create(
    db: &PgPool,
    owner: Uuid,
    week_number: i32,
    year: i32,
    start_date: Date,
    end_date: Date,
    content: &str,
    result: &str,
) -> Result<WeeklyPlan, ApiError> {
    let plan = sqlx::query_as::<_, WeeklyPlan>(
        "INSERT INTO weekly_plans (user_id, week_number, year, start_date, end_date, content, result) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING id, user_id, week_number, year, start_date, end_date, content, result, \
                   created_at, updated_at",
    )
    .bind(owner)
    .bind(week_number)
    .bind(year)
    .bind(start_date)
    .bind(end_date)
    .bind(content)
    .bind(result)
    .fetch_one(db)
    .await?;
    Ok(plan)
}

pub async fn update(db: &PgPool, plan: &WeeklyPlan) -> Result<WeeklyPlan, ApiError> {
    let updated = sqlx::query_as::<_, WeeklyPlan>(
        "UPDATE weekly_plans \
         SET week_number = $2, year = $3, start_date = $4, end_date = $5, content = $6, \
             result = $7, updated_at = now() \
         WHERE id = $1 \
         RETURNING id, user_id, week_number, year, start_date, end_date, content, result, \
                   created_at, updated_at",
    )
    .bind(plan.id)
    .bind(plan.week_number)
    .bind(plan.year)
    .bind(plan.start_date)
    .bind(plan.end_date)
    .bind(&plan.content)
    .bind(&plan.result)
    .fetch_one(db)
    .await?;
    Ok(updated)
}

pub async fn delete(db: &PgPool, id: Uuid) -> Result<(), ApiError> {
    sqlx::query("DELETE FROM weekly_plans WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}
