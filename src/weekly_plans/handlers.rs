use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::claims::Claims;
use crate::auth::jwt::Auth;
use crate::error::ApiError;
use crate::pagination::{PageParams, Paginated};
use crate::scope::OwnerScope;
use crate::state::AppState;
use crate::weekly_plans::dto::{
    CreateWeeklyPlanRequest, UpdateWeeklyPlanRequest, WeeklyPlanListParams, WeeklyPlanResponse,
};
use crate::weekly_plans::repo::{self, WeeklyPlanFilter, WeeklyPlanWithOwner};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/weekly-plans", get(list_plans).post(create_plan))
        .route(
            "/weekly-plans/:id",
            get(get_plan).put(update_plan).delete(delete_plan),
        )
}

fn validate_week_number(week_number: i32) -> Result<(), ApiError> {
    if !(1..=53).contains(&week_number) {
        return Err(ApiError::validation("weekNumber must be between 1 and 53"));
    }
    Ok(())
}

#[instrument(skip(state, claims))]
pub async fn list_plans(
    State(state): State<AppState>,
    Auth(claims): Auth,
    Query(page): Query<PageParams>,
    Query(params): Query<WeeklyPlanListParams>,
) -> Result<Json<Paginated<WeeklyPlanResponse>>, ApiError> {
    let page = page.normalized();
    let filter = WeeklyPlanFilter {
        scope: OwnerScope::resolve(&claims, params.user_id),
        year: params.year,
        week_number: params.week_number,
    };
    let (rows, total) = repo::list(&state.db, &filter, &page).await?;
    let items = rows.into_iter().map(WeeklyPlanResponse::from).collect();
    Ok(Json(Paginated::new(items, &page, total)))
}

#[instrument(skip(state, claims, payload))]
pub async fn create_plan(
    State(state): State<AppState>,
    Auth(claims): Auth,
    Json(payload): Json<CreateWeeklyPlanRequest>,
) -> Result<(StatusCode, Json<WeeklyPlanResponse>), ApiError> {
    let (Some(week_number), Some(year), Some(start_date), Some(end_date), Some(content)) = (
        payload.week_number,
        payload.year,
        payload.start_date,
        payload.end_date,
        payload.content.as_deref().filter(|c| !c.trim().is_empty()),
    ) else {
        return Err(ApiError::validation(
            "weekNumber, year, startDate, endDate and content are required",
        ));
    };
    validate_week_number(week_number)?;
    if end_date < start_date {
        return Err(ApiError::validation("endDate must not precede startDate"));
    }

    if repo::exists_for_week(&state.db, claims.sub, year, week_number).await? {
        return Err(ApiError::conflict(
            "weekly plan already exists for this week",
        ));
    }

    let plan = repo::create(
        &state.db,
        claims.sub,
        week_number,
        year,
        start_date,
        end_date,
        content,
        payload.result.as_deref().unwrap_or_default(),
    )
    .await?;

    info!(plan_id = %plan.id, owner = %claims.sub, year, week_number, "weekly plan created");
    Ok((StatusCode::CREATED, Json(WeeklyPlanResponse::from(plan))))
}

async fn fetch_guarded(
    state: &AppState,
    claims: &Claims,
    id: Uuid,
) -> Result<WeeklyPlanWithOwner, ApiError> {
    let plan = repo::find(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("weekly plan"))?;
    if !claims.is_admin() && plan.user_id != claims.sub {
        return Err(ApiError::Forbidden);
    }
    Ok(plan)
}

#[instrument(skip(state, claims))]
pub async fn get_plan(
    State(state): State<AppState>,
    Auth(claims): Auth,
    Path(id): Path<Uuid>,
) -> Result<Json<WeeklyPlanResponse>, ApiError> {
    let plan = fetch_guarded(&state, &claims, id).await?;
    Ok(Json(WeeklyPlanResponse::from(plan)))
}

#[instrument(skip(state, claims, payload))]
pub async fn update_plan(
    State(state): State<AppState>,
    Auth(claims): Auth,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateWeeklyPlanRequest>,
) -> Result<Json<WeeklyPlanResponse>, ApiError> {
    let existing = fetch_guarded(&state, &claims, id).await?;

    let mut plan = repo::WeeklyPlan {
        id: existing.id,
        user_id: existing.user_id,
        week_number: existing.week_number,
        year: existing.year,
        start_date: existing.start_date,
        end_date: existing.end_date,
        content: existing.content.clone(),
        result: existing.result.clone(),
        created_at: existing.created_at,
        updated_at: existing.updated_at,
    };
    if let Some(week_number) = payload.week_number {
        validate_week_number(week_number)?;
        plan.week_number = week_number;
    }
    if let Some(year) = payload.year {
        plan.year = year;
    }
    if let Some(start_date) = payload.start_date {
        plan.start_date = start_date;
    }
    if let Some(end_date) = payload.end_date {
        plan.end_date = end_date;
    }
    if let Some(content) = payload.content {
        plan.content = content;
    }
    if let Some(result) = payload.result {
        plan.result = result;
    }
    if plan.end_date < plan.start_date {
        return Err(ApiError::validation("endDate must not precede startDate"));
    }

    // Moving the plan onto an occupied (owner, year, week) slot trips the
    // unique index and surfaces as a conflict.
    let updated = repo::update(&state.db, &plan).await?;
    Ok(Json(WeeklyPlanResponse::from(updated)))
}

#[instrument(skip(state, claims))]
pub async fn delete_plan(
    State(state): State<AppState>,
    Auth(claims): Auth,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let plan = fetch_guarded(&state, &claims, id).await?;
    repo::delete(&state.db, plan.id).await?;
    info!(plan_id = %id, "weekly plan deleted");
    Ok(Json(json!({ "ok": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn week_number_bounds() {
        assert!(validate_week_number(1).is_ok());
        assert!(validate_week_number(53).is_ok());
        assert!(validate_week_number(0).is_err());
        assert!(validate_week_number(54).is_err());
    }
}
