use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde_json::{json, Value};
use time::OffsetDateTime;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::jwt::Auth;
use crate::auth::repo::User;
use crate::error::ApiError;
use crate::notify::{TransactionCreated, TransactionStatusChanged};
use crate::pagination::{PageParams, Paginated};
use crate::scope::OwnerScope;
use crate::state::AppState;
use crate::transactions::dto::{
    CreateTransactionRequest, SummaryParams, SummaryResponse, TransactionListParams,
    TransactionResponse, UpdateTransactionRequest,
};
use crate::transactions::repo::{self, TransactionFilter};
use crate::transactions::workflow::{self, TransitionOutcome};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/transactions",
            get(list_transactions).post(create_transaction),
        )
        .route("/transactions/summary", get(summary))
        .route(
            "/transactions/:id",
            put(update_transaction).delete(delete_transaction),
        )
}

#[instrument(skip(state, claims))]
pub async fn list_transactions(
    State(state): State<AppState>,
    Auth(claims): Auth,
    Query(page): Query<PageParams>,
    Query(params): Query<TransactionListParams>,
) -> Result<Json<Paginated<TransactionResponse>>, ApiError> {
    let page = page.normalized();
    let filter = TransactionFilter {
        scope: OwnerScope::resolve(&claims, params.user_id),
        search: params.search,
        from: params.from,
        to: params.to,
    };
    let (rows, total) = repo::list(&state.db, &filter, &page).await?;
    let items = rows.into_iter().map(TransactionResponse::from).collect();
    Ok(Json(Paginated::new(items, &page, total)))
}

#[instrument(skip(state, claims, payload))]
pub async fn create_transaction(
    State(state): State<AppState>,
    Auth(claims): Auth,
    Json(payload): Json<CreateTransactionRequest>,
) -> Result<(StatusCode, Json<TransactionResponse>), ApiError> {
    let (Some(date), Some(amount)) = (payload.date, payload.amount) else {
        return Err(ApiError::validation("date and amount are required"));
    };

    let tx = repo::create(
        &state.db,
        claims.sub,
        date,
        amount,
        payload.description.as_deref(),
        payload.notes.as_deref(),
    )
    .await?;

    info!(tx_id = %tx.id, owner = %claims.sub, "transaction created");

    // Best-effort notification on a detached task; the create already
    // committed and must not be affected by delivery problems.
    if let Some(creator) = User::find_by_id(&state.db, claims.sub).await? {
        let event = TransactionCreated {
            creator_email: creator.email,
            amount: tx.amount,
            date: tx.date,
            description: tx.description.clone().unwrap_or_default(),
        };
        let notifier = Arc::clone(&state.notifier);
        tokio::spawn(async move { notifier.transaction_created(event).await });
    }

    Ok((StatusCode::CREATED, Json(TransactionResponse::from(tx))))
}

#[instrument(skip(state, claims, payload))]
pub async fn update_transaction(
    State(state): State<AppState>,
    Auth(claims): Auth,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTransactionRequest>,
) -> Result<Json<TransactionResponse>, ApiError> {
    let existing = repo::find(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("transaction"))?;

    let is_owner = existing.user_id == claims.sub;
    if !claims.is_admin() && !is_owner {
        return Err(ApiError::Forbidden);
    }

    let mut current_status = existing.status;

    if let Some(requested) = payload.status {
        match workflow::plan_transition(current_status, requested, claims.role)? {
            TransitionOutcome::Transitioned => {
                let tx = repo::set_status(&state.db, id, requested, claims.sub).await?;
                current_status = tx.status;
                info!(tx_id = %id, status = ?requested, approver = %claims.sub, "transaction status changed");

                let approver_email = User::find_by_id(&state.db, claims.sub)
                    .await?
                    .map(|u| u.email)
                    .unwrap_or_default();
                let event = TransactionStatusChanged {
                    tx_id: tx.id,
                    new_status: tx.status,
                    approver_email,
                    owner_email: Some(existing.owner_email.clone()),
                    amount: tx.amount,
                    date: tx.date,
                    notes: tx.notes.clone(),
                };
                let notifier = Arc::clone(&state.notifier);
                tokio::spawn(async move { notifier.transaction_status_changed(event).await });
            }
            // Repeated approval/rejection of a terminal record: absorb
            // silently, and send no second notification.
            TransitionOutcome::AlreadyTerminal => {}
        }
    }

    if payload.has_field_changes() {
        workflow::check_field_edit(current_status, claims.role, is_owner)?;
        repo::update_fields(
            &state.db,
            id,
            payload.date.unwrap_or(existing.date),
            payload.amount.unwrap_or(existing.amount),
            payload
                .description
                .as_deref()
                .or(existing.description.as_deref()),
            payload.notes.as_deref().or(existing.notes.as_deref()),
        )
        .await?;
    }

    let updated = repo::find(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("transaction"))?;
    Ok(Json(TransactionResponse::from(updated)))
}

#[instrument(skip(state, claims))]
pub async fn delete_transaction(
    State(state): State<AppState>,
    Auth(claims): Auth,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let existing = repo::find(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("transaction"))?;

    let is_owner = existing.user_id == claims.sub;
    if !claims.is_admin() && !is_owner {
        return Err(ApiError::Forbidden);
    }
    workflow::check_delete(existing.status, claims.role, is_owner)?;

    repo::delete(&state.db, id).await?;
    info!(tx_id = %id, "transaction deleted");
    Ok(Json(json!({ "ok": true })))
}

#[instrument(skip(state, claims))]
pub async fn summary(
    State(state): State<AppState>,
    Auth(claims): Auth,
    Query(params): Query<SummaryParams>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let scope = OwnerScope::resolve(&claims, params.user_id);
    let year = params
        .year
        .unwrap_or_else(|| OffsetDateTime::now_utc().year());

    let monthly = repo::monthly_totals(&state.db, scope, year).await?;
    let stats = repo::stats(&state.db, scope, year).await?;
    let breakdown = repo::status_breakdown(&state.db, scope, year).await?;

    Ok(Json(SummaryResponse::assemble(monthly, stats, breakdown)))
}
