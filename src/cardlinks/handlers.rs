use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::jwt::Auth;
use crate::cardlinks::dto::{
    CardLinkListParams, CardLinkResponse, CreateCardLinkRequest, UpdateCardLinkRequest,
};
use crate::cardlinks::repo::{self, CardLinkFilter};
use crate::cardlinks::workflow;
use crate::error::ApiError;
use crate::pagination::{PageParams, Paginated};
use crate::scope::OwnerScope;
use crate::state::AppState;
use crate::transactions::workflow::TransitionOutcome;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/cardlinks", get(list_cardlinks).post(create_cardlink))
        .route(
            "/cardlinks/:id",
            put(update_cardlink).delete(delete_cardlink),
        )
}

#[instrument(skip(state, claims))]
pub async fn list_cardlinks(
    State(state): State<AppState>,
    Auth(claims): Auth,
    Query(page): Query<PageParams>,
    Query(params): Query<CardLinkListParams>,
) -> Result<Json<Paginated<CardLinkResponse>>, ApiError> {
    let page = page.normalized();
    let filter = CardLinkFilter {
        scope: OwnerScope::resolve(&claims, params.user_id),
        search: params.search,
        from: params.from,
        to: params.to,
    };
    let (rows, total) = repo::list(&state.db, &filter, &page).await?;
    let items = rows.into_iter().map(CardLinkResponse::from).collect();
    Ok(Json(Paginated::new(items, &page, total)))
}

#[instrument(skip(state, claims, payload))]
pub async fn create_cardlink(
    State(state): State<AppState>,
    Auth(claims): Auth,
    Json(payload): Json<CreateCardLinkRequest>,
) -> Result<(StatusCode, Json<CardLinkResponse>), ApiError> {
    let (Some(email), Some(card_number), Some(from), Some(to)) = (
        payload.email.as_deref().filter(|s| !s.trim().is_empty()),
        payload
            .card_number
            .as_deref()
            .filter(|s| !s.trim().is_empty()),
        payload.from,
        payload.to,
    ) else {
        return Err(ApiError::validation(
            "email, cardNumber, from and to are required",
        ));
    };
    if to < from {
        return Err(ApiError::validation("to must not precede from"));
    }

    let cl = repo::create(
        &state.db,
        claims.sub,
        email,
        card_number,
        payload.site.as_deref().unwrap_or_default(),
        from,
        to,
    )
    .await?;

    info!(cardlink_id = %cl.id, owner = %claims.sub, "card link created");
    Ok((StatusCode::CREATED, Json(CardLinkResponse::from(cl))))
}

#[instrument(skip(state, claims, payload))]
pub async fn update_cardlink(
    State(state): State<AppState>,
    Auth(claims): Auth,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCardLinkRequest>,
) -> Result<Json<CardLinkResponse>, ApiError> {
    let existing = repo::find(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("card link"))?;

    let is_owner = existing.user_id == claims.sub;
    if !claims.is_admin() && !is_owner {
        return Err(ApiError::Forbidden);
    }

    let mut current_status = existing.status;

    if let Some(requested) = payload.status {
        match workflow::plan_transition(current_status, requested, claims.role)? {
            TransitionOutcome::Transitioned => {
                let cl = repo::set_status(&state.db, id, requested, claims.sub).await?;
                current_status = cl.status;
                info!(cardlink_id = %id, status = ?requested, approver = %claims.sub, "card link canceled");
            }
            TransitionOutcome::AlreadyTerminal => {}
        }
    }

    if payload.has_field_changes() {
        workflow::check_field_edit(current_status, claims.role, is_owner)?;
        let mut cl = repo::CardLink {
            id: existing.id,
            user_id: existing.user_id,
            email: existing.email.clone(),
            card_number: existing.card_number.clone(),
            site: existing.site.clone(),
            from_date: existing.from_date,
            to_date: existing.to_date,
            status: current_status,
            approved_by: existing.approved_by,
            approved_at: existing.approved_at,
            created_at: existing.created_at,
        };
        if let Some(email) = payload.email {
            cl.email = email;
        }
        if let Some(card_number) = payload.card_number {
            cl.card_number = card_number;
        }
        if let Some(site) = payload.site {
            cl.site = site;
        }
        if let Some(from) = payload.from {
            cl.from_date = from;
        }
        if let Some(to) = payload.to {
            cl.to_date = to;
        }
        if cl.to_date < cl.from_date {
            return Err(ApiError::validation("to must not precede from"));
        }
        repo::update_fields(&state.db, &cl).await?;
    }

    let updated = repo::find(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("card link"))?;
    Ok(Json(CardLinkResponse::from(updated)))
}

#[instrument(skip(state, claims))]
pub async fn delete_cardlink(
    State(state): State<AppState>,
    Auth(claims): Auth,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let existing = repo::find(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("card link"))?;

    let is_owner = existing.user_id == claims.sub;
    if !claims.is_admin() && !is_owner {
        return Err(ApiError::Forbidden);
    }
    workflow::check_delete(existing.status, claims.role, is_owner)?;

    repo::delete(&state.db, id).await?;
    info!(cardlink_id = %id, "card link deleted");
    Ok(Json(json!({ "ok": true })))
}
