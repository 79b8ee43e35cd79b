use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::accounts::dto::{
    AccountListParams, AccountResponse, CreateAccountRequest, UpdateAccountRequest,
};
use crate::accounts::repo::{self, Account, AccountFilter};
use crate::auth::claims::Claims;
use crate::auth::jwt::Auth;
use crate::error::ApiError;
use crate::pagination::{PageParams, Paginated};
use crate::scope::OwnerScope;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/accounts", get(list_accounts).post(create_account))
        .route("/accounts/:id", put(update_account).delete(delete_account))
}

#[instrument(skip(state, claims))]
pub async fn list_accounts(
    State(state): State<AppState>,
    Auth(claims): Auth,
    Query(page): Query<PageParams>,
    Query(params): Query<AccountListParams>,
) -> Result<Json<Paginated<AccountResponse>>, ApiError> {
    let page = page.normalized();
    let filter = AccountFilter {
        scope: OwnerScope::resolve(&claims, params.user_id),
        search: params.search,
    };
    let (rows, total) = repo::list(&state.db, &filter, &page).await?;
    let items = rows.into_iter().map(AccountResponse::from).collect();
    Ok(Json(Paginated::new(items, &page, total)))
}

#[instrument(skip(state, claims, payload))]
pub async fn create_account(
    State(state): State<AppState>,
    Auth(claims): Auth,
    Json(payload): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), ApiError> {
    let name = payload
        .name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::validation("name is required"))?;
    let email = payload
        .email
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::validation("email is required"))?;

    // Owner always comes from the caller's claims, never the payload.
    let account = repo::create(
        &state.db,
        claims.sub,
        name,
        email,
        payload.phone.as_deref(),
        payload.address.as_deref(),
    )
    .await?;

    info!(account_id = %account.id, owner = %claims.sub, "account created");
    Ok((StatusCode::CREATED, Json(AccountResponse::from(account))))
}

/// Non-admins get a 404 for another owner's account, indistinguishable from a
/// missing one, so ids cannot be probed across tenants.
async fn fetch_scoped(state: &AppState, claims: &Claims, id: Uuid) -> Result<Account, ApiError> {
    let account = repo::find(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("account"))?;
    if !claims.is_admin() && account.created_by != claims.sub {
        return Err(ApiError::NotFound("account"));
    }
    Ok(account)
}

#[instrument(skip(state, claims, payload))]
pub async fn update_account(
    State(state): State<AppState>,
    Auth(claims): Auth,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAccountRequest>,
) -> Result<Json<AccountResponse>, ApiError> {
    let mut account = fetch_scoped(&state, &claims, id).await?;

    if let Some(name) = payload.name {
        account.name = name;
    }
    if let Some(email) = payload.email {
        account.email = email;
    }
    if let Some(phone) = payload.phone {
        account.phone = Some(phone);
    }
    if let Some(address) = payload.address {
        account.address = Some(address);
    }

    let updated = repo::update(&state.db, &account).await?;
    Ok(Json(AccountResponse::from(updated)))
}

#[instrument(skip(state, claims))]
pub async fn delete_account(
    State(state): State<AppState>,
    Auth(claims): Auth,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let account = fetch_scoped(&state, &claims, id).await?;
    repo::delete(&state.db, account.id).await?;
    info!(account_id = %id, "account deleted");
    Ok(Json(json!({ "ok": true })))
}
