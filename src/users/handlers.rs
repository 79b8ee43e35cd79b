use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::claims::{Claims, Role};
use crate::auth::handlers::is_valid_email;
use crate::auth::jwt::Auth;
use crate::auth::repo::User;
use crate::error::ApiError;
use crate::pagination::{PageParams, Paginated};
use crate::state::AppState;
use crate::users::dto::{CreateUserRequest, UpdateUserRequest, UserListParams, UserResponse};
use crate::users::repo::{self, UserFilter};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/:id", put(update_user).delete(delete_user))
}

fn require_admin(claims: &Claims) -> Result<(), ApiError> {
    if !claims.is_admin() {
        return Err(ApiError::Forbidden);
    }
    Ok(())
}

#[instrument(skip(state, claims))]
pub async fn list_users(
    State(state): State<AppState>,
    Auth(claims): Auth,
    Query(page): Query<PageParams>,
    Query(params): Query<UserListParams>,
) -> Result<Json<Paginated<UserResponse>>, ApiError> {
    require_admin(&claims)?;
    let page = page.normalized();
    let filter = UserFilter {
        search: params.search,
        role: params.role,
    };
    let (rows, total) = repo::list(&state.db, &filter, &page).await?;
    let items = rows.into_iter().map(UserResponse::from).collect();
    Ok(Json(Paginated::new(items, &page, total)))
}

#[instrument(skip(state, claims, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    Auth(claims): Auth,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    require_admin(&claims)?;
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
    if !is_valid_email(email) {
        return Err(ApiError::validation("email is invalid"));
    }

    if User::name_or_email_taken(&state.db, name, email).await? {
        return Err(ApiError::conflict("user with this name or email exists"));
    }

    let role = payload.role.unwrap_or(Role::Staff);
    let user = repo::create_invited(&state.db, name, email, role, payload.phone.as_deref()).await?;

    info!(user_id = %user.id, role = ?role, "user invited");
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

#[instrument(skip(state, claims, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    Auth(claims): Auth,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    require_admin(&claims)?;
    let existing = User::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;

    let name = payload.name.unwrap_or(existing.name);
    let role = payload.role.unwrap_or(existing.role);
    let phone = payload.phone.or(existing.phone);
    let birthday = payload.birthday.or(existing.birthday);
    if name.trim().is_empty() {
        return Err(ApiError::validation("name must not be empty"));
    }

    let updated = repo::update(&state.db, id, name.trim(), role, phone.as_deref(), birthday)
        .await?
        .ok_or(ApiError::NotFound("user"))?;
    Ok(Json(UserResponse::from(updated)))
}

#[instrument(skip(state, claims))]
pub async fn delete_user(
    State(state): State<AppState>,
    Auth(claims): Auth,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    require_admin(&claims)?;
    if !repo::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("user"));
    }
    info!(user_id = %id, "user deleted");
    Ok(Json(json!({ "ok": true })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::test_claims;

    #[test]
    fn non_admins_are_rejected() {
        let staff = test_claims(Uuid::new_v4(), Role::Staff);
        let accountant = test_claims(Uuid::new_v4(), Role::Accountant);
        let admin = test_claims(Uuid::new_v4(), Role::Admin);
        assert!(matches!(require_admin(&staff), Err(ApiError::Forbidden)));
        assert!(matches!(
            require_admin(&accountant),
            Err(ApiError::Forbidden)
        ));
        assert!(require_admin(&admin).is_ok());
    }
}
