use axum::{
    extract::State,
    routing::{get, put},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{info, instrument};

use crate::auth::handlers::is_valid_email;
use crate::auth::jwt::Auth;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::repo::User;
use crate::error::ApiError;
use crate::profile::dto::{ChangePasswordRequest, ProfileResponse, UpdateProfileRequest};
use crate::state::AppState;
use crate::users::repo;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route("/profile/password", put(change_password))
}

#[instrument(skip(state, claims))]
pub async fn get_profile(
    State(state): State<AppState>,
    Auth(claims): Auth,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or(ApiError::NotFound("user"))?;
    Ok(Json(ProfileResponse::from(user)))
}

#[instrument(skip(state, claims, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    Auth(claims): Auth,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let existing = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or(ApiError::NotFound("user"))?;

    let name = payload.name.unwrap_or(existing.name);
    if name.trim().is_empty() {
        return Err(ApiError::validation("name must not be empty"));
    }
    let email = payload.email.unwrap_or(existing.email);
    if !is_valid_email(&email) {
        return Err(ApiError::validation("email is invalid"));
    }
    if repo::email_taken_by_other(&state.db, claims.sub, &email).await? {
        return Err(ApiError::conflict("email already in use"));
    }
    let image = payload.image.or(existing.image);
    let birthday = payload.birthday.or(existing.birthday);

    let updated = repo::update_profile(
        &state.db,
        claims.sub,
        name.trim(),
        email.trim(),
        image.as_deref(),
        birthday,
    )
    .await?
    .ok_or(ApiError::NotFound("user"))?;

    info!(user_id = %claims.sub, "profile updated");
    Ok(Json(ProfileResponse::from(updated)))
}

#[instrument(skip(state, claims, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    Auth(claims): Auth,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<Value>, ApiError> {
    let (Some(current), Some(new)) = (payload.current_password, payload.new_password) else {
        return Err(ApiError::validation(
            "currentPassword and newPassword are required",
        ));
    };
    if new.len() < 6 {
        return Err(ApiError::validation(
            "password must be at least 6 characters",
        ));
    }

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or(ApiError::NotFound("user"))?;
    // Invited users have no password yet and cannot rotate one here.
    let Some(hash) = user.password_hash.as_deref() else {
        return Err(ApiError::validation("no password set for this account"));
    };
    if !verify_password(&current, hash)? {
        return Err(ApiError::validation("current password is incorrect"));
    }

    let new_hash = hash_password(&new)?;
    repo::set_password(&state.db, claims.sub, &new_hash).await?;
    info!(user_id = %claims.sub, "password changed");
    Ok(Json(json!({ "ok": true })))
}
