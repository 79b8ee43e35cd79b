use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::auth::claims::Role;
use crate::auth::dto::{AuthResponse, LoginRequest, PublicUser, RefreshRequest, RegisterRequest};
use crate::auth::jwt::{Auth, JwtKeys};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::repo::User;
use crate::error::ApiError;
use crate::state::AppState;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<PublicUser>), ApiError> {
    let username = payload.username.trim().to_string();
    let email = payload.email.trim().to_lowercase();

    if username.is_empty() || email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::validation(
            "username, email and password are required",
        ));
    }
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(ApiError::validation("invalid email"));
    }
    if payload.password.len() < 6 {
        return Err(ApiError::validation(
            "password must be at least 6 characters long",
        ));
    }

    // Friendlier message than the unique-index violation; the index still
    // backs this check under concurrent registration.
    if User::name_or_email_taken(&state.db, &username, &email).await? {
        warn!(email = %email, "name or email already registered");
        return Err(ApiError::conflict("try another username or email"));
    }

    // The very first account becomes the admin; everyone after that is staff.
    let role = if User::count(&state.db).await? == 0 {
        Role::Admin
    } else {
        Role::Staff
    };

    let hash = hash_password(&payload.password)?;
    let user = User::create(&state.db, &username, &email, Some(&hash), role).await?;

    info!(user_id = %user.id, email = %user.email, role = ?user.role, "user registered");
    Ok((StatusCode::CREATED, Json(PublicUser::from(&user))))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let identifier = payload.identifier.trim();
    if identifier.is_empty() || payload.password.is_empty() {
        return Err(ApiError::InvalidCredentials);
    }

    let user = User::find_by_identifier(&state.db, identifier)
        .await?
        .ok_or_else(|| {
            warn!(identifier, "login unknown identifier");
            ApiError::InvalidCredentials
        })?;

    // Invited users have no password yet and cannot log in.
    let Some(hash) = user.password_hash.as_deref() else {
        warn!(user_id = %user.id, "login attempt on invited account");
        return Err(ApiError::InvalidCredentials);
    };

    if !verify_password(&payload.password, hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign_access(user.id, user.role)?;
    let refresh_token = keys.sign_refresh(user.id, user.role)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        user: PublicUser::from(&user),
    }))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|_| ApiError::Unauthenticated)?;

    // Re-read the user so a role change or deletion invalidates old refresh
    // tokens at rotation time.
    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or(ApiError::Unauthenticated)?;

    let access_token = keys.sign_access(user.id, user.role)?;
    let refresh_token = keys.sign_refresh(user.id, user.role)?;

    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        user: PublicUser::from(&user),
    }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    Auth(claims): Auth,
) -> Result<Json<PublicUser>, ApiError> {
    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or(ApiError::Unauthenticated)?;
    Ok(Json(PublicUser::from(&user)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(is_valid_email("staff@example.com"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a b@example.com"));
        assert!(!is_valid_email("a@b"));
    }
}
