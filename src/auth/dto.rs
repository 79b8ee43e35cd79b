use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::claims::Role;
use crate::auth::repo::User;

/// Request body for self-registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Request body for login. `identifier` matches name or email.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "username")]
    pub identifier: String,
    pub password: String,
}

/// Request body for token refresh.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Response returned after login or refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: PublicUser,
}

/// Public part of the user returned to clients. Never carries the hash.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_user_never_serializes_a_hash() {
        let user = User {
            id: Uuid::new_v4(),
            name: "dana".into(),
            email: "dana@example.com".into(),
            password_hash: Some("secret-hash".into()),
            role: Role::Staff,
            phone: None,
            birthday: None,
            image: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
        };
        let json = serde_json::to_string(&PublicUser::from(&user)).unwrap();
        assert!(json.contains("dana@example.com"));
        assert!(!json.contains("secret-hash"));
    }

    #[test]
    fn login_accepts_username_alias() {
        let req: LoginRequest =
            serde_json::from_str(r#"{"username":"dana","password":"pw"}"#).unwrap();
        assert_eq!(req.identifier, "dana");
    }
}
