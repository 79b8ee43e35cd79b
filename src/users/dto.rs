use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::auth::claims::Role;
use crate::auth::repo::User;
use crate::dates;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListParams {
    pub search: Option<String>,
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub role: Option<Role>,
    pub phone: Option<String>,
    #[serde(default, with = "dates::iso_date::option")]
    pub birthday: Option<Date>,
}

/// Admin-facing view. The hash itself never leaves the repository layer;
/// only the fact that one exists is exposed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub phone: Option<String>,
    #[serde(with = "dates::iso_date::option")]
    pub birthday: Option<Date>,
    pub image: Option<String>,
    pub password_set: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            phone: user.phone,
            birthday: user.birthday,
            image: user.image,
            password_set: user.password_hash.is_some(),
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invited() -> User {
        User {
            id: Uuid::new_v4(),
            name: "dana".into(),
            email: "dana@corp.test".into(),
            password_hash: None,
            role: Role::Staff,
            phone: None,
            birthday: None,
            image: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn password_set_reflects_hash_presence() {
        let mut user = invited();
        assert!(!UserResponse::from(user.clone()).password_set);
        user.password_hash = Some("$argon2id$...".into());
        assert!(UserResponse::from(user).password_set);
    }

    #[test]
    fn response_never_contains_hash() {
        let mut user = invited();
        user.password_hash = Some("$argon2id$secret".into());
        let json = serde_json::to_string(&UserResponse::from(user)).unwrap();
        assert!(!json.contains("argon2id"));
        assert!(json.contains("\"passwordSet\":true"));
    }
}
