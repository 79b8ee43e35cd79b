use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

use crate::auth::claims::Role;
use crate::auth::repo::User;
use crate::dates;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub image: Option<String>,
    #[serde(default, with = "dates::iso_date::option")]
    pub birthday: Option<Date>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub phone: Option<String>,
    #[serde(with = "dates::iso_date::option")]
    pub birthday: Option<Date>,
    pub image: Option<String>,
}

impl From<User> for ProfileResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            phone: user.phone,
            birthday: user.birthday,
            image: user.image,
        }
    }
}
