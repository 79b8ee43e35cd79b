use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::accounts::repo::{Account, AccountWithOwner};

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAccountRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountListParams {
    pub search: Option<String>,
    /// Admin-only narrowing to one owner; ignored for everyone else.
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub owner_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_email: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Account> for AccountResponse {
    fn from(a: Account) -> Self {
        Self {
            id: a.id,
            name: a.name,
            email: a.email,
            phone: a.phone,
            address: a.address,
            owner_id: a.created_by,
            owner_name: None,
            owner_email: None,
            created_at: a.created_at,
        }
    }
}

impl From<AccountWithOwner> for AccountResponse {
    fn from(a: AccountWithOwner) -> Self {
        Self {
            id: a.id,
            name: a.name,
            email: a.email,
            phone: a.phone,
            address: a.address,
            owner_id: a.created_by,
            owner_name: Some(a.owner_name),
            owner_email: Some(a.owner_email),
            created_at: a.created_at,
        }
    }
}
