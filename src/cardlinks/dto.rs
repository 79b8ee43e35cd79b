use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::cardlinks::repo::{CardLink, CardLinkStatus, CardLinkWithOwner};
use crate::dates::iso_date;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCardLinkRequest {
    pub email: Option<String>,
    pub card_number: Option<String>,
    pub site: Option<String>,
    #[serde(default, with = "iso_date::option")]
    pub from: Option<Date>,
    #[serde(default, with = "iso_date::option")]
    pub to: Option<Date>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCardLinkRequest {
    pub email: Option<String>,
    pub card_number: Option<String>,
    pub site: Option<String>,
    #[serde(default, with = "iso_date::option")]
    pub from: Option<Date>,
    #[serde(default, with = "iso_date::option")]
    pub to: Option<Date>,
    /// Admin-only cancellation request.
    pub status: Option<CardLinkStatus>,
}

impl UpdateCardLinkRequest {
    pub fn has_field_changes(&self) -> bool {
        self.email.is_some()
            || self.card_number.is_some()
            || self.site.is_some()
            || self.from.is_some()
            || self.to.is_some()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardLinkListParams {
    pub search: Option<String>,
    pub user_id: Option<Uuid>,
    #[serde(default, with = "iso_date::option")]
    pub from: Option<Date>,
    #[serde(default, with = "iso_date::option")]
    pub to: Option<Date>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardLinkResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub email: String,
    pub card_number: String,
    pub site: String,
    #[serde(with = "iso_date")]
    pub from: Date,
    #[serde(with = "iso_date")]
    pub to: Date,
    pub status: CardLinkStatus,
    pub approved_by: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub approved_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_email: Option<String>,
}

impl From<CardLink> for CardLinkResponse {
    fn from(c: CardLink) -> Self {
        Self {
            id: c.id,
            owner_id: c.user_id,
            email: c.email,
            card_number: c.card_number,
            site: c.site,
            from: c.from_date,
            to: c.to_date,
            status: c.status,
            approved_by: c.approved_by,
            approved_at: c.approved_at,
            created_at: c.created_at,
            owner_name: None,
            owner_email: None,
        }
    }
}

impl From<CardLinkWithOwner> for CardLinkResponse {
    fn from(c: CardLinkWithOwner) -> Self {
        Self {
            id: c.id,
            owner_id: c.user_id,
            email: c.email,
            card_number: c.card_number,
            site: c.site,
            from: c.from_date,
            to: c.to_date,
            status: c.status,
            approved_by: c.approved_by,
            approved_at: c.approved_at,
            created_at: c.created_at,
            owner_name: Some(c.owner_name),
            owner_email: Some(c.owner_email),
        }
    }
}
