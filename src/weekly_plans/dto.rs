use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::dates::iso_date;
use crate::weekly_plans::repo::{WeeklyPlan, WeeklyPlanWithOwner};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWeeklyPlanRequest {
    pub week_number: Option<i32>,
    pub year: Option<i32>,
    #[serde(default, with = "iso_date::option")]
    pub start_date: Option<Date>,
    #[serde(default, with = "iso_date::option")]
    pub end_date: Option<Date>,
    pub content: Option<String>,
    pub result: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWeeklyPlanRequest {
    pub week_number: Option<i32>,
    pub year: Option<i32>,
    #[serde(default, with = "iso_date::option")]
    pub start_date: Option<Date>,
    #[serde(default, with = "iso_date::option")]
    pub end_date: Option<Date>,
    pub content: Option<String>,
    pub result: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyPlanListParams {
    pub year: Option<i32>,
    pub week_number: Option<i32>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyPlanResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub week_number: i32,
    pub year: i32,
    #[serde(with = "iso_date")]
    pub start_date: Date,
    #[serde(with = "iso_date")]
    pub end_date: Date,
    pub content: String,
    pub result: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_email: Option<String>,
}

impl From<WeeklyPlan> for WeeklyPlanResponse {
    fn from(p: WeeklyPlan) -> Self {
        Self {
            id: p.id,
            owner_id: p.user_id,
            week_number: p.week_number,
            year: p.year,
            start_date: p.start_date,
            end_date: p.end_date,
            content: p.content,
            result: p.result,
            created_at: p.created_at,
            updated_at: p.updated_at,
            owner_name: None,
            owner_email: None,
        }
    }
}

impl From<WeeklyPlanWithOwner> for WeeklyPlanResponse {
    fn from(p: WeeklyPlanWithOwner) -> Self {
        Self {
            id: p.id,
            owner_id: p.user_id,
            week_number: p.week_number,
            year: p.year,
            start_date: p.start_date,
            end_date: p.end_date,
            content: p.content,
            result: p.result,
            created_at: p.created_at,
            updated_at: p.updated_at,
            owner_name: Some(p.owner_name),
            owner_email: Some(p.owner_email),
        }
    }
}
