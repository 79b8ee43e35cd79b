use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::dates::iso_date;
use crate::transactions::repo::{
    MonthlyTotal, StatusTotal, SummaryStats, Transaction, TransactionWithOwner, TxStatus,
};

#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    #[serde(default, with = "iso_date::option")]
    pub date: Option<Date>,
    pub amount: Option<Decimal>,
    pub description: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTransactionRequest {
    #[serde(default, with = "iso_date::option")]
    pub date: Option<Date>,
    pub amount: Option<Decimal>,
    pub description: Option<String>,
    pub notes: Option<String>,
    /// Admin-only status transition request.
    pub status: Option<TxStatus>,
}

impl UpdateTransactionRequest {
    pub fn has_field_changes(&self) -> bool {
        self.date.is_some()
            || self.amount.is_some()
            || self.description.is_some()
            || self.notes.is_some()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionListParams {
    pub search: Option<String>,
    pub user_id: Option<Uuid>,
    #[serde(default, with = "iso_date::option")]
    pub from: Option<Date>,
    #[serde(default, with = "iso_date::option")]
    pub to: Option<Date>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryParams {
    pub year: Option<i32>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    #[serde(with = "iso_date")]
    pub date: Date,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub status: TxStatus,
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

impl From<Transaction> for TransactionResponse {
    fn from(t: Transaction) -> Self {
        Self {
            id: t.id,
            owner_id: t.user_id,
            date: t.date,
            amount: t.amount,
            description: t.description,
            notes: t.notes,
            status: t.status,
            approved_by: t.approved_by,
            approved_at: t.approved_at,
            created_at: t.created_at,
            owner_name: None,
            owner_email: None,
        }
    }
}

impl From<TransactionWithOwner> for TransactionResponse {
    fn from(t: TransactionWithOwner) -> Self {
        Self {
            id: t.id,
            owner_id: t.user_id,
            date: t.date,
            amount: t.amount,
            description: t.description,
            notes: t.notes,
            status: t.status,
            approved_by: t.approved_by,
            approved_at: t.approved_at,
            created_at: t.created_at,
            owner_name: Some(t.owner_name),
            owner_email: Some(t.owner_email),
        }
    }
}

// --- summary ---

#[derive(Debug, Serialize)]
pub struct MonthlyPoint {
    /// Calendar month label, `YYYY-MM`.
    pub period: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStatsDto {
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub total_count: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub avg_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub min_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub max_amount: Decimal,
}

#[derive(Debug, Serialize)]
pub struct StatusStat {
    pub count: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    pub monthly: Vec<MonthlyPoint>,
    pub stats: SummaryStatsDto,
    pub status_breakdown: BTreeMap<TxStatus, StatusStat>,
}

impl SummaryResponse {
    pub fn assemble(
        monthly: Vec<MonthlyTotal>,
        stats: SummaryStats,
        breakdown: Vec<StatusTotal>,
    ) -> Self {
        Self {
            monthly: monthly
                .into_iter()
                .map(|m| MonthlyPoint {
                    period: m.period,
                    total: m.total,
                })
                .collect(),
            stats: SummaryStatsDto {
                total_amount: stats.total_amount,
                total_count: stats.total_count,
                avg_amount: stats.avg_amount,
                min_amount: stats.min_amount,
                max_amount: stats.max_amount,
            },
            status_breakdown: breakdown
                .into_iter()
                .map(|s| {
                    (
                        s.status,
                        StatusStat {
                            count: s.count,
                            total: s.total,
                        },
                    )
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[test]
    fn summary_serializes_with_api_field_names() {
        let response = SummaryResponse::assemble(
            vec![
                MonthlyTotal {
                    period: "2025-01".into(),
                    total: Decimal::from_str("15").unwrap(),
                },
                MonthlyTotal {
                    period: "2025-02".into(),
                    total: Decimal::from_str("20").unwrap(),
                },
            ],
            SummaryStats {
                total_amount: Decimal::from_str("35").unwrap(),
                total_count: 3,
                avg_amount: Decimal::from_str("11.67").unwrap(),
                min_amount: Decimal::from_str("5").unwrap(),
                max_amount: Decimal::from_str("20").unwrap(),
            },
            vec![StatusTotal {
                status: TxStatus::Approved,
                count: 1,
                total: Decimal::from_str("10").unwrap(),
            }],
        );
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["monthly"][0]["period"], "2025-01");
        assert_eq!(json["monthly"][0]["total"], 15.0);
        assert_eq!(json["stats"]["totalAmount"], 35.0);
        assert_eq!(json["stats"]["totalCount"], 3);
        assert_eq!(json["statusBreakdown"]["approved"]["count"], 1);
        assert_eq!(json["statusBreakdown"]["approved"]["total"], 10.0);
    }

    #[test]
    fn create_accepts_plain_json_numbers() {
        let req: CreateTransactionRequest =
            serde_json::from_str(r#"{"date":"2025-03-01","amount":42.5,"description":"x"}"#)
                .unwrap();
        assert_eq!(req.amount, Some(Decimal::from_str("42.5").unwrap()));
        assert_eq!(req.date.unwrap().to_string(), "2025-03-01");
    }

    #[test]
    fn update_detects_field_changes() {
        let none: UpdateTransactionRequest = serde_json::from_str(r#"{"status":"approved"}"#).unwrap();
        assert!(!none.has_field_changes());
        assert_eq!(none.status, Some(TxStatus::Approved));

        let some: UpdateTransactionRequest = serde_json::from_str(r#"{"notes":"n"}"#).unwrap();
        assert!(some.has_field_changes());
    }
}
