//! Best-effort Slack notification sink.
//!
//! Notifications are dispatched on a detached task after the database write
//! commits; nothing here can fail a request. Failures are logged at warn and
//! dropped.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use time::Date;
use tracing::warn;
use uuid::Uuid;

use crate::dates::DATE_FMT;
use crate::transactions::repo::TxStatus;

#[derive(Debug, Clone)]
pub struct TransactionCreated {
    pub creator_email: String,
    pub amount: Decimal,
    pub date: Date,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct TransactionStatusChanged {
    pub tx_id: Uuid,
    pub new_status: TxStatus,
    pub approver_email: String,
    pub owner_email: Option<String>,
    pub amount: Decimal,
    pub date: Date,
    pub notes: Option<String>,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn transaction_created(&self, event: TransactionCreated);
    async fn transaction_status_changed(&self, event: TransactionStatusChanged);
}

/// Sink used when notifications are disabled (and in unit tests).
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn transaction_created(&self, _event: TransactionCreated) {}
    async fn transaction_status_changed(&self, _event: TransactionStatusChanged) {}
}

pub struct SlackNotifier {
    http: reqwest::Client,
    webhook_url: Option<String>,
    base_url: String,
}

impl SlackNotifier {
    pub fn new(webhook_url: Option<String>, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            webhook_url,
            base_url,
        }
    }

    async fn post(&self, payload: Value) {
        let Some(url) = &self.webhook_url else {
            return; // quietly skip if not configured
        };
        let result = self.http.post(url).json(&payload).send().await;
        match result {
            Ok(res) if !res.status().is_success() => {
                warn!(status = %res.status(), "slack webhook rejected payload");
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "slack webhook delivery failed"),
        }
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn transaction_created(&self, event: TransactionCreated) {
        self.post(created_payload(&event, &self.base_url)).await;
    }

    async fn transaction_status_changed(&self, event: TransactionStatusChanged) {
        self.post(status_changed_payload(&event, &self.base_url))
            .await;
    }
}

fn fmt_usd(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let sign = if rounded.is_sign_negative() { "-" } else { "" };
    let s = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = s.split_once('.').unwrap_or((s.as_str(), "00"));
    let mut grouped = String::new();
    let digits = int_part.as_bytes();
    for (i, b) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*b as char);
    }
    format!("{sign}${grouped}.{frac_part}")
}

fn fmt_date(date: Date) -> String {
    date.format(DATE_FMT).unwrap_or_else(|_| date.to_string())
}

fn open_transactions_action(base_url: &str) -> Value {
    json!({
        "type": "actions",
        "elements": [{
            "type": "button",
            "text": { "type": "plain_text", "text": "Open Transactions" },
            "url": format!("{base_url}/transactions"),
        }]
    })
}

fn created_payload(event: &TransactionCreated, base_url: &str) -> Value {
    let text = format!(
        "New transaction by {} ({} on {})",
        event.creator_email,
        fmt_usd(event.amount),
        fmt_date(event.date)
    );
    json!({
        "text": text,
        "blocks": [
            { "type": "header", "text": { "type": "plain_text", "text": "💸 New Transaction", "emoji": true } },
            { "type": "divider" },
            {
                "type": "section",
                "fields": [
                    { "type": "mrkdwn", "text": format!("*By:*\n{}", event.creator_email) },
                    { "type": "mrkdwn", "text": format!("*Amount:*\n{}", fmt_usd(event.amount)) },
                    { "type": "mrkdwn", "text": format!("*Date:*\n{}", fmt_date(event.date)) },
                    { "type": "mrkdwn", "text": format!("*Description:*\n{}", if event.description.is_empty() { "—" } else { &event.description }) },
                ]
            },
            open_transactions_action(base_url),
        ]
    })
}

fn status_changed_payload(event: &TransactionStatusChanged, base_url: &str) -> Value {
    let status = serde_json::to_value(event.new_status)
        .ok()
        .and_then(|v| v.as_str().map(str::to_owned))
        .unwrap_or_default();
    let emoji = match event.new_status {
        TxStatus::Approved => "✅",
        _ => "⛔",
    };
    let text = format!(
        "Transaction {} by {}",
        status.to_uppercase(),
        event.approver_email
    );
    let mut blocks = vec![
        json!({ "type": "header", "text": { "type": "plain_text", "text": format!("{emoji} Transaction {}", status.to_uppercase()), "emoji": true } }),
        json!({ "type": "divider" }),
        json!({
            "type": "section",
            "fields": [
                { "type": "mrkdwn", "text": format!("*Tx ID:*\n{}", event.tx_id) },
                { "type": "mrkdwn", "text": format!("*Owner:*\n{}", event.owner_email.as_deref().unwrap_or("—")) },
                { "type": "mrkdwn", "text": format!("*Amount:*\n{}", fmt_usd(event.amount)) },
                { "type": "mrkdwn", "text": format!("*Date:*\n{}", fmt_date(event.date)) },
                { "type": "mrkdwn", "text": format!("*Approver:*\n{}", event.approver_email) },
                { "type": "mrkdwn", "text": format!("*Status:*\n{status}") },
            ]
        }),
    ];
    if let Some(notes) = event.notes.as_deref().filter(|n| !n.is_empty()) {
        blocks.push(json!({
            "type": "section",
            "text": { "type": "mrkdwn", "text": format!("*Notes*\n{notes}") }
        }));
    }
    blocks.push(open_transactions_action(base_url));
    json!({ "text": text, "blocks": blocks })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use time::macros::date;

    #[test]
    fn formats_amounts_like_the_dashboard() {
        assert_eq!(fmt_usd(Decimal::from_str("42.5").unwrap()), "$42.50");
        assert_eq!(fmt_usd(Decimal::from_str("1234567.891").unwrap()), "$1,234,567.89");
        assert_eq!(fmt_usd(Decimal::from_str("-950").unwrap()), "-$950.00");
        assert_eq!(fmt_usd(Decimal::ZERO), "$0.00");
    }

    #[test]
    fn created_payload_carries_fields() {
        let event = TransactionCreated {
            creator_email: "staff@example.com".into(),
            amount: Decimal::from_str("42.50").unwrap(),
            date: date!(2025 - 03 - 01),
            description: "office chairs".into(),
        };
        let payload = created_payload(&event, "http://localhost:8080");
        let text = payload["text"].as_str().unwrap();
        assert!(text.contains("staff@example.com"));
        assert!(text.contains("$42.50"));
        assert!(text.contains("2025-03-01"));
        let rendered = payload.to_string();
        assert!(rendered.contains("office chairs"));
        assert!(rendered.contains("http://localhost:8080/transactions"));
    }

    #[test]
    fn status_payload_marks_rejection() {
        let event = TransactionStatusChanged {
            tx_id: Uuid::new_v4(),
            new_status: TxStatus::Rejected,
            approver_email: "admin@example.com".into(),
            owner_email: Some("staff@example.com".into()),
            amount: Decimal::from_str("10").unwrap(),
            date: date!(2025 - 01 - 15),
            notes: Some("missing receipt".into()),
        };
        let payload = status_changed_payload(&event, "http://localhost:8080");
        assert_eq!(
            payload["text"].as_str().unwrap(),
            "Transaction REJECTED by admin@example.com"
        );
        let rendered = payload.to_string();
        assert!(rendered.contains("missing receipt"));
        assert!(rendered.contains(&event.tx_id.to_string()));
    }

    #[test]
    fn status_payload_omits_empty_notes() {
        let event = TransactionStatusChanged {
            tx_id: Uuid::new_v4(),
            new_status: TxStatus::Approved,
            approver_email: "admin@example.com".into(),
            owner_email: None,
            amount: Decimal::ZERO,
            date: date!(2025 - 01 - 15),
            notes: None,
        };
        let payload = status_changed_payload(&event, "http://localhost:8080");
        assert!(!payload.to_string().contains("*Notes*"));
    }
}
