use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::decimal::Money;
use crate::loan::{deserialize_id, deserialize_opt_datetime, LoanRequest};

/// loan counters shown on the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_requested: usize,
    pub total_approved: usize,
    pub total_to_receive: Money,
    pub overdue_installments: usize,
}

impl DashboardSummary {
    pub fn aggregate(loans: &[LoanRequest], today: NaiveDate) -> Self {
        let approved = loans.iter().filter(|loan| loan.is_approved());

        Self {
            total_requested: loans.len(),
            total_approved: approved.clone().count(),
            total_to_receive: approved.map(LoanRequest::amount_to_receive).sum(),
            overdue_installments: loans.iter().map(|loan| loan.overdue_count(today)).sum(),
        }
    }

    /// aggregate straight from a list endpoint payload
    ///
    /// Never fails. A payload that is not a list gives a zero summary. Every
    /// list entry counts as requested, even one that cannot be read as a loan.
    pub fn from_json(payload: &Value, today: NaiveDate) -> Self {
        match parse_list::<LoanRequest>(payload, "loan") {
            Some((loans, skipped)) => Self {
                total_requested: loans.len() + skipped,
                ..Self::aggregate(&loans, today)
            },
            None => Self::default(),
        }
    }
}

/// reward credit issued to a wallet user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashbackRecord {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub user_id: String,
    pub amount: Money,
    #[serde(default, deserialize_with = "deserialize_opt_datetime")]
    pub created_at: Option<DateTime<Utc>>,
}

/// cashback totals shown on the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashbackSummary {
    pub count: usize,
    pub total: Money,
    pub today_count: usize,
    pub today_total: Money,
}

impl CashbackSummary {
    pub fn aggregate(records: &[CashbackRecord], today: NaiveDate) -> Self {
        let issued_today = records
            .iter()
            .filter(|r| r.created_at.map(|ts| ts.date_naive()) == Some(today));

        Self {
            count: records.len(),
            total: records.iter().map(|r| r.amount).sum(),
            today_count: issued_today.clone().count(),
            today_total: issued_today.map(|r| r.amount).sum(),
        }
    }

    /// `count` covers every list entry; totals only the readable ones
    pub fn from_json(payload: &Value, today: NaiveDate) -> Self {
        match parse_list::<CashbackRecord>(payload, "cashback") {
            Some((records, skipped)) => Self {
                count: records.len() + skipped,
                ..Self::aggregate(&records, today)
            },
            None => Self::default(),
        }
    }
}

/// parse every element of a JSON list, skipping the ones that do not fit `T`
///
/// Returns `None` when the payload is not a list, otherwise the parsed
/// records and how many were skipped.
pub(crate) fn parse_list<T: DeserializeOwned>(payload: &Value, kind: &str) -> Option<(Vec<T>, usize)> {
    let Some(items) = payload.as_array() else {
        tracing::warn!(kind, "expected a list payload, got {}", value_kind(payload));
        return None;
    };

    let mut records = Vec::with_capacity(items.len());
    let mut skipped = 0;
    for (index, item) in items.iter().enumerate() {
        match T::deserialize(item) {
            Ok(record) => records.push(record),
            Err(error) => {
                skipped += 1;
                tracing::warn!(kind, index, %error, "skipping malformed record");
            }
        }
    }

    Some((records, skipped))
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
