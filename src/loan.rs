use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::config::LoanLimits;
use crate::decimal::{Money, Rate};
use crate::errors::{DeskError, Result};
use crate::payments::installment_payment;
use crate::types::{ApprovalStatus, LoanId};

/// loan request as reported by the backend
///
/// Deserialization is lenient: a field that is missing or has the wrong
/// shape falls back to its empty value instead of rejecting the record.
/// Only a record without a usable `id` fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawLoanRequest")]
pub struct LoanRequest {
    pub id: LoanId,
    pub borrower_name: Option<String>,
    pub amount_requested: Money,
    pub value_approved: Option<Money>,
    pub max_installments: Option<u32>,
    pub interest_rate: Option<Rate>,
    pub approval_status: ApprovalStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub disbursed: bool,
    pub disbursed_at: Option<DateTime<Utc>>,
    /// present only on detail views
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installments: Option<Vec<Installment>>,
}

/// loan record exactly as it arrives, every field loosely typed
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLoanRequest {
    #[serde(default)]
    id: Value,
    #[serde(default)]
    borrower_name: Value,
    #[serde(default)]
    amount_requested: Value,
    #[serde(default)]
    value_approved: Value,
    #[serde(default)]
    max_installments: Value,
    #[serde(default)]
    interest_rate: Value,
    #[serde(default)]
    approval_status: Value,
    #[serde(default)]
    status: Value,
    #[serde(default)]
    created_at: Value,
    #[serde(default)]
    disbursed: Value,
    #[serde(default)]
    disbursed_at: Value,
    #[serde(default)]
    installments: Value,
}

impl TryFrom<RawLoanRequest> for LoanRequest {
    type Error = String;

    fn try_from(raw: RawLoanRequest) -> std::result::Result<Self, Self::Error> {
        let id = id_from_value(&raw.id).ok_or_else(|| format!("missing or invalid id: {}", raw.id))?;

        // `approvalStatus` wins when both keys are sent
        let status = if raw.approval_status.is_null() {
            &raw.status
        } else {
            &raw.approval_status
        };

        let installments = raw.installments.as_array().map(|items| {
            items
                .iter()
                .filter_map(loose::<Installment>)
                .collect::<Vec<_>>()
        });

        Ok(LoanRequest {
            id,
            borrower_name: loose(&raw.borrower_name),
            amount_requested: loose(&raw.amount_requested).unwrap_or(Money::ZERO),
            value_approved: loose(&raw.value_approved),
            max_installments: count_from_value(&raw.max_installments),
            interest_rate: loose(&raw.interest_rate),
            approval_status: status_from_value(status),
            created_at: raw.created_at.as_str().and_then(parse_datetime),
            disbursed: loose(&raw.disbursed).unwrap_or(false),
            disbursed_at: raw.disbursed_at.as_str().and_then(parse_datetime),
            installments,
        })
    }
}

/// one scheduled repayment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Installment {
    #[serde(default, deserialize_with = "deserialize_opt_date")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_opt_date")]
    pub payment_date: Option<NaiveDate>,
}

impl Installment {
    pub fn new(due_date: NaiveDate) -> Self {
        Self {
            due_date: Some(due_date),
            payment_date: None,
        }
    }

    pub fn paid_on(mut self, date: NaiveDate) -> Self {
        self.payment_date = Some(date);
        self
    }

    /// unpaid and due strictly before `today`; no due date means not overdue
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        match (self.due_date, self.payment_date) {
            (Some(due), None) => due < today,
            _ => false,
        }
    }
}

impl LoanRequest {
    /// minimal pending request, mostly for tests and demos
    pub fn new(id: impl Into<LoanId>, amount_requested: Money) -> Self {
        Self {
            id: id.into(),
            borrower_name: None,
            amount_requested,
            value_approved: None,
            max_installments: None,
            interest_rate: None,
            approval_status: ApprovalStatus::Pending,
            created_at: None,
            disbursed: false,
            disbursed_at: None,
            installments: None,
        }
    }

    pub fn is_approved(&self) -> bool {
        self.approval_status == ApprovalStatus::Approved
    }

    /// value the institution will receive back as principal
    pub fn amount_to_receive(&self) -> Money {
        self.value_approved.unwrap_or(self.amount_requested)
    }

    /// installments overdue as of `today`
    pub fn overdue_count(&self, today: NaiveDate) -> usize {
        self.installments
            .as_ref()
            .map(|list| list.iter().filter(|i| i.is_overdue(today)).count())
            .unwrap_or(0)
    }

    /// fixed monthly payment for the approved terms, if the terms are known
    pub fn monthly_payment(&self) -> Option<Money> {
        let count = self.max_installments?;
        let rate = self.interest_rate.unwrap_or(Rate::ZERO);
        Some(installment_payment(self.amount_to_receive(), count as i64, rate))
    }

    /// date portion of `created_at`, in UTC
    pub fn created_on(&self) -> Option<NaiveDate> {
        self.created_at.map(|ts| ts.date_naive())
    }
}

/// terms an operator chooses when approving a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalTerms {
    pub value_approved: Money,
    pub max_installments: u32,
    pub interest_rate: Rate,
}

impl ApprovalTerms {
    pub fn new(value_approved: Money, max_installments: u32, interest_rate: Rate) -> Self {
        Self {
            value_approved,
            max_installments,
            interest_rate,
        }
    }

    pub fn validate(&self, amount_requested: Money, limits: &LoanLimits) -> Result<()> {
        if self.max_installments == 0 || self.max_installments > limits.max_installments {
            return Err(DeskError::InvalidTerms {
                message: format!(
                    "installments must be between 1 and {}, got {}",
                    limits.max_installments, self.max_installments
                ),
            });
        }

        let percent = self.interest_rate.as_percentage();
        if percent < Decimal::ZERO || percent > limits.max_interest_rate {
            return Err(DeskError::InvalidInterestRate {
                rate: self.interest_rate,
            });
        }

        if !self.value_approved.is_positive() {
            return Err(DeskError::InvalidTerms {
                message: format!("approved value must be positive, got {}", self.value_approved),
            });
        }

        if self.value_approved > amount_requested {
            return Err(DeskError::ApprovedExceedsRequested {
                approved: self.value_approved,
                requested: amount_requested,
            });
        }

        Ok(())
    }

    /// fixed monthly payment under these terms
    pub fn monthly_payment(&self) -> Money {
        installment_payment(self.value_approved, self.max_installments as i64, self.interest_rate)
    }
}

/// backends send ids as strings or as numbers
fn id_from_value(value: &Value) -> Option<LoanId> {
    match value {
        Value::String(id) if !id.trim().is_empty() => Some(id.trim().to_string()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    id_from_value(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid id: {}", raw)))
}

/// `T` if the value has the right shape, `None` otherwise
fn loose<T: DeserializeOwned>(value: &Value) -> Option<T> {
    if value.is_null() {
        return None;
    }
    T::deserialize(value).ok()
}

/// counts arrive as numbers or as digit strings
fn count_from_value(value: &Value) -> Option<u32> {
    match value {
        Value::String(raw) => raw.trim().parse().ok(),
        other => loose(other),
    }
}

fn status_from_value(value: &Value) -> ApprovalStatus {
    match value {
        Value::Null => ApprovalStatus::Pending,
        Value::String(raw) => ApprovalStatus::parse(raw),
        other => ApprovalStatus::Other(other.to_string()),
    }
}

fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .ok()
        .or_else(|| parse_datetime(raw).map(|ts| ts.date_naive()))
}

/// timestamp or `None`; unparseable values are treated as absent
pub(crate) fn deserialize_opt_datetime<'de, D>(deserializer: D) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(raw.as_str().and_then(parse_datetime))
}

/// date or `None`; unparseable values are treated as absent
fn deserialize_opt_date<'de, D>(deserializer: D) -> std::result::Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(raw.as_str().and_then(parse_date))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    #[test]
    fn test_overdue_requires_past_due_and_unpaid() {
        let yesterday = today() - Duration::days(1);
        let tomorrow = today() + Duration::days(1);

        assert!(Installment::new(yesterday).is_overdue(today()));
        assert!(!Installment::new(yesterday).paid_on(yesterday).is_overdue(today()));
        assert!(!Installment::new(tomorrow).is_overdue(today()));
        // due today is not strictly before today
        assert!(!Installment::new(today()).is_overdue(today()));
    }

    #[test]
    fn test_missing_due_date_is_not_overdue() {
        let installment = Installment {
            due_date: None,
            payment_date: None,
        };
        assert!(!installment.is_overdue(today()));
    }

    #[test]
    fn test_paid_late_is_not_overdue() {
        let long_ago = today() - Duration::days(90);
        let installment = Installment::new(long_ago).paid_on(today());
        assert!(!installment.is_overdue(today()));
    }

    #[test]
    fn test_deserialize_backend_payload() {
        let json = r#"{
            "id": "42",
            "borrowerName": "Maria",
            "amountRequested": "1500.00",
            "valueApproved": 1200,
            "maxInstallments": 12,
            "interestRate": 2.5,
            "status": "Aprovado",
            "createdAt": "2024-06-15T13:45:00.000Z",
            "installments": [
                {"dueDate": "2024-06-01", "paymentDate": null},
                {"dueDate": "2024-07-01T00:00:00", "paymentDate": ""}
            ]
        }"#;

        let loan: LoanRequest = serde_json::from_str(json).unwrap();
        assert_eq!(loan.approval_status, ApprovalStatus::Approved);
        assert_eq!(loan.amount_requested, Money::from_major(1500));
        assert_eq!(loan.value_approved, Some(Money::from_major(1200)));
        assert_eq!(loan.interest_rate, Some(Rate::from_percent(dec!(2.5))));
        assert_eq!(loan.created_on(), Some(today()));
        assert_eq!(loan.overdue_count(today()), 1);
        assert!(!loan.disbursed);
    }

    #[test]
    fn test_numeric_id_accepted() {
        let loan: LoanRequest = serde_json::from_str(r#"{"id": 7, "amountRequested": 10}"#).unwrap();
        assert_eq!(loan.id, "7");
        assert_eq!(loan.approval_status, ApprovalStatus::Pending);
    }

    #[test]
    fn test_loosely_shaped_records_still_parse() {
        let null_status: LoanRequest =
            serde_json::from_str(r#"{"id": "1", "amountRequested": 100, "approvalStatus": null}"#).unwrap();
        assert_eq!(null_status.approval_status, ApprovalStatus::Pending);

        let both_keys: LoanRequest = serde_json::from_str(
            r#"{"id": "2", "amountRequested": 100, "status": "Pendente", "approvalStatus": "APPROVED"}"#,
        )
        .unwrap();
        assert_eq!(both_keys.approval_status, ApprovalStatus::Approved);

        let text_count: LoanRequest =
            serde_json::from_str(r#"{"id": "3", "amountRequested": "1200", "maxInstallments": "12"}"#).unwrap();
        assert_eq!(text_count.max_installments, Some(12));
        assert_eq!(text_count.monthly_payment(), Some(Money::from_major(100)));

        let numeric_status: LoanRequest =
            serde_json::from_str(r#"{"id": 4, "amountRequested": 100, "status": 2}"#).unwrap();
        assert_eq!(numeric_status.approval_status, ApprovalStatus::Other("2".to_string()));
    }

    #[test]
    fn test_unreadable_dates_are_absent() {
        let loan: LoanRequest = serde_json::from_str(
            r#"{
                "id": "5",
                "amountRequested": 100,
                "createdAt": "ontem",
                "installments": [
                    {"dueDate": "15/05/2024"},
                    {"dueDate": "2024-05-15"},
                    "garbage"
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(loan.created_at, None);
        let installments = loan.installments.as_ref().unwrap();
        assert_eq!(installments.len(), 2);
        assert_eq!(installments[0].due_date, None);
        // only the readable, past-due installment counts
        assert_eq!(loan.overdue_count(today()), 1);
    }

    #[test]
    fn test_record_without_id_is_rejected() {
        assert!(serde_json::from_str::<LoanRequest>(r#"{"amountRequested": 100}"#).is_err());
        assert!(serde_json::from_str::<LoanRequest>(r#"{"id": "", "amountRequested": 100}"#).is_err());
    }

    #[test]
    fn test_serialized_record_reads_back() {
        let mut loan = LoanRequest::new("9", Money::from_str_exact("1500.25").unwrap());
        loan.approval_status = ApprovalStatus::Approved;
        loan.interest_rate = Some(Rate::from_percent(dec!(1.99)));
        loan.max_installments = Some(10);
        loan.created_at = Some(Utc.with_ymd_and_hms(2024, 6, 15, 9, 30, 0).unwrap());
        loan.installments = Some(vec![Installment::new(today()).paid_on(today())]);

        let json = serde_json::to_value(&loan).unwrap();
        assert_eq!(json["approvalStatus"], "APPROVED");
        let back: LoanRequest = serde_json::from_value(json).unwrap();
        assert_eq!(back, loan);
    }

    #[test]
    fn test_amount_to_receive_falls_back_to_requested() {
        let mut loan = LoanRequest::new("1", Money::from_major(500));
        assert_eq!(loan.amount_to_receive(), Money::from_major(500));

        loan.value_approved = Some(Money::from_major(300));
        assert_eq!(loan.amount_to_receive(), Money::from_major(300));
    }

    #[test]
    fn test_monthly_payment_needs_installment_count() {
        let mut loan = LoanRequest::new("1", Money::from_major(1200));
        assert_eq!(loan.monthly_payment(), None);

        loan.max_installments = Some(12);
        assert_eq!(loan.monthly_payment(), Some(Money::from_major(100)));
    }

    #[test]
    fn test_terms_validation() {
        let limits = LoanLimits::default();
        let requested = Money::from_major(1000);
        let rate = Rate::from_percent(dec!(2.5));

        assert!(ApprovalTerms::new(Money::from_major(800), 12, rate)
            .validate(requested, &limits)
            .is_ok());
        assert!(ApprovalTerms::new(requested, 60, Rate::from_percent(dec!(100)))
            .validate(requested, &limits)
            .is_ok());

        assert!(matches!(
            ApprovalTerms::new(requested, 0, rate).validate(requested, &limits),
            Err(DeskError::InvalidTerms { .. })
        ));
        assert!(matches!(
            ApprovalTerms::new(requested, 61, rate).validate(requested, &limits),
            Err(DeskError::InvalidTerms { .. })
        ));
        assert!(matches!(
            ApprovalTerms::new(requested, 12, Rate::from_percent(dec!(100.5))).validate(requested, &limits),
            Err(DeskError::InvalidInterestRate { .. })
        ));
        assert!(matches!(
            ApprovalTerms::new(Money::from_major(1001), 12, rate).validate(requested, &limits),
            Err(DeskError::ApprovedExceedsRequested { .. })
        ));
        assert!(matches!(
            ApprovalTerms::new(Money::ZERO, 12, rate).validate(requested, &limits),
            Err(DeskError::InvalidTerms { .. })
        ));
    }

    #[test]
    fn test_naive_timestamp_taken_as_utc() {
        let ts = parse_datetime("2024-06-15 23:30:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 6, 15, 23, 30, 0).unwrap());
        assert_eq!(parse_date("2024-06-15T23:30:00-03:00"), NaiveDate::from_ymd_opt(2024, 6, 16));
    }
}
