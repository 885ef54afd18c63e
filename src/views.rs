use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::DisplayConfig;
use crate::dashboard::{CashbackSummary, DashboardSummary};
use crate::filter::TabCounts;
use crate::loan::LoanRequest;
use crate::types::LoanId;

/// one row of the loan request table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanRow {
    pub id: LoanId,
    pub borrower: String,
    pub requested: String,
    pub approved: Option<String>,
    pub installments: Option<u32>,
    pub interest_rate: Option<String>,
    pub monthly_payment: Option<String>,
    pub status: String,
    pub created_on: Option<NaiveDate>,
    pub disbursed: bool,
    pub overdue_installments: usize,
}

impl LoanRow {
    pub fn from_loan(loan: &LoanRequest, display: &DisplayConfig, today: NaiveDate) -> Self {
        LoanRow {
            id: loan.id.clone(),
            borrower: loan.borrower_name.clone().unwrap_or_else(|| "-".to_string()),
            requested: loan.amount_requested.format_with(display),
            approved: loan.value_approved.map(|m| m.format_with(display)),
            installments: loan.max_installments,
            interest_rate: loan.interest_rate.map(|r| r.to_string()),
            monthly_payment: loan.monthly_payment().map(|m| m.format_with(display)),
            status: loan.approval_status.display_label().to_string(),
            created_on: loan.created_on(),
            disbursed: loan.disbursed,
            overdue_installments: loan.overdue_count(today),
        }
    }
}

/// dashboard cards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub total_requested: usize,
    pub total_approved: usize,
    pub total_to_receive: String,
    pub overdue_installments: usize,
    pub tabs: TabCounts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cashback: Option<CashbackView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashbackView {
    pub count: usize,
    pub total: String,
    pub today_count: usize,
    pub today_total: String,
}

impl DashboardView {
    pub fn new(summary: &DashboardSummary, tabs: TabCounts, display: &DisplayConfig) -> Self {
        DashboardView {
            total_requested: summary.total_requested,
            total_approved: summary.total_approved,
            total_to_receive: summary.total_to_receive.format_with(display),
            overdue_installments: summary.overdue_installments,
            tabs,
            cashback: None,
        }
    }

    pub fn with_cashback(mut self, cashback: &CashbackSummary, display: &DisplayConfig) -> Self {
        self.cashback = Some(CashbackView {
            count: cashback.count,
            total: cashback.total.format_with(display),
            today_count: cashback.today_count,
            today_total: cashback.today_total.format_with(display),
        });
        self
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// render a table of rows as pretty json
pub fn rows_to_json_pretty(rows: &[LoanRow]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::{Money, Rate};
    use crate::types::ApprovalStatus;

    #[test]
    fn test_row_formats_for_display() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let mut loan = LoanRequest::new("9", Money::from_major(1500));
        loan.borrower_name = Some("Maria".to_string());
        loan.approval_status = ApprovalStatus::Approved;
        loan.value_approved = Some(Money::from_major(1000));
        loan.max_installments = Some(3);
        loan.interest_rate = Some(Rate::ZERO);

        let row = LoanRow::from_loan(&loan, &DisplayConfig::brazil(), today);
        assert_eq!(row.requested, "R$ 1.500,00");
        assert_eq!(row.approved.as_deref(), Some("R$ 1.000,00"));
        assert_eq!(row.monthly_payment.as_deref(), Some("R$ 333,33"));
        assert_eq!(row.interest_rate.as_deref(), Some("0%"));
        assert_eq!(row.status, "Aprovado");
    }

    #[test]
    fn test_dashboard_view_json() {
        let summary = DashboardSummary {
            total_requested: 4,
            total_approved: 2,
            total_to_receive: Money::from_str_exact("1234.565").unwrap(),
            overdue_installments: 1,
        };
        let cashback = CashbackSummary {
            count: 2,
            total: Money::from_major(15),
            today_count: 1,
            today_total: Money::from_major(5),
        };

        let view = DashboardView::new(&summary, TabCounts::default(), &DisplayConfig::default())
            .with_cashback(&cashback, &DisplayConfig::default());
        assert_eq!(view.total_to_receive, "$ 1,234.57");

        let json = view.to_json_pretty().unwrap();
        assert!(json.contains("\"totalToReceive\": \"$ 1,234.57\""));
        assert!(json.contains("\"todayTotal\": \"$ 5.00\""));
    }
}
