use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::loan::LoanRequest;
use crate::types::StatusTab;

/// true when `loan` belongs under `tab` on `today`
pub fn matches_tab(loan: &LoanRequest, tab: StatusTab, today: NaiveDate) -> bool {
    match tab {
        StatusTab::All => true,
        StatusTab::Today => loan.created_on() == Some(today),
        _ => tab.status().as_ref() == Some(&loan.approval_status),
    }
}

/// subset of `loans` shown under `tab`, in input order
pub fn filter_loans(loans: &[LoanRequest], tab: StatusTab, today: NaiveDate) -> Vec<&LoanRequest> {
    loans
        .iter()
        .filter(|loan| matches_tab(loan, tab, today))
        .collect()
}

/// badge counts for every tab
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TabCounts {
    pub today: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    pub all: usize,
}

impl TabCounts {
    pub fn get(&self, tab: StatusTab) -> usize {
        match tab {
            StatusTab::Today => self.today,
            StatusTab::Pending => self.pending,
            StatusTab::Approved => self.approved,
            StatusTab::Rejected => self.rejected,
            StatusTab::All => self.all,
        }
    }
}

pub fn tab_counts(loans: &[LoanRequest], today: NaiveDate) -> TabCounts {
    let count = |tab: StatusTab| loans.iter().filter(|loan| matches_tab(loan, tab, today)).count();

    TabCounts {
        today: count(StatusTab::Today),
        pending: count(StatusTab::Pending),
        approved: count(StatusTab::Approved),
        rejected: count(StatusTab::Rejected),
        all: loans.len(),
    }
}
