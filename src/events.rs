use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::{Money, Rate};
use crate::types::LoanId;

/// everything the desk records about operator actions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    LoansRefreshed {
        count: usize,
        skipped: usize,
        timestamp: DateTime<Utc>,
    },
    LoanApproved {
        loan_id: LoanId,
        value_approved: Money,
        installments: u32,
        interest_rate: Rate,
        monthly_payment: Money,
        idempotency_key: Uuid,
        operator_id: String,
        timestamp: DateTime<Utc>,
    },
    LoanRejected {
        loan_id: LoanId,
        idempotency_key: Uuid,
        operator_id: String,
        timestamp: DateTime<Utc>,
    },
    LoanDisbursed {
        loan_id: LoanId,
        amount: Money,
        idempotency_key: Uuid,
        operator_id: String,
        timestamp: DateTime<Utc>,
    },
    NotificationSent {
        recipient: String,
        title: String,
        operator_id: String,
        timestamp: DateTime<Utc>,
    },
}

impl Event {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Event::LoansRefreshed { timestamp, .. }
            | Event::LoanApproved { timestamp, .. }
            | Event::LoanRejected { timestamp, .. }
            | Event::LoanDisbursed { timestamp, .. }
            | Event::NotificationSent { timestamp, .. } => *timestamp,
        }
    }

    /// loan the event refers to, if any
    pub fn loan_id(&self) -> Option<&str> {
        match self {
            Event::LoanApproved { loan_id, .. }
            | Event::LoanRejected { loan_id, .. }
            | Event::LoanDisbursed { loan_id, .. } => Some(loan_id),
            Event::LoansRefreshed { .. } | Event::NotificationSent { .. } => None,
        }
    }
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// events about one loan, oldest first
    pub fn for_loan<'a>(&'a self, loan_id: &'a str) -> impl Iterator<Item = &'a Event> + 'a {
        self.events
            .iter()
            .filter(move |event| event.loan_id() == Some(loan_id))
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
