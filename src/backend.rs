use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::{DeskError, Result};
use crate::loan::{ApprovalTerms, LoanRequest};
use crate::types::{ApprovalStatus, LoanId};

/// one state-changing call against a loan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationRequest {
    pub loan_id: LoanId,
    /// lets the backend recognise a retried submission
    pub idempotency_key: Uuid,
    pub bearer_token: String,
    pub requested_at: DateTime<Utc>,
}

impl MutationRequest {
    pub fn new(loan_id: impl Into<LoanId>, bearer_token: impl Into<String>, requested_at: DateTime<Utc>) -> Self {
        Self {
            loan_id: loan_id.into(),
            idempotency_key: Uuid::new_v4(),
            bearer_token: bearer_token.into(),
            requested_at,
        }
    }
}

/// push notification sent to a wallet user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// user id, or `None` to broadcast
    #[serde(default)]
    pub recipient: Option<String>,
    pub title: String,
    pub body: String,
}

impl Notification {
    pub fn to_user(user_id: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            recipient: Some(user_id.into()),
            title: title.into(),
            body: body.into(),
        }
    }

    pub fn broadcast(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            recipient: None,
            title: title.into(),
            body: body.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(DeskError::InvalidNotification {
                message: "title must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// calls the desk makes against the REST API
///
/// The HTTP transport lives outside this crate. [`InMemoryBackend`] answers
/// the same calls from JSON held in memory.
pub trait LoanBackend {
    /// raw payload of the loan list endpoint
    fn list_loans(&self) -> Result<Value>;

    /// raw payload of the cashback list endpoint
    fn list_cashbacks(&self) -> Result<Value>;

    fn approve(&mut self, request: &MutationRequest, terms: &ApprovalTerms) -> Result<LoanRequest>;

    fn reject(&mut self, request: &MutationRequest) -> Result<LoanRequest>;

    fn mark_disbursed(&mut self, request: &MutationRequest) -> Result<LoanRequest>;

    fn send_notification(&mut self, bearer_token: &str, notification: &Notification) -> Result<()>;
}

/// how many idempotency keys the in-memory backend remembers by default
pub const DEFAULT_REPLAY_CAPACITY: usize = 1024;

/// backend answering from in-memory JSON
#[derive(Debug)]
pub struct InMemoryBackend {
    loans: Value,
    cashbacks: Value,
    replays: HashMap<Uuid, LoanRequest>,
    /// replay keys, oldest first
    replay_order: VecDeque<Uuid>,
    replay_capacity: usize,
    calls: HashMap<&'static str, usize>,
    notifications: Vec<Notification>,
    fail_next: Option<String>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            loans: Value::Array(Vec::new()),
            cashbacks: Value::Array(Vec::new()),
            replays: HashMap::new(),
            replay_order: VecDeque::new(),
            replay_capacity: DEFAULT_REPLAY_CAPACITY,
            calls: HashMap::new(),
            notifications: Vec::new(),
            fail_next: None,
        }
    }

    /// remember at most `capacity` idempotency keys, evicting the oldest
    pub fn with_replay_capacity(mut self, capacity: usize) -> Self {
        self.replay_capacity = capacity.max(1);
        self.evict_replays();
        self
    }

    /// idempotency keys currently remembered
    pub fn remembered_keys(&self) -> usize {
        self.replays.len()
    }

    fn remember(&mut self, key: Uuid, loan: LoanRequest) {
        if self.replays.insert(key, loan).is_none() {
            self.replay_order.push_back(key);
        }
        self.evict_replays();
    }

    fn evict_replays(&mut self) {
        while self.replay_order.len() > self.replay_capacity {
            if let Some(oldest) = self.replay_order.pop_front() {
                self.replays.remove(&oldest);
            }
        }
    }

    /// seed with loan records
    pub fn with_loans(loans: &[LoanRequest]) -> Result<Self> {
        let mut backend = Self::new();
        backend.loans = serde_json::to_value(loans)?;
        Ok(backend)
    }

    /// replace the loan list payload verbatim, malformed or not
    pub fn set_loans_payload(&mut self, payload: Value) {
        self.loans = payload;
    }

    pub fn set_cashbacks_payload(&mut self, payload: Value) {
        self.cashbacks = payload;
    }

    /// make the next mutating call fail with a backend error
    pub fn fail_next(&mut self, message: impl Into<String>) {
        self.fail_next = Some(message.into());
    }

    /// how many times an endpoint was hit
    pub fn calls(&self, endpoint: &str) -> usize {
        self.calls.get(endpoint).copied().unwrap_or(0)
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    fn record_call(&mut self, endpoint: &'static str) -> Result<()> {
        *self.calls.entry(endpoint).or_insert(0) += 1;
        match self.fail_next.take() {
            Some(message) => Err(DeskError::Backend { message }),
            None => Ok(()),
        }
    }

    fn check_token(token: &str) -> Result<()> {
        if token.trim().is_empty() {
            return Err(DeskError::Unauthenticated);
        }
        Ok(())
    }

    /// apply `change` to the stored record, once per idempotency key
    fn mutate<F>(&mut self, endpoint: &'static str, request: &MutationRequest, change: F) -> Result<LoanRequest>
    where
        F: FnOnce(&mut LoanRequest),
    {
        self.record_call(endpoint)?;
        Self::check_token(&request.bearer_token)?;

        if let Some(previous) = self.replays.get(&request.idempotency_key) {
            tracing::debug!(loan_id = %request.loan_id, endpoint, "replaying idempotent response");
            return Ok(previous.clone());
        }

        let slot = self
            .loans
            .as_array_mut()
            .and_then(|items| {
                items
                    .iter_mut()
                    .find(|item| item.get("id").is_some_and(|id| id_matches(id, &request.loan_id)))
            })
            .ok_or_else(|| DeskError::NotFound {
                id: request.loan_id.clone(),
            })?;

        let mut loan: LoanRequest = serde_json::from_value(slot.clone())?;
        change(&mut loan);
        *slot = serde_json::to_value(&loan)?;

        self.remember(request.idempotency_key, loan.clone());
        Ok(loan)
    }
}

fn id_matches(raw: &Value, id: &str) -> bool {
    match raw {
        Value::String(s) => s == id,
        Value::Number(n) => n.to_string() == id,
        _ => false,
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl LoanBackend for InMemoryBackend {
    fn list_loans(&self) -> Result<Value> {
        Ok(self.loans.clone())
    }

    fn list_cashbacks(&self) -> Result<Value> {
        Ok(self.cashbacks.clone())
    }

    fn approve(&mut self, request: &MutationRequest, terms: &ApprovalTerms) -> Result<LoanRequest> {
        let terms = *terms;
        self.mutate("approve", request, |loan| {
            loan.approval_status = ApprovalStatus::Approved;
            loan.value_approved = Some(terms.value_approved);
            loan.max_installments = Some(terms.max_installments);
            loan.interest_rate = Some(terms.interest_rate);
        })
    }

    fn reject(&mut self, request: &MutationRequest) -> Result<LoanRequest> {
        self.mutate("reject", request, |loan| {
            loan.approval_status = ApprovalStatus::Rejected;
        })
    }

    fn mark_disbursed(&mut self, request: &MutationRequest) -> Result<LoanRequest> {
        let at = request.requested_at;
        self.mutate("disburse", request, |loan| {
            loan.disbursed = true;
            loan.disbursed_at = Some(at);
        })
    }

    fn send_notification(&mut self, bearer_token: &str, notification: &Notification) -> Result<()> {
        self.record_call("notify")?;
        Self::check_token(bearer_token)?;
        self.notifications.push(notification.clone());
        Ok(())
    }
}
