use std::collections::HashMap;

use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;

use crate::backend::{LoanBackend, MutationRequest, Notification};
use crate::config::DeskConfig;
use crate::dashboard::{parse_list, CashbackRecord, CashbackSummary, DashboardSummary};
use crate::errors::{DeskError, Result};
use crate::events::{Event, EventStore};
use crate::filter::{filter_loans, tab_counts, TabCounts};
use crate::loan::{ApprovalTerms, LoanRequest};
use crate::payments::AmortizationSchedule;
use crate::session::SessionContext;
use crate::types::{ApprovalStatus, LoanId, StatusTab};
use crate::views::{DashboardView, LoanRow};

/// loan records last fetched from the backend, in list order
#[derive(Debug, Default)]
pub struct LoanCache {
    loans: Vec<LoanRequest>,
    index: HashMap<LoanId, usize>,
}

impl LoanCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// drop everything and load `loans`
    ///
    /// A repeated id keeps the first position and the last record. Returns
    /// how many duplicates were folded.
    pub fn replace_all(&mut self, loans: Vec<LoanRequest>) -> usize {
        self.loans.clear();
        self.index.clear();

        let received = loans.len();
        for loan in loans {
            self.upsert(loan);
        }
        received - self.loans.len()
    }

    /// replace one record in place, or append it if unseen
    pub fn upsert(&mut self, loan: LoanRequest) -> &LoanRequest {
        let pos = match self.index.get(&loan.id) {
            Some(&pos) => {
                self.loans[pos] = loan;
                pos
            }
            None => {
                let pos = self.loans.len();
                self.index.insert(loan.id.clone(), pos);
                self.loans.push(loan);
                pos
            }
        };
        &self.loans[pos]
    }

    pub fn get(&self, id: &str) -> Option<&LoanRequest> {
        self.index.get(id).map(|&pos| &self.loans[pos])
    }

    pub fn all(&self) -> &[LoanRequest] {
        &self.loans
    }

    pub fn len(&self) -> usize {
        self.loans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loans.is_empty()
    }
}

/// transition an operator can trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
    Approve,
    Reject,
    Disburse,
}

impl Transition {
    fn name(&self) -> &'static str {
        match self {
            Transition::Approve => "approve",
            Transition::Reject => "reject",
            Transition::Disburse => "mark disbursed",
        }
    }

    /// check the cached record allows this transition
    fn check(&self, loan: &LoanRequest) -> Result<()> {
        let allowed = match self {
            Transition::Approve | Transition::Reject => loan.approval_status == ApprovalStatus::Pending,
            Transition::Disburse => {
                if loan.disbursed {
                    return Err(DeskError::AlreadyDisbursed { id: loan.id.clone() });
                }
                loan.approval_status == ApprovalStatus::Approved
            }
        };

        if allowed {
            Ok(())
        } else {
            Err(DeskError::InvalidTransition {
                id: loan.id.clone(),
                action: self.name(),
                status: loan.approval_status.clone(),
            })
        }
    }
}

/// back-office desk for reviewing loan requests
pub struct LoanDesk<B: LoanBackend> {
    backend: B,
    config: DeskConfig,
    session: SessionContext,
    cache: LoanCache,
    /// list entries from the last refresh that could not be read
    unreadable: usize,
    events: EventStore,
}

impl<B: LoanBackend> LoanDesk<B> {
    pub fn new(backend: B, config: DeskConfig, session: SessionContext) -> Self {
        Self {
            backend,
            config,
            session,
            cache: LoanCache::new(),
            unreadable: 0,
            events: EventStore::new(),
        }
    }

    /// fetch the loan list and rebuild the cache
    ///
    /// A payload that is not a list leaves the cache empty. Returns the number
    /// of records loaded.
    pub fn refresh(&mut self, time_provider: &SafeTimeProvider) -> Result<usize> {
        let payload = self.backend.list_loans()?;
        let (loans, skipped) = parse_list::<LoanRequest>(&payload, "loan").unwrap_or_default();

        let duplicates = self.cache.replace_all(loans);
        if duplicates > 0 {
            tracing::warn!(duplicates, "loan list repeated ids, kept the last record of each");
        }
        self.unreadable = skipped;

        let count = self.cache.len();
        tracing::debug!(count, skipped, "loan cache refreshed");

        self.events.emit(Event::LoansRefreshed {
            count,
            skipped,
            timestamp: time_provider.now(),
        });

        Ok(count)
    }

    pub fn loans(&self) -> &[LoanRequest] {
        self.cache.all()
    }

    pub fn loan(&self, id: &str) -> Option<&LoanRequest> {
        self.cache.get(id)
    }

    /// dashboard counters; unreadable list entries still count as requested
    pub fn dashboard(&self, time_provider: &SafeTimeProvider) -> DashboardSummary {
        let summary = DashboardSummary::aggregate(self.cache.all(), today(time_provider));
        DashboardSummary {
            total_requested: summary.total_requested + self.unreadable,
            ..summary
        }
    }

    pub fn filtered(&self, tab: StatusTab, time_provider: &SafeTimeProvider) -> Vec<&LoanRequest> {
        filter_loans(self.cache.all(), tab, today(time_provider))
    }

    pub fn tab_counts(&self, time_provider: &SafeTimeProvider) -> TabCounts {
        tab_counts(self.cache.all(), today(time_provider))
    }

    /// cashback totals, fetched fresh; never fails on a malformed payload
    pub fn cashback_summary(&self, time_provider: &SafeTimeProvider) -> Result<CashbackSummary> {
        let payload = self.backend.list_cashbacks()?;
        let today = today(time_provider);
        Ok(parse_list::<CashbackRecord>(&payload, "cashback")
            .map(|(records, _)| CashbackSummary::aggregate(&records, today))
            .unwrap_or_default())
    }

    /// table rows for one tab, formatted for display
    pub fn rows(&self, tab: StatusTab, time_provider: &SafeTimeProvider) -> Vec<LoanRow> {
        let today = today(time_provider);
        filter_loans(self.cache.all(), tab, today)
            .into_iter()
            .map(|loan| LoanRow::from_loan(loan, &self.config.display, today))
            .collect()
    }

    /// dashboard cards, loan counters plus cashback totals
    pub fn dashboard_view(&self, time_provider: &SafeTimeProvider) -> Result<DashboardView> {
        let display = &self.config.display;
        let cashback = self.cashback_summary(time_provider)?;
        Ok(DashboardView::new(&self.dashboard(time_provider), self.tab_counts(time_provider), display)
            .with_cashback(&cashback, display))
    }

    /// amortization preview for the approval dialog
    pub fn preview_schedule(
        &self,
        id: &str,
        terms: &ApprovalTerms,
        first_due_date: NaiveDate,
    ) -> Result<AmortizationSchedule> {
        let loan = self.require_loan(id)?;
        terms.validate(loan.amount_requested, &self.config.limits)?;
        AmortizationSchedule::generate(
            terms.value_approved,
            terms.interest_rate,
            terms.max_installments,
            first_due_date,
        )
    }

    pub fn approve(
        &mut self,
        id: &str,
        terms: ApprovalTerms,
        time_provider: &SafeTimeProvider,
    ) -> Result<&LoanRequest> {
        let loan = self.require_loan(id)?;
        terms.validate(loan.amount_requested, &self.config.limits)?;

        let (request, operator_id) = self.begin(id, Transition::Approve, time_provider)?;
        let updated = self.backend.approve(&request, &terms)?;

        tracing::info!(
            loan_id = %id,
            value_approved = %terms.value_approved,
            installments = terms.max_installments,
            rate = %terms.interest_rate,
            "loan approved"
        );
        self.events.emit(Event::LoanApproved {
            loan_id: id.to_string(),
            value_approved: terms.value_approved,
            installments: terms.max_installments,
            interest_rate: terms.interest_rate,
            monthly_payment: terms.monthly_payment(),
            idempotency_key: request.idempotency_key,
            operator_id,
            timestamp: request.requested_at,
        });

        Ok(self.commit(updated))
    }

    pub fn reject(&mut self, id: &str, time_provider: &SafeTimeProvider) -> Result<&LoanRequest> {
        let (request, operator_id) = self.begin(id, Transition::Reject, time_provider)?;
        let updated = self.backend.reject(&request)?;

        tracing::info!(loan_id = %id, "loan rejected");
        self.events.emit(Event::LoanRejected {
            loan_id: id.to_string(),
            idempotency_key: request.idempotency_key,
            operator_id,
            timestamp: request.requested_at,
        });

        Ok(self.commit(updated))
    }

    pub fn mark_disbursed(&mut self, id: &str, time_provider: &SafeTimeProvider) -> Result<&LoanRequest> {
        let (request, operator_id) = self.begin(id, Transition::Disburse, time_provider)?;
        let updated = self.backend.mark_disbursed(&request)?;

        let amount = updated.amount_to_receive();
        tracing::info!(loan_id = %id, %amount, "loan marked as disbursed");
        self.events.emit(Event::LoanDisbursed {
            loan_id: id.to_string(),
            amount,
            idempotency_key: request.idempotency_key,
            operator_id,
            timestamp: request.requested_at,
        });

        Ok(self.commit(updated))
    }

    pub fn notify(&mut self, notification: Notification, time_provider: &SafeTimeProvider) -> Result<()> {
        notification.validate()?;
        let (operator, token) = self.session.require()?;
        let operator_id = operator.id.clone();
        self.backend.send_notification(token, &notification)?;

        let recipient = notification.recipient.unwrap_or_else(|| "*".to_string());
        tracing::info!(%recipient, title = %notification.title, "notification sent");
        self.events.emit(Event::NotificationSent {
            recipient,
            title: notification.title,
            operator_id,
            timestamp: time_provider.now(),
        });

        Ok(())
    }

    pub fn config(&self) -> &DeskConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionContext {
        &mut self.session
    }

    pub fn events(&self) -> &EventStore {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventStore {
        &mut self.events
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    fn require_loan(&self, id: &str) -> Result<&LoanRequest> {
        self.cache.get(id).ok_or_else(|| DeskError::NotFound { id: id.to_string() })
    }

    /// authorize and check a transition, minting a fresh idempotency key
    fn begin(
        &self,
        id: &str,
        transition: Transition,
        time_provider: &SafeTimeProvider,
    ) -> Result<(MutationRequest, String)> {
        let (operator, token) = self.session.require()?;
        let loan = self.require_loan(id)?;

        if let Err(error) = transition.check(loan) {
            tracing::warn!(loan_id = %id, action = transition.name(), %error, "transition refused");
            return Err(error);
        }

        let request = MutationRequest::new(id, token, time_provider.now());
        tracing::debug!(
            loan_id = %id,
            action = transition.name(),
            key = %request.idempotency_key,
            "submitting transition"
        );
        Ok((request, operator.id.clone()))
    }

    /// swap exactly the affected record into the cache
    fn commit(&mut self, updated: LoanRequest) -> &LoanRequest {
        tracing::debug!(loan_id = %updated.id, "cache entry replaced");
        self.cache.upsert(updated)
    }
}

fn today(time_provider: &SafeTimeProvider) -> NaiveDate {
    time_provider.now().date_naive()
}
