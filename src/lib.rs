pub mod backend;
pub mod config;
pub mod dashboard;
pub mod decimal;
pub mod desk;
pub mod errors;
pub mod events;
pub mod filter;
pub mod loan;
pub mod payments;
pub mod session;
pub mod types;
pub mod views;

// re-export key types
pub use backend::{InMemoryBackend, LoanBackend, MutationRequest, Notification};
pub use config::{DeskConfig, DisplayConfig, LoanLimits};
pub use dashboard::{CashbackRecord, CashbackSummary, DashboardSummary};
pub use decimal::{Money, Rate};
pub use desk::{LoanCache, LoanDesk};
pub use errors::{DeskError, Result};
pub use events::{Event, EventStore};
pub use filter::{filter_loans, tab_counts, TabCounts};
pub use loan::{ApprovalTerms, Installment, LoanRequest};
pub use payments::{installment_payment, AmortizationSchedule, ScheduledInstallment};
pub use session::{Operator, SessionContext};
pub use types::{ApprovalStatus, LoanId, StatusTab};
pub use views::{DashboardView, LoanRow};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
