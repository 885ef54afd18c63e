use thiserror::Error;

use crate::decimal::{Money, Rate};
use crate::types::{ApprovalStatus, LoanId};

#[derive(Error, Debug)]
pub enum DeskError {
    #[error("loan not found: {id}")]
    NotFound {
        id: LoanId,
    },

    #[error("invalid transition for loan {id}: cannot {action} while {status}")]
    InvalidTransition {
        id: LoanId,
        action: &'static str,
        status: ApprovalStatus,
    },

    #[error("loan {id} already disbursed")]
    AlreadyDisbursed {
        id: LoanId,
    },

    #[error("invalid approval terms: {message}")]
    InvalidTerms {
        message: String,
    },

    #[error("approved value {approved} exceeds requested amount {requested}")]
    ApprovedExceedsRequested {
        approved: Money,
        requested: Money,
    },

    #[error("interest rate out of range: {rate}")]
    InvalidInterestRate {
        rate: Rate,
    },

    #[error("no authenticated session")]
    Unauthenticated,

    #[error("invalid notification: {message}")]
    InvalidNotification {
        message: String,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("backend error: {message}")]
    Backend {
        message: String,
    },

    #[error("malformed payload: {0}")]
    Payload(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DeskError>;
