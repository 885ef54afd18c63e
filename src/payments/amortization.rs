use chrono::{Months, NaiveDate};
use rust_decimal::{Decimal, MathematicalOps};
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{DeskError, Result};

/// fixed payment per installment for an amortizing loan
///
/// `rate` is the monthly rate. A zero rate divides the principal evenly; a
/// non-positive count yields zero instead of dividing by zero. Nothing is
/// rounded here.
pub fn installment_payment(principal: Money, installment_count: i64, rate: Rate) -> Money {
    if installment_count <= 0 {
        return Money::ZERO;
    }

    let r = rate.as_decimal();
    if r.is_zero() {
        return principal / Decimal::from(installment_count);
    }

    // PMT = P * r * (1 + r)^n / ((1 + r)^n - 1)
    let compound = match (Decimal::ONE + r).checked_powu(installment_count as u64) {
        Some(compound) => compound,
        // (1 + r)^n has left the decimal range, the factor below is 1 to within precision
        None => return principal * r,
    };

    let denominator = compound - Decimal::ONE;
    if denominator.is_zero() {
        return principal / Decimal::from(installment_count);
    }

    principal * r * (compound / denominator)
}

/// one row of an amortization preview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledInstallment {
    pub number: u32,
    pub due_date: NaiveDate,
    pub beginning_balance: Money,
    pub payment: Money,
    pub interest_portion: Money,
    pub principal_portion: Money,
    pub ending_balance: Money,
}

/// full repayment plan for a set of approval terms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmortizationSchedule {
    pub principal: Money,
    pub rate: Rate,
    pub installment_count: u32,
    pub installment_amount: Money,
    pub installments: Vec<ScheduledInstallment>,
    pub total_payment: Money,
    pub total_interest: Money,
}

impl AmortizationSchedule {
    /// generate monthly installments starting at `first_due_date`
    pub fn generate(
        principal: Money,
        rate: Rate,
        installment_count: u32,
        first_due_date: NaiveDate,
    ) -> Result<Self> {
        if installment_count == 0 {
            return Err(DeskError::InvalidTerms {
                message: "schedule needs at least one installment".to_string(),
            });
        }

        let payment = installment_payment(principal, installment_count as i64, rate);
        let r = rate.as_decimal();

        let mut installments = Vec::with_capacity(installment_count as usize);
        let mut balance = principal;

        for number in 1..=installment_count {
            let due_date = first_due_date
                .checked_add_months(Months::new(number - 1))
                .ok_or_else(|| DeskError::InvalidTerms {
                    message: format!("due date of installment {} out of range", number),
                })?;

            let interest_portion = balance * r;
            let is_last = number == installment_count;

            // last installment absorbs the residual so the balance closes at zero
            let (payment_amount, principal_portion) = if is_last {
                (balance + interest_portion, balance)
            } else {
                (payment, payment - interest_portion)
            };

            let ending_balance = balance - principal_portion;

            installments.push(ScheduledInstallment {
                number,
                due_date,
                beginning_balance: balance,
                payment: payment_amount,
                interest_portion,
                principal_portion,
                ending_balance,
            });

            balance = ending_balance;
        }

        let total_payment: Money = installments.iter().map(|i| i.payment).sum();
        let total_interest: Money = installments.iter().map(|i| i.interest_portion).sum();

        Ok(Self {
            principal,
            rate,
            installment_count,
            installment_amount: payment,
            installments,
            total_payment,
            total_interest,
        })
    }

    /// get installment by its 1-based number
    pub fn get(&self, number: u32) -> Option<&ScheduledInstallment> {
        number
            .checked_sub(1)
            .and_then(|idx| self.installments.get(idx as usize))
    }

    pub fn last_due_date(&self) -> Option<NaiveDate> {
        self.installments.last().map(|i| i.due_date)
    }
}
