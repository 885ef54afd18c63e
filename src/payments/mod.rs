pub mod amortization;

pub use amortization::{installment_payment, AmortizationSchedule, ScheduledInstallment};
