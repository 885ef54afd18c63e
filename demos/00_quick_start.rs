/// quick start - installment math without a backend
use loan_desk_rs::{installment_payment, DisplayConfig, Money, Rate};
use rust_decimal_macros::dec;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let display = DisplayConfig::brazil();
    let principal = Money::from_major(1_000);

    for rate in [dec!(0), dec!(1.5), dec!(2.5)] {
        let payment = installment_payment(principal, 12, Rate::from_percent(rate));
        println!("12x at {}% a.m.: {}", rate, payment.format_with(&display));
    }

    Ok(())
}
