/// dashboard - aggregates straight from raw list payloads
use chrono::{TimeZone, Utc};
use loan_desk_rs::{CashbackSummary, DashboardSummary, DashboardView, DisplayConfig, TabCounts};
use serde_json::json;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let today = Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap().date_naive();

    let loans = json!([
        {"id": 1, "amountRequested": 500, "status": "APPROVED"},
        {"id": 2, "amountRequested": 900, "valueApproved": 800, "status": "Aprovado",
         "installments": [{"dueDate": "2024-06-01"}, {"dueDate": "2024-07-01"}]},
        {"id": 3, "amountRequested": 300, "status": "Pendente", "createdAt": "2024-06-15T10:00:00Z"}
    ]);
    let cashbacks = json!([
        {"id": "c1", "userId": "u1", "amount": "7.50", "createdAt": "2024-06-15T08:00:00Z"}
    ]);

    let summary = DashboardSummary::from_json(&loans, today);
    let records: Vec<loan_desk_rs::LoanRequest> = serde_json::from_value(loans)?;
    let display = DisplayConfig::brazil();
    let view = DashboardView::new(&summary, loan_desk_rs::tab_counts(&records, today), &display)
        .with_cashback(&CashbackSummary::from_json(&cashbacks, today), &display);
    println!("{}", view.to_json_pretty()?);

    // a broken payload still renders zeros
    let broken = DashboardSummary::from_json(&json!({"message": "internal error"}), today);
    let empty = DashboardView::new(&broken, TabCounts::default(), &display);
    println!("{}", empty.to_json_pretty()?);

    Ok(())
}
