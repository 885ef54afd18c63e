/// review workflow - approve, reject and disburse against the in-memory backend
use chrono::{Duration, TimeZone, Utc};
use loan_desk_rs::{
    ApprovalTerms, DeskConfig, InMemoryBackend, LoanDesk, LoanRequest, Money, Notification,
    Operator, Rate, SafeTimeProvider, SessionContext, StatusTab, TimeSource,
};
use rust_decimal_macros::dec;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,loan_desk_rs=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 6, 15, 9, 0, 0).unwrap(),
    ));

    let backend = InMemoryBackend::with_loans(&[
        LoanRequest::new("101", Money::from_major(2_000)),
        LoanRequest::new("102", Money::from_major(750)),
    ])?;
    let session = SessionContext::authenticated(
        "demo-token",
        Operator {
            id: "op-1".to_string(),
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
        },
    );

    let mut desk = LoanDesk::new(backend, DeskConfig::brazil(), session);
    desk.refresh(&time)?;

    let terms = ApprovalTerms::new(Money::from_major(1_500), 10, Rate::from_percent(dec!(2.5)));
    let first_due = time.now().date_naive() + Duration::days(30);
    let schedule = desk.preview_schedule("101", &terms, first_due)?;
    println!(
        "preview: {} installments of {}",
        schedule.installment_count,
        schedule.installment_amount.format_with(&desk.config().display)
    );

    desk.approve("101", terms, &time)?;
    desk.reject("102", &time)?;
    desk.mark_disbursed("101", &time)?;

    // a second click is refused without reaching the backend
    if let Err(e) = desk.mark_disbursed("101", &time) {
        println!("refused: {}", e);
    }

    desk.notify(
        Notification::to_user("101", "Empréstimo liberado", "O valor já está na sua carteira"),
        &time,
    )?;

    println!("{}", loan_desk_rs::views::rows_to_json_pretty(&desk.rows(StatusTab::All, &time))?);
    println!("{} events recorded", desk.events().events().len());

    Ok(())
}
