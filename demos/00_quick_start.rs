/// quick start - project overdue invoices and render a reminder
use dunning_rs::chrono::NaiveDate;
use dunning_rs::{
    CompanySettings, Customer, CustomerType, DunningCase, DunningConfig, DunningRun, DunningStage,
    DunningTemplate, Money, Receipt,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let today = NaiveDate::from_ymd_opt(2024, 6, 30).ok_or("invalid date")?;
    let run = DunningRun::at(DunningConfig::default(), today)?;

    // a business customer with one invoice due 40 days ago
    let customer = Customer::new("Acme GmbH").with_type(CustomerType::Business);
    let receipts = vec![Receipt::new(
        customer.id,
        "RE-2024-0042",
        NaiveDate::from_ymd_opt(2024, 5, 7).ok_or("invalid date")?,
        Money::from_major(1_000),
    )
    .with_due_date(NaiveDate::from_ymd_opt(2024, 5, 21).ok_or("invalid date")?)];
    let company = CompanySettings::default();
    let case = DunningCase::new(&customer, &receipts, &company);

    for invoice in run.project(&case, &DunningStage::Dunning1) {
        println!(
            "{}: {} days overdue, interest {} at {}, total {}",
            invoice.invoice_number,
            invoice.days_overdue,
            invoice.interest_amount.round_cents(),
            invoice.interest_rate,
            invoice.total_with_interest.round_cents(),
        );
    }

    let template = DunningTemplate::new(
        "Erinnerung",
        DunningStage::Reminder,
        "Zahlungserinnerung für {{kunde.name}}",
        "<p>Offen: {{formatCurrency summe.offen}}</p>",
    );
    let preview = run.preview(&case, &template)?;
    println!("{}\n{}", preview.subject, preview.html);

    Ok(())
}
