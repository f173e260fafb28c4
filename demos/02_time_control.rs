/// time control - the same receipts seen from different reference dates
use chrono::{Duration, TimeZone, Utc};
use dunning_rs::{
    CompanySettings, Customer, CustomerType, DunningCase, DunningConfig, DunningRun, DunningStage,
    Money, Receipt, SafeTimeProvider, TimeSource,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== time control example ===\n");

    // controlled clock instead of the system time
    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap()
    ));
    let controller = time.test_control().unwrap();

    let customer = Customer::new("Jane Doe").with_type(CustomerType::Consumer);
    let invoiced = time.now().date_naive();
    let receipts = vec![Receipt::new(customer.id, "RE-7", invoiced, Money::from_major(2_500))];
    let company = CompanySettings::default();
    let case = DunningCase::new(&customer, &receipts, &company);

    println!("invoiced on {}", invoiced.format("%d.%m.%Y"));

    for step in [10, 14, 30, 60, 365] {
        controller.advance(Duration::days(step));
        let run = DunningRun::new(DunningConfig::default(), &time)?;
        let stage = run.suggested_stage(&case).unwrap_or(DunningStage::Reminder);
        let invoices = run.project(&case, &stage);
        match invoices.first() {
            Some(invoice) => println!(
                "{}: {} days overdue, stage {}, interest {}",
                run.today().format("%d.%m.%Y"),
                invoice.days_overdue,
                stage.display_name(),
                invoice.interest_amount.round_cents(),
            ),
            None => println!("{}: not yet overdue", run.today().format("%d.%m.%Y")),
        }
    }

    // exact calendar-year proration across the 2024/2025 boundary
    let exact = DunningRun::new(DunningConfig::default().with_exact_day_count(), &time)?;
    let standard = DunningRun::new(DunningConfig::default(), &time)?;
    let a = &exact.project(&case, &DunningStage::Dunning3)[0];
    let b = &standard.project(&case, &DunningStage::Dunning3)[0];
    println!(
        "\nactual/actual: {}  actual/365: {}",
        a.interest_amount.round_cents(),
        b.interest_amount.round_cents()
    );

    Ok(())
}
