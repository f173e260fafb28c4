/// email preview - full dunning letter with rules, bank details and a text body
use dunning_rs::chrono::NaiveDate;
use dunning_rs::{
    BankDetails, CompanySettings, Customer, CustomerType, DunningCase, DunningConfig, DunningRules,
    DunningRun, DunningStage, DunningTemplate, Money, Rate, Receipt, SendRequest,
};
use rust_decimal_macros::dec;
use tracing_subscriber::EnvFilter;

const HTML: &str = r#"<p>Sehr geehrte Damen und Herren,</p>
<p>trotz unserer Zahlungserinnerung sind folgende Rechnungen der {{kunde.name}} noch offen:</p>
<table>
{{#each rechnungen}}
  <tr><td>{{add @index 1}}.</td><td>{{rechnungsnummer}}</td><td>{{formatDate faelligkeitsdatum}}</td>
      <td>{{tageUeberfaellig}} Tage</td><td>{{formatCurrency offen}}</td><td>{{formatCurrency zinsen}}</td></tr>
{{/each}}
</table>
{{#if (gt summe.gebuehren 0)}}<p>Mahngebühren: {{formatCurrency summe.gebuehren}}</p>{{/if}}
<p>Bitte überweisen Sie {{formatCurrency summe.gesamt}} bis zum {{formatDate mahnung.zahlungsfrist}}
auf {{bank.iban}} ({{bank.name}}).</p>
<p>{{firma.name}}</p>"#;

const TEXT: &str = "{{mahnung.stufenName}} vom {{formatDate mahnung.datum}}\n\
{{#each rechnungen}}- {{rechnungsnummer}}: {{formatCurrency gesamt}}\n{{/each}}\
Gesamt: {{formatCurrency summe.gesamt}}\n";

fn date(y: i32, m: u32, d: u32) -> Result<NaiveDate, Box<dyn std::error::Error>> {
    NaiveDate::from_ymd_opt(y, m, d).ok_or_else(|| "invalid date".into())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    println!("=== email preview example ===\n");

    let run = DunningRun::at(DunningConfig::default(), date(2024, 6, 30)?)?;

    let company = CompanySettings {
        name: Some("Lieferant AG".into()),
        city: Some("Köln".into()),
        bank: BankDetails {
            bank_name: Some("Sparkasse KölnBonn".into()),
            iban: Some("DE02370501980000000000".into()),
            bic: Some("COLSDE33XXX".into()),
            account_holder: Some("Lieferant AG".into()),
        },
        ..CompanySettings::default()
    };
    let customer = Customer::new("Müller & Söhne KG")
        .with_type(CustomerType::Business)
        .with_account_number("10042")
        .with_email("buchhaltung@mueller.example")
        .with_payment_terms(30);

    let receipts = vec![
        Receipt::new(customer.id, "RE-1001", date(2024, 3, 1)?, Money::from_major(1_250)),
        Receipt::new(customer.id, "RE-1017", date(2024, 4, 12)?, Money::from_minor(48_990)),
        Receipt::new(customer.id, "RE-1033", date(2024, 6, 20)?, Money::from_major(300)),
    ];
    let rules = DunningRules::from_json(
        r#"{"graceDays": 3, "stages": {
            "reminder": {"daysAfterDue": 7,  "fee": "0.00",  "enabled": true},
            "dunning1": {"daysAfterDue": 21, "fee": "7.50",  "enabled": true},
            "dunning2": {"daysAfterDue": 35, "fee": "12.50", "enabled": true},
            "dunning3": {"daysAfterDue": 49, "fee": "20.00", "enabled": false}
        }}"#,
    )?;
    let case = DunningCase::new(&customer, &receipts, &company)
        .with_rules(&rules)
        .with_base_rate(Rate::from_percent(dec!(3.37)));

    let stage = run.suggested_stage(&case).unwrap_or(DunningStage::Reminder);
    println!("suggested stage: {} ({})\n", stage, stage.display_name());

    let subject = "{{mahnung.stufenName}}: {{anzahlRechnungen}} offene Posten";
    let template = DunningTemplate::new("Mahnung", stage, subject, HTML).with_text(TEXT);

    let preview = run.preview(&case, &template)?;
    println!("subject: {}", preview.subject);
    println!(
        "invoices: {}, total: {}\n",
        preview.invoice_count,
        preview.summe.gesamt.round_cents()
    );
    println!("{}\n", preview.html);
    println!("{}", preview.text);

    let request = SendRequest::new(customer.id, template.id);
    let email = run.prepare_email(&case, &template, &request)?;
    println!("ready to send to {}", email.to);

    Ok(())
}
