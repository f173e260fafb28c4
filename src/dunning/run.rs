use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use tracing::{debug, info};

use crate::config::{CompanySettings, DunningConfig};
use crate::decimal::Rate;
use crate::dunning::context::{build_context_with_deadline, EmailContext};
use crate::dunning::email::{EmailPreview, OutgoingEmail, SendRequest};
use crate::dunning::projector::{OverdueInvoice, OverdueProjector};
use crate::errors::{DunningError, Result};
use crate::interest::InterestEngine;
use crate::records::{Customer, Receipt};
use crate::rules::DunningRules;
use crate::template::{select_template, DunningTemplate, TemplateEngine};
use crate::types::DunningStage;

/// everything known about one debtor for a dunning letter
#[derive(Debug, Clone, Copy)]
pub struct DunningCase<'a> {
    pub customer: &'a Customer,
    pub receipts: &'a [Receipt],
    pub rules: Option<&'a DunningRules>,
    pub company: &'a CompanySettings,
    /// current base rate from settings, if configured
    pub base_rate: Option<Rate>,
}

impl<'a> DunningCase<'a> {
    pub fn new(
        customer: &'a Customer,
        receipts: &'a [Receipt],
        company: &'a CompanySettings,
    ) -> Self {
        Self { customer, receipts, rules: None, company, base_rate: None }
    }

    pub fn with_rules(mut self, rules: &'a DunningRules) -> Self {
        self.rules = Some(rules);
        self
    }

    pub fn with_base_rate(mut self, base_rate: Rate) -> Self {
        self.base_rate = Some(base_rate);
        self
    }
}

/// one batch of dunning letters evaluated against a single reference date
#[derive(Debug, Clone)]
pub struct DunningRun {
    config: DunningConfig,
    today: NaiveDate,
    projector: OverdueProjector,
    engine: TemplateEngine,
}

impl DunningRun {
    /// capture today's date from the time provider
    pub fn new(config: DunningConfig, time_provider: &SafeTimeProvider) -> Result<Self> {
        Self::at(config, time_provider.now().date_naive())
    }

    /// run pinned to an explicit reference date
    pub fn at(config: DunningConfig, today: NaiveDate) -> Result<Self> {
        config.validate()?;
        let projector = OverdueProjector::from_config(&config);
        debug!(%today, convention = ?config.day_count_convention, "dunning run created");
        Ok(Self { config, today, projector, engine: TemplateEngine::default() })
    }

    /// replace the standard helper table
    pub fn with_engine(mut self, engine: TemplateEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn config(&self) -> &DunningConfig {
        &self.config
    }

    pub fn project(&self, case: &DunningCase<'_>, stage: &DunningStage) -> Vec<OverdueInvoice> {
        self.projector.project(
            case.receipts,
            case.customer,
            case.rules,
            stage,
            case.base_rate,
            self.today,
        )
    }

    pub fn build_context(
        &self,
        case: &DunningCase<'_>,
        invoices: &[OverdueInvoice],
        stage: &DunningStage,
    ) -> EmailContext {
        build_context_with_deadline(
            case.customer,
            invoices,
            stage,
            case.company,
            self.today,
            self.config.payment_deadline_days,
        )
    }

    /// most escalated stage the customer's oldest open receipt has reached
    pub fn suggested_stage(&self, case: &DunningCase<'_>) -> Option<DunningStage> {
        let max_days = case
            .receipts
            .iter()
            .filter(|r| r.customer_id == case.customer.id && r.is_open())
            .map(|r| {
                let due = self.projector.effective_due_date(r, case.customer);
                InterestEngine::days_overdue(due, self.today)
            })
            .max()?;
        let defaults = DunningRules::default();
        case.rules.unwrap_or(&defaults).stage_for(max_days)
    }

    /// active template for `stage`
    pub fn template_for<'t>(
        &self,
        templates: &'t [DunningTemplate],
        stage: &DunningStage,
    ) -> Result<&'t DunningTemplate> {
        select_template(templates, stage)
            .ok_or_else(|| DunningError::TemplateNotFound { stage: stage.to_string() })
    }

    /// render `template` for the case without sending anything
    pub fn preview(
        &self,
        case: &DunningCase<'_>,
        template: &DunningTemplate,
    ) -> Result<EmailPreview> {
        let invoices = self.project(case, &template.stage);
        let context = self.build_context(case, &invoices, &template.stage);
        let email = self.engine.render_template(template, &context)?;
        Ok(EmailPreview::new(email, invoices.len(), context.summe))
    }

    /// render the letter requested by `request`, ready for the mail transport
    pub fn prepare_email(
        &self,
        case: &DunningCase<'_>,
        template: &DunningTemplate,
        request: &SendRequest,
    ) -> Result<OutgoingEmail> {
        if request.customer_id != case.customer.id {
            return Err(DunningError::CustomerMismatch {
                expected: case.customer.id,
                actual: request.customer_id,
            });
        }
        if request.template_id != template.id {
            return Err(DunningError::TemplateNotFound { stage: template.stage.to_string() });
        }
        let recipient = request.recipient(case.customer)?;

        let invoices = self.project(case, &template.stage);
        if invoices.is_empty() {
            return Err(DunningError::NothingOverdue { customer_id: case.customer.id });
        }
        let context = self.build_context(case, &invoices, &template.stage);
        let email = self.engine.render_template(template, &context)?;

        info!(
            customer = %case.customer.id,
            stage = %template.stage,
            invoices = invoices.len(),
            total = %context.summe.gesamt.round_cents(),
            "dunning email prepared"
        );
        Ok(OutgoingEmail::new(recipient, email))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BankDetails;
    use crate::decimal::Money;
    use crate::types::CustomerType;
    use chrono::{Days, Duration, TimeZone, Utc};
    use hourglass_rs::TimeSource;
    use rust_decimal_macros::dec;

    fn time() -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::Test(Utc.with_ymd_and_hms(2024, 6, 30, 9, 0, 0).unwrap()))
    }

    fn company() -> CompanySettings {
        CompanySettings {
            name: Some("Lieferant AG".into()),
            bank: BankDetails {
                bank_name: Some("Sparkasse".into()),
                iban: Some("DE02120300000000202051".into()),
                ..BankDetails::default()
            },
            ..CompanySettings::default()
        }
    }

    fn customer() -> Customer {
        Customer::new("Acme GmbH")
            .with_type(CustomerType::Business)
            .with_email("buchhaltung@acme.example")
    }

    fn receipts(customer: &Customer, today: NaiveDate) -> Vec<Receipt> {
        let due = today.checked_sub_days(Days::new(40)).unwrap();
        vec![Receipt::new(customer.id, "RE-1", due - Duration::days(14), Money::from_major(1_000))
            .with_due_date(due)]
    }

    fn template() -> DunningTemplate {
        DunningTemplate::new(
            "Erste Mahnung",
            DunningStage::Dunning1,
            "{{mahnung.stufenName}}: {{anzahlRechnungen}} offene Rechnung(en)",
            "<p>Sehr geehrte Damen und Herren der {{kunde.name}},</p>\
             {{#each rechnungen}}<p>{{rechnungsnummer}} vom {{formatDate rechnungsdatum}}: \
             {{formatCurrency gesamt}} ({{formatNumber zinssatz}} %)</p>{{/each}}\
             <p>Gesamt: {{formatCurrency summe.gesamt}}, zahlbar bis {{formatDate mahnung.zahlungsfrist}} \
             an {{bank.iban}}</p>",
        )
        .with_text("Gesamt: {{formatCurrency summe.gesamt}}")
    }

    #[test]
    fn test_today_captured_from_time_provider() {
        let time = time();
        let control = time.test_control().unwrap();
        let run = DunningRun::new(DunningConfig::default(), &time).unwrap();
        assert_eq!(run.today(), NaiveDate::from_ymd_opt(2024, 6, 30).unwrap());

        control.advance(Duration::days(3));
        assert_eq!(run.today(), NaiveDate::from_ymd_opt(2024, 6, 30).unwrap());
        let later = DunningRun::new(DunningConfig::default(), &time).unwrap();
        assert_eq!(later.today(), NaiveDate::from_ymd_opt(2024, 7, 3).unwrap());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = DunningConfig { payment_deadline_days: 0, ..DunningConfig::default() };
        assert!(matches!(
            DunningRun::new(config, &time()),
            Err(DunningError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_preview_business_scenario() {
        let run = DunningRun::new(DunningConfig::default(), &time()).unwrap();
        let customer = customer();
        let receipts = receipts(&customer, run.today());
        let rules = DunningRules::default();
        let company = company();
        let case = DunningCase::new(&customer, &receipts, &company)
            .with_rules(&rules)
            .with_base_rate(Rate::from_percent(dec!(3.62)));

        let preview = run.preview(&case, &template()).unwrap();
        assert_eq!(preview.invoice_count, 1);
        assert_eq!(preview.subject, "1. Mahnung: 1 offene Rechnung(en)");
        assert!(preview.html.contains("Acme GmbH"));
        assert!(preview.html.contains("RE-1 vom 07.05.2024: 1.018,83 € (12,62 %)"));
        assert!(preview.html.contains("zahlbar bis 14.07.2024"));
        assert!(preview.html.contains("DE02120300000000202051"));
        assert_eq!(preview.text, "Gesamt: 1.018,83 €");
        assert_eq!(preview.summe.gebuehren, Money::from_major(5));
    }

    #[test]
    fn test_prepare_email() {
        let run = DunningRun::new(DunningConfig::default(), &time()).unwrap();
        let customer = customer();
        let receipts = receipts(&customer, run.today());
        let company = company();
        let case = DunningCase::new(&customer, &receipts, &company);
        let template = template();

        let request = SendRequest::new(customer.id, template.id);
        let email = run.prepare_email(&case, &template, &request).unwrap();
        assert_eq!(email.to, "buchhaltung@acme.example");
        assert_eq!(email.subject, "1. Mahnung: 1 offene Rechnung(en)");

        let request = SendRequest::new(customer.id, template.id).to("mahnwesen@acme.example");
        assert_eq!(run.prepare_email(&case, &template, &request).unwrap().to, "mahnwesen@acme.example");
    }

    #[test]
    fn test_prepare_email_errors() {
        let run = DunningRun::new(DunningConfig::default(), &time()).unwrap();
        let company = company();
        let template = template();

        let silent = Customer::new("Ohne Mail");
        let receipts = receipts(&silent, run.today());
        let case = DunningCase::new(&silent, &receipts, &company);
        let request = SendRequest::new(silent.id, template.id);
        assert!(matches!(
            run.prepare_email(&case, &template, &request),
            Err(DunningError::MissingRecipient { .. })
        ));

        let settled = customer();
        let case = DunningCase::new(&settled, &[], &company);
        let request = SendRequest::new(settled.id, template.id);
        assert!(matches!(
            run.prepare_email(&case, &template, &request),
            Err(DunningError::NothingOverdue { .. })
        ));

        let request = SendRequest::new(silent.id, template.id);
        assert!(matches!(
            run.prepare_email(&case, &template, &request),
            Err(DunningError::CustomerMismatch { .. })
        ));
    }

    #[test]
    fn test_suggested_stage_and_template_lookup() {
        let run = DunningRun::new(DunningConfig::default(), &time()).unwrap();
        let customer = customer();
        let receipts = receipts(&customer, run.today());
        let company = company();
        let case = DunningCase::new(&customer, &receipts, &company);

        assert_eq!(run.suggested_stage(&case), Some(DunningStage::Dunning2));
        assert_eq!(run.suggested_stage(&DunningCase::new(&customer, &[], &company)), None);

        let templates = vec![template()];
        assert!(run.template_for(&templates, &DunningStage::Dunning1).is_ok());
        assert!(matches!(
            run.template_for(&templates, &DunningStage::Dunning3),
            Err(DunningError::TemplateNotFound { .. })
        ));
    }

    #[test]
    fn test_deadline_from_config() {
        let config = DunningConfig { payment_deadline_days: 7, ..DunningConfig::default() };
        let run = DunningRun::new(config, &time()).unwrap();
        let customer = customer();
        let company = company();
        let case = DunningCase::new(&customer, &[], &company);
        let context = run.build_context(&case, &[], &DunningStage::Reminder);
        assert_eq!(context.mahnung.zahlungsfrist, NaiveDate::from_ymd_opt(2024, 7, 7).unwrap());
    }
}
