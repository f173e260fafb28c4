use chrono::{Days, NaiveDate};
use serde::{Serialize, Serializer};

use crate::config::{CompanySettings, DEFAULT_PAYMENT_DEADLINE_DAYS};
use crate::decimal::{Money, Rate};
use crate::dunning::projector::OverdueInvoice;
use crate::records::Customer;
use crate::types::DunningStage;

/// merge fields available to dunning templates
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailContext {
    pub kunde: CustomerFields,
    pub rechnungen: Vec<InvoiceFields>,
    pub anzahl_rechnungen: usize,
    pub summe: Totals,
    pub bank: BankFields,
    pub firma: CompanyFields,
    pub mahnung: StageFields,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerFields {
    pub name: String,
    pub kundennummer: String,
    pub ansprechpartner: String,
    pub strasse: String,
    pub plz: String,
    pub ort: String,
    pub land: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceFields {
    pub rechnungsnummer: String,
    pub rechnungsdatum: NaiveDate,
    pub faelligkeitsdatum: NaiveDate,
    #[serde(serialize_with = "money_number")]
    pub betrag: Money,
    #[serde(serialize_with = "money_number")]
    pub offen: Money,
    pub tage_ueberfaellig: u32,
    #[serde(serialize_with = "rate_number")]
    pub zinssatz: Rate,
    #[serde(serialize_with = "money_number")]
    pub zinsen: Money,
    #[serde(serialize_with = "money_number")]
    pub gebuehr: Money,
    #[serde(serialize_with = "money_number")]
    pub gesamt: Money,
}

/// aggregated amounts over all invoices of the letter
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Totals {
    #[serde(serialize_with = "money_number")]
    pub offen: Money,
    #[serde(serialize_with = "money_number")]
    pub zinsen: Money,
    #[serde(serialize_with = "money_number")]
    pub gebuehren: Money,
    #[serde(serialize_with = "money_number")]
    pub gesamt: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BankFields {
    pub name: String,
    pub iban: String,
    pub bic: String,
    pub kontoinhaber: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyFields {
    pub name: String,
    pub strasse: String,
    pub plz: String,
    pub ort: String,
    pub telefon: String,
    pub email: String,
    pub website: String,
    pub geschaeftsfuehrer: String,
    pub ust_id: String,
    pub handelsregister: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageFields {
    pub stufe: String,
    pub stufen_name: String,
    pub datum: NaiveDate,
    pub zahlungsfrist: NaiveDate,
}

// templates compare and format amounts, so they are exposed as json numbers
fn money_number<S: Serializer>(value: &Money, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(value.to_f64())
}

fn rate_number<S: Serializer>(value: &Rate, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(value.to_f64())
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

impl Totals {
    pub fn of(invoices: &[OverdueInvoice]) -> Self {
        let offen: Money = invoices.iter().map(|i| i.open_amount).sum();
        let zinsen: Money = invoices.iter().map(|i| i.interest_amount).sum();
        let gebuehren: Money = invoices.iter().map(|i| i.fee_amount).sum();
        Self {
            offen,
            zinsen,
            gebuehren,
            gesamt: offen + zinsen + gebuehren,
        }
    }
}

impl From<&Customer> for CustomerFields {
    fn from(customer: &Customer) -> Self {
        Self {
            name: customer.name.clone(),
            kundennummer: text(&customer.account_number),
            ansprechpartner: text(&customer.contact_person),
            strasse: text(&customer.street),
            plz: text(&customer.postal_code),
            ort: text(&customer.city),
            land: text(&customer.country),
            email: text(&customer.email),
        }
    }
}

impl From<&OverdueInvoice> for InvoiceFields {
    fn from(invoice: &OverdueInvoice) -> Self {
        Self {
            rechnungsnummer: invoice.invoice_number.clone(),
            rechnungsdatum: invoice.receipt_date,
            faelligkeitsdatum: invoice.due_date,
            betrag: invoice.total_amount,
            offen: invoice.open_amount,
            tage_ueberfaellig: invoice.days_overdue,
            zinssatz: invoice.interest_rate,
            zinsen: invoice.interest_amount,
            gebuehr: invoice.fee_amount,
            gesamt: invoice.total_with_interest,
        }
    }
}

impl From<&CompanySettings> for BankFields {
    fn from(settings: &CompanySettings) -> Self {
        let bank = &settings.bank;
        Self {
            name: text(&bank.bank_name),
            iban: text(&bank.iban),
            bic: text(&bank.bic),
            kontoinhaber: text(&bank.account_holder),
        }
    }
}

impl From<&CompanySettings> for CompanyFields {
    fn from(settings: &CompanySettings) -> Self {
        Self {
            name: text(&settings.name),
            strasse: text(&settings.street),
            plz: text(&settings.postal_code),
            ort: text(&settings.city),
            telefon: text(&settings.phone),
            email: text(&settings.email),
            website: text(&settings.website),
            geschaeftsfuehrer: text(&settings.managing_director),
            ust_id: text(&settings.vat_id),
            handelsregister: text(&settings.commercial_register),
        }
    }
}

/// build the merge-field context with the standard 14-day payment deadline
pub fn build_context(
    customer: &Customer,
    invoices: &[OverdueInvoice],
    stage: &DunningStage,
    company: &CompanySettings,
    today: NaiveDate,
) -> EmailContext {
    build_context_with_deadline(
        customer,
        invoices,
        stage,
        company,
        today,
        DEFAULT_PAYMENT_DEADLINE_DAYS,
    )
}

/// build the merge-field context, granting `deadline_days` to pay
pub fn build_context_with_deadline(
    customer: &Customer,
    invoices: &[OverdueInvoice],
    stage: &DunningStage,
    company: &CompanySettings,
    today: NaiveDate,
    deadline_days: u32,
) -> EmailContext {
    let zahlungsfrist = today
        .checked_add_days(Days::new(u64::from(deadline_days)))
        .unwrap_or(today);

    EmailContext {
        kunde: CustomerFields::from(customer),
        rechnungen: invoices.iter().map(InvoiceFields::from).collect(),
        anzahl_rechnungen: invoices.len(),
        summe: Totals::of(invoices),
        bank: BankFields::from(company),
        firma: CompanyFields::from(company),
        mahnung: StageFields {
            stufe: stage.as_str().to_string(),
            stufen_name: stage.display_name().to_string(),
            datum: today,
            zahlungsfrist,
        },
    }
}
