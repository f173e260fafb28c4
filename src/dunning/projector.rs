use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{DunningConfig, StatutoryRateConfig};
use crate::decimal::{Money, Rate};
use crate::interest::InterestEngine;
use crate::records::{Customer, Receipt};
use crate::rules::{stage_fee, DunningRules, InterestMode};
use crate::types::DunningStage;

/// open invoice past its due date, priced for a dunning letter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverdueInvoice {
    pub invoice_number: String,
    pub receipt_date: NaiveDate,
    pub due_date: NaiveDate,
    pub total_amount: Money,
    pub open_amount: Money,
    pub days_overdue: u32,
    pub interest_rate: Rate,
    pub interest_amount: Money,
    pub fee_amount: Money,
    pub total_with_interest: Money,
}

/// maps open receipts to the overdue invoices of one dunning letter
#[derive(Debug, Clone)]
pub struct OverdueProjector {
    pub statutory: StatutoryRateConfig,
    pub default_payment_term_days: u32,
    pub engine: InterestEngine,
}

impl Default for OverdueProjector {
    fn default() -> Self {
        Self::from_config(&DunningConfig::default())
    }
}

impl OverdueProjector {
    pub fn from_config(config: &DunningConfig) -> Self {
        Self {
            statutory: config.statutory.clone(),
            default_payment_term_days: config.default_payment_term_days,
            engine: InterestEngine::new(config.day_count_convention),
        }
    }

    /// stored due date, else receipt date plus the customer's payment terms
    pub fn effective_due_date(&self, receipt: &Receipt, customer: &Customer) -> NaiveDate {
        if let Some(due) = receipt.due_date {
            return due;
        }
        let terms = customer.payment_terms_days.unwrap_or(self.default_payment_term_days);
        receipt
            .receipt_date
            .checked_add_days(Days::new(u64::from(terms)))
            .unwrap_or(receipt.receipt_date)
    }

    /// overdue invoices of `customer` as of `today`, most overdue first.
    ///
    /// Ties on days overdue are ordered by invoice number ascending.
    pub fn project(
        &self,
        receipts: &[Receipt],
        customer: &Customer,
        rules: Option<&DunningRules>,
        stage: &DunningStage,
        base_rate: Option<Rate>,
        today: NaiveDate,
    ) -> Vec<OverdueInvoice> {
        let interest_mode = rules.map(|r| r.interest).unwrap_or(InterestMode::Statutory);
        let rate = interest_mode.rate_for(&self.statutory, customer.customer_type, base_rate);
        let fee = stage_fee(rules, stage);

        let mut invoices: Vec<OverdueInvoice> = receipts
            .iter()
            .filter(|r| r.customer_id == customer.id && r.is_open())
            .filter_map(|receipt| {
                let due_date = self.effective_due_date(receipt, customer);
                let calc = self.engine.interest_between(receipt.open_amount, rate, due_date, today);
                if calc.days == 0 {
                    return None;
                }
                Some(OverdueInvoice {
                    invoice_number: receipt.invoice_number.clone(),
                    receipt_date: receipt.receipt_date,
                    due_date,
                    total_amount: receipt.total_amount,
                    open_amount: receipt.open_amount,
                    days_overdue: calc.days,
                    interest_rate: rate,
                    interest_amount: calc.interest_amount,
                    fee_amount: fee,
                    total_with_interest: receipt.open_amount + calc.interest_amount + fee,
                })
            })
            .collect();

        invoices.sort_by(|a, b| {
            b.days_overdue
                .cmp(&a.days_overdue)
                .then_with(|| a.invoice_number.cmp(&b.invoice_number))
        });

        debug!(
            customer = %customer.id,
            %stage,
            %rate,
            receipts = receipts.len(),
            overdue = invoices.len(),
            "projected overdue invoices"
        );
        invoices
    }
}

/// project with the default configuration
pub fn project_overdue_invoices(
    receipts: &[Receipt],
    customer: &Customer,
    rules: Option<&DunningRules>,
    stage: &DunningStage,
    base_rate: Option<Rate>,
    today: NaiveDate,
) -> Vec<OverdueInvoice> {
    OverdueProjector::default().project(receipts, customer, rules, stage, base_rate, today)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::StageFee;
    use crate::types::CustomerType;
    use rust_decimal_macros::dec;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    fn days_ago(days: u64) -> NaiveDate {
        today().checked_sub_days(Days::new(days)).unwrap()
    }

    fn business() -> Customer {
        Customer::new("Acme GmbH").with_type(CustomerType::Business)
    }

    fn receipt(customer: &Customer, number: &str, open: Money, due_days_ago: u64) -> Receipt {
        Receipt::new(customer.id, number, days_ago(due_days_ago + 14), open)
            .with_due_date(days_ago(due_days_ago))
    }

    #[test]
    fn test_business_scenario() {
        let customer = business();
        let receipts = vec![receipt(&customer, "RE-1", Money::from_major(1_000), 40)];
        let rules = DunningRules::default();

        let invoices = project_overdue_invoices(
            &receipts,
            &customer,
            Some(&rules),
            &DunningStage::Dunning1,
            Some(Rate::from_percent(dec!(3.62))),
            today(),
        );

        assert_eq!(invoices.len(), 1);
        let invoice = &invoices[0];
        assert_eq!(invoice.days_overdue, 40);
        assert_eq!(invoice.interest_rate.as_percent(), dec!(12.62));
        assert_eq!(invoice.interest_amount.round_cents(), Money::from_minor(1383));
        assert_eq!(invoice.fee_amount, Money::from_major(5));
        assert_eq!(invoice.total_with_interest.round_cents(), Money::from_minor(101_883));
        assert_eq!(
            invoice.total_with_interest,
            invoice.open_amount + invoice.interest_amount + invoice.fee_amount
        );
    }

    #[test]
    fn test_zero_open_amount_excluded() {
        let customer = business();
        let receipts = vec![
            receipt(&customer, "RE-PAID", Money::ZERO, 400),
            receipt(&customer, "RE-OPEN", Money::from_major(10), 5),
        ];

        let invoices = project_overdue_invoices(
            &receipts, &customer, None, &DunningStage::Dunning1, None, today(),
        );
        assert_eq!(invoices.len(), 1);
        assert_eq!(invoices[0].invoice_number, "RE-OPEN");
    }

    #[test]
    fn test_not_yet_due_excluded_even_for_reminder() {
        let customer = business();
        let receipts = vec![
            Receipt::new(customer.id, "RE-FUTURE", today(), Money::from_major(50))
                .with_due_date(today().checked_add_days(Days::new(10)).unwrap()),
            Receipt::new(customer.id, "RE-TODAY", days_ago(14), Money::from_major(50))
                .with_due_date(today()),
        ];

        let invoices = project_overdue_invoices(
            &receipts, &customer, None, &DunningStage::Reminder, None, today(),
        );
        assert!(invoices.is_empty());
    }

    #[test]
    fn test_due_date_derived_from_payment_terms() {
        let customer = business().with_payment_terms(30);
        let receipts = vec![Receipt::new(customer.id, "RE-1", days_ago(45), Money::from_major(100))];

        let invoices = project_overdue_invoices(
            &receipts, &customer, None, &DunningStage::Reminder, None, today(),
        );
        assert_eq!(invoices[0].due_date, days_ago(15));
        assert_eq!(invoices[0].days_overdue, 15);
    }

    #[test]
    fn test_default_payment_terms() {
        let customer = business();
        let receipts = vec![Receipt::new(customer.id, "RE-1", days_ago(45), Money::from_major(100))];

        let invoices = project_overdue_invoices(
            &receipts, &customer, None, &DunningStage::Reminder, None, today(),
        );
        assert_eq!(invoices[0].days_overdue, 31);
    }

    #[test]
    fn test_sorted_by_days_then_invoice_number() {
        let customer = business();
        let receipts = vec![
            receipt(&customer, "RE-3", Money::from_major(10), 20),
            receipt(&customer, "RE-2", Money::from_major(10), 60),
            receipt(&customer, "RE-5", Money::from_major(10), 20),
            receipt(&customer, "RE-1", Money::from_major(10), 20),
            receipt(&customer, "RE-4", Money::from_major(10), 90),
        ];

        let invoices = project_overdue_invoices(
            &receipts, &customer, None, &DunningStage::Dunning2, None, today(),
        );
        let order: Vec<&str> = invoices.iter().map(|i| i.invoice_number.as_str()).collect();
        assert_eq!(order, vec!["RE-4", "RE-2", "RE-1", "RE-3", "RE-5"]);

        for pair in invoices.windows(2) {
            assert!(pair[0].days_overdue >= pair[1].days_overdue);
        }
        assert!(invoices.iter().all(|i| i.days_overdue > 0));
    }

    #[test]
    fn test_reminder_never_charges_fee() {
        let customer = business();
        let mut rules = DunningRules::default();
        rules.stages.reminder = Some(StageFee::new(0, Money::from_major(9)));
        let receipts = vec![receipt(&customer, "RE-1", Money::from_major(100), 10)];

        let invoices = project_overdue_invoices(
            &receipts, &customer, Some(&rules), &DunningStage::Reminder, None, today(),
        );
        assert_eq!(invoices[0].fee_amount, Money::ZERO);
    }

    #[test]
    fn test_no_rules_means_no_fee() {
        let customer = business();
        let receipts = vec![receipt(&customer, "RE-1", Money::from_major(100), 10)];

        let invoices = project_overdue_invoices(
            &receipts, &customer, None, &DunningStage::Dunning3, None, today(),
        );
        assert_eq!(invoices[0].fee_amount, Money::ZERO);
    }

    #[test]
    fn test_unclassified_customer_accrues_no_interest() {
        let customer = Customer::new("Unbekannt");
        let receipts = vec![receipt(&customer, "RE-1", Money::from_major(1_000), 100)];

        let invoices = project_overdue_invoices(
            &receipts, &customer, None, &DunningStage::Dunning1, None, today(),
        );
        assert_eq!(invoices[0].interest_rate, Rate::ZERO);
        assert_eq!(invoices[0].interest_amount, Money::ZERO);
        assert_eq!(invoices[0].total_with_interest, Money::from_major(1_000));
    }

    #[test]
    fn test_flat_interest_from_rules() {
        let customer = Customer::new("Jane Doe").with_type(CustomerType::Consumer);
        let rules = DunningRules {
            interest: InterestMode::Flat { rate: Rate::from_percent(dec!(10)) },
            ..DunningRules::default()
        };
        let receipts = vec![receipt(&customer, "RE-1", Money::from_major(3_650), 10)];

        let invoices = project_overdue_invoices(
            &receipts, &customer, Some(&rules), &DunningStage::Dunning1, None, today(),
        );
        assert_eq!(invoices[0].interest_amount, Money::from_major(10));
    }

    #[test]
    fn test_foreign_receipts_ignored() {
        let customer = business();
        let other = business();
        let receipts = vec![
            receipt(&customer, "RE-MINE", Money::from_major(10), 20),
            receipt(&other, "RE-THEIRS", Money::from_major(10), 20),
        ];

        let invoices = project_overdue_invoices(
            &receipts, &customer, None, &DunningStage::Dunning1, None, today(),
        );
        assert_eq!(invoices.len(), 1);
        assert_eq!(invoices[0].invoice_number, "RE-MINE");
    }

    #[test]
    fn test_amounts_at_the_decimal_limit_do_not_panic() {
        let customer = business();
        let huge = Money::from_str_exact("50000000000000000000000000000").unwrap();
        let receipts = vec![receipt(&customer, "RE-BIG", huge, 40)];

        let invoices = project_overdue_invoices(
            &receipts,
            &customer,
            None,
            &DunningStage::Dunning1,
            Some(Rate::from_percent(dec!(3.62))),
            today(),
        );
        assert_eq!(invoices.len(), 1);
        assert!(invoices[0].interest_amount.is_positive());
        assert!(invoices[0].total_with_interest > huge);
    }
}
